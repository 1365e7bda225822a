//! voltlink: a BLE voltmeter split over two nRF52840 boards.
//!
//! - **display node** renders three values on three multiplexed 4-digit
//!   seven-segment displays and accepts text commands.
//! - **voltmeter node** samples three analog channels and streams the
//!   readings to the display node.
//!
//! Everything outside `ble`, `board` and `storage` is hardware-free and
//! runs on the host:
//!
//! Usage: `cargo test --lib` or `cargo test --test integration`
//!
//! The firmware binaries live in `src/bin/` and need the `embedded`
//! feature.

#![cfg_attr(not(test), no_std)]

// Must come first so the log macros are visible to every module below.
#[macro_use]
mod fmt;

pub mod command;
pub mod config;
pub mod display;
pub mod error;
pub mod gatt;
pub mod node;
pub mod protocol;
pub mod sampling;

#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod board;
#[cfg(feature = "embedded")]
pub mod storage;

pub use error::Error;
