//! GATT session layer.
//!
//! Each node owns one [`GattSession`] holding:
//!
//! 1. **Peripheral role** - serves the node's own service to up to
//!    [`MAX_CONNECTIONS`](crate::config::MAX_CONNECTIONS) peers and keeps
//!    advertising while there is room.
//! 2. **Central role** - the voltmeter's single link to the display node,
//!    used to write voltage triples.
//!
//! Everything the radio reports arrives as a [`GattEvent`]; the session
//! turns it into a [`SessionNotice`] for the node orchestrator.

pub mod activator;
pub mod connection;
pub mod descriptor;
pub mod radio;
pub mod roles;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use activator::{RadioActivator, RetryStrategy};
pub use connection::{ConnState, Connection, ConnectionSet, Role};
pub use descriptor::{
    display_services, voltmeter_services, CharKey, Consumer, HandleTable, ServiceDescriptor,
};
pub use radio::{Radio, ScanTarget};
pub use session::{GattSession, InboundWrite, NotifyReport, SessionNotice};

/// Connection handle assigned by the radio.
pub type ConnHandle = u16;

/// Attribute handle assigned by the radio.
pub type AttHandle = u16;

/// Something the radio reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GattEvent {
    Connected { conn: ConnHandle, role: Role },
    Disconnected { conn: ConnHandle },
    /// A peer wrote `handle`; the value is in the local attribute table.
    Write { conn: ConnHandle, handle: AttHandle },
    /// Discovery on a central link found the peer's `voltage-in`.
    RemoteReady { conn: ConnHandle, voltage_in: AttHandle },
    /// A central scan ended without finding the target.
    ScanTimedOut,
    /// Advertising ended without a connection.
    AdvertisingFailed,
}
