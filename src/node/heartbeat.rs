//! Status LED blink rate, shared between the node loop and the LED task.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::{HEARTBEAT_FAULT_MS, HEARTBEAT_IDLE_MS, HEARTBEAT_LINKED_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LinkMode {
    /// Waiting for peers.
    Idle = 0,
    /// At least one peer connected.
    Linked = 1,
    /// Bring-up failed.
    Fault = 2,
}

impl LinkMode {
    const fn from_u8(v: u8) -> Self {
        match v {
            1 => LinkMode::Linked,
            2 => LinkMode::Fault,
            _ => LinkMode::Idle,
        }
    }

    /// LED toggle period.
    pub const fn period_ms(self) -> u64 {
        match self {
            LinkMode::Idle => HEARTBEAT_IDLE_MS,
            LinkMode::Linked => HEARTBEAT_LINKED_MS,
            LinkMode::Fault => HEARTBEAT_FAULT_MS,
        }
    }
}

pub struct Heartbeat {
    mode: AtomicU8,
}

impl Heartbeat {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(LinkMode::Idle as u8),
        }
    }

    pub fn mode(&self) -> LinkMode {
        LinkMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    pub fn set(&self, mode: LinkMode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    /// Idle or Linked depending on `linked`. A fault is sticky.
    pub fn track(&self, linked: bool) {
        if self.mode() == LinkMode::Fault {
            return;
        }
        self.set(if linked {
            LinkMode::Linked
        } else {
            LinkMode::Idle
        });
    }

    pub fn period_ms(&self) -> u64 {
        self.mode().period_ms()
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}
