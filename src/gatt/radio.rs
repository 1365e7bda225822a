//! The seam between the GATT session and the radio platform.
//!
//! On target this is the SoftDevice adapter in `ble::radio`; host tests
//! use a recording mock. Calls are synchronous: the platform either
//! accepts a request or rejects it, and anything that completes later
//! arrives back as a [`GattEvent`](super::GattEvent).

use heapless::Vec;

use super::descriptor::{ServiceDescriptor, MAX_CHARACTERISTICS_PER_SERVICE};
use super::{AttHandle, ConnHandle};
use crate::error::RadioError;
use crate::protocol::{Advertisement, Uuid};

/// Peer the central role looks for in scan data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanTarget {
    pub name: &'static str,
    pub service: Uuid,
}

pub trait Radio {
    fn enable(&mut self) -> Result<(), RadioError>;

    fn disable(&mut self);

    /// Add a primary service. Handles come back in the order of
    /// `service.characteristics`.
    fn register_service(
        &mut self,
        service: &ServiceDescriptor,
    ) -> Result<Vec<AttHandle, MAX_CHARACTERISTICS_PER_SERVICE>, RadioError>;

    /// Start (or restart with new data) connectable advertising.
    fn start_advertising(&mut self, adv: &Advertisement) -> Result<(), RadioError>;

    fn stop_advertising(&mut self);

    /// Copy the stored value of a local attribute into `buf`.
    fn read_value(&mut self, handle: AttHandle, buf: &mut [u8]) -> Result<usize, RadioError>;

    /// Replace the stored value of a local attribute.
    fn write_value(&mut self, handle: AttHandle, data: &[u8]) -> Result<(), RadioError>;

    /// Send a notification to one peer. `NotSubscribed` when the peer has
    /// not enabled notifications.
    fn notify(&mut self, conn: ConnHandle, handle: AttHandle, data: &[u8])
        -> Result<(), RadioError>;

    /// Write without response to an attribute of a peer we are central to.
    fn write_remote(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        data: &[u8],
    ) -> Result<(), RadioError>;

    /// Scan for `target` and connect to the first match.
    fn start_scan(&mut self, target: &ScanTarget) -> Result<(), RadioError>;

    fn disconnect(&mut self, conn: ConnHandle);
}

impl<R: Radio + ?Sized> Radio for &mut R {
    fn enable(&mut self) -> Result<(), RadioError> {
        (**self).enable()
    }

    fn disable(&mut self) {
        (**self).disable()
    }

    fn register_service(
        &mut self,
        service: &ServiceDescriptor,
    ) -> Result<Vec<AttHandle, MAX_CHARACTERISTICS_PER_SERVICE>, RadioError> {
        (**self).register_service(service)
    }

    fn start_advertising(&mut self, adv: &Advertisement) -> Result<(), RadioError> {
        (**self).start_advertising(adv)
    }

    fn stop_advertising(&mut self) {
        (**self).stop_advertising()
    }

    fn read_value(&mut self, handle: AttHandle, buf: &mut [u8]) -> Result<usize, RadioError> {
        (**self).read_value(handle, buf)
    }

    fn write_value(&mut self, handle: AttHandle, data: &[u8]) -> Result<(), RadioError> {
        (**self).write_value(handle, data)
    }

    fn notify(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        data: &[u8],
    ) -> Result<(), RadioError> {
        (**self).notify(conn, handle, data)
    }

    fn write_remote(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        data: &[u8],
    ) -> Result<(), RadioError> {
        (**self).write_remote(conn, handle, data)
    }

    fn start_scan(&mut self, target: &ScanTarget) -> Result<(), RadioError> {
        (**self).start_scan(target)
    }

    fn disconnect(&mut self, conn: ConnHandle) {
        (**self).disconnect(conn)
    }
}
