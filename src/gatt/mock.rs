//! Recording radio for host tests.

use std::collections::BTreeMap;
use std::vec::Vec;

use super::descriptor::{ServiceDescriptor, MAX_CHARACTERISTICS_PER_SERVICE};
use super::radio::{Radio, ScanTarget};
use super::{AttHandle, ConnHandle};
use crate::error::RadioError;
use crate::protocol::Advertisement;

pub struct MockRadio {
    pub enabled: bool,
    pub enable_calls: usize,
    /// Number of upcoming `enable` calls that fail.
    pub enable_failures: usize,
    pub services_registered: usize,
    /// Services accepted before `register_service` starts failing.
    pub service_limit: Option<usize>,
    next_handle: AttHandle,
    values: BTreeMap<AttHandle, Vec<u8>>,
    pub advertising: bool,
    pub advertising_starts: usize,
    pub last_advertisement: Option<Advertisement>,
    pub notifications: Vec<(ConnHandle, AttHandle, Vec<u8>)>,
    pub remote_writes: Vec<(ConnHandle, AttHandle, Vec<u8>)>,
    /// Peers that have not enabled notifications.
    pub unsubscribed: Vec<ConnHandle>,
    /// Peers whose notify or remote write fails.
    pub failing: Vec<ConnHandle>,
    pub disconnected: Vec<ConnHandle>,
    pub scans: usize,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            enabled: false,
            enable_calls: 0,
            enable_failures: 0,
            services_registered: 0,
            service_limit: None,
            next_handle: 10,
            values: BTreeMap::new(),
            advertising: false,
            advertising_starts: 0,
            last_advertisement: None,
            notifications: Vec::new(),
            remote_writes: Vec::new(),
            unsubscribed: Vec::new(),
            failing: Vec::new(),
            disconnected: Vec::new(),
            scans: 0,
        }
    }

    /// Stored value of a local attribute.
    pub fn value(&self, handle: AttHandle) -> &[u8] {
        self.values.get(&handle).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Simulate a peer write landing in the attribute table.
    pub fn peer_writes(&mut self, handle: AttHandle, data: &[u8]) {
        self.values.insert(handle, data.to_vec());
    }

    /// Notifications delivered on `handle`, oldest first.
    pub fn notified(&self, handle: AttHandle) -> Vec<&[u8]> {
        self.notifications
            .iter()
            .filter(|(_, h, _)| *h == handle)
            .map(|(_, _, d)| d.as_slice())
            .collect()
    }
}

impl Radio for MockRadio {
    fn enable(&mut self) -> Result<(), RadioError> {
        self.enable_calls += 1;
        if self.enable_failures > 0 {
            self.enable_failures -= 1;
            return Err(RadioError::Unavailable);
        }
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.advertising = false;
    }

    fn register_service(
        &mut self,
        service: &ServiceDescriptor,
    ) -> Result<heapless::Vec<AttHandle, MAX_CHARACTERISTICS_PER_SERVICE>, RadioError> {
        if !self.enabled {
            return Err(RadioError::Unavailable);
        }
        if self.service_limit.is_some_and(|limit| self.services_registered >= limit) {
            return Err(RadioError::Rejected(4));
        }
        self.services_registered += 1;
        let mut handles = heapless::Vec::new();
        for _ in service.characteristics {
            // Value handle plus declaration and CCCD slots.
            self.next_handle += 3;
            handles
                .push(self.next_handle)
                .map_err(|_| RadioError::Rejected(4))?;
        }
        Ok(handles)
    }

    fn start_advertising(&mut self, adv: &Advertisement) -> Result<(), RadioError> {
        self.advertising = true;
        self.advertising_starts += 1;
        self.last_advertisement = Some(adv.clone());
        Ok(())
    }

    fn stop_advertising(&mut self) {
        self.advertising = false;
    }

    fn read_value(&mut self, handle: AttHandle, buf: &mut [u8]) -> Result<usize, RadioError> {
        let value = self.value(handle);
        let n = value.len().min(buf.len());
        buf[..n].copy_from_slice(&value[..n]);
        Ok(n)
    }

    fn write_value(&mut self, handle: AttHandle, data: &[u8]) -> Result<(), RadioError> {
        self.values.insert(handle, data.to_vec());
        Ok(())
    }

    fn notify(&mut self, conn: ConnHandle, handle: AttHandle, data: &[u8]) -> Result<(), RadioError> {
        if self.failing.contains(&conn) {
            return Err(RadioError::Rejected(8));
        }
        if self.unsubscribed.contains(&conn) {
            return Err(RadioError::NotSubscribed);
        }
        self.notifications.push((conn, handle, data.to_vec()));
        Ok(())
    }

    fn write_remote(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        data: &[u8],
    ) -> Result<(), RadioError> {
        if self.failing.contains(&conn) {
            return Err(RadioError::Rejected(8));
        }
        self.remote_writes.push((conn, handle, data.to_vec()));
        Ok(())
    }

    fn start_scan(&mut self, _target: &ScanTarget) -> Result<(), RadioError> {
        self.scans += 1;
        Ok(())
    }

    fn disconnect(&mut self, conn: ConnHandle) {
        self.disconnected.push(conn);
    }
}
