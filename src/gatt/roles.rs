//! Per-role state. The session composes one of each.

use super::connection::{ConnState, Connection, ConnectionSet, Role};
use super::descriptor::HandleTable;
use super::radio::ScanTarget;
use super::{AttHandle, ConnHandle};
use crate::config::{MAX_CENTRAL_LINKS, MAX_CONNECTIONS};
use crate::error::GattError;
use crate::protocol::Advertisement;

/// Accepts peers that connect to our advertisement and serves our
/// registered characteristics to them.
#[derive(Debug, Default)]
pub struct PeripheralRole {
    pub(crate) connections: ConnectionSet<MAX_CONNECTIONS>,
    pub(crate) handles: HandleTable,
    /// Remembered so advertising can resume after a disconnect.
    pub(crate) advertisement: Option<Advertisement>,
    pub(crate) advertising: bool,
}

impl PeripheralRole {
    pub const fn new() -> Self {
        Self {
            connections: ConnectionSet::new(),
            handles: HandleTable::new(),
            advertisement: None,
            advertising: false,
        }
    }

    pub fn connections(&self) -> &ConnectionSet<MAX_CONNECTIONS> {
        &self.connections
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    pub fn at_capacity(&self) -> bool {
        self.connections.is_full()
    }

    /// Record a new peer. Fails when the set is full.
    pub(crate) fn admit(&mut self, conn: ConnHandle) -> Result<(), GattError> {
        self.connections
            .insert(Connection::new(conn, Role::Peripheral, ConnState::Active))
    }
}

/// Our single outgoing link to the display node.
#[derive(Debug, Default)]
pub struct CentralRole {
    pub(crate) connections: ConnectionSet<MAX_CENTRAL_LINKS>,
    pub(crate) target: Option<ScanTarget>,
    /// Peer's `voltage-in` handle, known once discovery finished.
    pub(crate) remote_voltage_in: Option<AttHandle>,
    pub(crate) scanning: bool,
}

impl CentralRole {
    pub const fn new() -> Self {
        Self {
            connections: ConnectionSet::new(),
            target: None,
            remote_voltage_in: None,
            scanning: false,
        }
    }

    pub fn connections(&self) -> &ConnectionSet<MAX_CENTRAL_LINKS> {
        &self.connections
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// The link writes can go to right now.
    pub fn ready_link(&self) -> Option<(ConnHandle, AttHandle)> {
        let conn = self.connections.find(ConnState::Active)?;
        Some((conn.handle, self.remote_voltage_in?))
    }

    pub(crate) fn forget(&mut self, conn: ConnHandle) -> Option<Connection> {
        let removed = self.connections.remove(conn)?;
        self.remote_voltage_in = None;
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peripheral_admits_up_to_capacity() {
        let mut role = PeripheralRole::new();
        for h in 0..MAX_CONNECTIONS as u16 {
            role.admit(h).unwrap();
        }
        assert!(role.at_capacity());
        assert_eq!(role.admit(99), Err(GattError::CapacityReached));
    }

    #[test]
    fn central_link_needs_active_conn_and_handle() {
        let mut role = CentralRole::new();
        role.connections
            .insert(Connection::new(4, Role::Central, ConnState::Connecting))
            .unwrap();
        role.remote_voltage_in = Some(20);
        assert_eq!(role.ready_link(), None);

        role.connections.set_state(4, ConnState::Active);
        assert_eq!(role.ready_link(), Some((4, 20)));

        role.forget(4);
        assert_eq!(role.ready_link(), None);
        assert_eq!(role.remote_voltage_in, None);
    }
}
