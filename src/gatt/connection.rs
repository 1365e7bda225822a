//! Bounded connection bookkeeping, one set per role.

use heapless::Vec;

use super::ConnHandle;
use crate::error::GattError;

/// Which side of the link this node is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// We initiated the link.
    Central,
    /// A peer connected to our advertisement.
    Peripheral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnState {
    /// Link up, attributes not yet usable.
    Connecting,
    Active,
    /// Disconnect requested, waiting for the platform to confirm.
    Disconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Connection {
    pub handle: ConnHandle,
    pub role: Role,
    pub state: ConnState,
}

impl Connection {
    pub const fn new(handle: ConnHandle, role: Role, state: ConnState) -> Self {
        Self {
            handle,
            role,
            state,
        }
    }
}

/// At most `N` connections, keyed by handle.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSet<const N: usize> {
    links: Vec<Connection, N>,
}

impl<const N: usize> ConnectionSet<N> {
    pub const fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Add a connection. Re-adding a known handle updates it in place.
    pub fn insert(&mut self, conn: Connection) -> Result<(), GattError> {
        if let Some(existing) = self.get_mut(conn.handle) {
            *existing = conn;
            return Ok(());
        }
        self.links
            .push(conn)
            .map_err(|_| GattError::CapacityReached)
    }

    pub fn remove(&mut self, handle: ConnHandle) -> Option<Connection> {
        let pos = self.links.iter().position(|c| c.handle == handle)?;
        Some(self.links.swap_remove(pos))
    }

    pub fn get(&self, handle: ConnHandle) -> Option<&Connection> {
        self.links.iter().find(|c| c.handle == handle)
    }

    pub fn get_mut(&mut self, handle: ConnHandle) -> Option<&mut Connection> {
        self.links.iter_mut().find(|c| c.handle == handle)
    }

    pub fn contains(&self, handle: ConnHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn set_state(&mut self, handle: ConnHandle, state: ConnState) -> bool {
        match self.get_mut(handle) {
            Some(c) => {
                c.state = state;
                true
            }
            None => false,
        }
    }

    /// First connection in the given state.
    pub fn find(&self, state: ConnState) -> Option<&Connection> {
        self.links.iter().find(|c| c.state == state)
    }

    /// Handles of every connection in the given state.
    pub fn handles_in(&self, state: ConnState) -> Vec<ConnHandle, N> {
        self.links
            .iter()
            .filter(|c| c.state == state)
            .map(|c| c.handle)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.links.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Remove everything and return what was held.
    pub fn drain(&mut self) -> Vec<Connection, N> {
        core::mem::take(&mut self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(handle: ConnHandle) -> Connection {
        Connection::new(handle, Role::Peripheral, ConnState::Active)
    }

    #[test]
    fn capacity_is_enforced() {
        let mut set: ConnectionSet<3> = ConnectionSet::new();
        for h in 1..=3 {
            set.insert(active(h)).unwrap();
        }
        assert!(set.is_full());
        assert_eq!(set.insert(active(4)), Err(GattError::CapacityReached));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn reinsert_updates_in_place() {
        let mut set: ConnectionSet<1> = ConnectionSet::new();
        set.insert(Connection::new(7, Role::Central, ConnState::Connecting))
            .unwrap();
        set.insert(Connection::new(7, Role::Central, ConnState::Active))
            .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(7).unwrap().state, ConnState::Active);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut set: ConnectionSet<2> = ConnectionSet::new();
        set.insert(active(1)).unwrap();
        assert!(set.remove(5).is_none());
        assert_eq!(set.remove(1), Some(active(1)));
        assert!(set.is_empty());
    }

    #[test]
    fn handles_filter_by_state() {
        let mut set: ConnectionSet<3> = ConnectionSet::new();
        set.insert(active(1)).unwrap();
        set.insert(active(2)).unwrap();
        set.set_state(2, ConnState::Disconnecting);
        assert_eq!(set.handles_in(ConnState::Active).as_slice(), &[1]);
        assert_eq!(set.find(ConnState::Disconnecting).map(|c| c.handle), Some(2));
    }

    #[test]
    fn drain_empties_set() {
        let mut set: ConnectionSet<2> = ConnectionSet::new();
        set.insert(active(1)).unwrap();
        set.insert(active(2)).unwrap();
        assert_eq!(set.drain().len(), 2);
        assert!(set.is_empty());
    }
}
