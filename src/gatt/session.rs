//! One node's GATT state: radio lifecycle, registered services, and the
//! peripheral and central roles.

use heapless::Vec;

use super::connection::{ConnState, Connection, Role};
use super::descriptor::{CharKey, Consumer, HandleTable, ServiceDescriptor, HANDLE_TABLE_CAPACITY};
use super::radio::{Radio, ScanTarget};
use super::roles::{CentralRole, PeripheralRole};
use super::{AttHandle, ConnHandle, GattEvent};
use crate::config::ATT_VALUE_MAX_LEN;
use crate::error::{GattError, RadioError, RegistrationError};
use crate::protocol::{Advertisement, Uuid};

/// Bytes a peer wrote, routed to the component that owns the characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InboundWrite {
    pub conn: ConnHandle,
    pub key: CharKey,
    pub consumer: Consumer,
    pub data: Vec<u8, ATT_VALUE_MAX_LEN>,
}

/// Outcome of one notify fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotifyReport {
    pub delivered: usize,
    /// Peers that have not subscribed. They stay connected.
    pub skipped: usize,
    /// Peers whose delivery failed. They were disconnected and removed.
    pub dropped: usize,
}

/// What the session made of a [`GattEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionNotice {
    PeerJoined { conn: ConnHandle, role: Role },
    /// A peer connected while the role was full and was disconnected.
    PeerRefused { conn: ConnHandle },
    PeerLeft { conn: ConnHandle, role: Role },
    Inbound(InboundWrite),
    /// The central link is ready for [`GattSession::write_remote`].
    RemoteLinked { conn: ConnHandle },
    /// A scan ended without a connection.
    ScanEnded,
    Ignored,
}

pub struct GattSession<R> {
    radio: R,
    active: bool,
    peripheral: PeripheralRole,
    central: CentralRole,
    registered: Vec<Uuid, HANDLE_TABLE_CAPACITY>,
}

impl<R: Radio> GattSession<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            active: false,
            peripheral: PeripheralRole::new(),
            central: CentralRole::new(),
            registered: Vec::new(),
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn peripheral(&self) -> &PeripheralRole {
        &self.peripheral
    }

    pub fn central(&self) -> &CentralRole {
        &self.central
    }

    pub fn handles(&self) -> &HandleTable {
        &self.peripheral.handles
    }

    /// Peers currently connected to us.
    pub fn peer_count(&self) -> usize {
        self.peripheral.connections.len()
    }

    pub fn has_remote_link(&self) -> bool {
        self.central.ready_link().is_some()
    }

    // Lifecycle

    /// Turn the radio on. A second call while active does nothing.
    /// Exactly one attempt is made; retries belong to the caller.
    pub fn activate(&mut self) -> Result<(), GattError> {
        if self.active {
            return Ok(());
        }
        self.radio.enable().map_err(|e| {
            warn!("gatt: radio enable failed: {}", e);
            GattError::RadioUnavailable
        })?;
        self.active = true;
        info!("gatt: radio active");
        Ok(())
    }

    /// Stop advertising, drop every link and turn the radio off.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.stop_advertising();
        for conn in self.peripheral.connections.drain() {
            self.radio.disconnect(conn.handle);
        }
        for conn in self.central.connections.drain() {
            self.radio.disconnect(conn.handle);
        }
        self.central.remote_voltage_in = None;
        self.central.scanning = false;
        self.radio.disable();
        self.active = false;
        info!("gatt: radio off");
    }

    /// Register every service and record their characteristic handles.
    ///
    /// All UUIDs are checked before anything reaches the radio, so a
    /// collision (with an earlier registration or within `services`)
    /// registers nothing. Handles are only recorded once the radio has
    /// accepted the whole batch.
    pub fn register_services(
        &mut self,
        services: &[ServiceDescriptor],
    ) -> Result<HandleTable, GattError> {
        if !self.active {
            return Err(RegistrationError::Inactive.into());
        }

        let mut pending: Vec<Uuid, HANDLE_TABLE_CAPACITY> = self.registered.clone();
        let mut char_count = 0;
        for service in services {
            let uuids = core::iter::once(service.uuid)
                .chain(service.characteristics.iter().map(|c| c.uuid));
            for uuid in uuids {
                if pending.iter().any(|known| known.same_as(&uuid)) {
                    warn!("gatt: duplicate uuid {}", uuid);
                    return Err(RegistrationError::DuplicateUuid.into());
                }
                pending
                    .push(uuid)
                    .map_err(|_| GattError::from(RegistrationError::TableFull))?;
            }
            char_count += service.characteristics.len();
        }
        if char_count > self.peripheral.handles.remaining() {
            return Err(RegistrationError::TableFull.into());
        }

        let mut staged = self.peripheral.handles.clone();
        for service in services {
            let handles = self.radio.register_service(service).map_err(|e| {
                warn!("gatt: radio rejected service {}: {}", service.uuid, e);
                GattError::from(RegistrationError::Rejected(e))
            })?;
            for (c, h) in service.characteristics.iter().zip(handles) {
                staged.insert(c.key, h);
            }
        }
        self.peripheral.handles = staged;
        self.registered = pending;
        info!("gatt: {} characteristics registered", self.peripheral.handles.len());
        Ok(self.peripheral.handles.clone())
    }

    // Advertising

    /// Advertise `name` and `service_uuids`. Does nothing while the
    /// peripheral role is full; the data is kept for when a slot frees.
    pub fn start_advertising(&mut self, name: &str, service_uuids: &[Uuid]) -> Result<(), GattError> {
        if !self.active {
            return Err(GattError::RadioUnavailable);
        }
        let adv = Advertisement::new(name, service_uuids);
        let result = if self.peripheral.at_capacity() {
            debug!("gatt: at capacity, advertising deferred");
            Ok(())
        } else {
            self.radio.start_advertising(&adv).map_err(GattError::from)
        };
        if result.is_ok() && !self.peripheral.at_capacity() {
            self.peripheral.advertising = true;
        }
        self.peripheral.advertisement = Some(adv);
        result
    }

    pub fn stop_advertising(&mut self) {
        if self.peripheral.advertising {
            self.radio.stop_advertising();
            self.peripheral.advertising = false;
        }
    }

    /// The radio stopped advertising on its own. Forget the flag so the
    /// next disconnect or [`start_advertising`](Self::start_advertising)
    /// starts it again.
    pub fn on_advertising_stopped(&mut self) {
        if self.peripheral.advertising {
            warn!("gatt: advertising stopped by the radio");
            self.peripheral.advertising = false;
        }
    }

    fn resume_advertising(&mut self) {
        if !self.active || self.peripheral.advertising || self.peripheral.at_capacity() {
            return;
        }
        let Some(adv) = self.peripheral.advertisement.as_ref() else {
            return;
        };
        match self.radio.start_advertising(adv) {
            Ok(()) => self.peripheral.advertising = true,
            Err(e) => warn!("gatt: advertising restart failed: {}", e),
        }
    }

    // Connection lifecycle

    pub fn on_connect(&mut self, conn: ConnHandle, role: Role) -> SessionNotice {
        match role {
            Role::Peripheral => {
                // Connectable advertising ends when a peer connects.
                self.peripheral.advertising = false;
                if self.peripheral.admit(conn).is_err() {
                    warn!("gatt: peer {} refused, at capacity", conn);
                    self.radio.disconnect(conn);
                    return SessionNotice::PeerRefused { conn };
                }
                info!(
                    "gatt: peer {} connected ({} of {})",
                    conn,
                    self.peripheral.connections.len(),
                    self.peripheral.connections.capacity()
                );
                self.resume_advertising();
            }
            Role::Central => {
                self.central.scanning = false;
                let link = Connection::new(conn, Role::Central, ConnState::Connecting);
                if self.central.connections.insert(link).is_err() {
                    warn!("gatt: second central link {} refused", conn);
                    self.radio.disconnect(conn);
                    return SessionNotice::PeerRefused { conn };
                }
                info!("gatt: central link {} up, discovering", conn);
            }
        }
        SessionNotice::PeerJoined { conn, role }
    }

    pub fn on_disconnect(&mut self, conn: ConnHandle) -> SessionNotice {
        if self.peripheral.connections.remove(conn).is_some() {
            info!("gatt: peer {} disconnected", conn);
            self.resume_advertising();
            return SessionNotice::PeerLeft {
                conn,
                role: Role::Peripheral,
            };
        }
        if self.central.forget(conn).is_some() {
            info!("gatt: central link {} lost", conn);
            return SessionNotice::PeerLeft {
                conn,
                role: Role::Central,
            };
        }
        SessionNotice::Ignored
    }

    /// Read what a peer just wrote and name its consumer. `None` for
    /// handles nobody consumes.
    pub fn on_characteristic_write(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
    ) -> Option<InboundWrite> {
        let key = self.peripheral.handles.key_for(handle)?;
        let consumer = key.consumer()?;
        let mut buf = [0u8; ATT_VALUE_MAX_LEN];
        let len = match self.radio.read_value(handle, &mut buf) {
            Ok(len) => len.min(ATT_VALUE_MAX_LEN),
            Err(e) => {
                warn!("gatt: reading written value failed: {}", e);
                return None;
            }
        };
        let data = Vec::from_slice(&buf[..len]).ok()?;
        Some(InboundWrite {
            conn,
            key,
            consumer,
            data,
        })
    }

    // Values

    /// Replace a characteristic's stored value without notifying.
    pub fn set_value(&mut self, key: CharKey, data: &[u8]) -> Result<(), GattError> {
        if !self.active {
            return Err(GattError::RadioUnavailable);
        }
        let handle = self.peripheral.handles.handle(key).ok_or(GattError::UnknownHandle)?;
        self.radio.write_value(handle, data)?;
        Ok(())
    }

    /// Store `data` and notify every connected peer.
    ///
    /// A peer that has not subscribed is skipped. A peer whose delivery
    /// fails is disconnected and removed; the others still receive it.
    pub fn notify(&mut self, key: CharKey, data: &[u8]) -> Result<NotifyReport, GattError> {
        self.set_value(key, data)?;
        let handle = self.peripheral.handles.handle(key).ok_or(GattError::UnknownHandle)?;

        let mut report = NotifyReport::default();
        for conn in self.peripheral.connections.handles_in(ConnState::Active) {
            match self.radio.notify(conn, handle, data) {
                Ok(()) => report.delivered += 1,
                Err(RadioError::NotSubscribed) => report.skipped += 1,
                Err(e) => {
                    warn!("gatt: notify to {} failed ({}), dropping peer", conn, e);
                    self.radio.disconnect(conn);
                    self.peripheral.connections.remove(conn);
                    report.dropped += 1;
                }
            }
        }
        if report.dropped > 0 {
            self.resume_advertising();
        }
        Ok(report)
    }

    // Central role

    /// Scan for `target` and connect when found.
    pub fn request_central_connect(&mut self, target: ScanTarget) -> Result<(), GattError> {
        if !self.active {
            return Err(GattError::RadioUnavailable);
        }
        if self.central.connections.is_full() {
            return Err(GattError::CapacityReached);
        }
        self.central.target = Some(target);
        if self.central.scanning {
            return Ok(());
        }
        self.radio.start_scan(&target)?;
        self.central.scanning = true;
        info!("gatt: scanning for {}", target.name);
        Ok(())
    }

    /// Discovery on the central link found the peer's `voltage-in`.
    pub fn on_remote_ready(&mut self, conn: ConnHandle, voltage_in: AttHandle) -> SessionNotice {
        if !self.central.connections.set_state(conn, ConnState::Active) {
            return SessionNotice::Ignored;
        }
        self.central.remote_voltage_in = Some(voltage_in);
        info!("gatt: central link {} ready", conn);
        SessionNotice::RemoteLinked { conn }
    }

    /// Write to the peer's `voltage-in`. A failed write tears the link down.
    pub fn write_remote(&mut self, data: &[u8]) -> Result<(), GattError> {
        let (conn, handle) = self.central.ready_link().ok_or(GattError::NoRemoteLink)?;
        if let Err(e) = self.radio.write_remote(conn, handle, data) {
            warn!("gatt: remote write failed ({}), closing link", e);
            self.central.connections.set_state(conn, ConnState::Disconnecting);
            self.radio.disconnect(conn);
            return Err(e.into());
        }
        Ok(())
    }

    // Events

    pub fn handle_event(&mut self, event: GattEvent) -> SessionNotice {
        match event {
            GattEvent::Connected { conn, role } => self.on_connect(conn, role),
            GattEvent::Disconnected { conn } => self.on_disconnect(conn),
            GattEvent::Write { conn, handle } => match self.on_characteristic_write(conn, handle) {
                Some(write) => SessionNotice::Inbound(write),
                None => SessionNotice::Ignored,
            },
            GattEvent::RemoteReady { conn, voltage_in } => self.on_remote_ready(conn, voltage_in),
            GattEvent::ScanTimedOut => {
                self.central.scanning = false;
                SessionNotice::ScanEnded
            }
            GattEvent::AdvertisingFailed => {
                self.on_advertising_stopped();
                SessionNotice::Ignored
            }
        }
    }
}
