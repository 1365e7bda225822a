//! Bluetooth Low Energy platform on the Nordic SoftDevice S140.
//!
//! 1. **Radio** - [`radio::SoftdeviceRadio`] implements the session's
//!    [`Radio`](crate::gatt::Radio) seam on top of the SoftDevice.
//! 2. **Peripheral** - advertiser loop plus one task per inbound
//!    connection running the GATT server.
//! 3. **Central** - scans for the display node, connects, discovers its
//!    voltage characteristic and holds the link.
//!
//! Everything asynchronous reports back through [`GATT_EVENTS`]; the node
//! main loop drains it into the session.

pub mod central;
pub mod peripheral;
pub mod radio;

use core::cell::RefCell;
use core::mem;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use nrf_softdevice::ble::Connection;
use nrf_softdevice::raw;

use crate::config::{ATT_VALUE_MAX_LEN, MAX_CENTRAL_LINKS, MAX_CONNECTIONS};
use crate::gatt::{ConnHandle, GattEvent};

pub use radio::SoftdeviceRadio;

/// Depth of the event queue between the BLE tasks and the main loop.
pub const GATT_EVENT_QUEUE_LEN: usize = 16;

/// Radio events for the node main loop.
pub static GATT_EVENTS: Channel<CriticalSectionRawMutex, GattEvent, GATT_EVENT_QUEUE_LEN> =
    Channel::new();

/// Inbound connections plus one spare for a peer that is refused.
pub const CONNECTION_SLOTS: usize = MAX_CONNECTIONS + MAX_CENTRAL_LINKS + 1;

/// Live SoftDevice connections by handle, shared between the connection
/// tasks and the radio adapter.
pub struct ConnectionRegistry {
    links: Mutex<CriticalSectionRawMutex, RefCell<Vec<Connection, CONNECTION_SLOTS>>>,
}

impl ConnectionRegistry {
    pub const fn new() -> Self {
        Self {
            links: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Track `conn`. Returns its handle, or `None` if it is already gone
    /// or no slot is free.
    pub fn insert(&self, conn: &Connection) -> Option<ConnHandle> {
        let handle = conn.handle()?;
        self.links.lock(|links| {
            let mut links = links.borrow_mut();
            links.retain(|c| c.handle() != Some(handle));
            links.push(conn.clone()).ok().map(|_| handle)
        })
    }

    pub fn remove(&self, handle: ConnHandle) {
        self.links.lock(|links| {
            links.borrow_mut().retain(|c| c.handle() != Some(handle));
        });
    }

    /// Run `f` on the connection with `handle`, if still tracked.
    pub fn with<T>(&self, handle: ConnHandle, f: impl FnOnce(&Connection) -> T) -> Option<T> {
        self.links.lock(|links| {
            links
                .borrow()
                .iter()
                .find(|c| c.handle() == Some(handle))
                .map(f)
        })
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Every connection the node holds, in either role.
pub static CONNECTIONS: ConnectionRegistry = ConnectionRegistry::new();

/// SoftDevice configuration for a node advertising as `name`.
///
/// Sized for three peripheral links and one central link.
pub fn softdevice_config(name: &'static str) -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: (MAX_CONNECTIONS + MAX_CENTRAL_LINKS) as u8,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: (ATT_VALUE_MAX_LEN + 3) as u16,
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: MAX_CONNECTIONS as u8,
            central_role_count: MAX_CENTRAL_LINKS as u8,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: name.as_ptr() as _,
            current_len: name.len() as u16,
            max_len: name.len() as u16,
            // SAFETY: all-zero is the "no access" security mode.
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}
