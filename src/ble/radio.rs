//! [`Radio`] on the SoftDevice.
//!
//! The SoftDevice is enabled once and never turned off again. Services
//! must be added before it starts running, so the adapter moves through
//! three states:
//!
//! - `Off` until [`Radio::enable`],
//! - `Configuring` while services are registered,
//! - `Running` after [`SoftdeviceRadio::start`] hands out the shared
//!   reference the SoftDevice task needs.
//!
//! Advertising and scanning are requests to the long-running tasks in
//! [`peripheral`](super::peripheral) and [`central`](super::central);
//! their outcome arrives later through [`GATT_EVENTS`](super::GATT_EVENTS).

use core::mem;

use heapless::Vec;
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, GetValueError, NotifyValueError, SetValueError};
use nrf_softdevice::ble::{gatt_client, Uuid as SdUuid};
use nrf_softdevice::{RawError, Softdevice};

use super::{central, peripheral, CONNECTIONS};
use crate::error::RadioError;
use crate::gatt::descriptor::{ServiceDescriptor, MAX_CHARACTERISTICS_PER_SERVICE};
use crate::gatt::{AttHandle, ConnHandle, Radio, ScanTarget};
use crate::protocol::{Advertisement, Uuid};

enum State {
    Off,
    Configuring(&'static mut Softdevice),
    Running(&'static Softdevice),
}

pub struct SoftdeviceRadio {
    config: nrf_softdevice::Config,
    state: State,
}

impl SoftdeviceRadio {
    pub fn new(config: nrf_softdevice::Config) -> Self {
        Self {
            config,
            state: State::Off,
        }
    }

    /// Freeze the attribute table and return the SoftDevice for
    /// `Softdevice::run` and the BLE tasks. `None` until enabled.
    pub fn start(&mut self) -> Option<&'static Softdevice> {
        match mem::replace(&mut self.state, State::Off) {
            State::Off => None,
            State::Configuring(sd) => {
                let sd: &'static Softdevice = sd;
                self.state = State::Running(sd);
                info!("SoftDevice running");
                Some(sd)
            }
            State::Running(sd) => {
                self.state = State::Running(sd);
                Some(sd)
            }
        }
    }

    fn running(&self) -> Result<&'static Softdevice, RadioError> {
        match self.state {
            State::Running(sd) => Ok(sd),
            _ => Err(RadioError::Unavailable),
        }
    }
}

fn to_sd_uuid(uuid: Uuid) -> SdUuid {
    match uuid {
        Uuid::U16(v) => SdUuid::new_16(v),
        // The SoftDevice has no 32-bit form; use the full 128-bit alias.
        Uuid::U32(_) | Uuid::U128(_) => SdUuid::new_128(&uuid.to_u128().to_le_bytes()),
    }
}

fn raw_code(e: RawError) -> RadioError {
    RadioError::Rejected(e as u32)
}

impl Radio for SoftdeviceRadio {
    fn enable(&mut self) -> Result<(), RadioError> {
        if matches!(self.state, State::Off) {
            self.state = State::Configuring(Softdevice::enable(&self.config));
            info!("SoftDevice enabled");
        }
        Ok(())
    }

    fn disable(&mut self) {
        // The SoftDevice stays enabled until reset; quiesce the radio.
        peripheral::request_stop();
        central::cancel_scan();
        warn!("SoftDevice stays enabled until reset");
    }

    fn register_service(
        &mut self,
        service: &ServiceDescriptor,
    ) -> Result<Vec<AttHandle, MAX_CHARACTERISTICS_PER_SERVICE>, RadioError> {
        let State::Configuring(sd) = &mut self.state else {
            warn!("Services can only be added before the SoftDevice runs");
            return Err(RadioError::Unavailable);
        };

        let mut builder =
            ServiceBuilder::new(sd, to_sd_uuid(service.uuid)).map_err(|_| RadioError::Rejected(0))?;
        let mut handles = Vec::new();
        for c in service.characteristics {
            let mut props = Properties::new();
            if c.access.read {
                props = props.read();
            }
            if c.access.write {
                props = props.write().write_without_response();
            }
            if c.access.notify {
                props = props.notify();
            }
            let attr = Attribute::new(&[][..]).variable_len(c.max_len as u16);
            let char_handles = builder
                .add_characteristic(to_sd_uuid(c.uuid), attr, Metadata::new(props))
                .map_err(|_| RadioError::Rejected(0))?
                .build();
            handles
                .push(char_handles.value_handle)
                .map_err(|_| RadioError::Rejected(0))?;
        }
        builder.build();
        Ok(handles)
    }

    fn start_advertising(&mut self, adv: &Advertisement) -> Result<(), RadioError> {
        if matches!(self.state, State::Off) {
            return Err(RadioError::Unavailable);
        }
        peripheral::request_advertising(adv.clone());
        Ok(())
    }

    fn stop_advertising(&mut self) {
        peripheral::request_stop();
    }

    fn read_value(&mut self, handle: AttHandle, buf: &mut [u8]) -> Result<usize, RadioError> {
        let sd = self.running()?;
        gatt_server::get_value(sd, handle, buf).map_err(|e| match e {
            GetValueError::Truncated => RadioError::Rejected(0),
            GetValueError::Raw(raw) => raw_code(raw),
        })
    }

    fn write_value(&mut self, handle: AttHandle, data: &[u8]) -> Result<(), RadioError> {
        let sd = self.running()?;
        gatt_server::set_value(sd, handle, data).map_err(|e| match e {
            SetValueError::Raw(raw) => raw_code(raw),
        })
    }

    fn notify(&mut self, conn: ConnHandle, handle: AttHandle, data: &[u8]) -> Result<(), RadioError> {
        self.running()?;
        CONNECTIONS
            .with(conn, |c| gatt_server::notify_value(c, handle, data))
            .ok_or(RadioError::Unavailable)?
            .map_err(|e| match e {
                NotifyValueError::Raw(RawError::BleErrorGattsSysAttrMissing)
                | NotifyValueError::Raw(RawError::InvalidState) => RadioError::NotSubscribed,
                NotifyValueError::Raw(raw) => raw_code(raw),
                NotifyValueError::Disconnected => RadioError::Unavailable,
            })
    }

    fn write_remote(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        data: &[u8],
    ) -> Result<(), RadioError> {
        self.running()?;
        CONNECTIONS
            .with(conn, |c| gatt_client::try_write_without_response(c, handle, data))
            .ok_or(RadioError::Unavailable)?
            .map_err(|e| match e {
                gatt_client::TryWriteError::Raw(raw) => raw_code(raw),
                _ => RadioError::Rejected(0),
            })
    }

    fn start_scan(&mut self, target: &ScanTarget) -> Result<(), RadioError> {
        if matches!(self.state, State::Off) {
            return Err(RadioError::Unavailable);
        }
        central::request_scan(*target);
        Ok(())
    }

    fn disconnect(&mut self, conn: ConnHandle) {
        let closed = CONNECTIONS.with(conn, |c| c.disconnect());
        match closed {
            Some(Err(_)) => warn!("Disconnect of {} failed", conn),
            None => warn!("Disconnect of unknown connection {}", conn),
            Some(Ok(())) => {}
        }
    }
}
