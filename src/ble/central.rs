//! Central role: find the display node, connect, hold the link.
//!
//! One loop serves scan requests from the radio adapter:
//! 1. scan until an advertiser matches the target's name or service UUID,
//! 2. connect to that address only,
//! 3. discover the display service and report the `voltage-in` handle,
//! 4. keep the GATT client running until the link drops.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};
use nrf_softdevice::ble::{central, gatt_client, Address, Connection};
use nrf_softdevice::raw;
use nrf_softdevice::Softdevice;

use super::{CONNECTIONS, GATT_EVENTS};
use crate::config::{
    BLE_CONN_INTERVAL_MAX, BLE_CONN_INTERVAL_MIN, BLE_SCAN_DURATION_SECS, BLE_SLAVE_LATENCY,
    BLE_SUP_TIMEOUT,
};
use crate::gatt::{GattEvent, Role, ScanTarget};
use crate::protocol::advertising::{contains_service_uuid, extract_device_name};

/// Client for the display node's service. Only `voltage-in` is used.
#[nrf_softdevice::gatt_client(uuid = "12345678-1234-1234-1234-123456789abc")]
pub struct DisplayServiceClient {
    /// Voltage triple, written without response.
    #[characteristic(uuid = "87654321-4321-4321-4321-cba987654322", write, notify)]
    pub voltage_in: [u8; 12],
}

enum ScanRequest {
    Find(ScanTarget),
    Cancel,
}

static SCAN_REQUESTS: Signal<CriticalSectionRawMutex, ScanRequest> = Signal::new();

pub fn request_scan(target: ScanTarget) {
    SCAN_REQUESTS.signal(ScanRequest::Find(target));
}

pub fn cancel_scan() {
    SCAN_REQUESTS.signal(ScanRequest::Cancel);
}

pub async fn central_loop(sd: &'static Softdevice) -> ! {
    loop {
        let target = match SCAN_REQUESTS.wait().await {
            ScanRequest::Find(target) => target,
            ScanRequest::Cancel => continue,
        };

        let conn = match select(find_and_connect(sd, &target), SCAN_REQUESTS.wait()).await {
            Either::First(Some(conn)) => conn,
            Either::First(None) => {
                GATT_EVENTS.send(GattEvent::ScanTimedOut).await;
                continue;
            }
            Either::Second(next) => {
                if let ScanRequest::Find(_) = next {
                    SCAN_REQUESTS.signal(next);
                }
                continue;
            }
        };

        run_link(conn).await;
    }
}

/// Scan for `target`; `None` when the scan window closes without a match
/// or the connection attempt fails.
async fn find_and_connect(sd: &'static Softdevice, target: &ScanTarget) -> Option<Connection> {
    info!("Scanning for {} ({} s window)", target.name, BLE_SCAN_DURATION_SECS);

    let config = central::ScanConfig {
        // Active scan to retrieve scan-response data (device names).
        active: true,
        ..Default::default()
    };
    let scan = central::scan(sd, &config, |params| {
        let data =
            unsafe { core::slice::from_raw_parts(params.data.p_data, params.data.len as usize) };
        let name_matches = extract_device_name(data).is_some_and(|n| n.as_str() == target.name);
        if name_matches || contains_service_uuid(data, &target.service) {
            Some(Address::from_raw(params.peer_addr))
        } else {
            None
        }
    });

    let address = match with_timeout(Duration::from_secs(BLE_SCAN_DURATION_SECS), scan).await {
        Ok(Ok(address)) => address,
        Ok(Err(e)) => {
            warn!("Scan failed: {:?}", e);
            return None;
        }
        Err(_) => {
            info!("{} not found", target.name);
            return None;
        }
    };

    info!("Found {} at {}, connecting", target.name, address);
    let whitelist = [&address];
    let mut config = central::ConnectConfig::default();
    config.scan_config.whitelist = Some(&whitelist);
    config.conn_params = raw::ble_gap_conn_params_t {
        min_conn_interval: BLE_CONN_INTERVAL_MIN,
        max_conn_interval: BLE_CONN_INTERVAL_MAX,
        slave_latency: BLE_SLAVE_LATENCY,
        conn_sup_timeout: BLE_SUP_TIMEOUT,
    };

    match central::connect(sd, &config).await {
        Ok(conn) => Some(conn),
        Err(e) => {
            warn!("Connect failed: {:?}", e);
            None
        }
    }
}

/// Report the link, discover `voltage-in`, then wait for the link to drop.
async fn run_link(conn: Connection) {
    let Some(handle) = CONNECTIONS.insert(&conn) else {
        warn!("Display link gone before it could be tracked");
        return;
    };
    GATT_EVENTS
        .send(GattEvent::Connected {
            conn: handle,
            role: Role::Central,
        })
        .await;

    let discovered: Result<DisplayServiceClient, _> = gatt_client::discover(&conn).await;
    match discovered {
        Ok(client) => {
            GATT_EVENTS
                .send(GattEvent::RemoteReady {
                    conn: handle,
                    voltage_in: client.voltage_in_value_handle,
                })
                .await;
            let reason = gatt_client::run(&conn, &client, |_| {}).await;
            info!("Display link closed: {:?}", reason);
        }
        Err(e) => {
            warn!("Display service not found: {:?}", e);
            let _ = conn.disconnect();
        }
    }

    CONNECTIONS.remove(handle);
    GATT_EVENTS
        .send(GattEvent::Disconnected { conn: handle })
        .await;
}
