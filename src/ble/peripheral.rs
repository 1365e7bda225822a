//! Peripheral role: connectable advertising and the GATT server.
//!
//! Advertising runs in one long-lived loop driven by [`AdvertisingRequest`]s
//! from the radio adapter. Each accepted connection gets its own task that
//! serves the attribute table until the peer leaves.

use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::gatt_server::{self, WriteOp};
use nrf_softdevice::ble::{peripheral, Connection};
use nrf_softdevice::Softdevice;

use super::{CONNECTIONS, CONNECTION_SLOTS, GATT_EVENTS};
use crate::config::BLE_ADV_INTERVAL;
use crate::gatt::{GattEvent, Role};
use crate::protocol::Advertisement;

/// What the advertiser loop should do next. A newer request replaces
/// one not yet picked up.
pub enum AdvertisingRequest {
    Start(Advertisement),
    Stop,
}

static ADVERTISING: Signal<CriticalSectionRawMutex, AdvertisingRequest> = Signal::new();

pub fn request_advertising(adv: Advertisement) {
    ADVERTISING.signal(AdvertisingRequest::Start(adv));
}

pub fn request_stop() {
    ADVERTISING.signal(AdvertisingRequest::Stop);
}

/// GATT server that forwards every peer write to [`GATT_EVENTS`].
///
/// Values land in the SoftDevice attribute table before `on_write` runs,
/// so only the handle travels; the session reads the bytes back.
pub struct EventServer;

impl gatt_server::Server for EventServer {
    type Event = ();

    fn on_write(
        &self,
        conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        _data: &[u8],
    ) -> Option<Self::Event> {
        if let Some(conn) = conn.handle() {
            // Dropping keeps the radio task from blocking on a slow main loop.
            if GATT_EVENTS.try_send(GattEvent::Write { conn, handle }).is_err() {
                warn!("GATT event queue full - dropping write on {}", handle);
            }
        }
        None
    }
}

/// Advertise whenever asked to, handing each new connection to
/// [`connection_task`].
///
/// Connectable advertising stops when a peer connects; the session asks
/// for it again while it has room.
pub async fn advertise_loop(
    sd: &'static Softdevice,
    server: &'static EventServer,
    spawner: Spawner,
) -> ! {
    let mut request = ADVERTISING.wait().await;
    loop {
        let adv = match request {
            AdvertisingRequest::Stop => {
                debug!("Advertising stopped");
                request = ADVERTISING.wait().await;
                continue;
            }
            AdvertisingRequest::Start(adv) => adv,
        };

        let config = peripheral::Config {
            interval: BLE_ADV_INTERVAL,
            ..Default::default()
        };
        let advertisement = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: adv.data(),
            scan_data: adv.scan_response(),
        };

        info!("Advertising ({} bytes)", adv.data().len());
        match select(
            peripheral::advertise_connectable(sd, advertisement, &config),
            ADVERTISING.wait(),
        )
        .await
        {
            Either::First(Ok(conn)) => {
                if spawner.spawn(connection_task(conn, server)).is_err() {
                    // Dropping the last handle closes the link.
                    warn!("No free connection task - dropping peer");
                }
                request = ADVERTISING.wait().await;
            }
            Either::First(Err(e)) => {
                warn!("Advertising failed: {:?}", e);
                GATT_EVENTS.send(GattEvent::AdvertisingFailed).await;
                request = ADVERTISING.wait().await;
            }
            Either::Second(next) => request = next,
        }
    }
}

/// Serve one inbound connection until it closes.
#[embassy_executor::task(pool_size = CONNECTION_SLOTS)]
pub async fn connection_task(conn: Connection, server: &'static EventServer) {
    let Some(handle) = CONNECTIONS.insert(&conn) else {
        warn!("Peer gone before it could be tracked");
        return;
    };
    GATT_EVENTS
        .send(GattEvent::Connected {
            conn: handle,
            role: Role::Peripheral,
        })
        .await;

    let reason = gatt_server::run(&conn, server, |_| {}).await;
    CONNECTIONS.remove(handle);
    info!("Peer {} closed: {:?}", handle, reason);

    GATT_EVENTS
        .send(GattEvent::Disconnected { conn: handle })
        .await;
}
