//! Voltmeter node firmware.
//!
//! Runs on an nRF52840 sampling three analog inputs. Serves its own
//! voltmeter service to phones and pushes readings to the display node
//! over a central link.
//!
//! | Task          | Role                                        |
//! |---------------|---------------------------------------------|
//! | softdevice    | runs the BLE stack                          |
//! | advertiser    | advertising + connection tasks              |
//! | central       | scan, connect and hold the display link     |
//! | heartbeat     | status LED                                  |
//! | main          | sampling, pushes, commands, calibration     |

#![no_std]
#![no_main]

use core::future::pending;

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, select4, Either, Either4};
use embassy_nrf::gpio::{AnyPin, Pin as _};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::saadc::{self, Input as _};
use embassy_nrf::bind_interrupts;
use embassy_time::{Delay, Duration, Ticker};
use nrf_softdevice::Softdevice;
use {defmt_rtt as _, panic_probe as _};

use voltlink::ble::peripheral::{self, EventServer};
use voltlink::ble::{self, central, SoftdeviceRadio, GATT_EVENTS};
use voltlink::board;
use voltlink::config::{
    BLE_RESCAN_INTERVAL_SECS, RADIO_ACTIVATION_ATTEMPTS, RADIO_ACTIVATION_DELAY_MS,
    READING_INTERVAL_MS, VOLTMETER_NODE_NAME, VOLTMETER_STATUS_INTERVAL_SECS,
};
use voltlink::gatt::{RadioActivator, RetryStrategy};
use voltlink::node::{Heartbeat, LogSink, MeterEffect, MeterNode, StatusSink};
use voltlink::sampling::{AdcSnapshot, CalibrationStore, PipelineConfig};
use voltlink::storage::FlashCalibrationStore;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
});

static HEARTBEAT: Heartbeat = Heartbeat::new();
static SERVER: EventServer = EventServer;

#[embassy_executor::task]
async fn heartbeat_task(led: AnyPin) -> ! {
    board::run_heartbeat(led, &HEARTBEAT).await
}

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn advertiser_task(sd: &'static Softdevice, spawner: Spawner) -> ! {
    peripheral::advertise_loop(sd, &SERVER, spawner).await
}

#[embassy_executor::task]
async fn central_task(sd: &'static Softdevice) -> ! {
    central::central_loop(sd).await
}

fn push_ticker(interval_ms: u32) -> Ticker {
    Ticker::every(Duration::from_millis(interval_ms as u64))
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("voltlink voltmeter node starting");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    unwrap!(spawner.spawn(heartbeat_task(p.P0_13.degrade())));

    interrupt::SAADC.set_priority(Priority::P3);
    let mut adc = board::voltmeter_saadc(
        p.SAADC,
        Irqs,
        [
            p.P0_02.degrade_saadc(),
            p.P0_03.degrade_saadc(),
            p.P0_04.degrade_saadc(),
        ],
    );
    adc.calibrate().await;

    let radio = SoftdeviceRadio::new(ble::softdevice_config(VOLTMETER_NODE_NAME));
    let mut node = MeterNode::new(radio, AdcSnapshot::new(), PipelineConfig::default(), &HEARTBEAT);
    let mut activator = RadioActivator::new(
        Delay,
        RetryStrategy::FixedDelay {
            attempts: RADIO_ACTIVATION_ATTEMPTS,
            delay_ms: RADIO_ACTIVATION_DELAY_MS,
        },
    );
    let mut sink = LogSink;

    if node.bring_up(&mut activator, &mut sink).await.is_err() {
        // Nothing to sample for; the LED blinks fast.
        pending::<()>().await;
    }

    let sd = unwrap!(node.session_mut().radio_mut().start());
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(advertiser_task(sd, spawner)));
    unwrap!(spawner.spawn(central_task(sd)));

    let mut store = FlashCalibrationStore::new(nrf_softdevice::Flash::take(sd));
    node.restore_calibration(&mut store).await;

    let mut sampling = Ticker::every(Duration::from_millis(READING_INTERVAL_MS));
    let mut pushes = push_ticker(node.settings().send_interval_ms);
    let mut status = Ticker::every(Duration::from_secs(VOLTMETER_STATUS_INTERVAL_SECS));
    let mut rescan = Ticker::every(Duration::from_secs(BLE_RESCAN_INTERVAL_SECS));

    loop {
        match select4(
            GATT_EVENTS.receive(),
            sampling.next(),
            pushes.next(),
            select(status.next(), rescan.next()),
        )
        .await
        {
            Either4::First(event) => match node.handle_event(event, &mut sink) {
                MeterEffect::SaveCalibration(factors) => store.save(factors).await,
                MeterEffect::IntervalChanged(interval_ms) => pushes = push_ticker(interval_ms),
                MeterEffect::None => {}
            },
            Either4::Second(()) => {
                let snapshot = node.pipeline_mut().source_mut();
                match board::read_adc(&mut adc).await {
                    Some(raw) => snapshot.update(raw),
                    None => snapshot.invalidate(),
                }
                node.sample(&mut sink);
            }
            Either4::Third(()) => {
                if node.session().has_remote_link() {
                    if let Err(e) = node.push_to_display() {
                        warn!("Push to display failed: {}", e);
                    }
                }
            }
            Either4::Fourth(Either::First(())) => sink.emit(node.status_report()),
            Either4::Fourth(Either::Second(())) => {
                if let Err(e) = node.relink() {
                    warn!("Relink failed: {}", e);
                }
            }
        }
    }
}
