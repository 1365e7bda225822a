//! Display node firmware.
//!
//! Runs on an nRF52840 driving three 4-digit seven-segment displays.
//! Task layout:
//!
//! | Task          | Executor            | Role                              |
//! |---------------|---------------------|-----------------------------------|
//! | multiplex     | interrupt (P3)      | scans the 12 digit positions      |
//! | softdevice    | thread              | runs the BLE stack                |
//! | advertiser    | thread              | advertising + connection tasks    |
//! | heartbeat     | thread              | status LED                        |
//! | main          | thread              | session, commands, self-test      |

#![no_std]
#![no_main]

use core::future::pending;

use defmt::{info, unwrap};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::select::{select3, Either3};
use embassy_nrf::gpio::{AnyPin, Output, Pin as _};
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_time::{Delay, Duration, Instant, Ticker, Timer};
use nrf_softdevice::Softdevice;
use {defmt_rtt as _, panic_probe as _};

use voltlink::ble::peripheral::{self, EventServer};
use voltlink::ble::{self, SoftdeviceRadio, GATT_EVENTS};
use voltlink::board;
use voltlink::config::{
    DISPLAY_NODE_NAME, DISPLAY_STATUS_INTERVAL_SECS, RADIO_ACTIVATION_ATTEMPTS,
    RADIO_ACTIVATION_DELAY_MS,
};
use voltlink::display::{GpioDriveLines, MultiplexConfig, Renderer, SharedDisplay};
use voltlink::gatt::{RadioActivator, RetryStrategy};
use voltlink::node::{DisplayNode, Heartbeat, LogSink, StatusSink};

static SHARED_DISPLAY: SharedDisplay = SharedDisplay::new();
static HEARTBEAT: Heartbeat = Heartbeat::new();
static SERVER: EventServer = EventServer;
static MUX_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn EGU0_SWI0() {
    MUX_EXECUTOR.on_interrupt()
}

#[embassy_executor::task]
async fn multiplex_task(lines: GpioDriveLines<Output<'static>>) -> ! {
    board::run_multiplexer(&SHARED_DISPLAY, lines, MultiplexConfig::default()).await
}

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

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("voltlink display node starting");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let segments = [
        p.P1_01.degrade(),
        p.P1_02.degrade(),
        p.P1_03.degrade(),
        p.P1_04.degrade(),
        p.P1_05.degrade(),
        p.P1_06.degrade(),
        p.P1_07.degrade(),
        p.P1_08.degrade(),
    ];
    let digits = [
        p.P0_03.degrade(),
        p.P0_04.degrade(),
        p.P0_28.degrade(),
        p.P0_29.degrade(),
        p.P0_30.degrade(),
        p.P0_31.degrade(),
        p.P1_10.degrade(),
        p.P1_11.degrade(),
        p.P1_12.degrade(),
        p.P1_13.degrade(),
        p.P1_14.degrade(),
        p.P1_15.degrade(),
    ];
    let lines = board::display_lines(segments, digits);

    interrupt::EGU0_SWI0.set_priority(Priority::P3);
    let mux_spawner = MUX_EXECUTOR.start(interrupt::EGU0_SWI0);
    unwrap!(mux_spawner.spawn(multiplex_task(lines)));
    unwrap!(spawner.spawn(heartbeat_task(p.P0_13.degrade())));

    let radio = SoftdeviceRadio::new(ble::softdevice_config(DISPLAY_NODE_NAME));
    let mut node = DisplayNode::new(radio, Renderer::new(&SHARED_DISPLAY), &HEARTBEAT);
    let mut activator = RadioActivator::new(
        Delay,
        RetryStrategy::FixedDelay {
            attempts: RADIO_ACTIVATION_ATTEMPTS,
            delay_ms: RADIO_ACTIVATION_DELAY_MS,
        },
    );
    let mut sink = LogSink;

    if node.bring_up(&mut activator, &mut sink).await.is_err() {
        // Error pattern stays on the displays; the LED blinks fast.
        pending::<()>().await;
    }

    let sd = unwrap!(node.session_mut().radio_mut().start());
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(advertiser_task(sd, spawner)));

    let mut status = Ticker::every(Duration::from_secs(DISPLAY_STATUS_INTERVAL_SECS));
    let mut next_frame: Option<Instant> = None;

    loop {
        let due = next_frame;
        let frame_due = async move {
            match due {
                Some(at) => Timer::at(at).await,
                None => pending::<()>().await,
            }
        };

        match select3(GATT_EVENTS.receive(), status.next(), frame_due).await {
            Either3::First(event) => node.handle_event(event, &mut sink),
            Either3::Second(()) => sink.emit(node.status_report()),
            Either3::Third(()) => next_frame = None,
        }

        // A new self-test starts here; a running one advances when its
        // frame is due.
        if node.self_test_running() && next_frame.is_none() {
            next_frame = node
                .poll_self_test(&mut sink)
                .map(|dwell_ms| Instant::now() + Duration::from_millis(dwell_ms as u64));
        }
    }
}
