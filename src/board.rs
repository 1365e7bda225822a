//! Board bring-up for the nRF52840: GPIO lines, the multiplex tick,
//! the status LED and the SAADC.
//!
//! Pin assignments follow the table in [`crate::config`].

use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive};
use embassy_nrf::interrupt::typelevel::Binding;
use embassy_nrf::peripherals::SAADC;
use embassy_nrf::saadc::{self, ChannelConfig, Gain, Reference, Resolution, Saadc};
use embassy_time::{with_timeout, Duration, Ticker, Timer};

use crate::config::{ADC_CHANNEL_COUNT, ADC_CONVERSION_TIMEOUT_MS, DIGIT_POSITIONS};
use crate::display::glyph::SEGMENT_LINES;
use crate::display::mux::{GpioDriveLines, MultiplexConfig, Multiplexer};
use crate::display::SharedDisplay;
use crate::node::Heartbeat;

/// Push-pull output, initially low.
fn output(pin: AnyPin) -> Output<'static> {
    Output::new(pin, Level::Low, OutputDrive::Standard)
}

/// Segment lines (a..g, dp) and digit selects (display-major).
pub fn display_lines(
    segments: [AnyPin; SEGMENT_LINES],
    digits: [AnyPin; DIGIT_POSITIONS],
) -> GpioDriveLines<Output<'static>> {
    GpioDriveLines::new(segments.map(output), digits.map(output))
}

/// Refresh the displays forever. Meant for a high-priority executor so
/// radio and command traffic cannot stall the scan.
pub async fn run_multiplexer(
    shared: &'static SharedDisplay,
    lines: GpioDriveLines<Output<'static>>,
    config: MultiplexConfig,
) -> ! {
    let mut mux = Multiplexer::new(shared, lines, config);
    let mut ticker = Ticker::every(Duration::from_hz(config.tick_hz() as u64));
    info!("Multiplexer at {} Hz per digit", config.frequency_hz);
    loop {
        mux.tick();
        ticker.next().await;
    }
}

/// Blink the status LED at the heartbeat's current rate.
pub async fn run_heartbeat(pin: AnyPin, heartbeat: &'static Heartbeat) -> ! {
    // LED1 on the DK is active low.
    let mut led = Output::new(pin, Level::High, OutputDrive::Standard);
    loop {
        led.toggle();
        Timer::after_millis(heartbeat.period_ms()).await;
    }
}

/// Three single-ended channels, 12-bit, full scale at VDD.
pub fn voltmeter_saadc<I>(
    saadc: SAADC,
    irq: I,
    inputs: [saadc::AnyInput; ADC_CHANNEL_COUNT],
) -> Saadc<'static, ADC_CHANNEL_COUNT>
where
    I: Binding<embassy_nrf::interrupt::typelevel::SAADC, saadc::InterruptHandler> + 'static,
{
    let mut config = saadc::Config::default();
    config.resolution = Resolution::_12BIT;

    let channels = inputs.map(|input| {
        let mut channel = ChannelConfig::single_ended(input);
        // Gain 1/4 against VDD/4 puts full scale at VDD.
        channel.gain = Gain::GAIN1_4;
        channel.reference = Reference::VDD1_4;
        channel
    });
    Saadc::new(saadc, irq, config, channels)
}

/// One conversion of every channel. `None` if the converter does not
/// finish in time.
pub async fn read_adc(
    adc: &mut Saadc<'static, ADC_CHANNEL_COUNT>,
) -> Option<[i16; ADC_CHANNEL_COUNT]> {
    let mut buf = [0i16; ADC_CHANNEL_COUNT];
    let timeout = Duration::from_millis(ADC_CONVERSION_TIMEOUT_MS);
    if with_timeout(timeout, adc.sample(&mut buf)).await.is_err() {
        error!("SAADC: conversion timed out");
        return None;
    }
    if buf.iter().all(|&raw| raw < 0) {
        warn!("SAADC: every channel below ground");
    }
    Some(buf)
}
