//! Voltmeter node: samples three channels, serves voltage-out and command,
//! and pushes readings to the display node over a central link.

use embedded_hal_async::delay::DelayNs;

use super::heartbeat::{Heartbeat, LinkMode};
use super::status::{StatusEvent, StatusSink};
use crate::command::meter::{self, MeterCommand, STATUS_REPLY};
use crate::command::command_line;
use crate::config::{
    ADC_CHANNEL_COUNT, DISPLAY_NODE_NAME, DISPLAY_SERVICE_UUID, SEND_INTERVAL_MS,
    VOLTMETER_NODE_NAME, VOLTMETER_SERVICE_UUID,
};
use crate::error::{Error, GattError};
use crate::gatt::{
    voltmeter_services, CharKey, Consumer, GattEvent, GattSession, InboundWrite, Radio,
    RadioActivator, Role, ScanTarget, SessionNotice,
};
use crate::protocol::{encode_voltage_text, encode_voltages, Uuid};
use crate::sampling::{CalibrationStore, PipelineConfig, SamplePipeline, SampleSource};

/// The display node, as the central role looks for it.
pub const DISPLAY_TARGET: ScanTarget = ScanTarget {
    name: DISPLAY_NODE_NAME,
    service: Uuid::U128(DISPLAY_SERVICE_UUID),
};

/// Runtime-tunable behaviour, changed over the command characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeterSettings {
    /// Period for pushing readings to the display node.
    pub send_interval_ms: u32,
    /// Notify voltage-out subscribers after each sample.
    pub monitoring: bool,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            send_interval_ms: SEND_INTERVAL_MS,
            monitoring: true,
        }
    }
}

/// Follow-up work for the firmware loop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterEffect {
    None,
    /// Calibration changed; persist these factors.
    SaveCalibration([f32; ADC_CHANNEL_COUNT]),
    /// Restart the push timer with the new period.
    IntervalChanged(u32),
}

pub struct MeterNode<'a, R, S> {
    session: GattSession<R>,
    pipeline: SamplePipeline<S>,
    settings: MeterSettings,
    heartbeat: &'a Heartbeat,
    latest: [f32; ADC_CHANNEL_COUNT],
}

impl<'a, R: Radio, S: SampleSource> MeterNode<'a, R, S> {
    pub fn new(radio: R, source: S, config: PipelineConfig, heartbeat: &'a Heartbeat) -> Self {
        Self {
            session: GattSession::new(radio),
            pipeline: SamplePipeline::new(source, config),
            settings: MeterSettings::default(),
            heartbeat,
            latest: [0.0; ADC_CHANNEL_COUNT],
        }
    }

    pub fn session(&self) -> &GattSession<R> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GattSession<R> {
        &mut self.session
    }

    pub fn pipeline(&self) -> &SamplePipeline<S> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut SamplePipeline<S> {
        &mut self.pipeline
    }

    pub fn settings(&self) -> MeterSettings {
        self.settings
    }

    /// Last filtered readings.
    pub fn latest(&self) -> [f32; ADC_CHANNEL_COUNT] {
        self.latest
    }

    /// Load stored calibration factors into the pipeline.
    pub async fn restore_calibration(&mut self, store: &mut impl CalibrationStore) {
        let factors = store.load().await;
        self.pipeline.restore_calibration(factors);
        info!("meter: calibration restored");
    }

    pub async fn persist_calibration(&self, store: &mut impl CalibrationStore) {
        store.save(self.pipeline.calibration()).await;
    }

    /// Radio up, voltmeter service registered, advertising, and a scan
    /// for the display node started.
    pub async fn bring_up<D: DelayNs>(
        &mut self,
        activator: &mut RadioActivator<D>,
        sink: &mut impl StatusSink,
    ) -> Result<(), Error> {
        if let Err(e) = self.start_radio(activator).await {
            self.heartbeat.set(LinkMode::Fault);
            sink.emit(StatusEvent::BringUpFailed(e));
            return Err(e);
        }
        self.heartbeat.track(false);
        info!("voltmeter node ready");
        Ok(())
    }

    async fn start_radio<D: DelayNs>(
        &mut self,
        activator: &mut RadioActivator<D>,
    ) -> Result<(), Error> {
        let session = &mut self.session;
        activator.activate(|| session.activate()).await?;
        self.session.register_services(voltmeter_services())?;
        self.session
            .start_advertising(VOLTMETER_NODE_NAME, &[Uuid::U128(VOLTMETER_SERVICE_UUID)])?;
        self.session.request_central_connect(DISPLAY_TARGET)?;
        Ok(())
    }

    /// Start a new scan for the display node if there is no link and no
    /// scan in progress.
    pub fn relink(&mut self) -> Result<(), GattError> {
        let central = self.session.central();
        if !central.connections().is_empty() || central.is_scanning() {
            return Ok(());
        }
        self.session.request_central_connect(DISPLAY_TARGET)
    }

    /// Take one reading of every channel and update voltage-out. While
    /// monitoring, subscribers are notified too.
    pub fn sample(&mut self, sink: &mut impl StatusSink) -> [f32; ADC_CHANNEL_COUNT] {
        self.latest = self.pipeline.read_all_voltages();
        let payload = encode_voltages(self.latest);
        if self.settings.monitoring {
            match self.session.notify(CharKey::VoltageOut, &payload) {
                Ok(report) if report.dropped > 0 => sink.emit(StatusEvent::PeersDropped {
                    count: report.dropped,
                }),
                Ok(_) => {}
                Err(e) => debug!("meter: voltage-out not published: {}", e),
            }
        } else if let Err(e) = self.session.set_value(CharKey::VoltageOut, &payload) {
            debug!("meter: voltage-out not stored: {}", e);
        }
        self.latest
    }

    /// Write the latest readings to the display node.
    pub fn push_to_display(&mut self) -> Result<(), GattError> {
        self.session.write_remote(&encode_voltages(self.latest))
    }

    pub fn handle_event(&mut self, event: GattEvent, sink: &mut impl StatusSink) -> MeterEffect {
        let effect = match self.session.handle_event(event) {
            SessionNotice::PeerJoined {
                role: Role::Peripheral,
                conn,
            } => {
                sink.emit(StatusEvent::PeerConnected { conn });
                MeterEffect::None
            }
            SessionNotice::PeerJoined {
                role: Role::Central,
                ..
            } => MeterEffect::None,
            SessionNotice::PeerRefused { conn } => {
                sink.emit(StatusEvent::PeerRefused { conn });
                MeterEffect::None
            }
            SessionNotice::PeerLeft {
                conn,
                role: Role::Peripheral,
            } => {
                sink.emit(StatusEvent::PeerDisconnected { conn });
                MeterEffect::None
            }
            SessionNotice::PeerLeft {
                conn,
                role: Role::Central,
            } => {
                sink.emit(StatusEvent::RemoteLost { conn });
                MeterEffect::None
            }
            SessionNotice::RemoteLinked { conn } => {
                sink.emit(StatusEvent::RemoteLinked { conn });
                MeterEffect::None
            }
            SessionNotice::Inbound(write) => self.on_inbound(write, sink),
            SessionNotice::ScanEnded | SessionNotice::Ignored => MeterEffect::None,
        };
        self.heartbeat
            .track(self.session.peer_count() > 0 || self.session.has_remote_link());
        effect
    }

    fn on_inbound(&mut self, write: InboundWrite, sink: &mut impl StatusSink) -> MeterEffect {
        if write.consumer != Consumer::CommandInterpreter {
            return MeterEffect::None;
        }
        match command_line(&write.data).and_then(meter::parse) {
            Ok(cmd) => {
                sink.emit(StatusEvent::CommandReceived { conn: write.conn });
                self.apply(cmd, sink)
            }
            Err(error) => {
                warn!("meter: command rejected: {}", error);
                sink.emit(StatusEvent::CommandRejected {
                    conn: write.conn,
                    error,
                });
                MeterEffect::None
            }
        }
    }

    pub fn apply(&mut self, cmd: MeterCommand, sink: &mut impl StatusSink) -> MeterEffect {
        match cmd {
            MeterCommand::GetVoltages => {
                let text = encode_voltage_text(self.latest);
                if let Err(e) = self.session.notify(CharKey::VoltageOut, text.as_bytes()) {
                    warn!("meter: readings not sent: {}", e);
                }
                MeterEffect::None
            }
            MeterCommand::StartMonitoring => {
                self.settings.monitoring = true;
                info!("meter: monitoring on");
                MeterEffect::None
            }
            MeterCommand::StopMonitoring => {
                self.settings.monitoring = false;
                info!("meter: monitoring off");
                MeterEffect::None
            }
            MeterCommand::Status => {
                if let Err(e) = self.session.set_value(CharKey::Command, STATUS_REPLY.as_bytes()) {
                    warn!("meter: status reply not stored: {}", e);
                }
                MeterEffect::None
            }
            MeterCommand::Calibrate {
                channel,
                known_volts,
            } => {
                let result = self.pipeline.auto_calibrate(channel, known_volts);
                sink.emit(StatusEvent::CalibrationResult { channel, result });
                match result {
                    Ok(_) => MeterEffect::SaveCalibration(self.pipeline.calibration()),
                    Err(_) => MeterEffect::None,
                }
            }
            MeterCommand::SetInterval(ms) => {
                self.settings.send_interval_ms = ms;
                info!("meter: send interval {} ms", ms);
                MeterEffect::IntervalChanged(ms)
            }
        }
    }

    pub fn status_report(&self) -> StatusEvent {
        StatusEvent::MeterReport {
            peers: self.session.peer_count(),
            remote_linked: self.session.has_remote_link(),
            monitoring: self.settings.monitoring,
            voltages: self.latest,
        }
    }
}
