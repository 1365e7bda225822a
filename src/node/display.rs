//! Display node: serves voltage-in, command and display-out, and renders
//! whatever arrives on the three seven-segment displays.

use embedded_hal_async::delay::DelayNs;

use super::heartbeat::{Heartbeat, LinkMode};
use super::status::{StatusEvent, StatusSink};
use crate::command::{self, Command};
use crate::config::{DISPLAY_COUNT, DISPLAY_NODE_NAME, DISPLAY_SERVICE_UUID, SELF_TEST_STEP_MS};
use crate::display::{Renderer, SelfTest};
use crate::error::Error;
use crate::gatt::{
    display_services, CharKey, Consumer, GattEvent, GattSession, InboundWrite, Radio,
    RadioActivator, SessionNotice,
};
use crate::protocol::display::encode_display_values;
use crate::protocol::{decode_voltage_payload, Uuid};

pub struct DisplayNode<'a, R> {
    session: GattSession<R>,
    renderer: Renderer<'a>,
    heartbeat: &'a Heartbeat,
    self_test: Option<SelfTest>,
}

impl<'a, R: Radio> DisplayNode<'a, R> {
    pub fn new(radio: R, renderer: Renderer<'a>, heartbeat: &'a Heartbeat) -> Self {
        Self {
            session: GattSession::new(radio),
            renderer,
            heartbeat,
            self_test: None,
        }
    }

    pub fn session(&self) -> &GattSession<R> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GattSession<R> {
        &mut self.session
    }

    pub fn renderer(&self) -> Renderer<'a> {
        self.renderer
    }

    /// Show the boot pattern, bring the radio up, register the display
    /// service and advertise. On failure the error pattern stays on the
    /// displays and the heartbeat switches to fast blink.
    pub async fn bring_up<D: DelayNs>(
        &mut self,
        activator: &mut RadioActivator<D>,
        sink: &mut impl StatusSink,
    ) -> Result<(), Error> {
        self.renderer.show_boot_pattern();
        self.renderer.start_multiplexing();

        if let Err(e) = self.start_radio(activator).await {
            self.renderer.show_error();
            self.heartbeat.set(LinkMode::Fault);
            sink.emit(StatusEvent::BringUpFailed(e));
            return Err(e);
        }

        // Ready: all channels at zero until the first reading arrives.
        self.renderer.set_voltages([0.0; DISPLAY_COUNT]);
        self.heartbeat.track(false);
        self.publish(sink);
        info!("display node ready");
        Ok(())
    }

    async fn start_radio<D: DelayNs>(
        &mut self,
        activator: &mut RadioActivator<D>,
    ) -> Result<(), Error> {
        let session = &mut self.session;
        activator.activate(|| session.activate()).await?;
        self.session.register_services(display_services())?;
        self.session
            .start_advertising(DISPLAY_NODE_NAME, &[Uuid::U128(DISPLAY_SERVICE_UUID)])?;
        Ok(())
    }

    pub fn handle_event(&mut self, event: GattEvent, sink: &mut impl StatusSink) {
        match self.session.handle_event(event) {
            SessionNotice::PeerJoined { conn, .. } => {
                sink.emit(StatusEvent::PeerConnected { conn });
            }
            SessionNotice::PeerRefused { conn } => sink.emit(StatusEvent::PeerRefused { conn }),
            SessionNotice::PeerLeft { conn, .. } => {
                sink.emit(StatusEvent::PeerDisconnected { conn });
            }
            SessionNotice::Inbound(write) => self.on_inbound(write, sink),
            SessionNotice::RemoteLinked { .. } | SessionNotice::ScanEnded | SessionNotice::Ignored => {}
        }
        self.heartbeat.track(self.session.peer_count() > 0);
    }

    fn on_inbound(&mut self, write: InboundWrite, sink: &mut impl StatusSink) {
        match write.consumer {
            Consumer::VoltageSink => {
                let volts = decode_voltage_payload(&write.data).unwrap_or_else(|e| {
                    warn!("display: bad voltage payload ({}), showing zeros", e);
                    [0.0; DISPLAY_COUNT]
                });
                self.apply(Command::ShowVoltages(volts), sink);
            }
            Consumer::CommandInterpreter => {
                match command::command_line(&write.data).and_then(command::display::parse) {
                    Ok(cmd) => {
                        sink.emit(StatusEvent::CommandReceived { conn: write.conn });
                        self.apply(cmd, sink);
                    }
                    Err(error) => {
                        warn!("display: command rejected: {}", error);
                        sink.emit(StatusEvent::CommandRejected {
                            conn: write.conn,
                            error,
                        });
                    }
                }
            }
        }
    }

    /// Apply a command, then publish the new contents on display-out.
    /// Anything that changes the displays cancels a running self-test.
    /// `STATUS` always publishes, self-test or not.
    pub fn apply(&mut self, cmd: Command, sink: &mut impl StatusSink) {
        let status = matches!(cmd, Command::Status);
        if cmd.mutates_display() && self.self_test.take().is_some() {
            debug!("display: self-test cancelled");
        }
        match cmd {
            Command::ShowText(values) | Command::ShowFormattedNumbers(values) => {
                for (display, text) in values.iter().enumerate() {
                    self.renderer.set_text(display, text);
                }
            }
            Command::ShowVoltages(volts) => self.renderer.set_voltages(volts),
            Command::Clear => self.renderer.clear(),
            Command::Test => self.self_test = Some(SelfTest::all_displays()),
            Command::TestDisplay(display) => self.self_test = SelfTest::single(display),
            Command::Status => {}
        }
        if status || self.self_test.is_none() {
            self.publish(sink);
        }
    }

    pub fn self_test_running(&self) -> bool {
        self.self_test.is_some()
    }

    /// Show the next self-test frame and return how long to hold it.
    /// `None` once the test is over; the displays are cleared then.
    pub fn poll_self_test(&mut self, sink: &mut impl StatusSink) -> Option<u32> {
        let test = self.self_test.as_mut()?;
        match test.next() {
            Some(frame) => {
                self.renderer.show_frame(&frame);
                Some(SELF_TEST_STEP_MS)
            }
            None => {
                self.self_test = None;
                self.renderer.clear();
                info!("display: self-test complete");
                self.publish(sink);
                None
            }
        }
    }

    /// Notify the current display contents to every subscribed peer.
    fn publish(&mut self, sink: &mut impl StatusSink) {
        let payload = encode_display_values(&self.renderer.current_values());
        match self.session.notify(CharKey::DisplayOut, &payload) {
            Ok(report) if report.dropped > 0 => sink.emit(StatusEvent::PeersDropped {
                count: report.dropped,
            }),
            Ok(_) => {}
            Err(e) => debug!("display: display-out not published: {}", e),
        }
    }

    pub fn status_report(&self) -> StatusEvent {
        StatusEvent::DisplayReport {
            peers: self.session.peer_count(),
            values: self.renderer.current_values(),
        }
    }
}
