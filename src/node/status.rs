//! Status events reported by the node orchestrators.

use crate::config::ADC_CHANNEL_COUNT;
use crate::error::{CalibrationError, CommandError, Error};
use crate::gatt::ConnHandle;
use crate::protocol::display::DisplayValues;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusEvent {
    PeerConnected { conn: ConnHandle },
    PeerDisconnected { conn: ConnHandle },
    /// Connected while the node was full; disconnected again.
    PeerRefused { conn: ConnHandle },
    /// Peers removed after a failed notification.
    PeersDropped { count: usize },
    RemoteLinked { conn: ConnHandle },
    RemoteLost { conn: ConnHandle },
    CommandReceived { conn: ConnHandle },
    CommandRejected { conn: ConnHandle, error: CommandError },
    CalibrationResult {
        channel: usize,
        result: Result<f32, CalibrationError>,
    },
    BringUpFailed(Error),
    DisplayReport { peers: usize, values: DisplayValues },
    MeterReport {
        peers: usize,
        remote_linked: bool,
        monitoring: bool,
        voltages: [f32; ADC_CHANNEL_COUNT],
    },
}

/// Where status events go.
pub trait StatusSink {
    fn emit(&mut self, event: StatusEvent);
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn emit(&mut self, event: StatusEvent) {
        (**self).emit(event)
    }
}

/// Forwards every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn emit(&mut self, event: StatusEvent) {
        match event {
            StatusEvent::PeerConnected { conn } => info!("status: peer {} connected", conn),
            StatusEvent::PeerDisconnected { conn } => info!("status: peer {} disconnected", conn),
            StatusEvent::PeerRefused { conn } => warn!("status: peer {} refused", conn),
            StatusEvent::PeersDropped { count } => warn!("status: {} peers dropped", count),
            StatusEvent::RemoteLinked { conn } => info!("status: display link {} up", conn),
            StatusEvent::RemoteLost { conn } => warn!("status: display link {} lost", conn),
            StatusEvent::CommandReceived { conn } => debug!("status: command from {}", conn),
            StatusEvent::CommandRejected { conn, error } => {
                warn!("status: command from {} rejected: {}", conn, error)
            }
            StatusEvent::CalibrationResult { channel, result } => match result {
                Ok(factor) => info!("status: channel {} calibrated, factor {}", channel, factor),
                Err(e) => warn!("status: channel {} calibration failed: {}", channel, e),
            },
            StatusEvent::BringUpFailed(e) => error!("status: bring-up failed: {}", e),
            StatusEvent::DisplayReport { peers, values } => info!(
                "status: {} peers, showing [{}] [{}] [{}]",
                peers,
                values[0].as_str(),
                values[1].as_str(),
                values[2].as_str()
            ),
            StatusEvent::MeterReport {
                peers,
                remote_linked,
                monitoring,
                voltages,
            } => info!(
                "status: {} peers, display link {}, monitoring {}, V={} {} {}",
                peers,
                remote_linked,
                monitoring,
                voltages[0],
                voltages[1],
                voltages[2]
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Keeps every event for inspection.
    #[derive(Default)]
    pub struct RecordingSink {
        pub events: std::vec::Vec<StatusEvent>,
    }

    impl StatusSink for RecordingSink {
        fn emit(&mut self, event: StatusEvent) {
            self.events.push(event);
        }
    }

    #[test]
    fn sink_by_reference_forwards() {
        let mut sink = RecordingSink::default();
        {
            let mut by_ref = &mut sink;
            by_ref.emit(StatusEvent::PeerConnected { conn: 1 });
        }
        assert_eq!(sink.events, [StatusEvent::PeerConnected { conn: 1 }]);
    }

    #[test]
    fn log_sink_accepts_every_event() {
        let mut sink = LogSink;
        sink.emit(StatusEvent::PeersDropped { count: 2 });
        sink.emit(StatusEvent::CalibrationResult {
            channel: 0,
            result: Err(CalibrationError::CalibrationFailed),
        });
    }
}
