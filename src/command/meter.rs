//! Voltmeter node command grammar.

use super::{bare, split_verb};
use crate::config::{ADC_CHANNEL_COUNT, MIN_SEND_INTERVAL_MS};
use crate::error::CommandError;
use crate::protocol::voltage::parse_finite;

/// Reply written to the command characteristic for `STATUS`.
pub const STATUS_REPLY: &str = "VOLTMETER_OK";

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterCommand {
    /// Notify the current readings in text form.
    GetVoltages,
    StartMonitoring,
    StopMonitoring,
    Status,
    /// `CALIBRATE:<channel>,<volts>`: make `channel` read `volts`.
    Calibrate { channel: usize, known_volts: f32 },
    /// `INTERVAL:<ms>`: period for pushing readings to the display node.
    SetInterval(u32),
}

pub fn parse(line: &str) -> Result<MeterCommand, CommandError> {
    let (verb, payload) = split_verb(line);
    match verb {
        "GET_VOLTAGES" => bare(payload, MeterCommand::GetVoltages),
        "START_MONITORING" => bare(payload, MeterCommand::StartMonitoring),
        "STOP_MONITORING" => bare(payload, MeterCommand::StopMonitoring),
        "STATUS" => bare(payload, MeterCommand::Status),
        "CALIBRATE" => calibrate(payload.ok_or(CommandError::InvalidFormat)?),
        "INTERVAL" => {
            let ms: u32 = payload
                .ok_or(CommandError::InvalidFormat)?
                .trim()
                .parse()
                .map_err(|_| CommandError::InvalidFormat)?;
            if ms < MIN_SEND_INTERVAL_MS {
                return Err(CommandError::InvalidArgument);
            }
            Ok(MeterCommand::SetInterval(ms))
        }
        _ => Err(CommandError::UnknownCommand),
    }
}

fn calibrate(payload: &str) -> Result<MeterCommand, CommandError> {
    let (channel, volts) = payload
        .split_once(',')
        .ok_or(CommandError::InvalidFormat)?;
    let channel: usize = channel
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidFormat)?;
    let known_volts = parse_finite(volts).map_err(|_| CommandError::InvalidFormat)?;
    if channel >= ADC_CHANNEL_COUNT || known_volts <= 0.0 {
        return Err(CommandError::InvalidArgument);
    }
    Ok(MeterCommand::Calibrate {
        channel,
        known_volts,
    })
}
