//! Text commands written to the `command` characteristic.
//!
//! Both nodes share the `VERB[:payload]` framing. Verbs are case-sensitive;
//! whitespace and trailing NULs around the line are ignored.

pub mod display;
pub mod meter;

pub use display::Command;
pub use meter::MeterCommand;

use crate::error::CommandError;

/// Decode a raw write into a trimmed command line.
pub fn command_line(bytes: &[u8]) -> Result<&str, CommandError> {
    let text = core::str::from_utf8(bytes).map_err(|_| CommandError::InvalidFormat)?;
    Ok(text.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
}

/// Split `VERB:payload`. The payload is `None` when there is no colon.
pub(crate) fn split_verb(line: &str) -> (&str, Option<&str>) {
    match line.split_once(':') {
        Some((verb, payload)) => (verb.trim(), Some(payload)),
        None => (line.trim(), None),
    }
}

/// Accept a verb that takes no payload.
pub(crate) fn bare<T>(payload: Option<&str>, command: T) -> Result<T, CommandError> {
    match payload {
        None => Ok(command),
        Some(_) => Err(CommandError::InvalidFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_is_trimmed() {
        assert_eq!(command_line(b"  CLEAR\r\n\0").unwrap(), "CLEAR");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_eq!(command_line(&[0xff, 0xfe]), Err(CommandError::InvalidFormat));
    }

    #[test]
    fn verb_split_keeps_payload_colons() {
        assert_eq!(split_verb("A:b:c"), ("A", Some("b:c")));
        assert_eq!(split_verb("STATUS"), ("STATUS", None));
        assert_eq!(split_verb("TEXT:"), ("TEXT", Some("")));
    }
}
