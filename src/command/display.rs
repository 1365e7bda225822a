//! Display node command grammar.
//!
//! | Line | Command |
//! |---|---|
//! | `TEXT:a,b,c` | [`Command::ShowText`] |
//! | `VOLT:f,f,f` | [`Command::ShowVoltages`] |
//! | `NUM:n,n,n` | [`Command::ShowFormattedNumbers`] |
//! | `CLEAR` | [`Command::Clear`] |
//! | `TEST` | [`Command::Test`] |
//! | `TEST_DISP:i` | [`Command::TestDisplay`] |
//! | `STATUS` | [`Command::Status`] |

use super::{bare, split_verb};
use crate::config::{DIGITS_PER_DISPLAY, DISPLAY_COUNT};
use crate::error::CommandError;
use crate::protocol::display::{blank_values, DisplayValues, FieldText};
use crate::protocol::voltage::parse_finite;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Free text, at most four characters per display.
    ShowText(DisplayValues),
    ShowVoltages([f32; DISPLAY_COUNT]),
    Clear,
    /// Self-test on every display.
    Test,
    /// Self-test on one display.
    TestDisplay(usize),
    /// Digits zero-padded to four places, other text as-is.
    ShowFormattedNumbers(DisplayValues),
    /// Report the current contents.
    Status,
}

impl Command {
    /// True when applying the command changes what is shown.
    pub fn mutates_display(&self) -> bool {
        !matches!(self, Command::Status)
    }
}

/// Parse a trimmed command line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let (verb, payload) = split_verb(line);
    match verb {
        "TEXT" => text_fields(payload.ok_or(CommandError::InvalidFormat)?, truncated)
            .map(Command::ShowText),
        "NUM" => text_fields(payload.ok_or(CommandError::InvalidFormat)?, zero_padded)
            .map(Command::ShowFormattedNumbers),
        "VOLT" => voltages(payload.ok_or(CommandError::InvalidFormat)?).map(Command::ShowVoltages),
        "TEST_DISP" => {
            let payload = payload.ok_or(CommandError::InvalidFormat)?;
            let index: usize = payload
                .trim()
                .parse()
                .map_err(|_| CommandError::InvalidArgument)?;
            if index < DISPLAY_COUNT {
                Ok(Command::TestDisplay(index))
            } else {
                Err(CommandError::InvalidArgument)
            }
        }
        "CLEAR" => bare(payload, Command::Clear),
        "TEST" => bare(payload, Command::Test),
        "STATUS" => bare(payload, Command::Status),
        _ => Err(CommandError::UnknownCommand),
    }
}

/// Up to three comma-separated fields, padded with empties; extras ignored.
fn text_fields(
    payload: &str,
    shape: impl Fn(&str) -> FieldText,
) -> Result<DisplayValues, CommandError> {
    let mut values = blank_values();
    for (slot, field) in values.iter_mut().zip(payload.split(',')) {
        *slot = shape(field.trim());
    }
    Ok(values)
}

fn truncated(field: &str) -> FieldText {
    let mut out = FieldText::new();
    for c in field.chars().take(DIGITS_PER_DISPLAY) {
        // Four chars of at most four bytes each always fit.
        let _ = out.push(c);
    }
    out
}

fn zero_padded(field: &str) -> FieldText {
    let all_digits = !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit());
    if !all_digits || field.len() >= DIGITS_PER_DISPLAY {
        return truncated(field);
    }
    let mut out = FieldText::new();
    for _ in field.len()..DIGITS_PER_DISPLAY {
        let _ = out.push('0');
    }
    let _ = out.push_str(field);
    out
}

/// Exactly three finite floats. Any bad field rejects the whole command.
fn voltages(payload: &str) -> Result<[f32; DISPLAY_COUNT], CommandError> {
    let mut out = [0.0; DISPLAY_COUNT];
    let mut fields = payload.split(',');
    for slot in out.iter_mut() {
        let field = fields.next().ok_or(CommandError::InvalidFormat)?;
        *slot = parse_finite(field).map_err(|_| CommandError::InvalidFormat)?;
    }
    if fields.next().is_some() {
        return Err(CommandError::InvalidFormat);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(cmd: &Command) -> [&str; 3] {
        match cmd {
            Command::ShowText(v) | Command::ShowFormattedNumbers(v) => {
                [v[0].as_str(), v[1].as_str(), v[2].as_str()]
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn volt_parses_three_floats() {
        assert_eq!(
            parse("VOLT:1.23,4.56,7.89"),
            Ok(Command::ShowVoltages([1.23, 4.56, 7.89]))
        );
    }

    #[test]
    fn malformed_volt_is_rejected_whole() {
        assert_eq!(parse("VOLT:abc"), Err(CommandError::InvalidFormat));
        assert_eq!(parse("VOLT:1.0,x,2.0"), Err(CommandError::InvalidFormat));
        assert_eq!(parse("VOLT:1,2"), Err(CommandError::InvalidFormat));
        assert_eq!(parse("VOLT:1,2,3,4"), Err(CommandError::InvalidFormat));
        assert_eq!(parse("VOLT:NaN,1,2"), Err(CommandError::InvalidFormat));
        assert_eq!(parse("VOLT"), Err(CommandError::InvalidFormat));
    }

    #[test]
    fn text_pads_and_truncates() {
        assert_eq!(texts(&parse("TEXT:Hi,Lo,Go").unwrap()), ["Hi", "Lo", "Go"]);
        assert_eq!(texts(&parse("TEXT:Hello").unwrap()), ["Hell", "", ""]);
        assert_eq!(texts(&parse("TEXT:a,b,c,d").unwrap()), ["a", "b", "c"]);
    }

    #[test]
    fn num_zero_pads_digits_only() {
        assert_eq!(texts(&parse("NUM:7,88,999").unwrap()), ["0007", "0088", "0999"]);
        assert_eq!(texts(&parse("NUM:12345,x1,-5").unwrap()), ["1234", "x1", "-5"]);
        assert_eq!(texts(&parse("NUM:,1").unwrap()), ["", "0001", ""]);
    }

    #[test]
    fn test_disp_checks_index() {
        assert_eq!(parse("TEST_DISP:2"), Ok(Command::TestDisplay(2)));
        assert_eq!(parse("TEST_DISP:3"), Err(CommandError::InvalidArgument));
        assert_eq!(parse("TEST_DISP:-1"), Err(CommandError::InvalidArgument));
        assert_eq!(parse("TEST_DISP:one"), Err(CommandError::InvalidArgument));
        assert_eq!(parse("TEST_DISP"), Err(CommandError::InvalidFormat));
    }

    #[test]
    fn bare_verbs() {
        assert_eq!(parse("CLEAR"), Ok(Command::Clear));
        assert_eq!(parse("TEST"), Ok(Command::Test));
        assert_eq!(parse("STATUS"), Ok(Command::Status));
        assert_eq!(parse("CLEAR:now"), Err(CommandError::InvalidFormat));
    }

    #[test]
    fn verbs_are_case_sensitive() {
        assert_eq!(parse("clear"), Err(CommandError::UnknownCommand));
        assert_eq!(parse("Volt:1,2,3"), Err(CommandError::UnknownCommand));
        assert_eq!(parse(""), Err(CommandError::UnknownCommand));
    }

    #[test]
    fn only_status_leaves_display_alone() {
        assert!(!Command::Status.mutates_display());
        assert!(Command::Clear.mutates_display());
        assert!(Command::TestDisplay(0).mutates_display());
    }

    proptest! {
        #[test]
        fn parse_never_panics(line in "\\PC{0,40}") {
            let _ = parse(&line);
        }

        #[test]
        fn text_fields_fit_a_display(a in "\\PC{0,12}", b in "\\PC{0,12}") {
            let line = format!("TEXT:{},{}", a.replace(',', ""), b.replace(',', ""));
            if let Ok(Command::ShowText(values)) = parse(&line) {
                for v in values.iter() {
                    prop_assert!(v.chars().count() <= DIGITS_PER_DISPLAY);
                }
            }
        }
    }
}
