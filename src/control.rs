//! Controller boundary: operator text → command records
//!
//! Numeric arguments are validated here. A line that fails to parse is
//! reported to the operator and never turns into a command.

use crate::command::Command;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    UnknownCommand(String),
    /// Missing or unparsable numeric argument
    InvalidValue { command: String, input: String },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::UnknownCommand(word) => write!(f, "Unknown command: {}", word),
            ControlError::InvalidValue { command, input } if input.is_empty() => {
                write!(f, "Error: {} needs a numeric value", command)
            }
            ControlError::InvalidValue { command, input } => {
                write!(f, "Error: invalid {} value {:?}", command, input)
            }
        }
    }
}

impl std::error::Error for ControlError {}

/// Words the controller understands, for the help menu
pub const COMMAND_WORDS: [&str; 5] = ["start", "stop", "freq <hz>", "amp <0..1>", "quit"];

fn parse_value(command: &str, rest: &str) -> Result<f64, ControlError> {
    rest.trim().parse::<f64>().map_err(|_| ControlError::InvalidValue {
        command: command.to_string(),
        input: rest.trim().to_string(),
    })
}

/// Parse one input line
///
/// Blank lines give `Ok(None)`. Range checks are left to the generator,
/// which clamps.
pub fn parse_line(line: &str) -> Result<Option<Command>, ControlError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (line, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "start" => Command::start(),
        "stop" => Command::stop(),
        "quit" => Command::quit(),
        "freq" => Command::set_frequency(parse_value("frequency", rest)?),
        "amp" => Command::set_amplitude(parse_value("amplitude", rest)?),
        _ => return Err(ControlError::UnknownCommand(word.to_string())),
    };

    Ok(Some(cmd))
}

/// Confirmation line printed after a command was sent
pub fn describe(cmd: &Command) -> String {
    use crate::command::CommandKind;

    match cmd.kind {
        CommandKind::Start => "START sent".to_string(),
        CommandKind::Stop => "STOP sent".to_string(),
        CommandKind::Quit => "QUIT sent".to_string(),
        CommandKind::SetFrequency => format!("FREQ={} Hz sent", cmd.value),
        CommandKind::SetAmplitude => format!("AMP={} sent", cmd.value),
        CommandKind::None => "nothing sent".to_string(),
    }
}
