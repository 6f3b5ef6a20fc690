//! Command-line parsing and run-action classification.
//!
//! The flag vocabulary is single-dash and order sensitive: `-h` and `-l`
//! end the scan wherever they appear, value flags swallow the next argument
//! whatever it looks like, and a malformed pair or unknown flag discards
//! everything parsed so far.

use std::path::PathBuf;
use thiserror::Error;

/// What the invocation asks the tool to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    /// Print the catalog of known modes.
    List,
    /// Print the current device state.
    Get,
    /// Change one or more settings.
    Set,
    /// Print help.
    Usage,
    /// Invalid invocation; print help and fail.
    Unknown,
}

/// Diagnostic verbosity selected by `-g`, `-g1`, `-g2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugLevel {
    #[default]
    Fatal,
    Warn,
    Info,
    Trace,
}

/// A direct register write requested with `-raw ADDR:VALUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawWrite {
    pub address: u8,
    pub value: u8,
}

/// The parsed user request.
///
/// Index fields are 0-based (the command line is 1-based). `None` means the
/// field was not requested; a negative value means the user supplied a
/// number below 1 and is rejected when the change is attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    pub dpi_index: Option<i32>,
    pub dpires_level: Option<i32>,
    pub dpires_value: Option<i32>,
    pub led_index: Option<i32>,
    pub speed_index: Option<i32>,
    pub poll_index: Option<i32>,
    pub brightness_index: Option<i32>,
    pub raw: Option<RawWrite>,
    pub save_path: Option<PathBuf>,
    pub load_path: Option<PathBuf>,
    pub dump_requested: bool,
    pub debug_level: DebugLevel,
}

impl Intent {
    /// Whether any field that changes the device was requested.
    pub fn has_changes(&self) -> bool {
        self.dpi_index.is_some()
            || self.led_index.is_some()
            || self.speed_index.is_some()
            || self.poll_index.is_some()
            || self.dpires_level.is_some()
            || self.brightness_index.is_some()
            || self.raw.is_some()
            || self.load_path.is_some()
    }
}

/// Why an invocation was classified [`RunAction::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("unrecognized option '{0}'")]
    UnknownFlag(String),

    #[error("-dpires requires L:R format (e.g. -dpires 1:8), got '{0}'")]
    MalformedDpiRes(String),

    #[error("-raw requires valid hex ADDR:VALUE (e.g. -raw 30:05), got '{0}'")]
    MalformedRaw(String),

    #[error("{0} requires a filename argument")]
    MissingFilename(&'static str),

    #[error("no setting was requested")]
    NothingToSet,
}

/// Result of parsing one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub action: RunAction,
    pub intent: Intent,
    /// Set when `action` is [`RunAction::Unknown`].
    pub error: Option<ArgError>,
}

impl Invocation {
    fn terminal(action: RunAction, intent: Intent) -> Self {
        Self {
            action,
            intent,
            error: None,
        }
    }

    fn unknown(error: ArgError) -> Self {
        Self {
            action: RunAction::Unknown,
            intent: Intent::default(),
            error: Some(error),
        }
    }
}

/// Lenient integer parse: optional leading whitespace and sign, then the
/// longest run of digits. Anything unparsable reads as 0.
fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            (acc * 10 + i64::from(d - b'0')).min(i64::from(i32::MAX) + 1)
        });
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Convert a 1-based user value to a 0-based index; 0 (or garbage) means
/// "not requested".
fn to_index(value: i32) -> Option<i32> {
    match value.saturating_sub(1) {
        -1 => None,
        index => Some(index),
    }
}

fn parse_dpires(argument: &str) -> Result<(Option<i32>, Option<i32>), ArgError> {
    let malformed = || ArgError::MalformedDpiRes(argument.to_string());
    let (level, value) = argument.split_once(':').ok_or_else(malformed)?;
    let level: i32 = level.trim().parse().map_err(|_| malformed())?;
    let value: i32 = value.trim().parse().map_err(|_| malformed())?;
    Ok((to_index(level), to_index(value)))
}

fn parse_hex_byte(s: &str) -> Option<u8> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

fn parse_raw(argument: &str) -> Result<RawWrite, ArgError> {
    let malformed = || ArgError::MalformedRaw(argument.to_string());
    let (address, value) = argument.split_once(':').ok_or_else(malformed)?;
    Ok(RawWrite {
        address: parse_hex_byte(address).ok_or_else(malformed)?,
        value: parse_hex_byte(value).ok_or_else(malformed)?,
    })
}

/// Parse the argument list (program name excluded) and classify it.
pub fn parse_args<I, S>(args: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let mut intent = Intent::default();
    let mut action = RunAction::Get;
    let mut cursor = 0;

    while cursor < args.len() {
        let option = args[cursor].as_str();
        let next = args.get(cursor + 1).map(String::as_str);
        // Value flags consume the following slot even when it is missing.
        let argument = next.unwrap_or("");
        let mut consumed = 1;

        match option {
            "-h" => return Invocation::terminal(RunAction::Usage, intent),
            "-l" => return Invocation::terminal(RunAction::List, intent),
            "-g" => intent.debug_level = DebugLevel::Warn,
            "-g1" => intent.debug_level = DebugLevel::Info,
            "-g2" => intent.debug_level = DebugLevel::Trace,
            "-dump" => intent.dump_requested = true,
            "-dpi" | "-led" | "-speed" | "-poll" | "-bright" => {
                if !argument.is_empty() {
                    let index = to_index(parse_leading_int(argument));
                    match option {
                        "-dpi" => intent.dpi_index = index,
                        "-led" => intent.led_index = index,
                        "-speed" => intent.speed_index = index,
                        "-poll" => intent.poll_index = index,
                        _ => intent.brightness_index = index,
                    }
                }
                action = RunAction::Set;
                consumed = 2;
            }
            "-dpires" => {
                if !argument.is_empty() {
                    match parse_dpires(argument) {
                        Ok((level, value)) => {
                            intent.dpires_level = level;
                            intent.dpires_value = value;
                        }
                        Err(e) => return Invocation::unknown(e),
                    }
                }
                action = RunAction::Set;
                consumed = 2;
            }
            "-raw" => {
                if !argument.is_empty() {
                    match parse_raw(argument) {
                        Ok(raw) => intent.raw = Some(raw),
                        Err(e) => return Invocation::unknown(e),
                    }
                }
                action = RunAction::Set;
                consumed = 2;
            }
            "-save" => match next {
                Some(path) if !path.is_empty() => {
                    intent.save_path = Some(PathBuf::from(path));
                    consumed = 2;
                }
                _ => return Invocation::unknown(ArgError::MissingFilename("-save")),
            },
            "-load" => match next {
                Some(path) if !path.is_empty() => {
                    intent.load_path = Some(PathBuf::from(path));
                    action = RunAction::Set;
                    consumed = 2;
                }
                _ => return Invocation::unknown(ArgError::MissingFilename("-load")),
            },
            other => return Invocation::unknown(ArgError::UnknownFlag(other.to_string())),
        }

        cursor += consumed;
    }

    if action == RunAction::Set && !intent.has_changes() {
        return Invocation::unknown(ArgError::NothingToSet);
    }

    Invocation {
        action,
        intent,
        error: None,
    }
}
