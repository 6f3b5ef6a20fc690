//! Run workflow: turns a parsed [`Invocation`] into device calls.
//!
//! GET and SET runs query and print the device, optionally dump memory and
//! save a profile, and (SET only) attempt every requested change. Changes are
//! committed and re-read only if every attempt succeeded.

use crate::args::{Intent, Invocation, RunAction};
use crate::render;
use anyhow::anyhow;
use m8mouse_core::error::Result as CoreResult;
use m8mouse_core::{DeviceSession, USB_M8_PID, USB_M8_VID};
use std::io::Write;
use std::ops::{BitOr, BitOrAssign};
use tracing::{debug, info, warn};

/// Process exit status for a completed run.
pub const EXIT_OK: u8 = 0;
/// Process exit status for help, invalid arguments, and fatal device errors.
pub const EXIT_FAILURE: u8 = 1;

/// Aggregated result of independent mutation attempts; any failure sticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationOutcome {
    failed: bool,
}

impl OperationOutcome {
    pub const SUCCESS: Self = Self { failed: false };
    pub const FAILURE: Self = Self { failed: true };

    pub fn is_success(self) -> bool {
        !self.failed
    }
}

impl BitOr for OperationOutcome {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            failed: self.failed | rhs.failed,
        }
    }
}

impl BitOrAssign for OperationOutcome {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// Print a failure line for `what` and map the result to an outcome.
fn report(
    out: &mut impl Write,
    what: &str,
    result: anyhow::Result<()>,
) -> anyhow::Result<OperationOutcome> {
    match result {
        Ok(()) => {
            debug!("{what}: ok");
            Ok(OperationOutcome::SUCCESS)
        }
        Err(e) => {
            warn!("{what} failed: {e}");
            writeln!(out, "Error: failed to {what}: {e}")?;
            Ok(OperationOutcome::FAILURE)
        }
    }
}

/// Convert a parsed 0-based index to a session index.
///
/// Negative values come from user input below 1 and are rejected here.
fn session_index(index: i32) -> anyhow::Result<usize> {
    usize::try_from(index)
        .map_err(|_| anyhow!("index {} is out of range (must be 1 or more)", i64::from(index) + 1))
}

fn optional_index(index: Option<i32>) -> anyhow::Result<Option<usize>> {
    index.map(session_index).transpose()
}

fn set_mode_group<S: DeviceSession>(intent: &Intent, session: &mut S) -> anyhow::Result<()> {
    let dpi = optional_index(intent.dpi_index)?;
    let led = optional_index(intent.led_index)?;
    let speed = optional_index(intent.speed_index)?;
    Ok(session.set_modes(dpi, led, speed)?)
}

/// Run one invocation, writing all user-facing output to `out`.
///
/// `open` is only called for GET and SET runs.
pub fn run<S, F>(invocation: &Invocation, open: F, out: &mut impl Write) -> anyhow::Result<u8>
where
    S: DeviceSession,
    F: FnOnce() -> CoreResult<S>,
{
    match invocation.action {
        RunAction::List => {
            render::known_modes(out)?;
            return Ok(EXIT_OK);
        }
        RunAction::Usage | RunAction::Unknown => {
            if let Some(err) = &invocation.error {
                writeln!(out, "Error: {err}")?;
            }
            render::usage(out)?;
            return Ok(EXIT_FAILURE);
        }
        RunAction::Get | RunAction::Set => {}
    }

    let mut session = match open() {
        Ok(session) => session,
        Err(e) => {
            warn!("device open failed: {e}");
            writeln!(
                out,
                "Error initialising device. May not be connected or no user permission"
            )?;
            writeln!(
                out,
                "      - check that device {USB_M8_VID:04x}:{USB_M8_PID:04x} is connected to usb (lsusb)"
            )?;
            writeln!(
                out,
                "      - run with sudo or add uaccess to udev rules (see README.md)"
            )?;
            return Ok(EXIT_FAILURE);
        }
    };

    let status = drive(invocation.action, &invocation.intent, &mut session, out);
    session.close();
    status
}

fn drive<S: DeviceSession>(
    action: RunAction,
    intent: &Intent,
    session: &mut S,
    out: &mut impl Write,
) -> anyhow::Result<u8> {
    writeln!(out, "Getting device modes")?;
    if let Err(e) = session.query() {
        writeln!(out, "Error: failed to read device state: {e}")?;
        return Ok(EXIT_FAILURE);
    }
    render::device_state(out, session)?;

    if intent.dump_requested {
        writeln!(out, "\nDevice memory dump:")?;
        out.write_all(session.dump_memory().as_bytes())?;
    }

    if let Some(path) = &intent.save_path {
        writeln!(out, "Saving profile to {}", path.display())?;
        match session.save_profile(path) {
            Ok(()) => writeln!(out, "Profile saved successfully")?,
            Err(e) => writeln!(out, "Error: Failed to save profile: {e}")?,
        }
    }

    if action != RunAction::Set {
        return Ok(EXIT_OK);
    }

    let outcome = apply_changes(intent, session, out)?;
    if !outcome.is_success() {
        writeln!(out, "Device not updated: one or more settings failed")?;
        return Ok(EXIT_OK);
    }

    writeln!(out, "Updating device modes")?;
    if let Err(e) = session.commit() {
        writeln!(out, "Error: failed to update device: {e}")?;
        return Ok(EXIT_OK);
    }

    writeln!(out, "Refreshing device modes")?;
    if let Err(e) = session.query() {
        writeln!(out, "Error: failed to read device state: {e}")?;
        return Ok(EXIT_FAILURE);
    }
    render::device_state(out, session)?;
    info!("device settings updated");
    Ok(EXIT_OK)
}

/// Attempt every requested change; a failure never stops the next attempt.
fn apply_changes<S: DeviceSession>(
    intent: &Intent,
    session: &mut S,
    out: &mut impl Write,
) -> anyhow::Result<OperationOutcome> {
    let mut outcome = OperationOutcome::SUCCESS;

    if let Some(path) = &intent.load_path {
        writeln!(out, "Loading profile from {}", path.display())?;
        match session.load_profile(path) {
            Ok(()) => writeln!(out, "Profile loaded, applying to device...")?,
            Err(e) => {
                writeln!(out, "Error: Failed to load profile: {e}")?;
                outcome |= OperationOutcome::FAILURE;
            }
        }
    }

    if intent.dpi_index.is_some() || intent.led_index.is_some() || intent.speed_index.is_some() {
        let result = set_mode_group(intent, session);
        outcome |= report(out, "set DPI/LED/speed modes", result)?;
    }

    if let (Some(level), Some(value)) = (intent.dpires_level, intent.dpires_value) {
        let result = session_index(level).and_then(|level| {
            let value = session_index(value)?;
            Ok(session.set_dpires(level, value)?)
        });
        outcome |= report(out, "set DPI resolution", result)?;
    }

    if let Some(index) = intent.poll_index {
        let result = session_index(index).and_then(|i| Ok(session.set_poll_rate(i)?));
        outcome |= report(out, "set poll rate", result)?;
    }

    if let Some(index) = intent.brightness_index {
        let result = session_index(index).and_then(|i| Ok(session.set_brightness(i)?));
        outcome |= report(out, "set brightness", result)?;
    }

    if let Some(raw) = intent.raw {
        writeln!(
            out,
            "Setting raw memory: address 0x{:02x} = 0x{:02x}",
            raw.address, raw.value
        )?;
        let result = session.set_raw(raw.address, raw.value).map_err(Into::into);
        outcome |= report(out, "set raw memory", result)?;
    }

    Ok(outcome)
}
