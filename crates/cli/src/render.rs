//! Text rendering of device state, mode catalogs, and help.

use m8mouse_core::modes::{Mode, ModeCategory, DPI_RES_COUNT};
use m8mouse_core::DeviceSession;
use std::io::{self, Write};

/// Column at which catalog lines wrap.
const WRAP_WIDTH: usize = 64;

const USAGE: &str = "\
Usage:
    m8mouse
    m8mouse -l
    m8mouse [-dpi D | -led L | -speed S | -poll P | -dpires L:R | -bright B]
    m8mouse -save <file>    # save current config to file
    m8mouse -load <file>    # load config from file and apply

    Options:
       -l        list known modes and values
       -dpi      set DPI to this index (from known modes)
       -dpires   set DPI resolution for level L to resolution R (e.g. -dpires 1:8)
       -led      set LED mode to this index (from known modes)
       -speed    set LED speed to this index (from known modes)
       -bright   set LED brightness (1=Full, 2=Half)
       -poll     set polling rate (1=1000Hz, 2=500Hz, 3=250Hz, 4=125Hz)
       -save     save current device config to a profile file
       -load     load a profile file and apply to device
       -raw      set raw memory byte at ADDR:VALUE (hex, e.g. -raw 30:05)
       -dump     dump device memory (for debugging)
       -g        print debug messages (-g1 more, -g2 trace to m8debug-*.log)
       -h        help message (this one)

";

pub fn usage(out: &mut impl Write) -> io::Result<()> {
    out.write_all(USAGE.as_bytes())
}

fn active_line(
    out: &mut impl Write,
    label: &str,
    mode: Option<&Mode>,
    missing: &str,
) -> io::Result<()> {
    match mode {
        Some(mode) => writeln!(out, "  {label:<15}: {}", mode.label),
        None => writeln!(out, "  {missing}"),
    }
}

/// Print the active selection of every category.
pub fn device_state<S: DeviceSession>(out: &mut impl Write, session: &S) -> io::Result<()> {
    active_line(
        out,
        "DPI Mode",
        session.active_mode(ModeCategory::Dpi),
        "DPI Mode is unknown",
    )?;

    write!(out, "  {:<15}: ", "DPI Resolution")?;
    for level in 0..DPI_RES_COUNT {
        match session.dpi_resolution(level) {
            Some(mode) => write!(out, "DPI {} [{}]", level + 1, mode.label)?,
            None => write!(out, "  N/A")?,
        }
        if level < DPI_RES_COUNT - 1 {
            write!(out, ", ")?;
        }
        // Second half of the table goes on a continuation line.
        if level == DPI_RES_COUNT / 2 - 1 {
            write!(out, "\n{:19}", "")?;
        }
    }
    writeln!(out)?;

    active_line(
        out,
        "LED Mode",
        session.active_mode(ModeCategory::Led),
        "LED Mode is unknown",
    )?;
    active_line(
        out,
        "LED Speed",
        session.active_mode(ModeCategory::Speed),
        "LED Speed is unknown",
    )?;
    active_line(
        out,
        "Poll Rate",
        session.active_mode(ModeCategory::PollRate),
        "Poll Rate: unknown (may not be supported)",
    )?;
    active_line(
        out,
        "LED Brightness",
        session.active_mode(ModeCategory::Brightness),
        "LED Brightness: unknown",
    )
}

/// Format one catalog as `  <label> [a, b, c]`, wrapping at [`WRAP_WIDTH`].
fn catalog_line(label: &str, modes: &[Mode]) -> String {
    let mut line = format!("  {label:<16} [");
    let mut wrapped = 0;
    for mode in modes {
        if line.len() / WRAP_WIDTH > wrapped {
            line.push('\n');
            line.push_str(&" ".repeat(20));
            wrapped += 1;
        }
        line.push_str(mode.label);
        line.push_str(", ");
    }
    if line.ends_with(", ") {
        line.truncate(line.len() - 2);
    }
    line.push_str("]\n");
    line
}

/// Print every category's catalog.
pub fn known_modes(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Known modes")?;
    let sections = [
        ("DPI modes", ModeCategory::Dpi),
        ("DPI resolution", ModeCategory::DpiResolution),
        ("LED modes", ModeCategory::Led),
        ("LED speeds", ModeCategory::Speed),
        ("Poll rates", ModeCategory::PollRate),
        ("Brightness", ModeCategory::Brightness),
    ];
    for (label, category) in sections {
        out.write_all(catalog_line(label, category.modes()).as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use m8mouse_core::error::Result;
    use std::path::Path;

    /// Session with fixed selections and nothing else.
    struct Fixed {
        active: Option<usize>,
    }

    impl DeviceSession for Fixed {
        fn query(&mut self) -> Result<()> {
            Ok(())
        }
        fn active_mode(&self, category: ModeCategory) -> Option<&'static Mode> {
            category.mode_at(self.active?)
        }
        fn dpi_resolution(&self, level: usize) -> Option<&'static Mode> {
            self.active?;
            ModeCategory::DpiResolution.mode_at(level)
        }
        fn set_modes(&mut self, _: Option<usize>, _: Option<usize>, _: Option<usize>) -> Result<()> {
            Ok(())
        }
        fn set_dpires(&mut self, _: usize, _: usize) -> Result<()> {
            Ok(())
        }
        fn set_poll_rate(&mut self, _: usize) -> Result<()> {
            Ok(())
        }
        fn set_brightness(&mut self, _: usize) -> Result<()> {
            Ok(())
        }
        fn set_raw(&mut self, _: u8, _: u8) -> Result<()> {
            Ok(())
        }
        fn commit(&mut self) -> Result<()> {
            Ok(())
        }
        fn dump_memory(&self) -> String {
            String::new()
        }
        fn save_profile(&self, _: &Path) -> Result<()> {
            Ok(())
        }
        fn load_profile(&mut self, _: &Path) -> Result<()> {
            Ok(())
        }
        fn close(self) {}
    }

    fn render_state(session: &Fixed) -> String {
        let mut out = Vec::new();
        device_state(&mut out, session).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn state_shows_active_labels() {
        let text = render_state(&Fixed { active: Some(1) });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  DPI Mode       : DPI 2");
        assert_eq!(
            lines[1],
            "  DPI Resolution : DPI 1 [500], DPI 2 [750], DPI 3 [1000], "
        );
        assert_eq!(
            lines[2],
            "                   DPI 4 [1200], DPI 5 [1600], DPI 6 [2000]"
        );
        assert_eq!(lines[3], "  LED Mode       : Static");
        assert_eq!(lines[4], "  LED Speed      : Slow");
        assert_eq!(lines[5], "  Poll Rate      : 500Hz");
        assert_eq!(lines[6], "  LED Brightness : Half");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn state_shows_placeholders_when_unknown() {
        let text = render_state(&Fixed { active: None });
        assert!(text.contains("  DPI Mode is unknown\n"));
        assert!(text.contains("  N/A,   N/A,   N/A, \n"));
        assert!(text.contains("  LED Speed is unknown\n"));
        assert!(text.contains("  Poll Rate: unknown (may not be supported)\n"));
        assert!(text.contains("  LED Brightness: unknown\n"));
    }

    #[test]
    fn catalog_line_short_list() {
        assert_eq!(
            catalog_line("Brightness", ModeCategory::Brightness.modes()),
            "  Brightness       [Full, Half]\n"
        );
    }

    #[test]
    fn catalog_line_wraps_long_list() {
        let line = catalog_line("DPI resolution", ModeCategory::DpiResolution.modes());
        let rows: Vec<&str> = line.lines().collect();
        assert!(rows.len() > 1);
        assert!(rows[1].starts_with(&" ".repeat(20)));
        assert!(line.ends_with("12000]\n"));
        for mode in ModeCategory::DpiResolution.modes() {
            assert!(line.contains(mode.label));
        }
    }

    #[test]
    fn catalog_line_empty_list() {
        assert_eq!(catalog_line("Nothing", &[]), "  Nothing          []\n");
    }

    #[test]
    fn known_modes_lists_every_category() {
        let mut out = Vec::new();
        known_modes(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Known modes\n"));
        assert!(text.contains("  Poll rates       [1000Hz, 500Hz, 250Hz, 125Hz]\n"));
        assert!(text.contains("  LED modes        [Off, Static, Breathing"));
    }

    #[test]
    fn usage_mentions_every_flag() {
        let mut out = Vec::new();
        usage(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        for flag in [
            "-l", "-dpi", "-dpires", "-led", "-speed", "-bright", "-poll", "-save", "-load",
            "-raw", "-dump", "-g", "-h",
        ] {
            assert!(text.contains(flag), "{flag}");
        }
    }
}
