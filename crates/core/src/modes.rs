//! Mode catalogs and the register map.
//!
//! Each configurable setting is a [`ModeCategory`] whose selectable values
//! are a fixed, ordered list of [`Mode`] entries. A mode pairs the label shown
//! to the user with the raw byte stored in the device register.

/// Register addresses of the configuration block.
pub mod registers {
    /// USB polling rate (report interval in ms).
    pub const POLL_RATE: u8 = 0x10;
    /// Active DPI level (0-based).
    pub const DPI_ACTIVE: u8 = 0x20;
    /// First entry of the per-level DPI resolution table.
    pub const DPI_RES_BASE: u8 = 0x21;
    /// LED effect.
    pub const LED_MODE: u8 = 0x30;
    /// LED animation speed.
    pub const LED_SPEED: u8 = 0x31;
    /// LED brightness.
    pub const LED_BRIGHTNESS: u8 = 0x32;
}

/// Number of DPI levels the mouse cycles through.
pub const DPI_RES_COUNT: usize = 6;

/// One labeled, selectable configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub label: &'static str,
    pub value: u8,
}

const fn mode(label: &'static str, value: u8) -> Mode {
    Mode { label, value }
}

const DPI_MODES: &[Mode] = &[
    mode("DPI 1", 0x00),
    mode("DPI 2", 0x01),
    mode("DPI 3", 0x02),
    mode("DPI 4", 0x03),
    mode("DPI 5", 0x04),
    mode("DPI 6", 0x05),
];

const DPI_RESOLUTIONS: &[Mode] = &[
    mode("500", 0x00),
    mode("750", 0x01),
    mode("1000", 0x02),
    mode("1200", 0x03),
    mode("1600", 0x04),
    mode("2000", 0x05),
    mode("2400", 0x06),
    mode("3200", 0x07),
    mode("4000", 0x08),
    mode("4800", 0x09),
    mode("6400", 0x0A),
    mode("7200", 0x0B),
    mode("8000", 0x0C),
    mode("10000", 0x0D),
    mode("12000", 0x0E),
];

const LED_MODES: &[Mode] = &[
    mode("Off", 0x00),
    mode("Static", 0x01),
    mode("Breathing", 0x02),
    mode("Spectrum", 0x03),
    mode("Wave", 0x04),
    mode("Reactive", 0x05),
    mode("Ripple", 0x06),
    mode("Marquee", 0x07),
];

const LED_SPEEDS: &[Mode] = &[
    mode("Slowest", 0x01),
    mode("Slow", 0x02),
    mode("Medium", 0x03),
    mode("Fast", 0x04),
    mode("Fastest", 0x05),
];

// Raw value is the report interval in milliseconds.
const POLL_RATES: &[Mode] = &[
    mode("1000Hz", 0x01),
    mode("500Hz", 0x02),
    mode("250Hz", 0x04),
    mode("125Hz", 0x08),
];

const BRIGHTNESS_LEVELS: &[Mode] = &[mode("Full", 0x02), mode("Half", 0x01)];

/// Configurable setting groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeCategory {
    Dpi,
    DpiResolution,
    Led,
    Speed,
    PollRate,
    Brightness,
}

impl ModeCategory {
    /// All categories, in display order.
    pub const ALL: [ModeCategory; 6] = [
        ModeCategory::Dpi,
        ModeCategory::DpiResolution,
        ModeCategory::Led,
        ModeCategory::Speed,
        ModeCategory::PollRate,
        ModeCategory::Brightness,
    ];

    /// Short identifier used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dpi => "dpi",
            Self::DpiResolution => "dpi_resolution",
            Self::Led => "led_mode",
            Self::Speed => "led_speed",
            Self::PollRate => "poll_rate",
            Self::Brightness => "brightness",
        }
    }

    /// The full catalog for this category.
    pub fn modes(&self) -> &'static [Mode] {
        match self {
            Self::Dpi => DPI_MODES,
            Self::DpiResolution => DPI_RESOLUTIONS,
            Self::Led => LED_MODES,
            Self::Speed => LED_SPEEDS,
            Self::PollRate => POLL_RATES,
            Self::Brightness => BRIGHTNESS_LEVELS,
        }
    }

    /// Register holding the active selection.
    ///
    /// `DpiResolution` has no single register; see [`dpi_res_register`].
    pub fn register(&self) -> Option<u8> {
        match self {
            Self::Dpi => Some(registers::DPI_ACTIVE),
            Self::DpiResolution => None,
            Self::Led => Some(registers::LED_MODE),
            Self::Speed => Some(registers::LED_SPEED),
            Self::PollRate => Some(registers::POLL_RATE),
            Self::Brightness => Some(registers::LED_BRIGHTNESS),
        }
    }

    /// Catalog entry at a 0-based index.
    pub fn mode_at(&self, index: usize) -> Option<&'static Mode> {
        self.modes().get(index)
    }

    /// Catalog entry whose raw value is `raw`.
    pub fn find_by_value(&self, raw: u8) -> Option<&'static Mode> {
        self.modes().iter().find(|m| m.value == raw)
    }
}

/// Register holding the resolution of DPI level `level` (0-based).
pub fn dpi_res_register(level: usize) -> Option<u8> {
    if level < DPI_RES_COUNT {
        Some(registers::DPI_RES_BASE + level as u8)
    } else {
        None
    }
}
