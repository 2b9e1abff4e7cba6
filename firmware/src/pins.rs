//! GPIO / peripheral pin assignments for the TftClock board.
//!
//! Single source of truth — the display initialiser references this module
//! rather than hard-coding pin numbers.  Change a pin here and it propagates
//! everywhere.

use core::fmt;

// ---------------------------------------------------------------------------
// ILI9341 TFT (SPI)
// ---------------------------------------------------------------------------

/// Data/command select: LOW = command byte, HIGH = parameter/pixel data.
pub const TFT_DC_GPIO: i32 = 4;
/// SPI chip select (active LOW), driven by the SPI device driver.
pub const TFT_CS_GPIO: i32 = 5;
/// Panel hardware reset (active LOW).
pub const TFT_RST_GPIO: i32 = 6;
/// Backlight enable (active HIGH).
pub const TFT_BL_GPIO: i32 = 7;

/// FSPI clock.
pub const TFT_SCLK_GPIO: i32 = 12;
/// FSPI MOSI.  The panel is write-only, MISO is left unconnected.
pub const TFT_MOSI_GPIO: i32 = 11;

/// SPI clock for the panel.  The ILI9341 datasheet allows 10 MHz for writes
/// but every module we have tested runs reliably at 40 MHz.
pub const TFT_SPI_FREQ_HZ: u32 = 40_000_000;

// ---------------------------------------------------------------------------
// Target limits
// ---------------------------------------------------------------------------

/// Highest GPIO index on the ESP32-S3 (GPIO0 – GPIO48).
pub const MAX_GPIO: i32 = 48;

/// `true` if `pin` names a GPIO that exists on the target.
pub const fn is_valid_gpio(pin: i32) -> bool {
    pin >= 0 && pin <= MAX_GPIO
}

// ---------------------------------------------------------------------------
// Display pin pair
// ---------------------------------------------------------------------------

/// The two control lines the display initialiser needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPins {
    /// Data/command select line.
    pub dc: i32,
    /// Chip select line.
    pub cs: i32,
}

/// Reasons a [`DisplayPins`] pair is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    /// Pin index outside `0..=MAX_GPIO`.
    OutOfRange(i32),
    /// DC and CS share a GPIO.
    Conflict(i32),
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(pin) => write!(f, "GPIO{} out of range (0-{})", pin, MAX_GPIO),
            Self::Conflict(pin) => write!(f, "GPIO{} assigned to both DC and CS", pin),
        }
    }
}

impl DisplayPins {
    /// Pins as wired on the board.
    pub const BOARD: Self = Self {
        dc: TFT_DC_GPIO,
        cs: TFT_CS_GPIO,
    };

    pub fn validate(&self) -> Result<(), PinError> {
        for pin in [self.dc, self.cs] {
            if !is_valid_gpio(pin) {
                return Err(PinError::OutOfRange(pin));
            }
        }
        if self.dc == self.cs {
            return Err(PinError::Conflict(self.dc));
        }
        Ok(())
    }
}

impl Default for DisplayPins {
    fn default() -> Self {
        Self::BOARD
    }
}

// Catch a bad edit at compile time rather than on the bench.
const _: () = assert!(is_valid_gpio(TFT_DC_GPIO) && is_valid_gpio(TFT_CS_GPIO));
const _: () = assert!(TFT_DC_GPIO != TFT_CS_GPIO);
