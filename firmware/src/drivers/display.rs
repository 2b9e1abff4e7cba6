//! ILI9341 TFT (320×240 landscape, RGB565).
//!
//! Panel bring-up goes through `mipidsi` on top of `display-interface-spi`.
//! The chip-select line is owned by the [`SpiDevice`], so the interface only
//! toggles DC.
//!
//! The clock face is drawn with `embedded-graphics` rectangles as
//! seven-segment digits onto any `DrawTarget<Color = Rgb565>`; no font
//! tables are needed.

use display_interface_spi::SPIInterface;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::info;
use mipidsi::Builder;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::options::{ColorOrder, Orientation, Rotation};

use crate::app::ports::{DisplayPort, DisplayStatus};
use crate::clock::LocalTime;
use crate::error::{Error, Result};

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;

// ── Colours (RGB565) ──────────────────────────────────────────

pub const BLACK: Rgb565 = Rgb565::BLACK;
pub const AMBER: Rgb565 = Rgb565::new(31, 41, 0);
pub const RED: Rgb565 = Rgb565::RED;
pub const BLUE: Rgb565 = Rgb565::BLUE;
/// Unlit segment ghost.
pub const DIM: Rgb565 = Rgb565::new(3, 6, 3);

// ── Panel bring-up ────────────────────────────────────────────

/// Hard-reset the panel through `rst` and run the ILI9341 init sequence:
/// landscape, BGR panel order, 16 bpp, display on.
pub fn init_panel<SPI, DC, RST>(
    spi: SPI,
    dc: DC,
    rst: RST,
    delay: &mut impl DelayNs,
) -> Result<impl DrawTarget<Color = Rgb565, Error: core::fmt::Debug>>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
{
    let panel = Builder::new(ILI9341Rgb565, SPIInterface::new(spi, dc))
        .reset_pin(rst)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .color_order(ColorOrder::Bgr)
        .init(delay)
        .map_err(|_| Error::Init("ILI9341 init sequence failed"))?;
    info!("ILI9341: initialised {}x{}", WIDTH, HEIGHT);
    Ok(panel)
}

// ── Clock face ────────────────────────────────────────────────

// Digit cell geometry.
const DIGIT_W: u32 = 36;
const DIGIT_H: u32 = 72;
const SEG_T: u32 = 6;
const DIGIT_GAP: u32 = 8;
const COLON_W: u32 = 16;
const FACE_W: u32 = 6 * DIGIT_W + 5 * DIGIT_GAP + 2 * COLON_W - 2 * DIGIT_GAP;
const FACE_X: u32 = (WIDTH - FACE_W) / 2;
const FACE_Y: u32 = (HEIGHT - DIGIT_H) / 2;

const STATUS_BAR_H: u32 = 8;

/// Segment rectangles (x, y, w, h) relative to the digit cell, in a..g order.
const SEGMENT_RECTS: [(u32, u32, u32, u32); 7] = [
    (SEG_T, 0, DIGIT_W - 2 * SEG_T, SEG_T),                       // a
    (DIGIT_W - SEG_T, SEG_T, SEG_T, DIGIT_H / 2 - SEG_T),         // b
    (DIGIT_W - SEG_T, DIGIT_H / 2, SEG_T, DIGIT_H / 2 - SEG_T),   // c
    (SEG_T, DIGIT_H - SEG_T, DIGIT_W - 2 * SEG_T, SEG_T),         // d
    (0, DIGIT_H / 2, SEG_T, DIGIT_H / 2 - SEG_T),                 // e
    (0, SEG_T, SEG_T, DIGIT_H / 2 - SEG_T),                       // f
    (SEG_T, DIGIT_H / 2 - SEG_T / 2, DIGIT_W - 2 * SEG_T, SEG_T), // g
];

/// Lit-segment bitmask per digit, bit 0 = a … bit 6 = g.
const SEGMENTS: [u8; 10] = [
    0b011_1111, // 0
    0b000_0110, // 1
    0b101_1011, // 2
    0b100_1111, // 3
    0b110_0110, // 4
    0b110_1101, // 5
    0b111_1101, // 6
    0b000_0111, // 7
    0b111_1111, // 8
    0b110_1111, // 9
];

/// Seven-segment HH:MM:SS face plus a status bar along the bottom edge.
pub struct ClockFace<D> {
    target: D,
}

impl<D> ClockFace<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn clear(&mut self) -> core::result::Result<(), D::Error> {
        self.target.clear(BLACK)
    }

    fn fill(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        colour: Rgb565,
    ) -> core::result::Result<(), D::Error> {
        Rectangle::new(Point::new(x as i32, y as i32), Size::new(w, h))
            .into_styled(PrimitiveStyle::with_fill(colour))
            .draw(&mut self.target)
    }

    fn draw_digit(&mut self, x: u32, y: u32, digit: u8) -> core::result::Result<(), D::Error> {
        let lit = SEGMENTS[usize::from(digit % 10)];
        for (i, (sx, sy, w, h)) in SEGMENT_RECTS.into_iter().enumerate() {
            let colour = if lit & (1 << i) != 0 { AMBER } else { DIM };
            self.fill(x + sx, y + sy, w, h, colour)?;
        }
        Ok(())
    }

    fn draw_colon(&mut self, x: u32, y: u32) -> core::result::Result<(), D::Error> {
        let dot = SEG_T;
        self.fill(x, y + DIGIT_H / 3 - dot / 2, dot, dot, AMBER)?;
        self.fill(x, y + 2 * DIGIT_H / 3 - dot / 2, dot, dot, AMBER)
    }
}

impl<D> DisplayPort for ClockFace<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: core::fmt::Debug,
{
    type Error = D::Error;

    fn show_time(&mut self, time: &LocalTime) -> core::result::Result<(), D::Error> {
        let digits = [
            time.hour / 10,
            time.hour % 10,
            time.minute / 10,
            time.minute % 10,
            time.second / 10,
            time.second % 10,
        ];
        let mut x = FACE_X;
        for (i, d) in digits.iter().enumerate() {
            self.draw_digit(x, FACE_Y, *d)?;
            x += DIGIT_W;
            if i == 1 || i == 3 {
                self.draw_colon(x + (COLON_W - SEG_T) / 2, FACE_Y)?;
                x += COLON_W;
            } else {
                x += DIGIT_GAP;
            }
        }
        Ok(())
    }

    fn show_status(&mut self, status: DisplayStatus) -> core::result::Result<(), D::Error> {
        let colour = match status {
            DisplayStatus::Ok => BLACK,
            DisplayStatus::Syncing => BLUE,
            DisplayStatus::NoNetwork => RED,
        };
        self.fill(0, HEIGHT - STATUS_BAR_H, WIDTH, STATUS_BAR_H, colour)
    }
}
