//! One-shot peripheral bring-up for the TFT panel.
//!
//! Turns the numeric pin map from [`crate::pins`] and the frozen
//! [`DisplayPins`] into ESP-IDF drivers and hands them to
//! [`init_panel`].  Called once from `main()` before the loop starts.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SPI2, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::Hertz;
use log::info;

use crate::drivers::display::{ClockFace, init_panel};
use crate::error::{ConfigError, Error, Result};
use crate::pins::{self, DisplayPins};

type PanelPin = PinDriver<'static, AnyOutputPin, Output>;

/// The clock face plus the backlight pin that must stay driven while it runs.
pub struct DisplayHandles<P> {
    pub face: ClockFace<P>,
    _backlight: PanelPin,
}

fn output(gpio: i32) -> Result<PanelPin> {
    // SAFETY: every GPIO number comes from `pins` and is claimed exactly
    // once here; nothing else in the firmware touches these lines.
    PinDriver::output(unsafe { AnyOutputPin::new(gpio) })
        .map_err(|_| Error::Init("GPIO output config failed"))
}

pub fn init_display(
    spi2: SPI2,
    display: &DisplayPins,
) -> Result<DisplayHandles<impl DrawTarget<Color = Rgb565, Error: core::fmt::Debug>>> {
    display.validate().map_err(ConfigError::from)?;

    // SAFETY: see `output()`.
    let (sclk, mosi, cs) = unsafe {
        (
            AnyOutputPin::new(pins::TFT_SCLK_GPIO),
            AnyOutputPin::new(pins::TFT_MOSI_GPIO),
            AnyOutputPin::new(display.cs),
        )
    };

    let bus = SpiDriver::new(spi2, sclk, mosi, Option::<AnyIOPin>::None, &SpiDriverConfig::new())
        .map_err(|_| Error::Init("SPI bus init failed"))?;
    let spi = SpiDeviceDriver::new(
        bus,
        Some(cs),
        &SpiConfig::new().baudrate(Hertz(pins::TFT_SPI_FREQ_HZ)),
    )
    .map_err(|_| Error::Init("SPI device init failed"))?;

    let dc = output(display.dc)?;
    let reset = output(pins::TFT_RST_GPIO)?;
    let mut backlight = output(pins::TFT_BL_GPIO)?;

    let mut face = ClockFace::new(init_panel(spi, dc, reset, &mut FreeRtos)?);
    face.clear()
        .map_err(|_| Error::Init("ILI9341 clear failed"))?;
    backlight
        .set_high()
        .map_err(|_| Error::Init("backlight enable failed"))?;

    info!(
        "hw_init: TFT up (DC=GPIO{}, CS=GPIO{}, {} MHz)",
        display.dc,
        display.cs,
        pins::TFT_SPI_FREQ_HZ / 1_000_000
    );

    Ok(DisplayHandles {
        face,
        _backlight: backlight,
    })
}
