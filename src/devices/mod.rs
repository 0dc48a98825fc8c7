mod hts221;
mod lps25h;

pub use hts221::Hts221;
pub use lps25h::Lps25h;

use std::thread;
use std::time::Duration;

use i2cdev::linux::LinuxI2CError;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("I2C bus error: {0}")]
    Bus(#[from] LinuxI2CError),

    #[error("unexpected chip id {found:#04x} for {name}")]
    UnexpectedChip { name: &'static str, found: u8 },

    #[error("{0} not responding")]
    NotResponding(&'static str),
}

pub type Result<T> = std::result::Result<T, SensorError>;

/// The environment sensing capability: four independent numeric reads.
///
/// Implemented by the real hardware board below and by fakes in tests.
pub trait EnvironmentSensor {
    /// Barometric pressure in hPa (millibar).
    fn pressure(&mut self) -> Result<f64>;
    /// Temperature in °C from the pressure sensor's onboard thermometer.
    fn temperature_from_pressure(&mut self) -> Result<f64>;
    /// Relative humidity in %.
    fn humidity(&mut self) -> Result<f64>;
    /// Temperature in °C from the humidity sensor's onboard thermometer.
    fn temperature_from_humidity(&mut self) -> Result<f64>;
}

/// The Sense HAT environment chips on one I2C bus: an LPS25H for pressure
/// and an HTS221 for humidity, each with its own thermometer.
pub struct SenseBoard {
    lps25h: Lps25h,
    hts221: Hts221,
}

impl SenseBoard {
    /// Opens both chips, powers them on and waits for them to settle.
    pub fn open(bus: &str, lps25h_addr: u16, hts221_addr: u16) -> Result<Self> {
        info!("Opening sensor board on {}", bus);
        let mut lps25h = Lps25h::open(bus, lps25h_addr)?;
        let mut hts221 = Hts221::open(bus, hts221_addr)?;

        lps25h.power_on()?;
        hts221.power_on()?;
        // Settling time after power-on before the first conversion is usable.
        thread::sleep(Duration::from_millis(50));

        info!("Sensor board powered on");
        Ok(SenseBoard { lps25h, hts221 })
    }
}

impl EnvironmentSensor for SenseBoard {
    fn pressure(&mut self) -> Result<f64> {
        self.lps25h.read_pressure()
    }

    fn temperature_from_pressure(&mut self) -> Result<f64> {
        self.lps25h.read_temperature()
    }

    fn humidity(&mut self) -> Result<f64> {
        self.hts221.read_humidity()
    }

    fn temperature_from_humidity(&mut self) -> Result<f64> {
        self.hts221.read_temperature()
    }
}
