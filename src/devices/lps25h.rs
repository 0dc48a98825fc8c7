use std::thread;
use std::time::Duration;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use tracing::{debug, info};

use super::{Result, SensorError};

const WHO_AM_I: u8 = 0x0f;
const CTRL_REG1: u8 = 0x20;
const STATUS_REG: u8 = 0x27;
const PRESS_OUT_XL: u8 = 0x28;

const CHIP_ID: u8 = 0xbd;
// Register address auto-increment for burst reads.
const AUTO_INCREMENT: u8 = 0x80;
// PD=1, ODR=1 Hz continuous conversion.
const CTRL_REG1_ON: u8 = 0x90;
// STATUS_REG: pressure and temperature data available.
const DATA_READY: u8 = 0x03;

/// ST LPS25H barometric pressure sensor with onboard thermometer.
pub struct Lps25h {
    dev: LinuxI2CDevice,
}

impl Lps25h {
    pub const DEFAULT_ADDR: u16 = 0x5c;

    pub fn open(bus: &str, addr: u16) -> Result<Self> {
        info!("Opening LPS25H at {:#04x} on {}", addr, bus);
        let mut dev = LinuxI2CDevice::new(bus, addr)?;
        let id = dev.smbus_read_byte_data(WHO_AM_I)?;
        if id != CHIP_ID {
            return Err(SensorError::UnexpectedChip {
                name: "LPS25H",
                found: id,
            });
        }
        Ok(Lps25h { dev })
    }

    pub fn power_on(&mut self) -> Result<()> {
        info!("Powering on LPS25H");
        self.dev.smbus_write_byte_data(CTRL_REG1, CTRL_REG1_ON)?;
        Ok(())
    }

    fn wait_data_ready(&mut self) -> Result<()> {
        // One conversion takes up to a second at 1 Hz.
        for _ in 0..25 {
            let status = self.dev.smbus_read_byte_data(STATUS_REG)?;
            if status & DATA_READY == DATA_READY {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(50));
        }
        Err(SensorError::NotResponding("LPS25H"))
    }

    fn read_raw(&mut self) -> Result<(i32, i16)> {
        self.wait_data_ready()?;
        let mut data = [0u8; 5];
        self.dev.write(&[PRESS_OUT_XL | AUTO_INCREMENT])?;
        self.dev.read(&mut data)?;

        // 24-bit two's complement pressure, sign-extended.
        let press_raw =
            (((data[2] as u32) << 24 | (data[1] as u32) << 16 | (data[0] as u32) << 8) as i32) >> 8;
        let temp_raw = i16::from_le_bytes([data[3], data[4]]);
        Ok((press_raw, temp_raw))
    }

    /// Pressure in hPa (millibar).
    pub fn read_pressure(&mut self) -> Result<f64> {
        let (press_raw, _) = self.read_raw()?;
        let pressure = press_raw as f64 / 4096.0;
        debug!("LPS25H pressure: {} hPa", pressure);
        Ok(pressure)
    }

    /// Temperature in °C from the onboard thermometer.
    pub fn read_temperature(&mut self) -> Result<f64> {
        let (_, temp_raw) = self.read_raw()?;
        let temperature = 42.5 + temp_raw as f64 / 480.0;
        debug!("LPS25H temperature: {} °C", temperature);
        Ok(temperature)
    }
}
