use std::thread;
use std::time::Duration;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use tracing::{debug, info};

use super::{Result, SensorError};

const WHO_AM_I: u8 = 0x0f;
const CTRL_REG1: u8 = 0x20;
const STATUS_REG: u8 = 0x27;
const HUMIDITY_OUT_L: u8 = 0x28;
const CALIB_START: u8 = 0x30;

const CHIP_ID: u8 = 0xbc;
// Register address auto-increment for burst reads.
const AUTO_INCREMENT: u8 = 0x80;
// PD=1, ODR=1 Hz continuous conversion.
const CTRL_REG1_ON: u8 = 0x81;
// STATUS_REG: humidity and temperature data available.
const DATA_READY: u8 = 0x03;

/// Factory calibration points, interpolated linearly at read time.
struct Calibration {
    h0_rh: f64,
    h1_rh: f64,
    t0_deg_c: f64,
    t1_deg_c: f64,
    h0_t0_out: f64,
    h1_t0_out: f64,
    t0_out: f64,
    t1_out: f64,
}

impl Calibration {
    fn parse(raw: &[u8; 16]) -> Self {
        // Temperature calibration values are 10-bit, split across MSB bits
        // in register 0x35.
        let t0_deg_c_x8 = (raw[2] as u16) | (((raw[5] & 0x03) as u16) << 8);
        let t1_deg_c_x8 = (raw[3] as u16) | (((raw[5] & 0x0c) as u16) << 6);

        Calibration {
            h0_rh: raw[0] as f64 / 2.0,
            h1_rh: raw[1] as f64 / 2.0,
            t0_deg_c: t0_deg_c_x8 as f64 / 8.0,
            t1_deg_c: t1_deg_c_x8 as f64 / 8.0,
            h0_t0_out: i16::from_le_bytes([raw[6], raw[7]]) as f64,
            h1_t0_out: i16::from_le_bytes([raw[10], raw[11]]) as f64,
            t0_out: i16::from_le_bytes([raw[12], raw[13]]) as f64,
            t1_out: i16::from_le_bytes([raw[14], raw[15]]) as f64,
        }
    }
}

/// ST HTS221 relative humidity sensor with onboard thermometer.
pub struct Hts221 {
    dev: LinuxI2CDevice,
    calibration: Calibration,
}

impl Hts221 {
    pub const DEFAULT_ADDR: u16 = 0x5f;

    pub fn open(bus: &str, addr: u16) -> Result<Self> {
        info!("Opening HTS221 at {:#04x} on {}", addr, bus);
        let mut dev = LinuxI2CDevice::new(bus, addr)?;
        let id = dev.smbus_read_byte_data(WHO_AM_I)?;
        if id != CHIP_ID {
            return Err(SensorError::UnexpectedChip {
                name: "HTS221",
                found: id,
            });
        }

        let mut raw = [0u8; 16];
        dev.write(&[CALIB_START | AUTO_INCREMENT])?;
        dev.read(&mut raw)?;
        let calibration = Calibration::parse(&raw);

        Ok(Hts221 { dev, calibration })
    }

    pub fn power_on(&mut self) -> Result<()> {
        info!("Powering on HTS221");
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
        Err(SensorError::NotResponding("HTS221"))
    }

    fn read_raw(&mut self) -> Result<(i16, i16)> {
        self.wait_data_ready()?;
        let mut data = [0u8; 4];
        self.dev.write(&[HUMIDITY_OUT_L | AUTO_INCREMENT])?;
        self.dev.read(&mut data)?;

        let h_out = i16::from_le_bytes([data[0], data[1]]);
        let t_out = i16::from_le_bytes([data[2], data[3]]);
        Ok((h_out, t_out))
    }

    /// Relative humidity in %, clamped to the physical 0–100 range.
    pub fn read_humidity(&mut self) -> Result<f64> {
        let (h_out, _) = self.read_raw()?;
        let c = &self.calibration;
        let humidity = if c.h1_t0_out != c.h0_t0_out {
            c.h0_rh + (h_out as f64 - c.h0_t0_out) * (c.h1_rh - c.h0_rh) / (c.h1_t0_out - c.h0_t0_out)
        } else {
            c.h0_rh
        };
        let humidity = humidity.clamp(0.0, 100.0);
        debug!("HTS221 humidity: {} %", humidity);
        Ok(humidity)
    }

    /// Temperature in °C from the onboard thermometer.
    pub fn read_temperature(&mut self) -> Result<f64> {
        let (_, t_out) = self.read_raw()?;
        let c = &self.calibration;
        let temperature = if c.t1_out != c.t0_out {
            c.t0_deg_c + (t_out as f64 - c.t0_out) * (c.t1_deg_c - c.t0_deg_c) / (c.t1_out - c.t0_out)
        } else {
            c.t0_deg_c
        };
        debug!("HTS221 temperature: {} °C", temperature);
        Ok(temperature)
    }
}
