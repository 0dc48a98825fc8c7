pub mod data;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::devices::{EnvironmentSensor, SensorError};
use data::Sample;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(#[source] SensorError),

    #[error("failed to append record: {0}")]
    Append(#[from] std::io::Error),
}

/// Configuration for one capture run.
#[derive(Debug)]
pub struct RecordingConfig {
    /// Record file, one tab-separated sample per line, appended to.
    pub output: PathBuf,
    /// Exercise the sensor path but discard the sample without writing.
    pub init_only: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("records.tsv"),
            init_only: false,
        }
    }
}

fn unix_seconds_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}

/// Takes one snapshot of the environment sensors.
///
/// Queries in fixed order: wall-clock time, pressure, temperature from
/// pressure, humidity, temperature from humidity. The four reads form one
/// logical snapshot; no retries happen here. Sentinel values such as NaN
/// pass through uninterpreted, only an unreachable capability fails the
/// capture.
pub fn capture<S: EnvironmentSensor>(sensor: &mut S) -> Result<Sample, RecordError> {
    let captured_at = unix_seconds_now();
    let pressure = sensor.pressure().map_err(RecordError::SensorUnavailable)?;
    let temperature_from_pressure = sensor
        .temperature_from_pressure()
        .map_err(RecordError::SensorUnavailable)?;
    let humidity = sensor.humidity().map_err(RecordError::SensorUnavailable)?;
    let temperature_from_humidity = sensor
        .temperature_from_humidity()
        .map_err(RecordError::SensorUnavailable)?;

    Ok(Sample {
        captured_at,
        pressure,
        temperature_from_pressure,
        humidity,
        temperature_from_humidity,
    })
}

/// Appends one sample to the record file, creating it if absent.
///
/// The line is fully formatted before a single write is issued, so a failed
/// append never leaves a half-written record. Existing bytes are never
/// touched.
pub fn append(sample: &Sample, target: &Path) -> Result<(), RecordError> {
    let line = sample.to_tsv_line();
    let mut file = OpenOptions::new().append(true).create(true).open(target)?;
    file.write_all(line.as_bytes())?;
    info!("Appended record to {}", target.display());
    Ok(())
}

/// Init-only path: the sample was captured to warm the sensor path and is
/// intentionally dropped without any log-file I/O.
pub fn discard(sample: Sample) {
    info!(
        "Init-only run, discarding sample captured at {}",
        sample.captured_at
    );
}

/// Runs one capture cycle: snapshot the sensors, then either append the
/// record or, in init-only mode, discard it.
pub fn run_capture<S: EnvironmentSensor>(
    sensor: &mut S,
    config: &RecordingConfig,
) -> Result<(), RecordError> {
    info!("Starting capture run with configuration: {:?}", config);

    let sample = capture(sensor)?;

    if config.init_only {
        discard(sample);
        return Ok(());
    }

    append(&sample, &config.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct FakeSensor {
        pressure: f64,
        temperature_from_pressure: f64,
        humidity: f64,
        temperature_from_humidity: f64,
        reachable: bool,
    }

    impl FakeSensor {
        fn nominal() -> Self {
            FakeSensor {
                pressure: 1013.25,
                temperature_from_pressure: 21.4,
                humidity: 45.0,
                temperature_from_humidity: 21.6,
                reachable: true,
            }
        }

        fn unreachable() -> Self {
            FakeSensor {
                reachable: false,
                ..FakeSensor::nominal()
            }
        }

        fn reading(&self, value: f64) -> Result<f64, SensorError> {
            if self.reachable {
                Ok(value)
            } else {
                Err(SensorError::NotResponding("fake"))
            }
        }
    }

    impl EnvironmentSensor for FakeSensor {
        fn pressure(&mut self) -> Result<f64, SensorError> {
            self.reading(self.pressure)
        }

        fn temperature_from_pressure(&mut self) -> Result<f64, SensorError> {
            self.reading(self.temperature_from_pressure)
        }

        fn humidity(&mut self) -> Result<f64, SensorError> {
            self.reading(self.humidity)
        }

        fn temperature_from_humidity(&mut self) -> Result<f64, SensorError> {
            self.reading(self.temperature_from_humidity)
        }
    }

    #[test]
    fn capture_assembles_a_full_sample() {
        let mut sensor = FakeSensor::nominal();
        let sample = capture(&mut sensor).unwrap();
        assert!(sample.captured_at > 0.0);
        assert_eq!(sample.pressure, 1013.25);
        assert_eq!(sample.temperature_from_pressure, 21.4);
        assert_eq!(sample.humidity, 45.0);
        assert_eq!(sample.temperature_from_humidity, 21.6);
    }

    #[test]
    fn capture_fails_outright_when_sensor_unreachable() {
        let mut sensor = FakeSensor::unreachable();
        assert!(matches!(
            capture(&mut sensor),
            Err(RecordError::SensorUnavailable(_))
        ));
    }

    #[test]
    fn append_to_empty_file_writes_exact_bytes() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("records.tsv");
        let sample = Sample {
            captured_at: 1700000000.0,
            pressure: 1013.25,
            temperature_from_pressure: 21.4,
            humidity: 45.0,
            temperature_from_humidity: 21.6,
        };

        append(&sample, &target).unwrap();

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "1700000000.0\t1013.25\t21.4\t45.0\t21.6\n"
        );
    }

    #[test]
    fn second_append_preserves_existing_bytes() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("records.tsv");
        let first = Sample {
            captured_at: 1700000000.0,
            pressure: 1013.25,
            temperature_from_pressure: 21.4,
            humidity: 45.0,
            temperature_from_humidity: 21.6,
        };
        let second = Sample {
            captured_at: 1700000060.0,
            pressure: 1013.5,
            temperature_from_pressure: 21.5,
            humidity: 44.5,
            temperature_from_humidity: 21.7,
        };

        append(&first, &target).unwrap();
        append(&second, &target).unwrap();

        let contents = fs::read_to_string(&target).unwrap();
        assert_eq!(
            contents,
            "1700000000.0\t1013.25\t21.4\t45.0\t21.6\n\
             1700000060.0\t1013.5\t21.5\t44.5\t21.7\n"
        );
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn init_only_run_does_not_create_the_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("records.tsv");
        let config = RecordingConfig {
            output: target.clone(),
            init_only: true,
        };

        run_capture(&mut FakeSensor::nominal(), &config).unwrap();

        assert!(!target.exists());
    }

    #[test]
    fn init_only_run_leaves_existing_file_unchanged() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("records.tsv");
        fs::write(&target, "1700000000.0\t1013.25\t21.4\t45.0\t21.6\n").unwrap();
        let before = fs::read(&target).unwrap();
        let config = RecordingConfig {
            output: target.clone(),
            init_only: true,
        };

        run_capture(&mut FakeSensor::nominal(), &config).unwrap();

        assert_eq!(fs::read(&target).unwrap(), before);
    }

    #[test]
    fn sensor_failure_leaves_the_file_untouched() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("records.tsv");
        fs::write(&target, "1700000000.0\t1013.25\t21.4\t45.0\t21.6\n").unwrap();
        let before = fs::read(&target).unwrap();
        let config = RecordingConfig {
            output: target.clone(),
            init_only: false,
        };

        let outcome = run_capture(&mut FakeSensor::unreachable(), &config);

        assert!(matches!(outcome, Err(RecordError::SensorUnavailable(_))));
        assert_eq!(fs::read(&target).unwrap(), before);
    }

    #[test]
    fn nan_reading_is_logged_rather_than_rejected() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("records.tsv");
        let mut sensor = FakeSensor {
            humidity: f64::NAN,
            ..FakeSensor::nominal()
        };
        let config = RecordingConfig {
            output: target.clone(),
            init_only: false,
        };

        run_capture(&mut sensor, &config).unwrap();

        let contents = fs::read_to_string(&target).unwrap();
        let fields: Vec<&str> = contents.trim_end_matches('\n').split('\t').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[3], "NaN");
    }
}
