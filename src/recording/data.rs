/// One complete snapshot of the environment sensors.
///
/// Either all five fields are populated or the capture fails; a Sample is
/// never partial. Individual readings may still carry NaN if a sub-sensor
/// reports a fault, and are logged through as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Seconds since the Unix epoch at capture time.
    pub captured_at: f64,
    /// Barometric pressure in hPa (millibar).
    pub pressure: f64,
    /// °C from the pressure sensor's thermometer.
    pub temperature_from_pressure: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// °C from the humidity sensor's thermometer.
    pub temperature_from_humidity: f64,
}

impl Sample {
    /// Serializes the sample as one tab-separated record line.
    ///
    /// Field order is fixed: captured_at, pressure, temperature from
    /// pressure, humidity, temperature from humidity, terminated by a
    /// single `\n`. Downstream parsers split positionally on tabs, so the
    /// float formatting is part of the file format: shortest
    /// round-trippable decimal (ryu), integral values with a trailing
    /// `.0`, non-finite values as `NaN`, `inf` and `-inf`.
    pub fn to_tsv_line(&self) -> String {
        let fields = [
            self.captured_at,
            self.pressure,
            self.temperature_from_pressure,
            self.humidity,
            self.temperature_from_humidity,
        ];

        let mut buffer = ryu::Buffer::new();
        let mut line = String::with_capacity(64);
        for (i, value) in fields.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            line.push_str(buffer.format(*value));
        }
        line.push('\n');
        line
    }
}
