mod devices;
mod recording;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;

use devices::{Hts221, Lps25h, SenseBoard};
use recording::RecordingConfig;

#[derive(Parser)]
#[command(about = "write sensor value to file")]
struct Args {
    /// initialize sensors. Data are discarded.
    #[arg(long)]
    init: bool,
    /// I2C bus device (e.g. /dev/i2c-1)
    #[arg(long, default_value = "/dev/i2c-1")]
    i2c_bus: String,
    /// LPS25H I2C address
    #[arg(long, default_value_t = Lps25h::DEFAULT_ADDR)]
    lps25h_addr: u16,
    /// HTS221 I2C address
    #[arg(long, default_value_t = Hts221::DEFAULT_ADDR)]
    hts221_addr: u16,
    /// Record file, one tab-separated sample per line
    #[arg(long, default_value = "records.tsv")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Set up logging
    let _guard = setup_logging();
    info!("Starting sense-logger");

    let mut board = match SenseBoard::open(&args.i2c_bus, args.lps25h_addr, args.hts221_addr) {
        Ok(board) => {
            info!("Sensor board ready on {}", args.i2c_bus);
            board
        }
        Err(e) => {
            error!("Failed to initialize sensor board: {}", e);
            return Err(Box::new(e));
        }
    };

    let config = RecordingConfig {
        output: args.output,
        init_only: args.init,
    };

    match recording::run_capture(&mut board, &config) {
        Ok(()) => info!("Capture run completed"),
        Err(e) => {
            error!("Capture run failed: {}", e);
            return Err(Box::new(e));
        }
    }

    Ok(())
}

fn setup_logging() -> WorkerGuard {
    // File-based logging with daily rotation
    let file_appender = rolling::daily("logs", "sense-logger.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false) // Disable ANSI colors in log files
        .with_level(true)
        .init();

    guard
}
