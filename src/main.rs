//! ECG FHIR Bridge CLI
//!
//! Converts biosignal recordings into FHIR Observation collections.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use ecg_fhir_bridge::{
    config::Config,
    container::{writer::default_filename, Recording},
    core::{SamplingContext, SignalCode, TimeBase, TimestampPolicy},
    pipeline::{self, ConversionRequest},
    simulate, VERSION,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ecg-bridge")]
#[command(version = VERSION)]
#[command(about = "Converts ECG recordings into FHIR Observation resources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// CLI flavor of [`TimeBase`].
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimeBaseArg {
    /// Derive elapsed time from the device sequence number
    DeviceSequence,
    /// Derive elapsed time from the array position
    SamplePosition,
}

impl From<TimeBaseArg> for TimeBase {
    fn from(arg: TimeBaseArg) -> Self {
        match arg {
            TimeBaseArg::DeviceSequence => TimeBase::DeviceSequence,
            TimeBaseArg::SamplePosition => TimeBase::SamplePosition,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a recording into a FHIR Observation collection
    Convert {
        /// Input recording (discovered in the data directory if omitted)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Directory to discover the recording in
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output JSON path
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Device group id, e.g. 98:D3:21:FC:8B:12
        #[arg(long)]
        device: Option<String>,

        /// Channel dataset to extract
        #[arg(long)]
        channel: Option<String>,

        /// Sequence-number dataset
        #[arg(long)]
        index_field: Option<String>,

        /// Sampling rate in Hz
        #[arg(long)]
        rate: Option<f64>,

        /// Base instant for counter 0 (RFC 3339, e.g. 2024-12-23T00:00:00Z)
        #[arg(long, conflicts_with = "fixed_date")]
        base_time: Option<String>,

        /// Stamp all output onto this calendar date (YYYY-MM-DD, midnight UTC)
        #[arg(long)]
        fixed_date: Option<String>,

        /// Counter to derive elapsed time from
        #[arg(long, value_enum)]
        time_base: Option<TimeBaseArg>,

        /// Subject reference, e.g. Patient/1
        #[arg(long)]
        subject: Option<String>,
    },

    /// List the groups and datasets of a recording
    Inspect {
        /// Recording to inspect
        path: PathBuf,
    },

    /// Generate a synthetic ECG recording
    Simulate {
        /// Output path (defaults into the data directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Recording length in seconds
        #[arg(long, default_value = "10")]
        seconds: f64,

        /// Sampling rate in Hz
        #[arg(long)]
        rate: Option<f64>,

        /// Device group id to write under
        #[arg(long)]
        device: Option<String>,
    },

    /// Run the heart-rate statistics server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            data_dir,
            output,
            device,
            channel,
            index_field,
            rate,
            base_time,
            fixed_date,
            time_base,
            subject,
        } => {
            cmd_convert(
                input,
                data_dir,
                output,
                device,
                channel,
                index_field,
                rate,
                base_time,
                fixed_date,
                time_base,
                subject,
            );
        }
        Commands::Inspect { path } => {
            cmd_inspect(&path);
        }
        Commands::Simulate {
            output,
            seconds,
            rate,
            device,
        } => {
            cmd_simulate(output, seconds, rate, device);
        }
        Commands::Serve { port } => {
            cmd_serve(port);
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_convert(
    input: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    device: Option<String>,
    channel: Option<String>,
    index_field: Option<String>,
    rate: Option<f64>,
    base_time: Option<String>,
    fixed_date: Option<String>,
    time_base: Option<TimeBaseArg>,
    subject: Option<String>,
) {
    let config = Config::load().unwrap_or_default();

    let device = device.unwrap_or(config.device_id);
    let channel = channel.unwrap_or(config.channel);
    let index_field = index_field.unwrap_or(config.index_field);
    let subject = subject.unwrap_or(config.subject);
    let rate = rate.unwrap_or(config.sampling_rate_hz);
    let output = output.unwrap_or(config.output_path);

    let policy = match (base_time, fixed_date) {
        (Some(s), None) => match s.parse::<DateTime<Utc>>() {
            Ok(base) => TimestampPolicy::Absolute { base },
            Err(e) => {
                eprintln!("Error: invalid --base-time '{s}': {e}");
                std::process::exit(1);
            }
        },
        (None, Some(s)) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            Ok(date) => TimestampPolicy::FixedDate { date },
            Err(e) => {
                eprintln!("Error: invalid --fixed-date '{s}': {e}");
                std::process::exit(1);
            }
        },
        _ => config.timestamp,
    };

    let sampling = match SamplingContext::new(rate, policy.base_instant()) {
        Ok(sampling) => sampling,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let sampling = sampling.with_time_base(
        time_base
            .map(TimeBase::from)
            .unwrap_or(config.time_base),
    );

    let input = match input {
        Some(path) => path,
        None => {
            let dir = data_dir.unwrap_or(config.data_path);
            match pipeline::discover_container(&dir) {
                Ok(path) => path,
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
    };

    println!("ECG FHIR Bridge v{VERSION}");
    println!();
    println!("Converting {input:?}");
    println!("  Device: {device}");
    println!("  Channel: {channel} (indices: {index_field})");
    println!("  Sampling rate: {rate} Hz");
    println!("  Base instant: {}", policy.base_instant().to_rfc3339());
    println!();

    let request = ConversionRequest {
        input,
        output,
        device_id: device,
        channel,
        index_field,
        sampling,
        subject,
        code: SignalCode::ecg(),
    };

    match pipeline::run(&request) {
        Ok(report) => {
            println!("{}", report.summary());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_inspect(path: &Path) {
    let recording = match Recording::open(path) {
        Ok(recording) => recording,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("Recording {path:?}");
    for group in recording.groups() {
        println!("  {}/", group.path());
        for dataset in group.datasets() {
            println!(
                "    {} ({}, {} samples)",
                dataset.name(),
                dataset.dtype().name(),
                dataset.len()
            );
        }
    }
}

fn cmd_simulate(output: Option<PathBuf>, seconds: f64, rate: Option<f64>, device: Option<String>) {
    let config = Config::load().unwrap_or_default();
    let device = device.unwrap_or(config.device_id);
    let rate = rate.unwrap_or(config.sampling_rate_hz);
    let output = output.unwrap_or_else(|| config.data_path.join(default_filename(&device)));

    match simulate::write_recording(
        &output,
        &device,
        &config.channel,
        &config.index_field,
        rate,
        seconds,
    ) {
        Ok(n) => {
            println!("Wrote {n} samples ({seconds} s at {rate} Hz) to {output:?}");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16) {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().unwrap_or_default();
    let server_config = ecg_fhir_bridge::server::ServerConfig::new(port, config.output_path);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    let (addr, shutdown_tx) = match runtime.block_on(ecg_fhir_bridge::server::run(server_config)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("Listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    println!();
    println!("Stopping server...");
    let _ = shutdown_tx.send(());
    runtime.block_on(tokio::time::sleep(std::time::Duration::from_millis(100)));
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_port: u16) {
    eprintln!("Error: this binary was built without the 'server' feature.");
    eprintln!("Rebuild with `--features server` to enable the statistics API.");
    std::process::exit(1);
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
