//! Car Interface CLI
//!
//! Command-line front end for the car-interface library:
//! - Fingerprint a recorded candump log against the known reference signatures
//! - Compute the Chrysler checksum of arbitrary bytes
//! - Encode individual Chrysler control messages

use anyhow::{bail, Context, Result};
use car_interface::car::chrysler::messages;
use car_interface::car::{AudibleAlert, Gear, VisualAlert};
use car_interface::formats::read_candump;
use car_interface::{
    checksum, fingerprint, CanFrame, CarRegistry, Clock, ManualClock, MonotonicClock,
    ReplaySource,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;

mod config;
mod report;

use config::AppConfig;
use report::FingerprintReport;

/// Car Interface - identify vehicles and encode their control messages
#[derive(Parser, Debug)]
#[command(name = "car-interface")]
#[command(about = "Identify vehicles from CAN traffic and encode control messages", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a candump log and identify the vehicle
    Fingerprint {
        /// candump -l log file
        #[arg(short, long, value_name = "FILE")]
        log: PathBuf,

        /// Extra JSON fingerprint table(s) (can be repeated)
        #[arg(long, value_name = "FILE")]
        table: Vec<PathBuf>,

        /// Replay at capture speed instead of as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the Chrysler checksum of hex bytes
    Checksum {
        /// Hex bytes, e.g. 0110 or "01 10"
        hex: Vec<String>,
    },

    /// Encode one Chrysler message and print it
    Encode {
        #[command(subcommand)]
        message: EncodeCommand,
    },
}

#[derive(Subcommand, Debug)]
enum EncodeCommand {
    /// LKAS_HUD lane-keeping icon state
    LkasHud {
        #[arg(long, value_enum, default_value_t = GearArg::Drive)]
        gear: GearArg,
        /// Lane keeping is actively steering
        #[arg(long)]
        active: bool,
        /// Show the "steer required" override
        #[arg(long)]
        steer_required: bool,
        /// HUD frames sent since the alert window opened
        #[arg(long, default_value_t = 0)]
        hud_count: u32,
        /// CAR_MODEL byte echoed back to the cluster
        #[arg(long, default_value_t = 0)]
        car_model: u8,
    },
    /// LKAS_COMMAND steering torque request
    LkasCommand {
        #[arg(long, allow_hyphen_values = true)]
        torque: i32,
        /// Vehicle is above the minimum steering speed
        #[arg(long)]
        moving_fast: bool,
        #[arg(long, default_value_t = 0)]
        frame: u64,
    },
    /// Chime request
    Chime {
        /// Sound an alert instead of silence
        #[arg(long)]
        on: bool,
    },
    /// WHEEL_BUTTONS ACC cancel press
    WheelButtons {
        #[arg(long, default_value_t = 0)]
        frame: u64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum GearArg {
    Park,
    Reverse,
    Neutral,
    Drive,
    Low,
}

impl From<GearArg> for Gear {
    fn from(gear: GearArg) -> Self {
        match gear {
            GearArg::Park => Gear::Park,
            GearArg::Reverse => Gear::Reverse,
            GearArg::Neutral => Gear::Neutral,
            GearArg::Drive => Gear::Drive,
            GearArg::Low => Gear::Low,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Car Interface CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using car-interface library v{}", car_interface::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    match args.command {
        Command::Fingerprint {
            log,
            table,
            realtime,
            json,
        } => fingerprint_log(&config, log, &table, realtime, json),
        Command::Checksum { hex } => {
            let data = parse_hex(&hex.concat())?;
            let value = checksum(&data).context("Cannot checksum empty input")?;
            println!("0x{:02X}", value);
            Ok(())
        }
        Command::Encode { message } => {
            let frame = encode(&config, message)?;
            println!("{}", frame);
            Ok(())
        }
    }
}

/// Replay `log_path` through the fingerprint engine and print a report
fn fingerprint_log(
    config: &AppConfig,
    log_path: PathBuf,
    extra_tables: &[PathBuf],
    realtime: bool,
    json: bool,
) -> Result<()> {
    let table = config.load_tables(extra_tables)?;
    log::info!("Fingerprint table: {} model(s)", table.len());

    let frames = read_candump(&log_path)
        .with_context(|| format!("Failed to read log file: {:?}", log_path))?;
    let frame_count = frames.len();
    log::info!("Replaying {} frame(s)", frame_count);

    let fingerprint_config = config.fingerprint.clone().with_env_overrides();
    // A recorded log can only be observed, so the passive timeout always applies
    let timeout = fingerprint_config.timeout(true);

    let run = |clock: &dyn Clock| {
        let mut source = ReplaySource::new(frames, clock);
        let result = fingerprint(
            &mut source,
            &table,
            table.all_known_cars(),
            &fingerprint_config,
            clock,
            timeout,
        );
        (result, clock.now())
    };
    let (result, elapsed) = if realtime {
        run(&MonotonicClock::new())
    } else {
        run(&ManualClock::new())
    };

    let registry = CarRegistry::with_defaults();
    let family = result.candidate.as_deref().and_then(|model| registry.get(model));
    let params = match (&result.candidate, family) {
        (Some(model), Some(family)) => Some(family.get_params(model, result.signature.as_ref())),
        _ => None,
    };

    let report = FingerprintReport {
        log: log_path,
        frames: frame_count,
        elapsed_ms: elapsed.as_millis(),
        fingerprint: result,
        interface: params.as_ref().map(|p| p.car_name.clone()),
        params,
    };

    let mut out = io::stdout().lock();
    if json {
        report.write_json(&mut out)
    } else {
        report.write_text(&mut out)
    }
}

fn encode(config: &AppConfig, message: EncodeCommand) -> Result<CanFrame> {
    let packer = config.packer()?;
    let frame = match message {
        EncodeCommand::LkasHud {
            gear,
            active,
            steer_required,
            hud_count,
            car_model,
        } => {
            let alert = if steer_required {
                VisualAlert::SteerRequired
            } else {
                VisualAlert::None
            };
            packer.render(messages::create_lkas_hud(gear.into(), active, alert, hud_count, car_model))?
        }
        EncodeCommand::LkasCommand {
            torque,
            moving_fast,
            frame,
        } => messages::create_lkas_command(&packer, torque, moving_fast, frame)?,
        EncodeCommand::Chime { on } => {
            let alert = if on {
                AudibleAlert::ChimeWarning1
            } else {
                AudibleAlert::None
            };
            messages::create_chimes(alert)
        }
        EncodeCommand::WheelButtons { frame } => messages::create_wheel_buttons(frame)?,
    };
    Ok(frame)
}

/// Parse hex bytes, ignoring whitespace and an optional 0x prefix
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        bail!("Odd number of hex digits: {:?}", input);
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("Invalid hex byte {:?}", &digits[i..i + 2]))
        })
        .collect()
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0110").unwrap(), vec![0x01, 0x10]);
        assert_eq!(parse_hex("0x01 f0").unwrap(), vec![0x01, 0xf0]);
        assert!(parse_hex("011").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_encode_wheel_buttons() {
        let frame = encode(&AppConfig::default(), EncodeCommand::WheelButtons { frame: 1 }).unwrap();
        assert_eq!(frame.to_string(), "23B@0#01103F");
    }

    #[test]
    fn test_encode_lkas_command() {
        let command = EncodeCommand::LkasCommand {
            torque: -261,
            moving_fast: false,
            frame: 17,
        };
        let frame = encode(&AppConfig::default(), command).unwrap();
        assert_eq!(frame.to_string(), "292@0#5F6000100077");
    }

    #[test]
    fn test_encode_hud() {
        let hud = EncodeCommand::LkasHud {
            gear: GearArg::Park,
            active: false,
            steer_required: true,
            hud_count: 0,
            car_model: 0,
        };
        let frame = encode(&AppConfig::default(), hud).unwrap();
        assert_eq!(frame.to_string(), "2A6@0#0000000300000000");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["car-interface", "-vv", "checksum", "01", "10"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command, Command::Checksum { hex } if hex == ["01", "10"]));
    }
}
