// msalib test application -- CLI tool for exercising the MSA400 driver
// against real hardware or a scripted mock stream.
//
// Usage:
//   msalib-test-app --port /dev/ttyUSB0 get span
//   msalib-test-app --port /dev/ttyUSB0 set span 2M
//   msalib-test-app --port COM3 sweep --freqs --json
//   msalib-test-app --port COM3 preset save --output bench.json
//   msalib-test-app --port COM3 preset load bench.json
//   msalib-test-app --mock action hold
//   msalib-test-app list

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use msalib_core::{ByteStream, SpectrumRecord, format_freq_mhz, format_freq_suffix};
use msalib_micronix::{Model, Msa400Builder, Preset, SETTINGS, Session, Setting, Validator};
use msalib_text_io::Terminator;
use msalib_transport::SerialStream;

mod mock;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// msalib test application -- drives an MSA400 analyzer from the command line.
#[derive(Parser)]
#[command(name = "msalib-test-app", version, about)]
struct Cli {
    /// Instrument model (MSA438, MSA458, MSA438E).
    #[arg(long, default_value = "MSA438")]
    model: String,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Override the default baud rate for this model.
    #[arg(long)]
    baud: Option<u32>,

    /// Reply terminator used by the instrument firmware.
    #[arg(long, default_value = "crlf", value_enum)]
    terminator: TerminatorArg,

    /// Use a scripted mock stream instead of a real serial port.
    /// Useful for verifying CLI parsing and session wiring without hardware.
    #[arg(long)]
    mock: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print center frequency, span and reference level.
    Info,

    /// Read one setting.
    Get {
        /// Setting name (see `list`).
        name: String,
    },

    /// Validate and write one setting.
    Set {
        /// Setting name (see `list`).
        name: String,
        /// New value (e.g. 2M, AUTO, -20).
        value: String,
    },

    /// Read one sweep.
    Sweep {
        /// Include the frequency of every bin.
        #[arg(long)]
        freqs: bool,

        /// Print the record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Read the result of the active measurement.
    Measure,

    /// Run a front-panel action.
    Action {
        #[arg(value_enum)]
        action: ActionArg,
    },

    /// Snapshot or restore all settings.
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// List all settings and their accepted values.
    List,
}

#[derive(Subcommand)]
enum PresetAction {
    /// Read every setting and print or save the snapshot as JSON.
    Save {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Apply a JSON snapshot.
    Load {
        /// Snapshot file produced by `preset save`.
        input: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ActionArg {
    Hold,
    Run,
    FreqSetMarker,
    Auto,
    MarkerReset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TerminatorArg {
    Crlf,
    Lf,
}

impl From<TerminatorArg> for Terminator {
    fn from(arg: TerminatorArg) -> Self {
        match arg {
            TerminatorArg::Crlf => Terminator::CrLf,
            TerminatorArg::Lf => Terminator::Lf,
        }
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_session(cli: &Cli) -> Result<Session> {
    let model: Model = cli.model.parse()?;
    let builder = Msa400Builder::new(model).terminator(cli.terminator.into());

    let stream: Box<dyn ByteStream> = if cli.mock {
        if cli.port.is_some() {
            bail!("--port and --mock are mutually exclusive");
        }
        let preset = match &cli.command {
            Command::Preset {
                action: PresetAction::Load { input },
            } => Some(read_preset(input)?),
            _ => None,
        };
        eprintln!("Connected (mock stream) -- {model}");
        Box::new(mock::scripted_stream(&cli.command, preset.as_ref())?)
    } else {
        let port = cli
            .port
            .as_deref()
            .context("--port is required when not using --mock")?;
        let baud = cli.baud.unwrap_or(model.default_baud_rate());
        let serial = SerialStream::open(port, baud)
            .with_context(|| format!("failed to open serial port {port} at {baud} baud"))?;
        eprintln!("Connected to {port} at {baud} baud -- {model}");
        Box::new(serial)
    };

    builder
        .build_with_stream(stream)
        .context("failed to initialize the instrument")
}

fn read_preset(path: &Path) -> Result<Preset> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid preset file {}", path.display()))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    println!("{:<10} {:<11} {:<10} ACCEPTS", "NAME", "QUERY", "WRITE");
    for d in &SETTINGS {
        let accepts = match d.validator {
            Validator::OneOf(values) | Validator::OneOfDecimalComma(values) => values.join(" "),
            other => other.describe(),
        };
        println!(
            "{:<10} {:<11} {:<10} {accepts}",
            d.name, d.query, d.write_prefix
        );
    }
    Ok(())
}

fn cmd_info(session: &mut Session) -> Result<()> {
    let center = session.center_frequency_hz()?;
    let span = session.span_hz()?;
    let reference = session.ref_level_dbm()?;

    println!("Instrument: {}", session.config().model);
    println!(
        "  Center:     {} ({})",
        format_freq_mhz(center),
        format_freq_suffix(center)
    );
    println!(
        "  Span:       {} ({})",
        format_freq_mhz(span),
        format_freq_suffix(span)
    );
    println!("  Ref level:  {reference} dBm");
    Ok(())
}

fn cmd_get(session: &mut Session, name: &str) -> Result<()> {
    let setting: Setting = name.parse()?;
    let value = session.get(setting)?;
    println!("{setting}: {value}");
    Ok(())
}

fn cmd_set(session: &mut Session, name: &str, value: &str) -> Result<()> {
    let setting: Setting = name.parse()?;
    session.set(setting, value)?;
    println!("{setting}: set to {value}");
    Ok(())
}

fn print_sweep(record: &SpectrumRecord) {
    println!(
        "CF {}  SP {}  RF {} dBm  ST {} s  RBW {} Hz  VBW {} Hz  {} dB/div",
        format_freq_mhz(record.center_freq_hz),
        format_freq_mhz(record.span_hz),
        record.ref_level_dbm,
        record.sweep_time_s,
        record.rbw_hz,
        record.vbw_hz,
        record.scale_db_per_div,
    );
    println!("{} samples", record.len());
    if let Some((index, level)) = record.peak() {
        println!("Peak: {level:.2} dBm at bin {index}");
    }
    match &record.points {
        Some(points) => {
            for p in points {
                println!("{:>14} Hz  {:>8.2} dBm", p.freq_hz, p.level_dbm);
            }
        }
        None => {
            for (i, level) in record.amplitudes.iter().enumerate() {
                println!("{i:>5}  {level:>8.2} dBm");
            }
        }
    }
}

fn cmd_sweep(session: &mut Session, freqs: bool, json: bool) -> Result<()> {
    let record = session.sweep(freqs)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_sweep(&record);
    }
    Ok(())
}

fn cmd_action(session: &mut Session, action: ActionArg) -> Result<()> {
    match action {
        ActionArg::Hold => session.hold()?,
        ActionArg::Run => session.run()?,
        ActionArg::FreqSetMarker => session.freq_set_marker()?,
        ActionArg::Auto => session.auto_tune()?,
        ActionArg::MarkerReset => session.marker_reset()?,
    }
    println!("{action:?}: done");
    Ok(())
}

fn cmd_preset_save(session: &mut Session, output: Option<&Path>) -> Result<()> {
    let preset = session.preset()?;
    let json = serde_json::to_string_pretty(&preset)?;
    match output {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Saved {} settings to {}", preset.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_preset_load(session: &mut Session, input: &Path) -> Result<()> {
    let preset = read_preset(input)?;
    session.apply_preset(&preset)?;
    println!("Applied {} settings from {}", preset.len(), input.display());
    Ok(())
}

fn run(cli: &Cli, session: &mut Session) -> Result<()> {
    match &cli.command {
        Command::Info => cmd_info(session),
        Command::Get { name } => cmd_get(session, name),
        Command::Set { name, value } => cmd_set(session, name, value),
        Command::Sweep { freqs, json } => cmd_sweep(session, *freqs, *json),
        Command::Measure => {
            println!("{}", session.measurement_result()?);
            Ok(())
        }
        Command::Action { action } => cmd_action(session, *action),
        Command::Preset { action } => match action {
            PresetAction::Save { output } => cmd_preset_save(session, output.as_deref()),
            PresetAction::Load { input } => cmd_preset_load(session, input),
        },
        Command::List => cmd_list(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // The `list` command does not require an instrument.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let mut session = open_session(&cli)?;
    let result = run(&cli, &mut session);
    session.close();
    result
}
