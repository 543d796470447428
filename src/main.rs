//! joyswap - Xin-Mo joystick order check and MAME config fixer
//!
//! `joyswap check` tells the boot script whether Player 1 is where it should
//! be, `joyswap swap` brings the MAME configs in line with that answer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use joyswap::catalog;
use joyswap::error::ResolveError;
use joyswap::inspector;
use joyswap::leds;
use joyswap::prompt;
use joyswap::reconcile::SwapDecision;
use joyswap::resolver::{Confidence, IdentityResolver, ResolutionMethod};
use joyswap::settings::AppSettings;
use joyswap::swapper;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, warn};

/// Exit code for usage and setup errors
const EXIT_FAILURE: u8 = 1;
/// Exit code when fewer than two candidates are found, and for any `check`
/// failure: 1 would read as "swapped" to the boot script
const EXIT_INSUFFICIENT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "joyswap", version, about = "Arcade joystick order check and MAME config fixer")]
struct Cli {
    #[arg(long, global = true, help = "Settings file (default: ~/.config/joyswap/settings.toml)")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify Player 1 (exit 0 ok, 1 swapped, 2 not enough devices or inconclusive)
    Check {
        #[arg(long, help = "Seconds to wait for the confirm button")]
        timeout: Option<u64>,
    },
    /// Swap joystick codes in every config file when hardware and config disagree
    Swap {
        /// Directory containing the cfg files (including the reference file)
        cfg_dir: PathBuf,
        /// 0 if the sticks are in normal order, 1 if swapped
        #[arg(value_parser = ["0", "1"])]
        hardware_swapped: String,
        #[arg(long, help = "Report the decision without rewriting files")]
        dry_run: bool,
        #[arg(long, help = "Seconds to wait for a key before rewriting (0 = no wait)")]
        acknowledge: Option<u64>,
    },
    /// Set the cabinet LED mask (0x00 to 0xFF)
    Leds { mask: String },
}

impl Commands {
    fn failure_code(&self) -> u8 {
        match self {
            Commands::Check { .. } => EXIT_INSUFFICIENT,
            Commands::Swap { .. } | Commands::Leds { .. } => EXIT_FAILURE,
        }
    }
}

/// Failure exit code for a command line that clap rejected.
///
/// The subcommand is the first positional argument, skipping the value of
/// `--config`.
fn usage_failure_code<I, S>(args: I) -> u8
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--config" => {
                args.next();
            }
            a if a.starts_with('-') => {}
            "check" => return EXIT_INSUFFICIENT,
            _ => return EXIT_FAILURE,
        }
    }
    EXIT_FAILURE
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(usage_failure_code(
                    std::env::args_os().map(|a| a.to_string_lossy().into_owned()),
                ))
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Diagnostics go to stderr, status lines to stdout
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let failure_code = cli.command.failure_code();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            println!("ERROR: {e}");
            ExitCode::from(failure_code)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = AppSettings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Check { timeout } => check(&settings, timeout),
        Commands::Swap {
            cfg_dir,
            hardware_swapped,
            dry_run,
            acknowledge,
        } => swap(&settings, cfg_dir, hardware_swapped == "1", dry_run, acknowledge),
        Commands::Leds { mask } => set_leds(&settings, &mask),
    }
}

fn check(settings: &AppSettings, timeout: Option<u64>) -> Result<ExitCode> {
    println!("Joystick identification v{}", env!("CARGO_PKG_VERSION"));

    let mut devices = catalog::discover(
        &settings.device_roots(),
        settings.devices.max_slots,
        &settings.name_filter(),
    );

    if devices.len() < 2 {
        warn!(
            "Fewer than two devices with '{}' in the name were found",
            settings.devices.name_filter
        );
        warn!("If your stick reports a different name, share the scan output above");
    }

    catalog::sort_by_path(&mut devices);

    let mut config = settings.resolver_config();
    if let Some(secs) = timeout {
        config.timeout = Duration::from_secs(secs);
    }
    let resolver = IdentityResolver::new(config);

    if devices.len() >= 2 {
        println!("Devices being watched:");
        for dev in &devices {
            println!("  - {:?} ({}) with {} buttons", dev.path, dev.name, dev.button_count);
        }
        println!(
            "Press button {} on PLAYER 1 now to confirm ({}s)...",
            resolver.config().confirm_button,
            resolver.config().timeout.as_secs()
        );
    }

    let verdict = match resolver.resolve(&devices) {
        Ok(verdict) => verdict,
        Err(e @ ResolveError::InsufficientCandidates { .. }) => {
            println!("[ERROR] {}. Cannot continue.", e);
            return Ok(ExitCode::from(EXIT_INSUFFICIENT));
        }
    };

    let status = match (verdict.method, verdict.confidence) {
        (ResolutionMethod::ObservedPress, Confidence::Ok) => "Player 1 correctly identified",
        (ResolutionMethod::ObservedPress, _) => {
            "Player 1 pressed on the wrong board, Player 1 and Player 2 are reversed"
        }
        (_, Confidence::Ok) => "Button counts suggest correct mapping",
        (_, Confidence::Swapped) => "Button counts suggest Player 1 and Player 2 are swapped",
        (_, Confidence::Inconclusive) => "Button counts are unusual and inconclusive",
    };
    match &verdict.primary {
        Some(dev) => println!("{} ({} at {:?})", status, dev.name, dev.path),
        None => println!("{}", status),
    }

    Ok(ExitCode::from(verdict.exit_code()))
}

fn swap(
    settings: &AppSettings,
    cfg_dir: PathBuf,
    hardware_swapped: bool,
    dry_run: bool,
    acknowledge: Option<u64>,
) -> Result<ExitCode> {
    let mapping = &settings.mapping;
    let tokens = settings.token_pair().context("Invalid joystick codes in settings")?;

    let reference = cfg_dir.join(&mapping.reference_file);
    println!("Checking {} at: {:?}", mapping.reference_file, reference);

    let config_normal = inspector::inspect(&reference, &mapping.anchor_port, tokens.second());
    println!(
        "{} joystick order is {}",
        mapping.reference_file,
        if config_normal { "normal" } else { "swapped" }
    );
    println!("Detected hardware swapped flag = {}", u8::from(hardware_swapped));

    let decision = SwapDecision::new(hardware_swapped, config_normal);
    if !decision.need_swap {
        println!("No swap needed. Configuration matches hardware state.");
        return Ok(ExitCode::SUCCESS);
    }

    if dry_run {
        println!("Swap needed, dry run: no files changed.");
        return Ok(ExitCode::SUCCESS);
    }

    let wait_secs = acknowledge.unwrap_or(settings.prompt.acknowledge_secs);
    if wait_secs > 0 {
        println!("WARNING - controllers swapped! (press any key, continuing in {}s)", wait_secs);
        if let Err(e) = prompt::wait_for_key(Duration::from_secs(wait_secs)) {
            warn!("Could not wait for acknowledgement: {}", e);
        }
    }

    println!("Performing joystick swap on all .{} files...", mapping.file_suffix);
    let report = swapper::swap_directory(&cfg_dir, &mapping.file_suffix, &tokens)
        .context("Failed to process config directory")?;

    if report.failed() > 0 {
        warn!("{} file(s) could not be processed", report.failed());
    }
    println!("Total joystick codes swapped across all files: {}", report.total());

    Ok(ExitCode::SUCCESS)
}

fn set_leds(settings: &AppSettings, raw: &str) -> Result<ExitCode> {
    let mask = match leds::parse_mask(raw) {
        Ok(mask) => mask,
        Err(e) => {
            println!("{}", e);
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };

    match leds::set_mask(settings.leds.vendor_id, settings.leds.product_id, mask) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            println!("Failed to send LED mask: {}", e);
            Ok(ExitCode::from(EXIT_FAILURE))
        }
    }
}
