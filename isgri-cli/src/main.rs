//! isgri-energy: command-line front end of the ISGRI energy correction.
//!
//! Loads the calibration tables and an event list, corrects every event
//! and writes the rise-time class and energy columns.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use clap::{Args, Parser, Subcommand};
use isgri_algorithms::{
    average_housekeeping, transform_events, DualLawModel, ExecutionMode, ModuleConditions,
    DIAGNOSTICS_TARGET, REPORT_CLASS,
};
use isgri_core::lut2::LUT2_RISE_TIME_CLASSES;
use isgri_core::random::SeededRandom;
use isgri_io::{
    load_calibration, load_law2, load_lut1, load_lut2, read_events, read_housekeeping,
    require_file, write_corrected, CalibrationPaths, RunConfig,
};
use log::{info, warn, LevelFilter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IsgriIo(#[from] isgri_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] isgri_core::Error),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Energy and rise-time correction of ISGRI events.
#[derive(Parser)]
#[command(name = "isgri-energy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity: 0 warnings, 1 summary, 2 diagnostics, 3 debug, 4 trace (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "2")]
    chatter: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct an event list
    Process(ProcessArgs),

    /// Print the gain-drift law parameters for a revolution
    Info {
        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        calibration: CalibrationArgs,

        /// Mission revolution
        #[arg(long)]
        revolution: Option<i64>,

        /// Rise-time class to report
        #[arg(long, default_value_t = REPORT_CLASS)]
        class: usize,
    },

    /// Load every calibration table and report shape errors
    Validate {
        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        calibration: CalibrationArgs,
    },
}

/// Calibration table locations; each overrides the run configuration.
#[derive(Args, Debug, Default)]
struct CalibrationArgs {
    /// LUT1 CSV (16384 rows)
    #[arg(long)]
    lut1: Option<PathBuf>,

    /// LUT2 raw i16 cube
    #[arg(long)]
    lut2: Option<PathBuf>,

    /// Law-2 gain coefficients CSV
    #[arg(long)]
    gain2: Option<PathBuf>,

    /// Law-2 offset coefficients CSV
    #[arg(long)]
    offset2: Option<PathBuf>,
}

impl CalibrationArgs {
    fn apply(self, paths: &mut CalibrationPaths) {
        if let Some(path) = self.lut1 {
            paths.lut1 = path;
        }
        if let Some(path) = self.lut2 {
            paths.lut2 = path;
        }
        if let Some(path) = self.gain2 {
            paths.gain2 = path;
        }
        if let Some(path) = self.offset2 {
            paths.offset2 = path;
        }
    }
}

#[derive(Args, Debug, Default)]
struct ProcessArgs {
    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    calibration: CalibrationArgs,

    /// Input event list (.csv, .bin or .h5)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Output file (.csv, .bin or .h5)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mission revolution of the events
    #[arg(long)]
    revolution: Option<i64>,

    /// Random seed (entropy-seeded when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the gain-drift correction
    #[arg(long)]
    no_drift_correction: bool,

    /// Housekeeping telemetry CSV
    #[arg(long)]
    hk: Option<PathBuf>,

    /// Correct events on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Also write pha1, rt1 and pha2
    #[arg(long)]
    diagnostic_columns: bool,
}

impl ProcessArgs {
    fn into_run_config(self) -> Result<RunConfig> {
        let mut run = load_run_config(self.config.as_deref())?;
        self.calibration.apply(&mut run.calibration);
        if let Some(events) = self.events {
            run.events = events;
        }
        if let Some(output) = self.output {
            run.output = output;
        }
        if let Some(revolution) = self.revolution {
            run.revolution = revolution;
        }
        if self.seed.is_some() {
            run.seed = self.seed;
        }
        if self.hk.is_some() {
            run.housekeeping = self.hk;
        }
        if self.no_drift_correction {
            run.correct_gain_drift = false;
        }
        if self.parallel {
            run.execution = ExecutionMode::Parallel;
        }
        if self.diagnostic_columns {
            run.diagnostic_columns = true;
        }
        Ok(run)
    }
}

fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            info!("run configuration: {}", path.display());
            Ok(RunConfig::from_file(path)?)
        }
        None => Ok(RunConfig::default()),
    }
}

fn chatter_level(chatter: u8) -> LevelFilter {
    match chatter {
        0 => LevelFilter::Warn,
        1 | 2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logger for a chatter level; chatter 1 leaves out the diagnostic summary.
fn log_builder(chatter: u8) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(chatter_level(chatter));
    if chatter == 1 {
        builder.filter_module(DIAGNOSTICS_TARGET, LevelFilter::Warn);
    }
    builder
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    log_builder(cli.chatter).parse_default_env().init();

    match cli.command {
        Commands::Process(args) => {
            let run = args.into_run_config()?;
            process(&run)?;
        }

        Commands::Info {
            config,
            calibration,
            revolution,
            class,
        } => {
            let mut run = load_run_config(config.as_deref())?;
            calibration.apply(&mut run.calibration);
            info_report(&run.calibration, revolution.unwrap_or(run.revolution), class)?;
        }

        Commands::Validate {
            config,
            calibration,
        } => {
            let mut run = load_run_config(config.as_deref())?;
            calibration.apply(&mut run.calibration);
            validate(&run.calibration)?;
        }
    }

    Ok(())
}

fn process(run: &RunConfig) -> Result<()> {
    require_calibration(&run.calibration)?;
    require_file("events", &run.events)?;
    if let Some(hk) = &run.housekeeping {
        require_file("housekeeping", hk)?;
    }
    if run.output.as_os_str().is_empty() {
        return Err(CliError::Usage("no output file given".to_string()));
    }

    let start = Instant::now();
    let tables = load_calibration(&run.calibration)?;
    let conditions = module_conditions(run)?;
    let events = read_events(&run.events)?;

    let mut rng = if let Some(seed) = run.seed {
        info!("random seed: {}", seed);
        SeededRandom::new(seed)
    } else {
        SeededRandom::from_entropy()
    };

    let output = transform_events(
        &tables,
        conditions,
        &events,
        run.transform_config(),
        &mut rng,
    )?;
    write_corrected(&run.output, &output.corrected, run.diagnostic_columns)?;

    let elapsed = start.elapsed();
    println!(
        "Processed {} events in {:.2}s",
        events.len(),
        elapsed.as_secs_f64()
    );
    println!("Revolution: {}", run.revolution);
    println!(
        "Energies forced to zero: {}",
        output.diagnostics.forced_zero
    );
    println!("Output: {}", run.output.display());
    Ok(())
}

fn module_conditions(run: &RunConfig) -> Result<ModuleConditions> {
    if let Some(conditions) = run.conditions {
        info!("module conditions taken from the run configuration");
        return Ok(conditions);
    }
    let Some(path) = &run.housekeeping else {
        info!("no housekeeping given, using default module conditions");
        return Ok(ModuleConditions::default());
    };

    let samples = read_housekeeping(path)?;
    if samples.is_empty() {
        warn!("housekeeping file {} holds no samples", path.display());
    }
    let summary = average_housekeeping(&samples);
    if !summary.rejected_modules.is_empty() {
        warn!(
            "temperature sensors rejected on MCE {:?}",
            summary.rejected_modules
        );
    }
    Ok(summary.conditions)
}

fn require_calibration(paths: &CalibrationPaths) -> Result<()> {
    require_file("LUT1", &paths.lut1)?;
    require_file("LUT2", &paths.lut2)?;
    require_file("law-2 gain", &paths.gain2)?;
    require_file("law-2 offset", &paths.offset2)?;
    Ok(())
}

fn info_report(paths: &CalibrationPaths, revolution: i64, class: usize) -> Result<()> {
    if class >= LUT2_RISE_TIME_CLASSES {
        return Err(CliError::Usage(format!(
            "rise-time class {} outside 0..{}",
            class, LUT2_RISE_TIME_CLASSES
        )));
    }
    require_file("law-2 gain", &paths.gain2)?;
    require_file("law-2 offset", &paths.offset2)?;

    let law2 = load_law2(&paths.gain2, &paths.offset2)?;
    let laws = DualLawModel::new(&law2, revolution);

    println!("Revolution: {}", revolution);
    println!(
        "GAIN1, OFFSET1 for PHA        : {:8.6}  {:8.4}",
        laws.gain1(),
        laws.offset1()
    );
    println!(
        "GAIN2, OFFSET2 for PHA (RT={}): {:8.6}  {:8.4}",
        class,
        laws.gain2(class),
        laws.offset2(class)
    );
    println!(
        "Crossover channel       (RT={}): {:8.2}",
        class,
        laws.crossover_channel(class)
    );
    println!(
        "Equal energy for laws  (RT={}): {:5.2} keV",
        class,
        laws.crossover_energy_kev(class)
    );
    println!(
        "Channel scale, offset         : {:8.6}  {:8.4}",
        laws.channel_scale(),
        laws.channel_offset()
    );

    if !paths.lut1.as_os_str().is_empty() {
        let lut1 = load_lut1(&paths.lut1)?;
        let (min, max) = lut1
            .gain()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &g| {
                (lo.min(g), hi.max(g))
            });
        println!("LUT1: {} pixels, gain {:.4} - {:.4}", lut1.gain().len(), min, max);
    }
    if !paths.lut2.as_os_str().is_empty() {
        let lut2 = load_lut2(&paths.lut2)?;
        let min = lut2.as_slice().iter().copied().min().unwrap_or(0);
        let max = lut2.as_slice().iter().copied().max().unwrap_or(0);
        println!("LUT2: {} cells, values {} - {}", lut2.len(), min, max);
    }
    Ok(())
}

fn validate(paths: &CalibrationPaths) -> Result<()> {
    let mut failures = 0usize;
    report(
        "LUT1",
        load_lut1(&paths.lut1).map(|lut| format!("{} pixels", lut.gain().len())),
        &mut failures,
    );
    report(
        "LUT2",
        load_lut2(&paths.lut2).map(|lut| format!("{} cells", lut.len())),
        &mut failures,
    );
    report(
        "law-2",
        load_law2(&paths.gain2, &paths.offset2)
            .map(|_| format!("{} rise-time classes", LUT2_RISE_TIME_CLASSES)),
        &mut failures,
    );

    if failures > 0 {
        return Err(CliError::Validation(format!(
            "{} calibration input(s) invalid",
            failures
        )));
    }
    println!("All calibration tables valid");
    Ok(())
}

fn report(label: &str, result: isgri_io::Result<String>, failures: &mut usize) {
    match result {
        Ok(summary) => println!("{:<6} OK    {}", label, summary),
        Err(e) => {
            println!("{:<6} FAIL  {}", label, e);
            *failures += 1;
        }
    }
}
