//! kmc-sim — command-line driver for the follow-graph simulator.
//!
//! Loads a TOML settings file, runs the simulation (single- or
//! multi-threaded), and writes the summary plus every enabled `.dat`
//! artifact into the output folder.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;

use kmc_config::Settings;
use kmc_engine::{RunReport, Simulation};

// ── Arguments ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "kmc-sim",
    version,
    disable_version_flag = true,
    about = "Kinetic Monte Carlo simulator for a directed social-follow graph"
)]
struct Cli {
    /// Print version information and exit.
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// TOML settings file.
    input: PathBuf,

    /// Destination folder for output artifacts.
    #[arg(default_value = "output")]
    output_folder: PathBuf,

    /// RNG seed: an integer, or "random" for an entropy-derived seed.
    #[arg(short = 'r', long, default_value = "42")]
    seed: String,

    /// Worker threads for the concurrent driver (0 = all cores).  Without
    /// this flag the single-threaded driver runs.
    #[arg(short = 'n', long)]
    threads: Option<usize>,

    /// Run the simulation once per thread count from 1 to all cores and
    /// write one summary per run.
    #[arg(short = 'b', long)]
    scaling_benchmark: bool,

    /// Log errors only.
    #[arg(short = 's', long)]
    silent: bool,
}

impl Cli {
    fn resolve_seed(&self) -> Result<u64> {
        if self.seed == "random" {
            return Ok(rand::random());
        }
        match self.seed.parse() {
            Ok(seed) => Ok(seed),
            Err(_) => bail!("--seed takes an integer or \"random\", got '{}'", self.seed),
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.silent);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(silent: bool) {
    use tracing_subscriber::EnvFilter;
    let default_filter = if silent { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = Settings::load(&cli.input)
        .with_context(|| format!("loading settings from {}", cli.input.display()))?;
    settings.output_folder = Some(cli.output_folder.clone());
    let seed = cli.resolve_seed()?;

    std::fs::create_dir_all(&cli.output_folder)
        .with_context(|| format!("creating output folder {}", cli.output_folder.display()))?;

    if cli.scaling_benchmark {
        scaling_benchmark(cli, &settings, seed)
    } else {
        single_run(cli, settings, seed)
    }
}

// ── Single run ────────────────────────────────────────────────────────────────

fn single_run(cli: &Cli, settings: Settings, seed: u64) -> Result<()> {
    let max_threads = available_threads();
    let sim = Simulation::new(settings, seed)?;

    let report = match cli.threads {
        None => {
            if !cli.silent {
                println!("Running single-threaded with seed {seed}...");
            }
            sim.run()
        }
        Some(threads) => {
            let threads = if threads == 0 { max_threads } else { threads };
            if !cli.silent {
                println!(
                    "Using {threads} out of {max_threads} concurrent threads, seed {seed}..."
                );
            }
            sim.run_parallel(threads)
        }
    };

    if !cli.silent {
        print_report(&report);
        println!("Saving output to {} ...", cli.output_folder.display());
    }
    write_summary(&sim, &report, cli.output_folder.join("out.dat"))?;
    sim.dump(&cli.output_folder)?;
    if !cli.silent {
        println!("Done!");
    }
    Ok(())
}

// ── Scaling benchmark ─────────────────────────────────────────────────────────

/// One run per thread count from 1 to the hardware maximum, each against a
/// fresh world with the same seed, writing `out_NN.dat` summaries.
fn scaling_benchmark(cli: &Cli, settings: &Settings, seed: u64) -> Result<()> {
    let max_threads = available_threads();
    for threads in 1..=max_threads {
        if !cli.silent {
            print!("Using {threads} out of {max_threads} concurrent threads...");
        }
        let sim = Simulation::new(settings.clone(), seed)?;
        let report = sim.run_parallel(threads);
        if !cli.silent {
            println!(" elapsed: {} ms", report.elapsed.as_millis());
        }
        write_summary(&sim, &report, cli.output_folder.join(format!("out_{threads:02}.dat")))?;
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn available_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn print_report(report: &RunReport) {
    println!(
        "Finished: {} steps, {} events, {:.3} simulated minutes in {} ms",
        report.steps,
        report.events,
        report.sim_minutes,
        report.elapsed.as_millis()
    );
}

fn write_summary(sim: &Simulation, report: &RunReport, path: PathBuf) -> Result<()> {
    let mut out = BufWriter::new(
        File::create(&path).with_context(|| format!("creating {}", path.display()))?,
    );
    sim.write_report(&mut out, report.elapsed)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
