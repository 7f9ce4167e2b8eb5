// ─────────────────────────────────────────────────────────────────────
// CR Waves — Command-Line Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `crwaves [CONFIG.json] [--log-level LEVEL] [--print-config] [--analytic-test]`
//!
//! Without a configuration file the reference halo run is evolved.
//! `--analytic-test` evolves a steady Gaussian source under constant D
//! instead and compares every dump with the closed form.

use crwaves_core::analytic::{build_analytic_test, AnalyticTestSink};
use crwaves_core::driver::Evolver;
use crwaves_core::dump::NpzDumper;
use crwaves_types::config::SimulationConfig;
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::units::KYR;
use log::LevelFilter;
use std::io::Write;
use std::process::ExitCode;

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config_path: Option<String>,
    log_level: Option<String>,
    print_config: bool,
    analytic_test: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> CrwResult<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--log-level" => {
                let level = iter.next().ok_or_else(|| {
                    CrwError::ConfigError("--log-level needs a value".to_string())
                })?;
                parsed.log_level = Some(level);
            }
            "--print-config" => parsed.print_config = true,
            "--analytic-test" => parsed.analytic_test = true,
            other if other.starts_with("--") => {
                return Err(CrwError::ConfigError(format!("unknown option {other}")));
            }
            path => {
                if parsed.config_path.is_some() {
                    return Err(CrwError::ConfigError(format!(
                        "unexpected extra argument {path}"
                    )));
                }
                parsed.config_path = Some(path.to_string());
            }
        }
    }
    Ok(parsed)
}

/// Level from the argument, else `RUST_LOG`, else info.
fn init_logging(level: Option<&str>) {
    let log_level = level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .try_init();
    log::debug!("logger initialized (level: {log_level})");
}

fn run(args: CliArgs) -> CrwResult<()> {
    let config = match &args.config_path {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    if args.analytic_test {
        return run_analytic_test(&config);
    }

    log::info!(
        "run '{}': {:?} geometry, {:?} damping, self-generation {}",
        config.tag,
        config.flags.geometry,
        config.flags.damping,
        if config.flags.do_selfgeneration { "on" } else { "off" }
    );
    let mut dumper = NpzDumper::new(&config.run.output_dir, &config.tag)?;
    let mut evolver = Evolver::from_config(config)?;
    let summary = evolver.evolve(&mut dumper)?;
    log::info!(
        "done: {} steps, {:.3} kyr, {} dumps, E_CR / E_injected = {:.6}",
        summary.steps,
        summary.simulated_time / KYR,
        summary.dumps,
        summary.energy.ratio
    );
    Ok(())
}

fn run_analytic_test(config: &SimulationConfig) -> CrwResult<()> {
    let (mut evolver, solution) = build_analytic_test(config)?;
    let dumper = NpzDumper::new(&config.run.output_dir, &config.tag)?;
    let mut sink = AnalyticTestSink::new(solution, dumper);
    let summary = evolver.evolve(&mut sink)?;
    let worst = sink
        .comparisons()
        .iter()
        .map(|c| c.relative_error())
        .fold(0.0, f64::max);
    log::info!(
        "analytic test done: {} steps, {:.3} kyr, worst relative deviation {:.4e}",
        summary.steps,
        summary.simulated_time / KYR,
        worst
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!(
                "usage: crwaves [CONFIG.json] [--log-level LEVEL] [--print-config] [--analytic-test]"
            );
            return ExitCode::from(2);
        }
    };
    init_logging(args.log_level.as_deref());
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
