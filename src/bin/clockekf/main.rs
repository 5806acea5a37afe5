/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

extern crate clap;
extern crate log;
extern crate nyx_clock as nyx;
extern crate pretty_env_logger;

use clap::{crate_version, value_parser, Arg, ArgMatches, Command};
use log::{error, info, warn};
use nyx::io::{ConfigError, ConfigRepr, FilterInputs, InputOutputError};
use nyx::mc::{ClockScenario, MonteCarlo};
use nyx::od::process::{ODProcess, RunConfig};
use nyx::od::ODError;
use snafu::prelude::*;
use std::env::{set_var, var};
use std::path::PathBuf;
use std::process::ExitCode;

const LOG_VAR: &str = "CLOCKEKF_LOG";

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("invalid configuration: {source}"))]
    Config { source: ConfigError },
    #[snafu(display("{source}"))]
    Estimation { source: ODError },
    #[snafu(display("{source}"))]
    Export { source: InputOutputError },
    #[snafu(display("missing argument {name}"))]
    MissingArgument { name: &'static str },
}

fn cli() -> Command {
    Command::new("clockekf")
        .version(crate_version!())
        .about("Estimates the bias and drift-rate of a clock from noisy measurements with an extended Kalman filter.")
        .arg(
            Arg::new("DT")
                .help("Time step between measurements")
                .value_parser(value_parser!(u32))
                .index(1),
        )
        .arg(
            Arg::new("dt")
                .long("dt")
                .value_name("seconds")
                .help("Time step between measurements, same as the positional argument")
                .value_parser(value_parser!(u32))
                .conflicts_with("DT"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("directory")
                .help("Directory containing the five filter input files")
                .value_parser(value_parser!(PathBuf))
                .default_value("filter_input"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("directory")
                .help("Directory where the state, covariance and NIS histories are written")
                .value_parser(value_parser!(PathBuf))
                .default_value("filter_output"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("yaml")
                .help("YAML run configuration (dt and nis_alpha), overridden by an explicit time step")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .value_name("file")
                .help("Also export the solution as a CSV file")
                .value_parser(value_parser!(PathBuf)),
        )
        .args_conflicts_with_subcommands(true)
        .subcommand(
            Command::new("mc")
                .about("Monte Carlo analysis of the filter consistency on a simulated clock")
                .arg(
                    Arg::new("SCENARIO")
                        .help("YAML clock scenario")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .index(1),
                )
                .arg(
                    Arg::new("runs")
                        .short('n')
                        .long("runs")
                        .value_parser(value_parser!(usize))
                        .default_value("100"),
                )
                .arg(
                    Arg::new("seed")
                        .short('s')
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .value_name("file")
                        .help("Export one row per run as a CSV file")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn run_filter(matches: &ArgMatches) -> Result<(), CliError> {
    let mut conf = match matches.get_one::<PathBuf>("config") {
        Some(path) => RunConfig::load(path).context(ConfigSnafu)?,
        None => RunConfig::default(),
    };

    if let Some(dt) = matches
        .get_one::<u32>("DT")
        .or_else(|| matches.get_one::<u32>("dt"))
    {
        conf.dt = f64::from(*dt);
    }
    conf.validate().context(ConfigSnafu)?;
    info!("Run configuration: {conf}");

    // Defaults are set for both directories
    let input_dir = matches
        .get_one::<PathBuf>("input")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("filter_input"));
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("filter_output"));

    let inputs = FilterInputs::load(&input_dir).context(EstimationSnafu)?;
    let odp = ODProcess::clock(&inputs, &conf).context(ConfigSnafu)?;
    let solution = odp.process(&inputs.measurements).context(EstimationSnafu)?;

    info!("{solution}");
    for path in solution.write_outputs(&output_dir).context(EstimationSnafu)? {
        info!("wrote {}", path.display());
    }

    if let Some(csv_path) = matches.get_one::<PathBuf>("csv") {
        solution.to_csv(csv_path).context(EstimationSnafu)?;
    }

    match solution.consistency(None) {
        Ok(report) if report.is_consistent() => info!("{report}"),
        Ok(report) => warn!("{report}"),
        Err(e) => warn!("{e}"),
    }

    Ok(())
}

fn run_monte_carlo(matches: &ArgMatches) -> Result<(), CliError> {
    let path = matches
        .get_one::<PathBuf>("SCENARIO")
        .context(MissingArgumentSnafu { name: "SCENARIO" })?;
    let runs = matches.get_one::<usize>("runs").copied().unwrap_or(100);
    let seed = matches.get_one::<u64>("seed").copied().unwrap_or(0);

    let scenario = ClockScenario::load(path).context(ConfigSnafu)?;
    info!("Loaded scenario {}: {scenario}", path.display());

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "clock".to_string());

    let mc = MonteCarlo::new(seed, scenario, name);
    let results = mc.run(runs).context(ConfigSnafu)?;

    info!(
        "{} runs ({} failed): average NIS {:.3} (std dev {:.3}), {:.1}% consistent, {:.1}% of final errors within 3 sigma",
        results.runs.len(),
        results.num_failed(),
        results.average_nis(),
        results.std_dev_nis(),
        100.0 * results.fraction_consistent(),
        100.0 * results.fraction_within_3sigma()
    );

    if let Some(csv_path) = matches.get_one::<PathBuf>("csv") {
        let path = results.to_csv(csv_path).context(ExportSnafu)?;
        info!("wrote {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    if var(LOG_VAR).is_err() {
        set_var(LOG_VAR, "INFO");
    }

    if pretty_env_logger::try_init_custom_env(LOG_VAR).is_err() {
        println!("could not init logger");
    }

    let outcome = match matches.subcommand() {
        Some(("mc", sub_matches)) => run_monte_carlo(sub_matches),
        _ => run_filter(&matches),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
