use std::{env, process::ExitCode};

use dept_report_app::{batch, telemetry};
use dept_report_util::{load_env_file, AppConfig, Invocation, ReportConfig};

fn main() -> ExitCode {
    load_env_file();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dept-report: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Command line problems abort before any input is opened.
    let report = match ReportConfig::from_args(env::args().skip(1))? {
        Invocation::Run(report) => report,
        Invocation::Help => {
            println!("{}", ReportConfig::USAGE);
            return Ok(());
        }
    };
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    batch::run_report(&report)?;

    if let Some(path) = &config.metrics_file {
        telemetry::export_metrics(&metrics, path)?;
    }
    Ok(())
}
