use std::{
    env,
    io::{self, BufWriter},
    process::ExitCode,
};

use tracing::info;

use dept_report_app::telemetry;
use dept_report_core::sample_file;
use dept_report_util::{load_env_file, AppConfig, Invocation, SampleConfig};

fn main() -> ExitCode {
    load_env_file();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dept-sample: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let sample = match SampleConfig::from_args(env::args().skip(1))? {
        Invocation::Run(sample) => sample,
        Invocation::Help => {
            println!("{}", SampleConfig::USAGE);
            return Ok(());
        }
    };
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(&config)?;

    let out = BufWriter::new(io::stdout().lock());
    let written = sample_file(&sample.data_file, sample.samples, &mut rand::thread_rng(), out)?;

    info!(
        stage = "sample",
        file = %sample.data_file.display(),
        samples = written,
        "sample written"
    );
    Ok(())
}
