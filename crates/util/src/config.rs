use std::{env, fmt, path::PathBuf};

use crate::{
    env_value, DEFAULT_ORDERS_FILE, DEFAULT_PRODUCTS_FILE, DEFAULT_REPORT_TO, DEFAULT_SAMPLES,
    METRICS_FILE_ENV, ORDERS_FILE_ENV, PRODUCTS_FILE_ENV, REPORT_TO_ENV, STDOUT_SENTINEL,
};

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Process-wide settings resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub metrics_file: Option<PathBuf>,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&app_env)?;
        let metrics_file = env_value(METRICS_FILE_ENV).map(PathBuf::from);

        Ok(Self {
            environment,
            metrics_file,
        })
    }
}

/// Where the report is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    Stdout,
    File(PathBuf),
}

impl ReportTarget {
    /// `-` selects standard output, anything else is a file path.
    pub fn parse(value: &str) -> Self {
        if value == STDOUT_SENTINEL {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

impl fmt::Display for ReportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Outcome of command line parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<T> {
    Run(T),
    Help,
}

/// Input and output locations of a report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub products_file: PathBuf,
    pub orders_file: PathBuf,
    pub report_to: ReportTarget,
}

impl ReportConfig {
    pub const USAGE: &'static str = "\
usage: dept-report [-p PRODUCTS] [-o ORDERS] [-r REPORT]

options:
  -p, --products-file PATH   products catalog (default: products.csv)
  -o, --orders-file PATH     order lines (default: order_products.csv)
  -r, --report-to PATH       report destination, '-' for stdout (default: report.csv)
  -h, --help                 show this message";

    /// Parses command line arguments (without the program name) on top of
    /// environment defaults.
    pub fn from_args<I, S>(args: I) -> Result<Invocation<Self>, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parsed = parse_options(args, &REPORT_OPTIONS)?;
        if parsed.help {
            return Ok(Invocation::Help);
        }
        if let Some(extra) = parsed.positionals.into_iter().next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }

        let mut builder = ReportConfigBuilder::default();
        for (option, value) in parsed.values {
            match option {
                "--products-file" => builder.products_file(value)?,
                "--orders-file" => builder.orders_file(value)?,
                "--report-to" => builder.report_to(ReportTarget::parse(&value))?,
                other => return Err(ConfigError::UnknownOption(other.to_string())),
            };
        }

        Ok(Invocation::Run(builder.build()))
    }
}

/// Collects report options, rejecting any option assigned twice.
#[derive(Debug, Clone, Default)]
pub struct ReportConfigBuilder {
    products_file: Option<PathBuf>,
    orders_file: Option<PathBuf>,
    report_to: Option<ReportTarget>,
}

impl ReportConfigBuilder {
    pub fn products_file(&mut self, path: impl Into<PathBuf>) -> Result<&mut Self, ConfigError> {
        assign_once(&mut self.products_file, path.into(), "--products-file")?;
        Ok(self)
    }

    pub fn orders_file(&mut self, path: impl Into<PathBuf>) -> Result<&mut Self, ConfigError> {
        assign_once(&mut self.orders_file, path.into(), "--orders-file")?;
        Ok(self)
    }

    pub fn report_to(&mut self, target: ReportTarget) -> Result<&mut Self, ConfigError> {
        assign_once(&mut self.report_to, target, "--report-to")?;
        Ok(self)
    }

    /// Fills unset options from the environment, then from built-in defaults.
    pub fn build(self) -> ReportConfig {
        ReportConfig {
            products_file: self
                .products_file
                .unwrap_or_else(|| env_path(PRODUCTS_FILE_ENV, DEFAULT_PRODUCTS_FILE)),
            orders_file: self
                .orders_file
                .unwrap_or_else(|| env_path(ORDERS_FILE_ENV, DEFAULT_ORDERS_FILE)),
            report_to: self.report_to.unwrap_or_else(|| {
                ReportTarget::parse(
                    &env_value(REPORT_TO_ENV).unwrap_or_else(|| DEFAULT_REPORT_TO.to_string()),
                )
            }),
        }
    }
}

/// Settings of the line sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleConfig {
    pub data_file: PathBuf,
    pub samples: usize,
}

impl SampleConfig {
    pub const USAGE: &'static str = "\
usage: dept-sample FILE [-s SAMPLES]

Prints the header of FILE and a random sample of its lines in file order.

options:
  -s, --samples N   sample size (default: 100 lines)
  -h, --help        show this message";

    pub fn from_args<I, S>(args: I) -> Result<Invocation<Self>, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parsed = parse_options(args, &SAMPLE_OPTIONS)?;
        if parsed.help {
            return Ok(Invocation::Help);
        }

        let mut samples = None;
        for (option, value) in parsed.values {
            let count = value
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue {
                    option,
                    value: value.clone(),
                })?;
            assign_once(&mut samples, count, option)?;
        }

        let mut positionals = parsed.positionals.into_iter();
        let data_file = positionals
            .next()
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingArgument("FILE"))?;
        if let Some(extra) = positionals.next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }

        Ok(Invocation::Run(Self {
            data_file,
            samples: samples.unwrap_or(DEFAULT_SAMPLES),
        }))
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    PathBuf::from(env_value(var).unwrap_or_else(|| default.to_string()))
}

fn assign_once<T>(slot: &mut Option<T>, value: T, option: &'static str) -> Result<(), ConfigError> {
    if slot.is_some() {
        return Err(ConfigError::DuplicateOption(option));
    }
    *slot = Some(value);
    Ok(())
}

/// Command line spelling of one valued option.
struct OptionSpec {
    name: &'static str,
    short: &'static str,
    aliases: &'static [&'static str],
}

impl OptionSpec {
    fn matches(&self, flag: &str) -> bool {
        flag == self.name || flag == self.short || self.aliases.contains(&flag)
    }
}

const REPORT_OPTIONS: [OptionSpec; 3] = [
    OptionSpec {
        name: "--products-file",
        short: "-p",
        aliases: &["--prod-db"],
    },
    OptionSpec {
        name: "--orders-file",
        short: "-o",
        aliases: &["--order-prod-db"],
    },
    OptionSpec {
        name: "--report-to",
        short: "-r",
        aliases: &[],
    },
];

const SAMPLE_OPTIONS: [OptionSpec; 1] = [OptionSpec {
    name: "--samples",
    short: "-s",
    aliases: &[],
}];

#[derive(Debug, Default)]
struct ParsedArgs {
    values: Vec<(&'static str, String)>,
    positionals: Vec<String>,
    help: bool,
}

fn parse_options<I, S>(args: I, specs: &[OptionSpec]) -> Result<ParsedArgs, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = ParsedArgs::default();
    let args: Vec<String> = args.into_iter().map(Into::into).collect();

    // Help wins over every other argument, valid or not.
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        parsed.help = true;
        return Ok(parsed);
    }

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == STDOUT_SENTINEL || !arg.starts_with('-') {
            parsed.positionals.push(arg);
            continue;
        }

        let (flag, inline) = split_inline_value(&arg);

        let spec = specs
            .iter()
            .find(|spec| spec.matches(&flag))
            .ok_or_else(|| ConfigError::UnknownOption(flag.clone()))?;

        let value = match inline {
            Some(value) => value,
            None => match args.next() {
                Some(next) if next == STDOUT_SENTINEL || !next.starts_with('-') => next,
                _ => return Err(ConfigError::MissingValue(spec.name)),
            },
        };
        parsed.values.push((spec.name, value));
    }

    Ok(parsed)
}

/// Splits `--name=value` and joined short forms such as `-pfile.csv`.
fn split_inline_value(arg: &str) -> (String, Option<String>) {
    if arg.starts_with("--") {
        return match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.to_string(), None),
        };
    }
    match (arg.get(..2), arg.get(2..)) {
        (Some(flag), Some(value)) if !value.is_empty() => {
            (flag.to_string(), Some(value.to_string()))
        }
        _ => (arg.to_string(), None),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidEnvironment(String),
    DuplicateOption(&'static str),
    UnknownOption(String),
    MissingValue(&'static str),
    MissingArgument(&'static str),
    UnexpectedArgument(String),
    InvalidValue { option: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::DuplicateOption(option) => {
                write!(f, "option {option} may only be given once")
            }
            Self::UnknownOption(option) => write!(f, "unknown option {option}"),
            Self::MissingValue(option) => write!(f, "option {option} requires a value"),
            Self::MissingArgument(name) => write!(f, "missing required argument {name}"),
            Self::UnexpectedArgument(value) => write!(f, "unexpected argument '{value}'"),
            Self::InvalidValue { option, value } => {
                write!(f, "invalid value '{value}' for option {option}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
