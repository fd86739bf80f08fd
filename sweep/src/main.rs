use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod context;
mod format;
mod logging;

use commands::clean::CleanOptions;
use commands::clean::handlers::{EXIT_FAILURE, EXIT_USAGE};

/// Sweep - Container Registry Tag Cleaner
///
/// Deletes old tags from Scaleway container registry namespaces, keeping the
/// newest ones and anything younger than a grace period.
#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Scaleway secret key used to authenticate against the registry
    #[arg(long, value_name = "SECRET", env = "SCW_SECRET_KEY", hide_env_values = true)]
    scw_secret_key: String,

    /// Registry region: fr-par, nl-ams, pl-waw
    #[arg(long, value_name = "REGION", env = "SCW_REGION")]
    region: Option<String>,

    /// Registry API base URL, instead of a region
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Namespace to clean (can be repeated)
    #[arg(short, long = "namespace", value_name = "NAMESPACE", required = true, num_args = 1..)]
    namespaces: Vec<String>,

    /// Minimum number of tags to keep per image
    #[arg(short, long, value_name = "NUMBER")]
    keep: Option<usize>,

    /// Delete selected tags older than this duration, e.g. '48hr', '3600s', '24hr30m'
    #[arg(short, long, value_name = "DURATION")]
    grace: Option<String>,

    /// Only tags whose name matches this regular expression can be deleted
    #[arg(short, long, value_name = "REGEX")]
    pattern: Option<String>,

    /// Never delete tags with this status (can be repeated, default: deleting)
    #[arg(long = "exclude-status", value_name = "STATUS")]
    exclude_statuses: Vec<String>,

    /// Print the tags that would be deleted without deleting them
    #[arg(long)]
    dry_run: bool,

    /// Log the responses of the registry API
    #[arg(long)]
    debug: bool,

    /// Output format: pretty, json, yaml
    #[arg(short, long, default_value = "pretty", value_parser = ["pretty", "json", "yaml"])]
    format: String,

    /// Control colored output: auto, always, never
    #[arg(long, default_value = "auto", value_parser = ["auto", "always", "never"])]
    color: String,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: <config dir>/sweep/config.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Parses the command line.
    ///
    /// `--base-url` replaces a region read from `SCW_REGION`; giving both
    /// `--region` and `--base-url` as flags is an error.
    fn parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut command = Self::command();
        let matches = command.try_get_matches_from_mut(args)?;
        let mut cli = Self::from_arg_matches(&matches)?;

        if cli.base_url.is_some() && cli.region.is_some() {
            if matches.value_source("region") == Some(ValueSource::CommandLine) {
                return Err(command.error(
                    ErrorKind::ArgumentConflict,
                    "the argument '--region <REGION>' cannot be used with '--base-url <URL>'",
                ));
            }
            cli.region = None;
        }
        Ok(cli)
    }

    fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            secret_key: self.scw_secret_key.clone(),
            region: self.region.clone(),
            base_url: self.base_url.clone(),
            namespaces: self.namespaces.clone(),
            keep: self.keep,
            grace: self.grace.clone(),
            pattern: self.pattern.clone(),
            exclude_statuses: self.exclude_statuses.clone(),
            dry_run: self.dry_run,
            debug: self.debug,
            format: format::OutputFormat::from(self.format.as_str()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());
    let verbosity = context::VerbosityLevel::from_count(cli.verbose);

    // Build context with precedence: defaults > config file > env vars > CLI flags
    let ctx = match context::AppContext::build(
        cli.config.as_deref(),
        format::ColorChoice::from(cli.color.as_str()),
        verbosity,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            format::create_formatter(format::ColorChoice::from(cli.color.as_str()))
                .error(&e.to_string());
            return ExitCode::from(EXIT_USAGE);
        }
    };
    let formatter = format::create_formatter(ctx.color);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            formatter.error(&format!("Failed to start async runtime: {}", e));
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let options = cli.clean_options();
    let subscriber = logging::subscriber(verbosity, cli.debug);
    let status = tracing::subscriber::with_default(subscriber, || {
        runtime.block_on(commands::clean::handlers::handle_clean(
            &ctx,
            &options,
            formatter.as_ref(),
        ))
    });

    ExitCode::from(status)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
