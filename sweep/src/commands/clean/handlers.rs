use super::*;
use crate::context::{AppContext, VerbosityLevel};
use crate::format::{OutputFormatter, format_output};
use futures::future::join_all;
use libsweep::SweepError;
use libsweep::format::format_grace;

/// Process exit status of a run
pub const EXIT_OK: u8 = 0;
/// A namespace could not be fetched or a delete failed
pub const EXIT_FAILURE: u8 = 1;
/// Invalid arguments, policy or configuration
pub const EXIT_USAGE: u8 = 2;

/// Handle a sweep run over every requested namespace
///
/// Namespaces are processed concurrently, each one planned then, unless this
/// is a dry run, executed. A namespace that fails to fetch is reported and
/// does not stop the others.
pub async fn handle_clean(
    ctx: &AppContext,
    options: &CleanOptions,
    formatter: &dyn OutputFormatter,
) -> u8 {
    let policy = match build_policy(options, &ctx.config) {
        Ok(policy) => policy,
        Err(e) => {
            formatter.error(&e.to_string());
            return EXIT_USAGE;
        }
    };

    let sweeper = match build_sweeper(options, &ctx.config) {
        Ok(sweeper) => sweeper,
        Err(e) => {
            formatter.error(&e.to_string());
            return usage_or_failure(&e);
        }
    };

    let grace = policy.grace.map(format_grace);
    if grace.is_none() {
        formatter.warning("No grace duration given, no tag will be deleted");
    }

    if ctx.shows(VerbosityLevel::Verbose) {
        if let Some(path) = &ctx.config_path {
            formatter.success(&format!("Loaded configuration from {}", path.display()));
        }
        formatter.success(&format!(
            "Using registry API {}",
            sweeper.client().base_url()
        ));
        if let Some(grace) = &grace {
            formatter.success(&format!("Selecting tags older than {}", grace));
        }
    }

    let spinner = formatter.spinner(&format!(
        "{} {} namespace(s)...",
        if options.dry_run { "Planning" } else { "Sweeping" },
        options.namespaces.len()
    ));

    let runs = options
        .namespaces
        .iter()
        .map(|namespace| sweep_namespace(&sweeper, namespace, &policy, options.dry_run));
    let reports = join_all(runs).await;

    formatter.finish_progress(spinner, "");
    sweeper.close();

    let output = SweepOutput {
        dry_run: options.dry_run,
        grace,
        namespaces: reports,
    };
    print_output(&output, options.format, formatter);

    let mut status = EXIT_OK;
    for report in &output.namespaces {
        if let Some(error) = &report.error {
            formatter.error(&format!(
                "Failed to fetch tags of namespace '{}': {}",
                report.namespace, error
            ));
            status = EXIT_FAILURE;
        }
        for failed in &report.failed {
            formatter.error(&format!(
                "Failed to delete {}: {}",
                failed.image_ref.as_deref().unwrap_or(&failed.tag_id),
                failed.error
            ));
            status = EXIT_FAILURE;
        }
        if !options.dry_run && report.is_success() && ctx.shows(VerbosityLevel::Verbose) {
            formatter.success(&format!(
                "Deleted {} tag(s) in {}",
                report.deleted.len(),
                report.namespace
            ));
        }
    }
    status
}

/// Plan one namespace and execute the plan unless this is a dry run
async fn sweep_namespace(
    sweeper: &Sweeper,
    namespace: &str,
    policy: &RetentionPolicy,
    dry_run: bool,
) -> NamespaceReport {
    let now = Utc::now();
    let plan = match sweeper.plan_at(namespace, policy, now).await {
        Ok(plan) => plan,
        Err(e) => return NamespaceReport::fetch_failed(namespace, dry_run, &e),
    };

    let report = if dry_run {
        None
    } else {
        Some(sweeper.execute(&plan).await)
    };
    NamespaceReport::from_plan(plan, report, now)
}

fn print_output(output: &SweepOutput, format: OutputFormat, formatter: &dyn OutputFormatter) {
    match format_output(output, format) {
        Ok(text) if text.is_empty() => {}
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => formatter.error(&e),
    }
}

fn usage_or_failure(error: &SweepError) -> u8 {
    if error.is_usage_error() {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}
