//! One-shot expansion against the configured store.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::NaiveDate;

use gathercal_server::{ExpansionReport, InstanceMaterializer};
use gathercal_store::EventStore;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Runs the materializer once for `today`.
pub async fn expand(
    store: Arc<dyn EventStore>,
    config: &ClientConfig,
    today: NaiveDate,
) -> ClientResult<ExpansionReport> {
    let materializer = InstanceMaterializer::new(store, config.to_server_config().materializer);
    Ok(materializer.run(today).await?)
}

/// Lines describing templates that were skipped or failed.
pub fn warnings(report: &ExpansionReport) -> Vec<String> {
    let unrecognized = report.unrecognized.iter().map(|u| {
        format!(
            "warning: template {} has unrecognized rule `{}`",
            u.template_id, u.rule
        )
    });
    let failures = report.failures.iter().map(|f| {
        format!(
            "warning: template {} failed{}: {}",
            f.template_id,
            if f.retryable { " (retryable)" } else { "" },
            f.error
        )
    });
    unrecognized.chain(failures).collect()
}

/// Writes the `{created, skipped}` summary to `out` and each warning once to `err`.
pub fn write_report(
    report: &ExpansionReport,
    out: &mut impl Write,
    err: &mut impl Write,
) -> ClientResult<()> {
    for line in warnings(report) {
        writeln!(err, "{}", line)?;
    }
    writeln!(out, "{}", serde_json::to_string(&report.summary())?)?;
    Ok(())
}

/// Expands templates and prints the summary.
pub async fn run(config: &ClientConfig, today: Option<NaiveDate>) -> ClientResult<()> {
    let store = super::as_dyn(super::open_store(config).await?);
    let today = super::today_or_now(today);
    let report = expand(store, config, today).await?;

    write_report(&report, &mut io::stdout().lock(), &mut io::stderr().lock())
}
