pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod sources;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::io::Write;

use anyhow::Context;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::{config::Settings, telemetry};
use crate::services::parse_client::ParseClient;
use crate::sources::{
    document::DocumentReportSource, relational::RelationalReportSource, ReportParams, ReportSource,
};
use crate::tasks::comparison::ComparisonHarness;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("comparison", %run_id);
    compare(&settings).instrument(span).await
}

async fn compare(settings: &Settings) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "\n{}", "=".repeat(80))?;
    writeln!(stdout, "ONLINE EDUCATION PLATFORM - Database Comparison Tool")?;
    writeln!(stdout, "Comparing Classical SQL vs Back4app BaaS")?;
    writeln!(stdout, "{}\n", "=".repeat(80))?;

    let relational = RelationalReportSource::connect(settings.database())
        .await
        .context("Cannot continue without SQL database connection")?;
    writeln!(stdout, "✓ Connected to PostgreSQL database")?;
    tracing::info!(
        environment = settings.runtime().environment.as_str(),
        "PostgreSQL connected"
    );

    let document = connect_document_source(settings, &mut stdout).await?;
    let params = ReportParams { min_missing: settings.harness().min_missing };
    let mut harness = ComparisonHarness::new(
        &relational,
        document.as_ref().map(|source| source as &dyn ReportSource),
        params,
        settings.harness().query_timeout(),
    );

    let outcome: std::io::Result<Option<&'static str>> = tokio::select! {
        result = harness.run_all(&mut stdout) => result.map(|()| None),
        signal = core::shutdown::interrupted() => Ok(Some(signal)),
    };

    relational.close().await;
    if let Some(signal) = outcome? {
        tracing::warn!(signal, "Comparison interrupted");
        writeln!(stdout, "\n✗ Interrupted by {signal}; stopping early")?;
        writeln!(stdout, "✓ PostgreSQL connection closed")?;
        return Ok(());
    }
    writeln!(stdout, "\n✓ PostgreSQL connection closed")?;

    let results = harness.results();
    tracing::info!(
        reports = results.len(),
        compared = results.values().filter(|result| result.speed().is_some()).count(),
        sql_rows = results.values().map(|result| result.relational.row_count()).sum::<usize>(),
        "Comparison finished"
    );

    if let Some(snapshot) = core::metrics::render() {
        writeln!(stdout, "\n{snapshot}")?;
    }
    writeln!(stdout, "\n✓ Comparison complete!")?;
    Ok(())
}

/// Any failure here degrades the run to relational-only reporting.
async fn connect_document_source<W: Write>(
    settings: &Settings,
    out: &mut W,
) -> anyhow::Result<Option<DocumentReportSource>> {
    if !settings.baas().is_configured() {
        writeln!(out, "Warning: Back4app credentials are not configured")?;
        writeln!(out, "Proceeding with SQL tests only...\n")?;
        return Ok(None);
    }

    let source = match DocumentReportSource::from_settings(settings.baas()) {
        Ok(source) => source,
        Err(err) => {
            writeln!(out, "Warning: Could not connect to Back4app: {err:#}")?;
            writeln!(out, "Proceeding with SQL tests only...\n")?;
            return Ok(None);
        }
    };

    match source.check_connection().await {
        Ok(()) => {
            writeln!(out, "✓ Configured Back4app connection")?;
            Ok(Some(source))
        }
        Err(err) => {
            writeln!(out, "Warning: Could not connect to Back4app: {err}")?;
            writeln!(out, "Proceeding with SQL tests only...\n")?;
            Ok(None)
        }
    }
}

pub async fn run_auth_smoke() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let baas = settings.baas();
    if baas.app_id.is_empty() {
        anyhow::bail!("BACK4APP_APP_ID is not set");
    }
    let client = ParseClient::from_settings(baas)?;
    let mut stdout = std::io::stdout();
    let steps = tasks::auth_smoke::run(&client, baas, &mut stdout).await?;

    let failed = steps.iter().filter(|step| step.status.is_none()).count();
    tracing::info!(steps = steps.len(), unreachable = failed, "Auth smoke test finished");
    Ok(())
}
