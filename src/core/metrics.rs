use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// Outcome label is `assigned`, `unchanged` or an assignment error kind.
pub(crate) fn record_section_assignment(outcome: &'static str) {
    metrics::counter!("section_assignments_total", "outcome" => outcome).increment(1);
}

/// Outcome label is one of `created`, `updated`, `not_needed`.
pub(crate) fn record_intervention_sync(outcome: &'static str) {
    metrics::counter!("interventions_synced_total", "outcome" => outcome).increment(1);
}
