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

    metrics::describe_counter!("exam_wakeups_fired_total", "Exam start wake-ups delivered");
    metrics::describe_counter!("exam_feed_snapshots_total", "Exam feed snapshots published");
    metrics::describe_counter!("sessions_auto_submitted_total", "Sessions finalized at deadline");
    metrics::describe_counter!("question_image_uploads_total", "Question images stored");
    metrics::describe_counter!("sessions_started_total", "Exam sessions opened by students");
    metrics::describe_counter!("sessions_submitted_total", "Sessions submitted by students");
    metrics::describe_counter!("submissions_graded_total", "Grades recorded by admins");
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
