//! Telemetry utilities for interview-scoped correlation and global subscriber management.

use std::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::Layer, layer::SubscriberExt};

use crate::config::AppConfig;

/// Interview context shared by every API call made within one diagnostic session.
#[derive(Debug, Clone)]
pub struct InterviewContext {
    pub interview_id: String,
}

task_local! {
    static ACTIVE_INTERVIEW: InterviewContext;
}

/// Errors that can occur while initializing global telemetry.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

static TELEMETRY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize global tracing/logging exactly once, wiring `log::` macros into the tracing pipeline.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if TELEMETRY_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }

    // Install log bridge first so `log::` macros route through tracing. The
    // subscriber below is registered without a second bridge.
    if let Err(err) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        eprintln!(
            "Warning: Failed to install log tracer bridge: {}. `log::` macros will not emit tracing events.",
            err
        );
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = match config.log_format.as_str() {
        "pretty" => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        _ => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        TELEMETRY_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(TelemetryInitError::Subscriber(err));
    }

    Ok(())
}

/// Execute `future` with `interview_id` attached to every API call it makes,
/// unless a call sets its own `Interview-Id` header.
pub async fn with_interview<Fut, R>(interview_id: impl Into<String>, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    let context = InterviewContext {
        interview_id: interview_id.into(),
    };
    ACTIVE_INTERVIEW.scope(context, future).await
}

/// Get the interview id active for the running task, if any.
pub fn current_interview_id() -> Option<String> {
    ACTIVE_INTERVIEW
        .try_with(|ctx| ctx.interview_id.clone())
        .ok()
}
