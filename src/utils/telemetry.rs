// file: src/utils/telemetry.rs
// description: repository run phase timing and backing-store reachability for GET /health
// reference: https://docs.rs/tracing

use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A reachable component answering slower than this is reported as degraded.
pub const SLOW_COMPONENT: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Reachability of one backing store the setup route depends on.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub component: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl ComponentHealth {
    /// Runs `check` and grades the component by its outcome and latency.
    pub async fn measure<F, E>(component: &'static str, check: F) -> Self
    where
        F: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let outcome = check.await;
        Self::from_outcome(component, outcome.map_err(|e| e.to_string()), started.elapsed())
    }

    fn from_outcome(
        component: &'static str,
        outcome: Result<(), String>,
        latency: Duration,
    ) -> Self {
        let (status, error) = match outcome {
            Ok(()) if latency > SLOW_COMPONENT => (HealthStatus::Degraded, None),
            Ok(()) => (HealthStatus::Healthy, None),
            Err(e) => (HealthStatus::Unhealthy, Some(e)),
        };

        if status != HealthStatus::Healthy {
            debug!(component, ?status, latency_ms = latency.as_millis() as u64, "Component not healthy");
        }

        Self {
            component,
            status,
            error,
            latency_ms: latency.as_millis() as u64,
        }
    }
}

/// Body of `GET /health`. The overall status is the worst component status.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealth>,
    pub version: &'static str,
}

impl HealthReport {
    pub fn new(components: Vec<ComponentHealth>) -> Self {
        let status = components
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        Self {
            status,
            components,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn is_serving(&self) -> bool {
        self.status != HealthStatus::Unhealthy
    }
}

/// Wall-clock breakdown of one repository run, logged when the run ends.
pub struct RunTimer {
    collection: String,
    started: Instant,
    phase_started: Instant,
    phases: Vec<(&'static str, Duration)>,
}

impl RunTimer {
    pub fn start(collection: &str) -> Self {
        info!(collection, "Repository run started");
        let now = Instant::now();
        Self {
            collection: collection.to_string(),
            started: now,
            phase_started: now,
            phases: Vec::new(),
        }
    }

    /// Closes the current phase and opens the next one.
    pub fn phase_done(&mut self, phase: &'static str) {
        let now = Instant::now();
        let elapsed = now - self.phase_started;
        self.phase_started = now;
        debug!(
            collection = %self.collection,
            phase,
            elapsed_ms = elapsed.as_millis() as u64,
            "Run phase complete"
        );
        self.phases.push((phase, elapsed));
    }

    pub fn phases(&self) -> &[(&'static str, Duration)] {
        &self.phases
    }

    pub fn finish(self, files_processed: usize) -> Duration {
        let total = self.started.elapsed();
        let breakdown = self
            .phases
            .iter()
            .map(|(phase, d)| format!("{} {:.2}s", phase, d.as_secs_f64()))
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            collection = %self.collection,
            files = files_processed,
            "Repository run finished in {:.2}s ({})",
            total.as_secs_f64(),
            breakdown
        );
        total
    }
}
