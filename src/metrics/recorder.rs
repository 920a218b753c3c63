//! Metrics recording implementation using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec,
    Encoder, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Trait for recording desk metrics.
pub trait MetricsRecorder: Send + Sync + 'static {
    /// Records a finished navigation attempt and how long it took.
    fn record_navigation(&self, outcome: &str, duration_secs: f64);

    /// Records a role-route materialization.
    fn record_materialization(&self, result: &str);

    /// Records a login attempt.
    fn record_login(&self, result: &str);

    /// Records a session teardown (`logout` or `reset`).
    fn record_session_reset(&self, kind: &str);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    navigation_attempts_total: CounterVec,
    navigation_duration_seconds: HistogramVec,

    route_materializations_total: CounterVec,

    login_attempts_total: CounterVec,
    session_resets_total: CounterVec,
}

impl Metrics {
    /// Creates a new metrics instance with its own Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let navigation_attempts_total = register_counter_vec_with_registry!(
            Opts::new(
                "navigation_attempts_total",
                "Navigation attempts by outcome"
            ),
            &["outcome"],
            registry.clone()
        )
        .expect("Failed to register navigation_attempts_total");

        let navigation_duration_seconds = register_histogram_vec_with_registry!(
            "navigation_duration_seconds",
            "Navigation attempt duration in seconds",
            &["outcome"],
            vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
            registry.clone()
        )
        .expect("Failed to register navigation_duration_seconds");

        let route_materializations_total = register_counter_vec_with_registry!(
            Opts::new(
                "route_materializations_total",
                "Role route materializations by result"
            ),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register route_materializations_total");

        let login_attempts_total = register_counter_vec_with_registry!(
            Opts::new("login_attempts_total", "Login attempts by result"),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register login_attempts_total");

        let session_resets_total = register_counter_vec_with_registry!(
            Opts::new("session_resets_total", "Session teardowns by kind"),
            &["kind"],
            registry.clone()
        )
        .expect("Failed to register session_resets_total");

        Metrics {
            registry,
            navigation_attempts_total,
            navigation_duration_seconds,
            route_materializations_total,
            login_attempts_total,
            session_resets_total,
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            return format!("# failed to encode metrics: {}\n", e);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Current value of a labelled counter, for assertions and the shell.
    pub fn counter_value(&self, name: &str, label: &str) -> f64 {
        let vec = match name {
            "navigation_attempts_total" => &self.navigation_attempts_total,
            "route_materializations_total" => &self.route_materializations_total,
            "login_attempts_total" => &self.login_attempts_total,
            "session_resets_total" => &self.session_resets_total,
            _ => return 0.0,
        };
        vec.get_metric_with_label_values(&[label])
            .map(|c| c.get())
            .unwrap_or(0.0)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_navigation(&self, outcome: &str, duration_secs: f64) {
        self.navigation_attempts_total
            .with_label_values(&[outcome])
            .inc();
        self.navigation_duration_seconds
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    fn record_materialization(&self, result: &str) {
        self.route_materializations_total
            .with_label_values(&[result])
            .inc();
    }

    fn record_login(&self, result: &str) {
        self.login_attempts_total.with_label_values(&[result]).inc();
    }

    fn record_session_reset(&self, kind: &str) {
        self.session_resets_total.with_label_values(&[kind]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_render() {
        let metrics = Metrics::new();
        metrics.record_navigation("allowed", 0.01);
        metrics.record_navigation("allowed", 0.02);
        metrics.record_navigation("redirected", 0.0);
        metrics.record_login("success");

        assert_eq!(metrics.counter_value("navigation_attempts_total", "allowed"), 2.0);
        assert_eq!(metrics.counter_value("navigation_attempts_total", "replayed"), 0.0);
        assert_eq!(metrics.counter_value("login_attempts_total", "success"), 1.0);

        let text = metrics.render();
        assert!(text.contains("navigation_attempts_total{outcome=\"redirected\"} 1"));
        assert!(text.contains("navigation_duration_seconds_bucket"));
    }
}
