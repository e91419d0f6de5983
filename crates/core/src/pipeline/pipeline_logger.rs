use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples the use case from specific output mechanisms (stdout, log
/// crate, a test recorder) so each caller can observe pipeline behavior
/// without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Report per-face progress within one image.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named pipeline stage took for one image.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. face count).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that forwards events to the `log` facade and keeps
/// per-stage timings and metrics for a summary report.
pub struct SummaryPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    messages: Vec<String>,
}

impl SummaryPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!("Pipeline summary ({elapsed_ms:.1}ms total):")];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:16}: {total_ms:8.1}ms over {} run(s) ({pct:4.1}%)",
                durations.len()
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let total: f64 = self.metrics[name].iter().sum();
            lines.push(format!("  {name}: {total}"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for SummaryPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for SummaryPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        log::debug!("Annotating face {current}/{total}");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("{stage} took {duration_ms:.2}ms");
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
