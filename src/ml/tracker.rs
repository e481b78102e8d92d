// ============================================================
// Layer 5 — Validation Metric Tracker
// ============================================================
// Follows the configured metric across epochs: remembers the best
// value and when it happened, counts consecutive epochs without a
// strict improvement and says when patience has run out.
//
// The best value starts at the worst value for the metric's
// direction, so the first finite observation always improves.

use crate::domain::metric::ValidationMetric;

#[derive(Debug, Clone)]
pub struct MetricTracker {
    metric:     ValidationMetric,
    patience:   Option<usize>,
    best:       f64,
    best_epoch: Option<usize>,
    stale:      usize,
    history:    Vec<f64>,
}

impl MetricTracker {
    pub fn new(metric: ValidationMetric, patience: Option<usize>) -> Self {
        Self {
            metric,
            patience,
            best: metric.direction().worst(),
            best_epoch: None,
            stale: 0,
            history: Vec::new(),
        }
    }

    /// Record the value of `epoch`; true on strict improvement.
    pub fn observe(&mut self, epoch: usize, value: f64) -> bool {
        self.history.push(value);
        let improved = self.metric.direction().improves(value, self.best);
        if improved {
            self.best       = value;
            self.best_epoch = Some(epoch);
            self.stale      = 0;
        } else {
            self.stale += 1;
        }
        improved
    }

    /// Patience ran out.
    pub fn exhausted(&self) -> bool {
        self.patience.is_some_and(|p| self.stale >= p)
    }

    pub fn metric(&self) -> ValidationMetric {
        self.metric
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn stale_epochs(&self) -> usize {
        self.stale
    }

    /// Observed values, one per epoch.
    pub fn history(&self) -> &[f64] {
        &self.history
    }
}
