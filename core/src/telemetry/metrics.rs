use std::sync::Mutex;

/// Record counts of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub collected: usize,
    pub removed: usize,
    pub retained: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_collected(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.collected += count;
            metrics.retained += count;
        }
    }

    pub fn record_removed(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.removed += count;
            metrics.retained = metrics.retained.saturating_sub(count);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
