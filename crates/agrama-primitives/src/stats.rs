//! Per-primitive call statistics (spec §4.F: "count, sum, sum-of-squares,
//! max").

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub count: u64,
    pub sum_ns: u64,
    pub sum_sq_ns: f64,
    pub max_ns: u64,
}

impl StatsSnapshot {
    pub fn mean_ns(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ns as f64 / self.count as f64
        }
    }
}

#[derive(Default)]
struct Inner {
    count: u64,
    sum_ns: u64,
    sum_sq_ns: f64,
    max_ns: u64,
}

/// Running statistics for one primitive's elapsed-time measurements.
pub struct PrimitiveStats {
    inner: Mutex<Inner>,
}

impl PrimitiveStats {
    pub fn new() -> Self {
        PrimitiveStats {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn record(&self, elapsed_ns: u64) {
        let mut inner = self.inner.lock();
        inner.count += 1;
        inner.sum_ns += elapsed_ns;
        inner.sum_sq_ns += (elapsed_ns as f64).powi(2);
        inner.max_ns = inner.max_ns.max(elapsed_ns);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            count: inner.count,
            sum_ns: inner.sum_ns,
            sum_sq_ns: inner.sum_sq_ns,
            max_ns: inner.max_ns,
        }
    }
}

impl Default for PrimitiveStats {
    fn default() -> Self {
        Self::new()
    }
}
