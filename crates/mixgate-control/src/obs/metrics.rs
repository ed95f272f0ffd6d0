//! Metrics registry for the policy client.
//!
//! Labels are flattened into sorted key vectors so rendering order is
//! deterministic. Histogram buckets are fixed in microseconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 when never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<Vec<(String, String)>, AtomicI64>,
}

impl GaugeVec {
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

// 1ms .. 5s, policy calls cross the network
const BUCKETS_MICROS: [u64; 9] = [
    1_000, 5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 1_000_000, 5_000_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration into cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let labels = label_str(r.key());
            let prefix = if labels.is_empty() {
                String::new()
            } else {
                format!("{},", labels)
            };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, labels, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, count);
        }
    }
}

/// Policy client metrics. Label `call` is one of `check`, `report`, `quota`.
#[derive(Default)]
pub struct ControlMetrics {
    /// Completed calls by `call` and final `code`.
    pub calls: CounterVec,
    /// Unavailable transports turned into success.
    pub fail_open: CounterVec,
    /// Calls skipped locally by `call` and `reason`.
    pub skipped: CounterVec,
    pub in_flight: GaugeVec,
    pub transport_duration: HistogramVec, // micros
}

impl ControlMetrics {
    /// Track one spawned call until the returned guard is dropped.
    pub fn start_call(self: &Arc<Self>, call: &'static str) -> InFlightGuard {
        self.in_flight.add(&[("call", call)], 1);
        InFlightGuard {
            metrics: Arc::clone(self),
            call,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.calls.render("mixgate_calls_total", &mut out);
        self.fail_open.render("mixgate_fail_open_total", &mut out);
        self.skipped.render("mixgate_skipped_calls_total", &mut out);
        self.in_flight.render("mixgate_calls_in_flight", &mut out);
        self.transport_duration
            .render("mixgate_transport_duration_micros", &mut out);
        out
    }
}

/// Decrements the in-flight gauge on drop, including when a call is aborted.
pub struct InFlightGuard {
    metrics: Arc<ControlMetrics>,
    call: &'static str,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics.in_flight.add(&[("call", self.call)], -1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_labels_are_order_independent() {
        let m = ControlMetrics::default();
        m.calls.inc(&[("call", "check"), ("code", "OK")]);
        m.calls.inc(&[("code", "OK"), ("call", "check")]);
        assert_eq!(m.calls.get(&[("call", "check"), ("code", "OK")]), 2);
    }

    #[test]
    fn guard_balances_gauge() {
        let m = Arc::new(ControlMetrics::default());
        {
            let _g = m.start_call("quota");
            assert_eq!(m.in_flight.get(&[("call", "quota")]), 1);
        }
        assert_eq!(m.in_flight.get(&[("call", "quota")]), 0);
    }

    #[test]
    fn render_contains_histogram_series() {
        let m = ControlMetrics::default();
        m.transport_duration
            .observe(&[("call", "check")], Duration::from_millis(3));
        let text = m.render();
        assert!(text.contains("mixgate_transport_duration_micros_bucket{call=\"check\",le=\"1000\"} 0"));
        assert!(text.contains("mixgate_transport_duration_micros_bucket{call=\"check\",le=\"5000\"} 1"));
        assert!(text.contains("mixgate_transport_duration_micros_count{call=\"check\"} 1"));
    }
}
