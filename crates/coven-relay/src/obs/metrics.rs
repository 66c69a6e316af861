//! Relay counters.
//!
//! No external exporter: counters and gauges with dynamic labels are backed by
//! `DashMap` + atomics and rendered in Prometheus text format on demand.
//! Label sets are sorted so the same labels always hit the same slot.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Delivery paths used as the `path` label.
pub mod path {
    /// Hand-off to the hosting application's listener.
    pub const NOTIFY: &str = "notify";
    /// Peer-initiated fan-out.
    pub const BROADCAST: &str = "broadcast";
    /// Peer-initiated addressed delivery.
    pub const UNICAST: &str = "unicast";
    /// `Server::send`.
    pub const SERVER_SEND: &str = "server_send";
    /// `Server::broadcast`.
    pub const SERVER_BROADCAST: &str = "server_broadcast";
}

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
        let counter = self.map.entry(label_key(labels)).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never touched).
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
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn sub(&self, v: i64) {
        self.value.fetch_sub(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge\n{} {}", name, name, self.get());
    }
}

#[derive(Default)]
pub struct RelayMetrics {
    deliveries: CounterVec,
    route_denials: CounterVec,
    unresolved_targets: AtomicU64,
    listener_failures: AtomicU64,
    connections: AtomicU64,
    connected_peers: Gauge,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivery(&self, path: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "failed" };
        self.deliveries.inc(&[("path", path), ("outcome", outcome)]);
    }

    pub fn route_denied(&self, path: &str) {
        self.route_denials.inc(&[("path", path)]);
    }

    pub fn unresolved_target(&self) {
        self.unresolved_targets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn listener_failure(&self) {
        self.listener_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn peer_connected(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
        self.connected_peers.inc();
    }

    pub fn peer_disconnected(&self) {
        self.connected_peers.dec();
    }

    pub fn peers_dropped(&self, n: usize) {
        self.connected_peers.sub(n as i64);
    }

    /// Delivery attempts on `path`, successful or not.
    pub fn delivery_attempts(&self, path: &str) -> u64 {
        self.deliveries(path, true) + self.deliveries(path, false)
    }

    pub fn deliveries(&self, path: &str, ok: bool) -> u64 {
        let outcome = if ok { "ok" } else { "failed" };
        self.deliveries.get(&[("path", path), ("outcome", outcome)])
    }

    pub fn route_denials(&self, path: &str) -> u64 {
        self.route_denials.get(&[("path", path)])
    }

    pub fn unresolved_targets(&self) -> u64 {
        self.unresolved_targets.load(Ordering::Relaxed)
    }

    pub fn listener_failures(&self) -> u64 {
        self.listener_failures.load(Ordering::Relaxed)
    }

    pub fn connections_total(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn connected_peers(&self) -> i64 {
        self.connected_peers.get()
    }

    /// Render everything in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.deliveries.render("coven_deliveries_total", &mut out);
        self.route_denials.render("coven_route_denials_total", &mut out);
        let _ = writeln!(
            out,
            "# TYPE coven_unresolved_targets_total counter\ncoven_unresolved_targets_total {}",
            self.unresolved_targets()
        );
        let _ = writeln!(
            out,
            "# TYPE coven_listener_failures_total counter\ncoven_listener_failures_total {}",
            self.listener_failures()
        );
        let _ = writeln!(
            out,
            "# TYPE coven_connections_total counter\ncoven_connections_total {}",
            self.connections_total()
        );
        self.connected_peers.render("coven_connected_peers", &mut out);
        out
    }
}
