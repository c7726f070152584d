//! Minimal `GET /metrics` contract stub.
//!
//! Prometheus scraping middleware itself is out of scope (spec.md §1); this
//! is the text-exposition shape every service still needs to carry so the
//! endpoint never silently disappears. It exposes process uptime and a
//! request counter, not the full per-route histogram a production
//! deployment would add via `actix-web-prom` or similar.

use actix_web::HttpResponse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct Metrics {
    service_name: String,
    started_at: Instant,
    requests_total: AtomicU64,
}

impl Metrics {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            started_at: Instant::now(),
            requests_total: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render(&self) -> String {
        format!(
            "# HELP {service}_uptime_seconds Seconds since process start.\n\
             # TYPE {service}_uptime_seconds gauge\n\
             {service}_uptime_seconds {uptime}\n\
             # HELP {service}_requests_total Total HTTP requests handled.\n\
             # TYPE {service}_requests_total counter\n\
             {service}_requests_total {requests}\n",
            service = self.service_name,
            uptime = self.started_at.elapsed().as_secs(),
            requests = self.requests_total.load(Ordering::Relaxed),
        )
    }
}

pub async fn metrics_handler(metrics: actix_web::web::Data<Metrics>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics.render())
}
