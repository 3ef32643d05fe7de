//! Push-based observability for tickwatch
//!
//! Metrics leave the process as outbound data only. There is no HTTP
//! endpoint; the reporter prints a `METRICS_JSON:` line to stdout on a
//! fixed interval, and the Prometheus registry can be rendered on demand.

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::MetricsReporter;
