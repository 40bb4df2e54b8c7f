//! Metrics and tracing helpers.
//!
//! With the `metrics` feature, [`METRICS`] records executor round-trips and served
//! pages through an OpenTelemetry SDK meter. Its Prometheus exporter writes into a
//! crate-owned registry, which [`LifeguardMetrics::render`] encodes as text. With the
//! `tracing` feature, [`tracing_helpers`] provides the spans wrapped around statement
//! execution and criteria terminals.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics::SdkMeterProvider;
#[cfg(feature = "metrics")]
use prometheus::{Encoder, Registry, TextEncoder};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<LifeguardMetrics> = Lazy::new(LifeguardMetrics::init);

#[cfg(feature = "metrics")]
pub struct LifeguardMetrics {
    /// Registry the Prometheus exporter writes into; see [`render`](Self::render)
    pub registry: Registry,
    provider: SdkMeterProvider,
    pub queries_total: Counter<u64>,
    pub query_errors_total: Counter<u64>,
    pub query_duration: Histogram<f64>,
    pub pages_total: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl LifeguardMetrics {
    pub fn init() -> Self {
        let registry = Registry::new();
        let provider = match opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
        {
            Ok(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
            Err(e) => {
                // Instruments still work, nothing is exported.
                log::warn!("failed to build prometheus exporter: {e:?}");
                SdkMeterProvider::builder().build()
            }
        };
        let meter = provider.meter("lifeguard");

        let queries_total = meter
            .u64_counter("lifeguard_queries_total")
            .with_description("Total queries executed")
            .build();

        let query_errors_total = meter
            .u64_counter("lifeguard_query_errors_total")
            .with_description("Queries that returned an error")
            .build();

        let query_duration = meter
            .f64_histogram("lifeguard_query_duration_seconds")
            .with_description("Duration of queries")
            .build();

        let pages_total = meter
            .u64_counter("lifeguard_pages_total")
            .with_description("Paged criteria queries served")
            .build();

        Self {
            registry,
            provider,
            queries_total,
            query_errors_total,
            query_duration,
            pages_total,
        }
    }

    /// Current metrics in the Prometheus text exposition format, for a `/metrics`
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns `prometheus::Error` if the collected families cannot be encoded.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    pub fn record_query(&self, elapsed: std::time::Duration) {
        self.queries_total.add(1, &[]);
        self.query_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_query_error(&self) {
        self.query_errors_total.add(1, &[]);
    }

    pub fn record_page(&self) {
        self.pages_total.add(1, &[]);
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Span around one executor round-trip
    pub fn execute_query_span(sql: &str) -> Span {
        info_span!("lifeguard.execute_query", db.statement = %sql)
    }

    /// Span around one criteria terminal (`list`, `first`, `unique`, `count`, `page`)
    pub fn terminal_span(operation: &'static str, table: &'static str) -> Span {
        info_span!("lifeguard.criteria", operation, table)
    }
}
