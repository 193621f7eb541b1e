//! Prometheus metrics registry for the provider plugin.
//!
//! [`ProviderMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and hand it to the
//! [`Provider`](crate::provider::Provider).
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};

pub struct ProviderMetrics {
    /// Provider operations, labelled by resource type, operation and outcome.
    pub operations_total: CounterVec,
    /// Operation latency in seconds, labelled by resource type and operation.
    pub operation_duration: HistogramVec,
    /// 1 once the provider holds a configured API client.
    pub configured: Gauge,
    pub registry: Registry,
}

impl ProviderMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let operations_total = CounterVec::new(
            Opts::new(
                "logzio_provider_operations_total",
                "Provider operations by resource, operation, and outcome",
            ),
            &["resource", "operation", "outcome"],
        )?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "logzio_provider_operation_duration_seconds",
                "Provider operation latency in seconds",
            )
            .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["resource", "operation"],
        )?;

        let configured = Gauge::with_opts(Opts::new(
            "logzio_provider_configured",
            "Whether the provider has been configured with an API token",
        ))?;

        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(operation_duration.clone()))?;
        registry.register(Box::new(configured.clone()))?;

        Ok(Self {
            operations_total,
            operation_duration,
            configured,
            registry,
        })
    }

    /// Record one finished operation. `outcome` is `ok` or an error kind.
    pub fn observe(&self, resource: &str, operation: &str, outcome: &str, seconds: f64) {
        self.operations_total
            .with_label_values(&[resource, operation, outcome])
            .inc();
        self.operation_duration
            .with_label_values(&[resource, operation])
            .observe(seconds);
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
