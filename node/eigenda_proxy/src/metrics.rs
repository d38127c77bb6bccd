use std::time::Duration;

use vise::{Buckets, Histogram, LabeledFamily, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "da_gateway_api")]
pub(crate) struct ApiMetrics {
    /// Latency of handling a request, including failed ones.
    #[metrics(labels = ["method"], buckets = Buckets::LATENCIES)]
    pub call: LabeledFamily<&'static str, Histogram<Duration>>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<ApiMetrics> = vise::Global::new();
