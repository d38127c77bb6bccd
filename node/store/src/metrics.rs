use std::time::Duration;

use vise::{Buckets, Counter, EncodeLabelValue, Histogram, LabeledFamily, Metrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub(crate) enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub(crate) fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub(crate) enum ReadResult {
    Hit,
    Miss,
    Error,
    VerificationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue)]
#[metrics(rename_all = "snake_case")]
pub(crate) enum Method {
    Put,
    Get,
}

#[derive(Debug, Metrics)]
#[metrics(prefix = "da_gateway")]
pub(crate) struct StoreMetrics {
    /// Latency of a single secondary write, including retries.
    #[metrics(labels = ["backend", "outcome"], buckets = Buckets::LATENCIES)]
    pub secondary_write_latency: LabeledFamily<(&'static str, Outcome), Histogram<Duration>, 2>,
    #[metrics(labels = ["backend", "outcome"], buckets = Buckets::LATENCIES)]
    pub secondary_read_latency: LabeledFamily<(&'static str, Outcome), Histogram<Duration>, 2>,
    #[metrics(labels = ["backend", "result"])]
    pub secondary_read_result: LabeledFamily<(&'static str, ReadResult), Counter, 2>,
    #[metrics(labels = ["method", "outcome"])]
    pub manager_requests: LabeledFamily<(Method, Outcome), Counter, 2>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<StoreMetrics> = vise::Global::new();
