pub mod collector;
pub mod report;

use mongodb::bson::Bson;

pub use collector::aggregate;

/// The three gauges produced by one sampling run.
/// Durations are in milliseconds, as recorded by the profiler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlowQueryMetrics {
    pub count: u64,
    pub total_time: f64,
    pub average_time: f64,
}

impl SlowQueryMetrics {
    /// `{count: 0, total_time: 0, average_time: 0}`
    pub const fn empty() -> Self {
        Self {
            count: 0,
            total_time: 0.0,
            average_time: 0.0,
        }
    }

    /// Name/value pairs in reporting order.
    pub fn values(&self) -> [(&'static str, f64); 3] {
        [
            ("count", self.count as f64),
            ("total_time", self.total_time),
            ("average_time", self.average_time),
        ]
    }
}

/// The numeric shapes a profiler `millis` field arrives in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Millis {
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// Absent, or not a number we know how to read.
    Other,
}

impl Millis {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int32(v) => f64::from(v),
            Self::Int64(v) => v as f64,
            Self::Double(v) => v,
            Self::Other => 0.0,
        }
    }
}

impl From<Option<&Bson>> for Millis {
    fn from(value: Option<&Bson>) -> Self {
        match value {
            Some(Bson::Int32(v)) => Self::Int32(*v),
            Some(Bson::Int64(v)) => Self::Int64(*v),
            Some(Bson::Double(v)) => Self::Double(*v),
            _ => Self::Other,
        }
    }
}
