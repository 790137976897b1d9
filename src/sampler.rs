use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Document, RawDocumentBuf};
use mongodb::Client;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

use crate::config::{ConnectionParams, COLLECT_BUDGET, SAMPLING_WINDOW};
use crate::error::SamplerError;
use crate::metrics::{self, SlowQueryMetrics};
use crate::mongo_client::{self, Release, ScopedClient};

// ─── Configuration ───────────────────────────────────────────────

/// Collection the database profiler writes to.
pub const PROFILE_COLLECTION: &str = "system.profile";

/// Profiler timestamp field.
const TS_FIELD: &str = "ts";

// ─── Sampling window ─────────────────────────────────────────────

/// `(lower, upper]`. Only `lower` is sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingWindow {
    pub lower: DateTime<Utc>,
    pub upper: DateTime<Utc>,
}

impl SamplingWindow {
    pub fn ending_at(upper: DateTime<Utc>, width: Duration) -> Self {
        let width = chrono::Duration::from_std(width).unwrap_or(chrono::Duration::zero());
        Self {
            lower: upper - width,
            upper,
        }
    }

    /// `{ts: {$gt: lower}}`
    pub fn filter(&self) -> Document {
        let lower = bson::DateTime::from_millis(self.lower.timestamp_millis());
        doc! { TS_FIELD: { "$gt": lower } }
    }
}

// ─── Sampler ─────────────────────────────────────────────────────

/// Runs one connect → ping → query → aggregate pass.
#[derive(Debug, Clone)]
pub struct Sampler {
    params: ConnectionParams,
    budget: Duration,
    window: Duration,
}

impl Sampler {
    pub fn new(params: ConnectionParams) -> Self {
        Self {
            params,
            budget: COLLECT_BUDGET,
            window: SAMPLING_WINDOW,
        }
    }

    /// Override the total time budget.
    #[cfg(test)]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Collect the gauges for the window ending now.
    ///
    /// One deadline covers the whole run. The client is released on every
    /// path, including budget expiry mid-iteration.
    pub async fn collect(&self) -> Result<SlowQueryMetrics, SamplerError> {
        let target = self.params.target()?;
        let deadline = Instant::now() + self.budget;

        info!(
            host = %self.params.host,
            port = self.params.port,
            database = %self.params.database,
            authenticated = self.params.credentials().is_some(),
            "collecting slow queries"
        );

        // ── 1. Connect ──────────────────────────────────────────
        let client = timeout_at(deadline, mongo_client::connect(&target, self.budget))
            .await
            .map_err(|_| SamplerError::timed_out(self.budget))??;
        let scoped = ScopedClient::new(client);

        // ── 2. Ping, query, aggregate, then release ─────────────
        let work = self.sample(scoped.client().clone());
        let metrics = within_budget(deadline, self.budget, scoped, work).await?;
        debug!(
            count = metrics.count,
            total_time = metrics.total_time,
            average_time = metrics.average_time,
            "collection finished"
        );
        Ok(metrics)
    }

    async fn sample(&self, client: Client) -> Result<SlowQueryMetrics, SamplerError> {
        mongo_client::ping(&client).await?;

        let window = SamplingWindow::ending_at(Utc::now(), self.window);
        debug!(lower = %window.lower, upper = %window.upper, "sampling window");

        let cursor = client
            .database(&self.params.database)
            .collection::<RawDocumentBuf>(PROFILE_COLLECTION)
            .find(window.filter())
            .await
            .map_err(|source| SamplerError::Query { source })?;

        metrics::aggregate(cursor).await
    }
}

/// Runs `work` until `deadline`, then releases `guard` whatever happened.
/// Expiry becomes a timeout error; nothing partial is returned.
async fn within_budget<G, T, F>(
    deadline: Instant,
    budget: Duration,
    guard: G,
    work: F,
) -> Result<T, SamplerError>
where
    G: Release,
    F: Future<Output = Result<T, SamplerError>>,
{
    let outcome = timeout_at(deadline, work).await;
    guard.release().await;
    outcome.map_err(|_| SamplerError::timed_out(budget))?
}
