use std::future::Future;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::SamplerError;

/// How long a shutdown may take before we give up and just log it.
const RELEASE_BUDGET: Duration = Duration::from_secs(2);

const APP_NAME: &str = "mongodb-slow-queries";

/// Builds a client for `target`. The driver's own selection and connect
/// timeouts are capped at `budget` so a dead server fails rather than
/// waiting on the driver's 30 s default.
pub async fn connect(target: &Url, budget: Duration) -> Result<Client, SamplerError> {
    let mut options = ClientOptions::parse(target.as_str())
        .await
        .map_err(SamplerError::connect)?;
    options.app_name = Some(APP_NAME.into());
    options.server_selection_timeout = Some(budget);
    options.connect_timeout = Some(budget);

    Client::with_options(options).map_err(SamplerError::connect)
}

/// Round-trips `{ping: 1}` using the client's read preference.
pub async fn ping(client: &Client) -> Result<(), SamplerError> {
    let admin = client.database("admin");
    let mut command = admin.run_command(doc! { "ping": 1 });
    if let Some(criteria) = client.selection_criteria() {
        command = command.selection_criteria(criteria.clone());
    }
    command.await.map_err(SamplerError::ping)?;
    Ok(())
}

// ─── Scoped client ───────────────────────────────────────────────

/// Something that must be given back once a collection run ends.
pub trait Release {
    fn release(self) -> impl Future<Output = ()>;
}

/// Owns a client for exactly one collection run.
///
/// `release()` is the only exit that closes connections; dropping an
/// unreleased guard just leaves the driver to clean up behind it.
pub struct ScopedClient {
    client: Client,
    released: bool,
}

impl ScopedClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            released: false,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Release for ScopedClient {
    /// Shuts the client down. Never fails; problems are logged.
    async fn release(mut self) {
        self.released = true;
        let client = self.client.clone();
        match tokio::time::timeout(RELEASE_BUDGET, async move { client.shutdown().await }).await {
            Ok(()) => debug!("disconnected from MongoDB"),
            Err(_) => warn!(
                budget_ms = RELEASE_BUDGET.as_millis() as u64,
                "failed to disconnect from MongoDB: shutdown timed out"
            ),
        }
    }
}

impl Drop for ScopedClient {
    fn drop(&mut self) {
        if !self.released {
            warn!("MongoDB client dropped without release");
        }
    }
}
