//! Access tokens for the BigQuery REST API.
//!
//! A token is requested for every HTTP call, so a long-running server keeps
//! working after the first token expires.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::WarehouseError;

/// OAuth scope covering `jobs.query` and `jobs.getQueryResults`.
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

/// Supplies the bearer token sent with each request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, WarehouseError>;
}

/// A fixed token, e.g. from `gcloud auth print-access-token`.  It is never
/// refreshed.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, WarehouseError> {
        Ok(self.0.clone())
    }
}

/// Application Default Credentials: `GOOGLE_APPLICATION_CREDENTIALS`, the
/// gcloud user config, or the metadata server.  Tokens are cached and
/// refreshed by the provider.
pub struct ApplicationDefault {
    provider: Arc<dyn gcp_auth::TokenProvider>,
}

impl ApplicationDefault {
    pub async fn discover() -> Result<Self, WarehouseError> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| WarehouseError::Other(format!("no application default credentials: {e}")))?;
        info!("using application default credentials");
        Ok(Self { provider })
    }
}

#[async_trait]
impl TokenSource for ApplicationDefault {
    async fn access_token(&self) -> Result<String, WarehouseError> {
        match self.provider.token(&[BIGQUERY_SCOPE]).await {
            Ok(token) => Ok(token.as_str().to_string()),
            Err(e) => {
                warn!(error = %e, "access token refresh failed");
                Err(WarehouseError::Unavailable(format!("access token refresh failed: {e}")))
            }
        }
    }
}
