//! BigQuery REST backend.
//!
//! Statements are submitted to `jobs.query` with named parameters.  A job
//! that does not finish inside the synchronous window is polled through
//! `jobs.getQueryResults` until it completes or the configured deadline
//! passes; result pages are followed until the page token runs out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::auth::TokenSource;
use crate::{Row, Statement, Value, Warehouse, WarehouseError};

/// Public BigQuery v2 endpoint.
pub const DEFAULT_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Slack on the HTTP client timeout over the statement deadline.
const HTTP_GRACE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection settings for [`BigQueryWarehouse`].
#[derive(Debug, Clone)]
pub struct BigQueryConfig {
    /// API base URL, without a trailing `/projects/...`.
    pub api_url: String,
    /// Project that runs (and is billed for) the query jobs.
    pub project_id: String,
    /// Job location (`US`, `europe-west1`, …); the API infers it when unset.
    pub location: Option<String>,
    /// Deadline for one statement, including polling.
    pub timeout: Duration,
}

impl BigQueryConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            project_id: project_id.into(),
            location: None,
            timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    parameter_mode: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    query_parameters: Vec<ApiParameter<'a>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
    timeout_ms: u64,
    request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiParameter<'a> {
    name: &'a str,
    parameter_type: ApiParameterType,
    parameter_value: ApiParameterValue,
}

#[derive(Debug, Serialize)]
struct ApiParameterType {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiParameterValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

/// Shared shape of `jobs.query` and `jobs.getQueryResults` responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    job_reference: Option<JobReference>,
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<ApiRow>,
    page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    project_id: String,
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

#[derive(Debug, Deserialize)]
struct ApiRow {
    #[serde(default)]
    f: Vec<ApiCell>,
}

#[derive(Debug, Deserialize)]
struct ApiCell {
    #[serde(default)]
    v: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: String,
}

// ---------------------------------------------------------------------------
// BigQueryWarehouse
// ---------------------------------------------------------------------------

/// [`Warehouse`] backed by the BigQuery v2 REST API.
pub struct BigQueryWarehouse {
    client: reqwest::Client,
    config: BigQueryConfig,
    tokens: Arc<dyn TokenSource>,
}

impl BigQueryWarehouse {
    /// Build the HTTP client.  No request is sent until the first query.
    pub fn new(config: BigQueryConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, WarehouseError> {
        let http_timeout = config.timeout.checked_add(HTTP_GRACE).ok_or_else(|| {
            WarehouseError::Other(format!("timeout of {:?} is out of range", config.timeout))
        })?;
        let client = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|e| WarehouseError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(config, tokens, client))
    }

    /// Use a caller-built HTTP client as is.
    pub fn with_client(config: BigQueryConfig, tokens: Arc<dyn TokenSource>, client: reqwest::Client) -> Self {
        Self { client, config, tokens }
    }

    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    fn api_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    async fn fetch_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
        deadline: Instant,
    ) -> Result<QueryResponse, WarehouseError> {
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.api_url(),
            job.project_id,
            job.job_id
        );

        // A poll may block server-side for `timeoutMs`; never past the deadline.
        let wait = deadline.saturating_duration_since(Instant::now());
        let mut params = vec![("timeoutMs", millis(wait).to_string())];
        if let Some(location) = job.location.as_deref().or(self.config.location.as_deref()) {
            params.push(("location", location.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        self.send(self.client.get(url).query(&params)).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<QueryResponse, WarehouseError> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = error_from_response(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "warehouse request failed");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| WarehouseError::Decode(e.to_string()))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    fn backend(&self) -> &'static str {
        "bigquery"
    }

    #[instrument(
        skip(self, statement),
        fields(operation = statement.get_label("operation").unwrap_or("unlabelled"))
    )]
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, WarehouseError> {
        statement.validate()?;

        let deadline = Instant::now().checked_add(self.config.timeout).ok_or_else(|| {
            WarehouseError::Other(format!("timeout of {:?} is out of range", self.config.timeout))
        })?;
        let request = encode_request(statement, millis(self.config.timeout), self.config.location.as_deref());
        debug!(request_id = %request.request_id, "submitting query job");

        let url = format!("{}/projects/{}/queries", self.api_url(), self.config.project_id);
        let mut response = self.send(self.client.post(url).json(&request)).await?;

        while !response.job_complete {
            let job = response.job_reference.clone().ok_or_else(|| {
                WarehouseError::Decode("incomplete job without a jobReference".into())
            })?;
            if Instant::now() >= deadline {
                warn!(job_id = %job.job_id, "query job exceeded its deadline");
                return Err(WarehouseError::Unavailable(format!(
                    "job {} did not complete within {:?}",
                    job.job_id, self.config.timeout
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            response = self.fetch_results(&job, None, deadline).await?;
        }

        let mut rows = decode_rows(response.schema.as_ref(), &response.rows)?;
        let mut page_token = response.page_token.take();

        while let Some(token) = page_token {
            let job = response.job_reference.clone().ok_or_else(|| {
                WarehouseError::Decode("paged result without a jobReference".into())
            })?;
            let page = self.fetch_results(&job, Some(&token), deadline).await?;
            let schema = page.schema.as_ref().or(response.schema.as_ref());
            rows.extend(decode_rows(schema, &page.rows)?);
            page_token = page.page_token;
        }

        debug!(rows = rows.len(), "query job complete");
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Encoding / decoding
// ---------------------------------------------------------------------------

fn encode_request<'a>(
    statement: &'a Statement,
    timeout_ms: u64,
    location: Option<&'a str>,
) -> QueryRequest<'a> {
    QueryRequest {
        query: &statement.sql,
        use_legacy_sql: false,
        parameter_mode: "NAMED",
        query_parameters: statement
            .params
            .iter()
            .map(|p| ApiParameter {
                name: &p.name,
                parameter_type: ApiParameterType {
                    kind: p.param_type.as_str(),
                },
                parameter_value: ApiParameterValue {
                    value: encode_value(&p.value),
                },
            })
            .collect(),
        labels: statement.labels.clone(),
        timeout_ms,
        request_id: Uuid::new_v4().to_string(),
        location,
    }
}

/// Parameter values travel as strings; NULL is an absent `value`.
fn encode_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Int64(v) => Some(v.to_string()),
        Value::String(v) => Some(v.clone()),
        Value::Float64(v) if v.is_nan() => Some("NaN".into()),
        Value::Float64(v) if v.is_infinite() => {
            Some(if *v > 0.0 { "Infinity" } else { "-Infinity" }.into())
        }
        Value::Float64(v) => Some(v.to_string()),
    }
}

fn decode_rows(schema: Option<&TableSchema>, rows: &[ApiRow]) -> Result<Vec<Row>, WarehouseError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let schema = schema.ok_or_else(|| WarehouseError::Decode("rows returned without a schema".into()))?;

    rows.iter()
        .map(|api_row| {
            if api_row.f.len() != schema.fields.len() {
                return Err(WarehouseError::Decode(format!(
                    "row has {} cells but the schema has {} fields",
                    api_row.f.len(),
                    schema.fields.len()
                )));
            }
            let mut row = Row::new();
            for (field, cell) in schema.fields.iter().zip(&api_row.f) {
                row.insert(field.name.clone(), decode_cell(field, &cell.v)?);
            }
            Ok(row)
        })
        .collect()
}

fn decode_cell(field: &FieldSchema, raw: &serde_json::Value) -> Result<Value, WarehouseError> {
    let text = match raw {
        serde_json::Value::Null => return Ok(Value::Null),
        serde_json::Value::String(s) => s,
        other => {
            return Err(WarehouseError::Decode(format!(
                "column '{}' holds an unsupported cell: {other}",
                field.name
            )))
        }
    };

    match field.field_type.as_str() {
        "INTEGER" | "INT64" => text.parse().map(Value::Int64).map_err(|e| {
            WarehouseError::Decode(format!("column '{}': {e}", field.name))
        }),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => {
            text.parse().map(Value::Float64).map_err(|e| {
                WarehouseError::Decode(format!("column '{}': {e}", field.name))
            })
        }
        _ => Ok(Value::String(text.clone())),
    }
}

/// Map a non-2xx response onto the warehouse error categories.
///
/// The first error `reason` wins; the HTTP status is the fallback.
fn error_from_response(status: u16, body: &str) -> WarehouseError {
    let (reason, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope
                .error
                .errors
                .first()
                .map(|e| e.reason.clone())
                .unwrap_or_default();
            let message = if envelope.error.message.is_empty() {
                format!("HTTP {status}")
            } else {
                envelope.error.message
            };
            (reason, message)
        }
        Err(_) if body.trim().is_empty() => (String::new(), format!("HTTP {status}")),
        Err(_) => (String::new(), body.trim().to_string()),
    };

    match reason.as_str() {
        "invalidQuery" | "invalid" => WarehouseError::InvalidQuery(message),
        "notFound" => WarehouseError::NotFound(message),
        "backendError" | "internalError" | "rateLimitExceeded" | "jobBackendError"
        | "jobInternalError" | "timeout" => WarehouseError::Unavailable(message),
        _ => match status {
            400 => WarehouseError::InvalidQuery(message),
            404 => WarehouseError::NotFound(message),
            408 | 429 | 500..=599 => WarehouseError::Unavailable(message),
            _ => WarehouseError::Other(format!("HTTP {status}: {message}")),
        },
    }
}

fn transport_error(err: reqwest::Error) -> WarehouseError {
    if err.is_timeout() || err.is_connect() || err.is_body() {
        WarehouseError::Unavailable(err.to_string())
    } else if err.is_decode() {
        WarehouseError::Decode(err.to_string())
    } else {
        WarehouseError::Other(err.to_string())
    }
}
