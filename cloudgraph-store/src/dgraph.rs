//! Dgraph store client.
//!
//! Talks to Dgraph's GraphQL layer: schema updates go to `/admin`, data
//! mutations to `/graphql`.

use crate::{GraphStore, StoreError, StoreResult, UpsertAck};
use async_trait::async_trait;
use cloudgraph_model::{CombinedSchema, MutationDescriptor};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, info};

const UPDATE_SCHEMA: &str = "mutation($schema: String!) { \
     updateGQLSchema(input: { set: { schema: $schema } }) { gqlSchema { schema } } }";

/// Dgraph connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DgraphConfig {
    /// Base URL, e.g. `http://localhost:8080`.
    pub host: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl DgraphConfig {
    pub const DEFAULT_HOST: &'static str = "http://localhost:8080";

    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DgraphConfig {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// HTTP client for a Dgraph instance.
pub struct DgraphClient {
    config: DgraphConfig,
    client: Client,
}

impl DgraphClient {
    pub fn new(config: DgraphConfig) -> StoreResult<Self> {
        if !(config.host.starts_with("http://") || config.host.starts_with("https://")) {
            return Err(StoreError::Config(format!(
                "dgraph host must be an http(s) URL, got {:?}",
                config.host
            )));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DgraphConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.host.trim_end_matches('/'))
    }

    /// Posts a GraphQL request and checks both the HTTP status and the
    /// response's `errors` array.
    async fn post(&self, path: &str, request: &GraphQlRequest<'_>) -> StoreResult<()> {
        let response = self
            .client
            .post(self.url(path))
            .json(request)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            if let Some(retry_after_secs) = retry_after {
                return Err(StoreError::RateLimited { retry_after_secs });
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(StoreError::from_transport)?;
        let parsed: GraphQlResponse = serde_json::from_str(&body)?;
        if !parsed.errors.is_empty() {
            return Err(StoreError::GraphQl(
                parsed.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for DgraphClient {
    fn describe(&self) -> String {
        format!("dgraph at {}", self.config.host)
    }

    async fn publish_schema(&self, schema: &CombinedSchema) -> StoreResult<()> {
        let document = schema.document();
        debug!(bytes = document.len(), "Publishing schema");
        let mut variables = Map::new();
        variables.insert("schema".to_string(), Value::String(document));
        self.post(
            "admin",
            &GraphQlRequest {
                query: UPDATE_SCHEMA,
                variables,
            },
        )
        .await?;
        info!(
            types = schema.type_def_count(),
            host = %self.config.host,
            "Schema published"
        );
        Ok(())
    }

    async fn upsert(
        &self,
        mutation: &MutationDescriptor,
        input: &[Value],
    ) -> StoreResult<UpsertAck> {
        let mut variables = Map::new();
        variables.insert(mutation.input_variable.clone(), json!(input));
        self.post(
            "graphql",
            &GraphQlRequest {
                query: &mutation.mutation,
                variables,
            },
        )
        .await?;
        Ok(UpsertAck {
            accepted: input.len(),
        })
    }
}
