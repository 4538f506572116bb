//! Tool invocation client for the domain lookup service.
//!
//! The AI backend can ask for an order record mid-conversation. The lookup
//! is one plain HTTP request; whatever happens, the caller of
//! [`OrderLookupClient::lookup`] always gets a usable string back - the
//! record on success, a fixed placeholder on any failure - so the
//! conversation never stalls because a tool failed.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::core::realtime::ToolDef;

/// Name of the order lookup tool as declared to the backend.
pub const ORDER_LOOKUP_TOOL: &str = "lookup_order";

/// Fixed human-readable result used whenever the lookup fails.
pub const LOOKUP_FAILED_PLACEHOLDER: &str =
    "No se pudo consultar la información del pedido en este momento.";

/// Errors from the lookup request. Never escape this module's public API;
/// they collapse into [`LOOKUP_FAILED_PLACEHOLDER`].
#[derive(Debug, Error)]
enum ToolError {
    #[error("lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Declaration of the order lookup tool for the session configuration.
pub fn order_lookup_tool() -> ToolDef {
    ToolDef {
        tool_type: "function".to_string(),
        name: ORDER_LOOKUP_TOOL.to_string(),
        description: Some(
            "Consulta el estado de un pedido a partir de su identificador numérico.".to_string(),
        ),
        parameters: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "integer",
                    "description": "Identificador numérico del pedido"
                }
            },
            "required": ["id"]
        })),
    }
}

/// One tool invocation request from the backend, request-scoped.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Correlation token supplied by the backend
    pub call_id: String,
    /// Tool name, resolved from the output-item announcement
    pub name: String,
    /// Raw JSON arguments string
    pub arguments: String,
}

impl ToolInvocation {
    /// Parse the arguments of an order lookup invocation.
    pub fn parse_order_args(&self) -> Result<OrderLookupArgs, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

/// Arguments of the order lookup tool.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLookupArgs {
    /// Record identifier; the backend sends it as an integer or a string
    pub id: OrderId,
}

/// Record identifier in either wire representation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OrderId {
    Number(i64),
    Text(String),
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderId::Number(n) => write!(f, "{n}"),
            OrderId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Client for the domain lookup service. Stateless; safe to use
/// concurrently across calls.
#[derive(Clone)]
pub struct OrderLookupClient {
    http: reqwest::Client,
    base_url: String,
}

impl OrderLookupClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Look up one record by identifier.
    ///
    /// Always returns a usable string: the service's text/JSON body on
    /// success, the fixed placeholder on any transport or status error.
    pub async fn lookup(&self, id: &str) -> String {
        match self.fetch(id).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Order lookup failed for id {}: {}", id, e);
                LOOKUP_FAILED_PLACEHOLDER.to_string()
            }
        }
    }

    async fn fetch(&self, id: &str) -> Result<String, ToolError> {
        let url = format!("{}/orders/{}", self.base_url, id);
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

// =============================================================================
// Tests
// =============================================================================
