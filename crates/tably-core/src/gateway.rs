use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::conversation::{Effect, Outcome};
use crate::error::{GatewayError, IncompleteResult};
use crate::presentation::PresentationKind;
use crate::state::Record;

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    user_query: &'a str,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    user_query: &'a str,
    visualization: &'a str,
}

/// Reply to `POST /analyze`. Missing fields decode as empty/false.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalyzeResponse {
    pub bot_response: Option<String>,
    pub requires_visualization: Option<bool>,
    pub error: Option<String>,
}

impl AnalyzeResponse {
    pub fn new(bot_response: &str, requires_visualization: bool) -> Self {
        Self {
            bot_response: Some(bot_response.to_string()),
            requires_visualization: Some(requires_visualization),
            error: None,
        }
    }

    pub fn bot_response(&self) -> &str {
        self.bot_response.as_deref().unwrap_or_default()
    }

    pub fn requires_visualization(&self) -> bool {
        self.requires_visualization.unwrap_or(false)
    }
}

/// Reply to `POST /query`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    pub data: Option<Vec<Record>>,
    pub visualization: Option<String>,
    pub columns: Option<Vec<String>>,
    pub sql_query: Option<String>,
    pub error: Option<String>,
    pub sql: Option<String>,
}

/// A dataset ready for the render selector
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: PresentationKind,
    pub data: Vec<Record>,
}

impl QueryResponse {
    pub fn new(data: Vec<Record>, visualization: &str) -> Self {
        Self {
            data: Some(data),
            visualization: Some(visualization.to_string()),
            ..Self::default()
        }
    }

    /// The service's echoed kind wins when it parses, otherwise `requested`.
    pub fn into_report(self, requested: PresentationKind) -> Result<Report, IncompleteResult> {
        let data = self.data.ok_or(IncompleteResult::MissingData)?;
        let kind = match self.visualization.as_deref() {
            Some(name) => PresentationKind::from_str(name).unwrap_or_else(|| {
                warn!("Unknown visualization {:?} in response, using {}", name, requested);
                requested
            }),
            None => requested,
        };
        Ok(Report { kind, data })
    }
}

/// HTTP client for the analysis service
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn analyze(&self, user_query: &str) -> Result<AnalyzeResponse, GatewayError> {
        let response: AnalyzeResponse = self.post("analyze", &AnalyzeRequest { user_query }).await?;
        if let Some(error) = &response.error {
            warn!("Analysis service reported an error: {}", error);
        }
        Ok(response)
    }

    pub async fn query(
        &self,
        user_query: &str,
        kind: PresentationKind,
    ) -> Result<QueryResponse, GatewayError> {
        let request = QueryRequest {
            user_query,
            visualization: kind.as_str(),
        };
        let response: QueryResponse = self.post("query", &request).await?;

        if let Some(sql) = response.sql_query.as_ref().or(response.sql.as_ref()) {
            debug!("Service generated SQL: {}", sql);
        }
        if let Some(error) = &response.error {
            warn!("Query service reported an error: {}", error);
        }
        Ok(response)
    }

    /// Run an effect emitted by the conversation and package the result for `Conversation::apply`.
    pub async fn execute(&self, effect: Effect) -> Outcome {
        match effect {
            Effect::Analyze { request, query } => Outcome::Analyzed {
                request,
                result: self.analyze(&query).await,
            },
            Effect::Query { request, query, kind } => Outcome::Queried {
                request,
                result: self.query(&query, kind).await,
            },
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analyze_response_defaults() {
        let response: AnalyzeResponse = serde_json::from_value(json!({"error": "boom"})).unwrap();
        assert_eq!(response.bot_response(), "");
        assert!(!response.requires_visualization());
        assert_eq!(response.error.as_deref(), Some("boom"));

        let response: AnalyzeResponse =
            serde_json::from_value(json!({"bot_response": null, "requires_visualization": true})).unwrap();
        assert_eq!(response.bot_response(), "");
        assert!(response.requires_visualization());
    }

    #[test]
    fn test_into_report_prefers_echoed_kind() {
        let response = QueryResponse::new(vec![json!({"name": "Tea", "value": 3})], "Pie");
        let report = response.into_report(PresentationKind::Bar).unwrap();
        assert_eq!(report.kind, PresentationKind::Pie);
        assert_eq!(report.data.len(), 1);
    }

    #[test]
    fn test_into_report_falls_back_to_requested_kind() {
        let response = QueryResponse {
            data: Some(vec![json!({"a": 1})]),
            ..QueryResponse::default()
        };
        assert_eq!(response.into_report(PresentationKind::Table).unwrap().kind, PresentationKind::Table);

        let response = QueryResponse::new(vec![], "hologram");
        assert_eq!(response.into_report(PresentationKind::List).unwrap().kind, PresentationKind::List);
    }

    #[test]
    fn test_into_report_requires_data() {
        let response = QueryResponse {
            visualization: Some("bar".into()),
            ..QueryResponse::default()
        };
        assert_eq!(response.into_report(PresentationKind::Bar), Err(IncompleteResult::MissingData));
        assert_eq!(
            QueryResponse::default().into_report(PresentationKind::Bar),
            Err(IncompleteResult::MissingData)
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AnalysisClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
