//! Web Search Integration
//!
//! Search-provider seam and the `web_search` tool exposed to the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tinker_core::{
    error::{CoreError, Result},
    tool::{ParameterSpec, Tool, ToolCall, ToolOutput, ToolSchema},
};

/// One search hit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Response from a search provider
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Concise answer, when the provider produces one
    #[serde(default)]
    pub answer: Option<String>,

    /// Ranked result list
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Search provider trait (Strategy pattern)
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one search query
    async fn search(&self, query: &str) -> Result<SearchResponse>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Tavily provider configuration
#[derive(Clone, Debug)]
pub struct TavilyConfig {
    /// API base URL
    pub base_url: String,

    /// API key, sent in the request body
    pub api_key: String,

    /// Cap on returned results
    pub max_results: u32,
}

impl TavilyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.tavily.com".into(),
            api_key: api_key.into(),
            max_results: 5,
        }
    }

    /// Read configuration from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| CoreError::Config("TAVILY_API_KEY is not set".into()))?;
        Ok(Self::new(api_key))
    }
}

/// Tavily search client
pub struct TavilyClient {
    client: reqwest::Client,
    config: TavilyConfig,
}

impl TavilyClient {
    /// Create from configuration
    pub fn from_config(config: TavilyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(TavilyConfig::from_env()?))
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    include_answer: bool,
    max_results: u32,
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let body = TavilyRequest {
            api_key: &self.config.api_key,
            query,
            include_answer: true,
            max_results: self.config.max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.config.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Gateway(format!("{}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| CoreError::Gateway(format!("malformed search response: {}", e)))
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

/// The `web_search` tool exposed to the model
pub struct WebSearchTool {
    search: Arc<dyn SearchClient>,
}

impl WebSearchTool {
    pub fn new(search: Arc<dyn SearchClient>) -> Self {
        Self { search }
    }

    fn format_response(response: &SearchResponse) -> String {
        let mut output = String::new();

        if let Some(answer) = &response.answer {
            output.push_str(answer);
        }

        if !response.results.is_empty() {
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str("Sources:\n");
            for result in &response.results {
                output.push_str(&format!("  {} ({})\n", result.title, result.url));
                if !result.content.is_empty() {
                    output.push_str(&format!("    {}\n", result.content));
                }
            }
        }

        if output.is_empty() {
            output.push_str("No results found.");
        }

        output.trim_end().to_string()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "web_search".into(),
            description: "Perform a web search and return a concise answer with sources.".into(),
            parameters: vec![ParameterSpec::required("query", "The search query")],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let query = call.str_arg("query").unwrap_or_default();
        tracing::debug!(provider = self.search.name(), query, "searching");

        // Provider failures become error payloads, not loop errors.
        Ok(match self.search.search(query).await {
            Ok(response) => ToolOutput::success(&call.id, Self::format_response(&response)),
            Err(e) => ToolOutput::failure(&call.id, format!("Error performing web search: {}", e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tinker_core::tool::ToolRegistry;

    /// Canned search client for tests
    pub struct MockSearchClient {
        response: Result<SearchResponse>,
        calls: AtomicUsize,
    }

    impl MockSearchClient {
        fn answering(answer: &str, results: Vec<SearchResult>) -> Self {
            Self {
                response: Ok(SearchResponse {
                    answer: Some(answer.into()),
                    results,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(CoreError::Gateway(message.into())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchClient for MockSearchClient {
        async fn search(&self, _query: &str) -> Result<SearchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(response) => Ok(response.clone()),
                Err(e) => Err(CoreError::Gateway(e.to_string())),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn call(arguments: serde_json::Value) -> ToolCall {
        ToolCall::new("toolu_search", "web_search", arguments)
    }

    #[tokio::test]
    async fn test_search_formats_answer_and_sources() {
        let client = Arc::new(MockSearchClient::answering(
            "Rust 1.83 is the latest stable release.",
            vec![SearchResult {
                title: "Rust Blog".into(),
                url: "https://blog.rust-lang.org".into(),
                content: "Announcing Rust 1.83".into(),
            }],
        ));
        let tool = WebSearchTool::new(client.clone());

        let outcome = tool
            .execute(&call(serde_json::json!({"query": "latest rust"})))
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.output.contains("1.83"));
        assert!(outcome.output.contains("Sources:"));
        assert!(outcome.output.contains("blog.rust-lang.org"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_error_payload() {
        let tool = WebSearchTool::new(Arc::new(MockSearchClient::failing("connection refused")));

        let outcome = tool
            .execute(&call(serde_json::json!({"query": "anything"})))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.output.contains("Error performing web search"));
    }

    #[tokio::test]
    async fn test_missing_query_rejected_by_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(WebSearchTool::new(Arc::new(MockSearchClient::answering(
            "unused",
            vec![],
        ))));

        let err = registry
            .dispatch(&call(serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ToolValidation(_)));
    }

    #[test]
    fn test_empty_response_formatting() {
        let formatted = WebSearchTool::format_response(&SearchResponse::default());
        assert_eq!(formatted, "No results found.");
    }
}
