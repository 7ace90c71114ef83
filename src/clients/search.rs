//! Lookup/search capability boundary.
//!
//! Given a free-text query and a result-count hint, the client returns a
//! ranked list of results, optionally a knowledge-panel summary and
//! related-query suggestions. Failures never escape the boundary: an upstream
//! error or an unusable payload comes back as [`SearchOutcome::Unavailable`].

use serde_json::{Value, json};

use super::completion::ToolSpec;
use super::config::SearchConfig;

/// One ranked search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Knowledge-panel summary, when the engine returns one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgePanel {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Parsed payload of a successful search.
#[derive(Clone, Debug, Default)]
pub struct SearchResults {
    pub query: String,
    pub total_results: Option<u64>,
    pub hits: Vec<SearchHit>,
    pub knowledge_panel: Option<KnowledgePanel>,
    pub related_queries: Vec<String>,
}

impl SearchResults {
    /// Human-readable digest suitable for feeding back into a completion
    /// call as a tool result.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        out.push(format!("Search results for: {}", self.query));
        if let Some(total) = self.total_results {
            out.push(format!("Total results: {total}"));
        }
        for (i, hit) in self.hits.iter().enumerate() {
            out.push(format!("{}. {}", i + 1, hit.title));
            out.push(format!("   link: {}", hit.url));
            out.push(format!("   snippet: {}", hit.snippet));
        }
        if let Some(panel) = &self.knowledge_panel {
            out.push(format!(
                "Knowledge panel: {} ({}) - {}",
                panel.title, panel.category, panel.description
            ));
        }
        if !self.related_queries.is_empty() {
            out.push(format!("Related: {}", self.related_queries.join("; ")));
        }
        out.join("\n")
    }
}

/// Terminal outcome of a search call.
#[derive(Clone, Debug)]
pub enum SearchOutcome {
    Results(SearchResults),
    /// The upstream call errored or the payload carried nothing usable.
    Unavailable(String),
}

impl SearchOutcome {
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SearchOutcome::Unavailable(_))
    }
}

/// Client for a SerpAPI-shaped search endpoint.
#[derive(Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    config: SearchConfig,
}

const RELATED_QUERY_LIMIT: usize = 3;

impl SearchClient {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Tool declaration for binding this capability to a completion service.
    #[must_use]
    pub fn tool_spec() -> ToolSpec {
        ToolSpec {
            name: "web_search".to_string(),
            description: "Search the web for current information, guidelines, and research."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Free-text search query" },
                    "num_results": { "type": "integer", "description": "Result-count hint" }
                },
                "required": ["query"]
            }),
        }
    }

    /// Executes a search. Never returns an error: failures of any kind
    /// collapse into [`SearchOutcome::Unavailable`].
    pub async fn search(&self, query: &str, num_results: usize) -> SearchOutcome {
        let raw = match self.request(query, num_results).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%error, query, "search request failed");
                return SearchOutcome::Unavailable(error.to_string());
            }
        };

        let results = parse_results(query, num_results, &raw);
        if results.hits.is_empty() && results.knowledge_panel.is_none() {
            return SearchOutcome::Unavailable("search returned no usable payload".to_string());
        }
        SearchOutcome::Results(results)
    }

    async fn request(&self, query: &str, num_results: usize) -> Result<Value, reqwest::Error> {
        self.http
            .get(&self.config.base_url)
            .query(&[
                ("q", query),
                ("api_key", &self.config.api_key),
                ("engine", &self.config.engine),
                ("num", &num_results.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_results(query: &str, num_results: usize, raw: &Value) -> SearchResults {
    let displayed_query = raw
        .get("search_information")
        .map(|info| str_field(info, "query_displayed"))
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| query.to_string());

    let total_results = raw
        .get("search_information")
        .and_then(|info| info.get("total_results"))
        .and_then(Value::as_u64);

    let hits = raw
        .get("organic_results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(num_results)
                .map(|item| SearchHit {
                    title: str_field(item, "title"),
                    url: str_field(item, "link"),
                    snippet: str_field(item, "snippet"),
                })
                .collect()
        })
        .unwrap_or_default();

    let knowledge_panel = raw.get("knowledge_graph").map(|kg| KnowledgePanel {
        title: str_field(kg, "title"),
        description: str_field(kg, "description"),
        category: str_field(kg, "type"),
    });

    let related_queries = raw
        .get("related_searches")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(RELATED_QUERY_LIMIT)
                .map(|item| str_field(item, "query"))
                .filter(|q| !q.is_empty())
                .collect()
        })
        .unwrap_or_default();

    SearchResults {
        query: displayed_query,
        total_results,
        hits,
        knowledge_panel,
        related_queries,
    }
}
