use std::sync::Arc;

use crate::{
    error::{Result, ScriptcastError},
    llm::TextGenerator,
    search::{SearchEngine, SearchQuery},
    types::Summary,
};

pub const RESULT_SEPARATOR: &str = " ";

/// Researches a topic and condenses the hits into a [`Summary`].
#[derive(Clone)]
pub struct SearchSummarizer {
    engine: Arc<dyn SearchEngine>,
}

impl SearchSummarizer {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    pub async fn run(&self, query: &str, text_provider: &dyn TextGenerator) -> Result<Summary> {
        let bodies = self.search(query).await?;
        self.summarize(query, &bodies, text_provider).await
    }

    /// One search call. An empty result set is an error.
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let request = SearchQuery::recent(query);
        let hits = self.engine.search(&request).await?;
        if hits.is_empty() {
            return Err(ScriptcastError::NoResultsFound {
                query: query.to_string(),
            });
        }

        Ok(hits
            .into_iter()
            .take(request.max_results)
            .map(|hit| hit.body)
            .collect())
    }

    pub async fn summarize(
        &self,
        query: &str,
        bodies: &[String],
        text_provider: &dyn TextGenerator,
    ) -> Result<Summary> {
        let text = bodies.join(RESULT_SEPARATOR);
        tracing::info!(query, sources = bodies.len(), provider = text_provider.provider_name(), "summarizing search results");
        let summary = text_provider.summarize(&text).await?;
        Ok(Summary::new(summary, query, bodies.len()))
    }
}
