//! Configured topics and whether their corpora exist yet.

use anyhow::Result;
use serde::Serialize;

use crate::config::{Config, TopicConfig};
use crate::report::ReportMode;
use crate::store::{CorpusStore, CsvStore};

/// One corpus written by a configured topic.
#[derive(Debug, Clone, Serialize)]
pub struct TopicStatus {
    pub label: String,
    pub kind: &'static str,
    pub corpus: String,
    pub collected: bool,
}

/// One row per (topic, corpus) pair, in config order.
pub fn topic_statuses(store: &dyn CorpusStore, config: &Config) -> Result<Vec<TopicStatus>> {
    let mut statuses = Vec::new();
    for topic in &config.topics {
        let kind = match topic {
            TopicConfig::Keyword { .. } => "keyword",
            TopicConfig::Communities { .. } => "communities",
        };
        for name in topic.corpus_names() {
            let target = config.target(&name);
            statuses.push(TopicStatus {
                label: topic.label().to_string(),
                kind,
                collected: store.size(&target.corpus)?.is_some(),
                corpus: name,
            });
        }
    }
    Ok(statuses)
}

/// `corpus topics`: configured topics and the state of their corpora.
pub fn list_topics(config: &Config, mode: ReportMode) -> Result<()> {
    let statuses = topic_statuses(&CsvStore::new(), config)?;
    mode.reporter().topics(&statuses);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use crate::models::Batch;
    use crate::store::memory::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_statuses_follow_store() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("corpus.toml");
        std::fs::write(
            &path,
            r#"
[data]
dir = "/data"

[producer]
kind = "file"
root = "/exports"

[[topics]]
kind = "keyword"
label = "GENAI"
keywords = ["gen ai"]

[[topics]]
kind = "communities"
label = "SUBS"
communities = ["rust", "go"]
"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        let store = MemoryStore::new();
        store
            .save(&config.target("go").corpus, &Batch::default())
            .unwrap();

        let statuses = topic_statuses(&store, &config).unwrap();
        let rows: Vec<(&str, &str, &str, bool)> = statuses
            .iter()
            .map(|s| (s.label.as_str(), s.kind, s.corpus.as_str(), s.collected))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("GENAI", "keyword", "GENAI", false),
                ("SUBS", "communities", "rust", false),
                ("SUBS", "communities", "go", true),
            ]
        );
    }
}
