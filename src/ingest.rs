//! Collection run orchestration.
//!
//! Coordinates one cycle: producer → cleaner → merger for every configured
//! topic, in order, then the maintenance sweep. Topics never run
//! concurrently, so no two writers touch the same corpus within a run.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Serialize;

use crate::clean::{clean, CleanStats};
use crate::config::{Config, ProducerConfig, TopicConfig};
use crate::maintenance::{dedupe_all, SweepReport};
use crate::merge::{merge, Delta, MergeResult};
use crate::models::{Batch, Post};
use crate::producer::{FileProducer, Producer, Query};
use crate::report::ReportMode;
use crate::stats;
use crate::store::{CorpusStore, CsvStore};

/// Result of cleaning and merging one corpus.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub corpus: String,
    pub clean: CleanStats,
    pub merge: MergeResult,
}

/// A corpus whose fetch or merge failed while the rest of its topic ran.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub corpus: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicReport {
    pub label: String,
    pub sources: Vec<SourceReport>,
    pub failed: Vec<SourceFailure>,
}

impl TopicReport {
    pub fn raw_total(&self) -> usize {
        self.sources.iter().map(|s| s.merge.raw_total).sum()
    }

    pub fn final_unique(&self) -> usize {
        self.sources.iter().map(|s| s.merge.final_unique_count).sum()
    }

    pub fn new_posts(&self) -> Delta {
        self.sources.iter().map(|s| s.merge.new_posts).sum()
    }
}

#[derive(Debug)]
pub struct TopicOutcome {
    pub label: String,
    pub result: Result<TopicReport>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub topics: Vec<TopicOutcome>,
    /// `None` when the sweep was skipped.
    pub sweep: Option<Result<SweepReport>>,
}

impl RunSummary {
    pub fn new_posts(&self) -> Delta {
        self.topics
            .iter()
            .filter_map(|t| t.result.as_ref().ok())
            .map(TopicReport::new_posts)
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.topics.iter().filter(|t| t.result.is_err()).count()
    }

    /// Corpora that failed inside otherwise successful topics.
    pub fn failed_sources(&self) -> usize {
        self.topics
            .iter()
            .filter_map(|t| t.result.as_ref().ok())
            .map(|r| r.failed.len())
            .sum()
    }
}

/// Build the producer named in the config.
pub fn producer_from_config(config: &Config) -> Box<dyn Producer> {
    match &config.producer {
        ProducerConfig::File { root } => Box::new(FileProducer::new(root.clone())),
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Runs topics against one store and one producer.
pub struct Collector<'a> {
    config: &'a Config,
    store: &'a dyn CorpusStore,
    producer: &'a dyn Producer,
}

impl<'a> Collector<'a> {
    pub fn new(config: &'a Config, store: &'a dyn CorpusStore, producer: &'a dyn Producer) -> Self {
        Self {
            config,
            store,
            producer,
        }
    }

    /// Collect every topic (or only `only`), then sweep unless `skip_dedupe`.
    ///
    /// A failing topic is recorded and the next one runs, unless
    /// `run.stop_on_error` is set.
    pub async fn run(&self, only: Option<&str>, skip_dedupe: bool) -> Result<RunSummary> {
        let topics: Vec<&TopicConfig> = match only {
            Some(label) => {
                let topic = self
                    .config
                    .topics
                    .iter()
                    .find(|t| t.label() == label);
                match topic {
                    Some(t) => vec![t],
                    None => bail!("Unknown topic: '{}'", label),
                }
            }
            None => self.config.topics.iter().collect(),
        };

        let mut summary = RunSummary::default();
        for topic in topics {
            let result = self.collect_topic(topic).await;
            if let Err(e) = &result {
                tracing::error!(topic = topic.label(), error = %format!("{:#}", e), "topic failed");
            }
            let result = match result {
                Err(e) if self.config.run.stop_on_error => {
                    return Err(e.context(format!("topic '{}' failed", topic.label())));
                }
                other => other,
            };
            summary.topics.push(TopicOutcome {
                label: topic.label().to_string(),
                result,
            });
        }

        if self.config.maintenance.run_after_collect && !skip_dedupe {
            let sweep = self.sweep();
            if let Err(e) = &sweep {
                tracing::error!(error = %format!("{:#}", e), "dedupe sweep failed");
            }
            summary.sweep = Some(sweep);
        }

        Ok(summary)
    }

    pub fn sweep(&self) -> Result<SweepReport> {
        let report = dedupe_all(
            self.store,
            &self.config.data.dir,
            &self.config.sweep_options(),
            now(),
        )
        .with_context(|| format!("dedupe sweep of {}", self.config.data.dir.display()))?;
        Ok(report)
    }

    /// Collect one topic.
    ///
    /// A `communities` topic keeps going past a failing community and records
    /// it in [`TopicReport::failed`]. The topic itself fails only when no community
    /// succeeded, or at the first failure under `run.stop_on_error`.
    pub async fn collect_topic(&self, topic: &TopicConfig) -> Result<TopicReport> {
        let mut failed = Vec::new();
        let sources = match topic {
            TopicConfig::Keyword {
                label,
                community,
                keywords,
                limit,
                corpus,
            } => {
                let mut posts = Vec::new();
                for keyword in keywords {
                    let query = Query::Search {
                        community: community.clone(),
                        keyword: keyword.clone(),
                        limit: *limit,
                    };
                    posts.extend(self.fetch(label, &query).await?);
                }
                let name = corpus.as_deref().unwrap_or(label);
                vec![self.clean_and_merge(name, &posts)?]
            }
            TopicConfig::Communities {
                label,
                communities,
                limit,
            } => {
                let mut sources = Vec::with_capacity(communities.len());
                for community in communities {
                    match self.collect_community(label, community, *limit).await {
                        Ok(source) => sources.push(source),
                        Err(e) if self.config.run.stop_on_error => return Err(e),
                        Err(e) => {
                            let error = format!("{:#}", e);
                            tracing::error!(
                                topic = label.as_str(),
                                corpus = community.as_str(),
                                error = %error,
                                "community failed"
                            );
                            failed.push(SourceFailure {
                                corpus: community.clone(),
                                error,
                            });
                        }
                    }
                }
                if sources.is_empty() && !failed.is_empty() {
                    let errors: Vec<String> = failed
                        .iter()
                        .map(|f| format!("{}: {}", f.corpus, f.error))
                        .collect();
                    bail!("every community failed: {}", errors.join("; "));
                }
                sources
            }
        };

        Ok(TopicReport {
            label: topic.label().to_string(),
            sources,
            failed,
        })
    }

    async fn collect_community(
        &self,
        label: &str,
        community: &str,
        limit: usize,
    ) -> Result<SourceReport> {
        let query = Query::Newest {
            community: community.to_string(),
            limit,
        };
        let posts = self.fetch(label, &query).await?;
        self.clean_and_merge(community, &posts)
    }

    async fn fetch(&self, label: &str, query: &Query) -> Result<Vec<Post>> {
        let posts = self
            .producer
            .fetch(query)
            .await
            .with_context(|| format!("{} producer failed for {}", self.producer.name(), query))?;

        let earliest = posts
            .iter()
            .filter_map(Post::created_at)
            .min()
            .map(|dt: DateTime<Utc>| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        tracing::info!(
            topic = label,
            query = %query,
            fetched = posts.len(),
            earliest = %earliest,
            "fetched posts"
        );

        Ok(posts)
    }

    fn clean_and_merge(&self, corpus_name: &str, posts: &[Post]) -> Result<SourceReport> {
        let text_field = &self.config.cleaning.text_field;
        let raw_total = posts.len();

        let cleaned = clean(Batch::from_posts(posts), text_field)
            .with_context(|| format!("cleaning batch for corpus '{}'", corpus_name))?;
        let clean_stats = cleaned.stats();

        let target = self.config.target(corpus_name);
        let merged = merge(
            self.store,
            cleaned.batch,
            raw_total,
            &target,
            text_field,
            now(),
        )
        .with_context(|| format!("merging into {}", target.corpus.display()))?;

        tracing::info!(
            corpus = corpus_name,
            raw = raw_total,
            removed_blank = clean_stats.removed_blank,
            removed_duplicate = clean_stats.removed_duplicate,
            unique = merged.final_unique_count,
            new_posts = %merged.new_posts,
            "corpus updated"
        );

        Ok(SourceReport {
            corpus: corpus_name.to_string(),
            clean: clean_stats,
            merge: merged,
        })
    }
}

/// `corpus run`: one collection cycle against the CSV store.
pub async fn run_collect(
    config: &Config,
    topic: Option<&str>,
    skip_dedupe: bool,
    mode: ReportMode,
) -> Result<()> {
    let store = CsvStore::new();
    let producer = producer_from_config(config);
    let collector = Collector::new(config, &store, producer.as_ref());

    let summary = collector.run(topic, skip_dedupe).await?;
    // every merge above is already on disk
    let leaderboard = match stats::load_leaderboard(&store, config) {
        Ok(board) => board,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "could not load leaderboard");
            None
        }
    };

    let reporter = mode.reporter();
    for outcome in &summary.topics {
        match &outcome.result {
            Ok(report) => reporter.topic(report),
            Err(e) => reporter.topic_failed(&outcome.label, e),
        }
    }
    match &summary.sweep {
        Some(Ok(sweep)) => reporter.sweep(sweep),
        Some(Err(e)) => reporter.sweep_failed(e),
        None => {}
    }
    reporter.summary(&summary, leaderboard.as_ref());

    if summary.failures() > 0 && summary.failures() == summary.topics.len() {
        bail!("all {} topic(s) failed", summary.failures());
    }
    if let Some(Err(e)) = &summary.sweep {
        bail!("dedupe sweep failed: {:#}", e);
    }
    Ok(())
}

/// `corpus dedupe`: the maintenance sweep on its own.
pub fn run_dedupe(config: &Config, mode: ReportMode) -> Result<()> {
    let store = CsvStore::new();
    let report = dedupe_all(&store, &config.data.dir, &config.sweep_options(), now())
        .with_context(|| format!("dedupe sweep of {}", config.data.dir.display()))?;
    mode.reporter().sweep(&report);
    Ok(())
}
