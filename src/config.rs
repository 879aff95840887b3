//! TOML configuration.
//!
//! Loaded once per invocation by [`load_config`]. Every section except
//! `[data]` and `[producer]` has defaults; topics are validated up front so a
//! run never starts with an unusable topic list.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::maintenance::SweepOptions;
use crate::models::{CorpusTarget, CORPUS_SUFFIX, ID, TEXT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub report: ReportConfig,
    pub producer: ProducerConfig,
    #[serde(default)]
    pub topics: Vec<TopicConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Directory holding every `<name>_merged.csv` and `<name>_log.csv`.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleaningConfig {
    #[serde(default = "default_text_field")]
    pub text_field: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            text_field: default_text_field(),
            id_field: default_id_field(),
        }
    }
}

fn default_text_field() -> String {
    TEXT.to_string()
}
fn default_id_field() -> String {
    ID.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MaintenanceConfig {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Append a re-baselining entry to a corpus's log when the sweep shrinks it.
    #[serde(default)]
    pub update_progress_log: bool,
    #[serde(default = "default_true")]
    pub run_after_collect: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            update_progress_log: false,
            run_after_collect: true,
        }
    }
}

fn default_pattern() -> String {
    format!("*{}", CORPUS_SUFFIX)
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunConfig {
    /// Abort the run at the first failing topic instead of skipping it.
    #[serde(default)]
    pub stop_on_error: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Corpus whose `community` column feeds the leaderboard.
    #[serde(default)]
    pub leaderboard_corpus: Option<String>,
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            leaderboard_corpus: None,
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

fn default_leaderboard_size() -> usize {
    25
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProducerConfig {
    /// JSON-lines export files, see [`FileProducer`](crate::producer::FileProducer).
    File { root: PathBuf },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopicConfig {
    /// Several keyword searches pooled into one corpus.
    Keyword {
        label: String,
        #[serde(default = "default_community")]
        community: String,
        keywords: Vec<String>,
        #[serde(default = "default_keyword_limit")]
        limit: usize,
        /// Corpus name; defaults to the label.
        #[serde(default)]
        corpus: Option<String>,
    },
    /// Newest posts of each community, one corpus per community.
    Communities {
        label: String,
        communities: Vec<String>,
        #[serde(default = "default_community_limit")]
        limit: usize,
    },
}

fn default_community() -> String {
    crate::producer::ALL_COMMUNITIES.to_string()
}
fn default_keyword_limit() -> usize {
    1000
}
fn default_community_limit() -> usize {
    250
}

impl TopicConfig {
    pub fn label(&self) -> &str {
        match self {
            TopicConfig::Keyword { label, .. } | TopicConfig::Communities { label, .. } => label,
        }
    }

    /// Corpus names this topic writes to.
    pub fn corpus_names(&self) -> Vec<String> {
        match self {
            TopicConfig::Keyword { label, corpus, .. } => {
                vec![corpus.clone().unwrap_or_else(|| label.clone())]
            }
            TopicConfig::Communities { communities, .. } => communities.clone(),
        }
    }
}

impl Config {
    pub fn target(&self, corpus_name: &str) -> CorpusTarget {
        CorpusTarget::for_name(&self.data.dir, corpus_name)
    }

    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            pattern: self.maintenance.pattern.clone(),
            id_field: self.cleaning.id_field.clone(),
            text_field: self.cleaning.text_field.clone(),
            update_progress_log: self.maintenance.update_progress_log,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.cleaning.text_field.trim().is_empty() {
        bail!("cleaning.text_field must not be empty");
    }

    if config.report.leaderboard_size == 0 {
        bail!("report.leaderboard_size must be >= 1");
    }

    if let Err(e) = globset::Glob::new(&config.maintenance.pattern) {
        bail!("maintenance.pattern is not a valid glob: {}", e);
    }

    let mut labels = HashSet::new();
    let mut corpora = HashSet::new();
    for topic in &config.topics {
        let label = topic.label();
        if label.trim().is_empty() {
            bail!("topic label must not be empty");
        }
        if !labels.insert(label.to_string()) {
            bail!("duplicate topic label: '{}'", label);
        }
        match topic {
            TopicConfig::Keyword { keywords, limit, .. } => {
                if keywords.is_empty() {
                    bail!("topic '{}': keywords must not be empty", label);
                }
                if *limit == 0 {
                    bail!("topic '{}': limit must be >= 1", label);
                }
            }
            TopicConfig::Communities {
                communities, limit, ..
            } => {
                if communities.is_empty() {
                    bail!("topic '{}': communities must not be empty", label);
                }
                if *limit == 0 {
                    bail!("topic '{}': limit must be >= 1", label);
                }
            }
        }
        // two topics writing one corpus would double-log every run
        for name in topic.corpus_names() {
            if !corpora.insert(name.clone()) {
                bail!("corpus '{}' is written by more than one topic", name);
            }
        }
    }

    Ok(config)
}
