//! Library-level tests of the clean → merge → log pipeline against the
//! on-disk CSV store, plus a custom producer driven through the collector.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use corpus_harness::clean::clean;
use corpus_harness::config::load_config;
use corpus_harness::ingest::Collector;
use corpus_harness::maintenance::{dedupe_all, SweepOptions};
use corpus_harness::merge::{merge, Delta};
use corpus_harness::models::{Batch, CorpusTarget, Post, Record, ID, TEXT};
use corpus_harness::producer::{Producer, Query};
use corpus_harness::progress_log::{parse_timestamp, ProgressLog};
use corpus_harness::store::{CorpusStore, CsvStore};
use std::fs;
use tempfile::TempDir;

fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

fn texts(texts: &[&str]) -> Batch {
    Batch::new(
        vec![TEXT.to_string()],
        texts.iter().map(|t| Record::new().with(TEXT, *t)).collect(),
    )
}

fn numbered(prefix: &str, n: usize) -> Batch {
    Batch::new(
        vec![ID.to_string(), TEXT.to_string()],
        (0..n)
            .map(|i| {
                Record::new()
                    .with(ID, format!("{}{}", prefix, i))
                    .with(TEXT, format!("{} post {}", prefix, i))
            })
            .collect(),
    )
}

#[test]
fn test_first_merge_into_empty_directory() {
    let tmp = TempDir::new().unwrap();
    let store = CsvStore::new();
    let target = CorpusTarget::for_name(tmp.path(), "topic");

    let raw = texts(&["hello", "hello", " ", "world"]);
    let raw_total = raw.len();
    let cleaned = clean(raw, TEXT).unwrap();
    assert_eq!((cleaned.removed_blank, cleaned.removed_duplicate), (1, 1));

    let result = merge(
        &store,
        cleaned.batch,
        raw_total,
        &target,
        TEXT,
        ts("2024-06-01 10:00:00"),
    )
    .unwrap();
    assert_eq!(result.final_unique_count, 2);
    assert_eq!(result.last_logged_total, 0);
    assert_eq!(result.new_posts, Delta::Increase(2));

    assert_eq!(
        fs::read_to_string(&target.corpus).unwrap(),
        "Text\nhello\nworld\n"
    );
    assert_eq!(
        fs::read_to_string(&target.log).unwrap(),
        "timestamp,unique_texts\n2024-06-01 10:00:00,2\n"
    );
}

#[test]
fn test_merge_counts_only_new_texts() {
    let tmp = TempDir::new().unwrap();
    let store = CsvStore::new();
    let target = CorpusTarget::for_name(tmp.path(), "topic");

    store.save(&target.corpus, &numbered("old", 10)).unwrap();
    ProgressLog::new(&store, &target.log)
        .append(ts("2024-06-01 10:00:00"), 10)
        .unwrap();

    let incoming = texts(&[
        "fresh 1",
        "fresh 2",
        "fresh 3",
        "old post 2",
        "old post 9",
    ]);
    let cleaned = clean(incoming, TEXT).unwrap();
    let result = merge(
        &store,
        cleaned.batch,
        5,
        &target,
        TEXT,
        ts("2024-06-01 11:00:00"),
    )
    .unwrap();

    assert_eq!(result.pre_merge_corpus_size, 10);
    assert_eq!(result.final_unique_count, 13);
    assert_eq!(result.new_posts, Delta::Increase(3));

    // existing ids survive, new rows have a null ID cell
    let stored = store.load(&target.corpus).unwrap().unwrap();
    assert_eq!(stored.columns, vec![ID, TEXT]);
    assert_eq!(stored.records[0].get(ID), Some("old0"));
    assert_eq!(stored.records[12].get(ID), None);
}

#[test]
fn test_externally_shrunk_corpus_gives_negative_delta() {
    let tmp = TempDir::new().unwrap();
    let store = CsvStore::new();
    let target = CorpusTarget::for_name(tmp.path(), "topic");

    store.save(&target.corpus, &numbered("p", 13)).unwrap();
    ProgressLog::new(&store, &target.log)
        .append(ts("2024-06-01 10:00:00"), 15)
        .unwrap();

    let result = merge(
        &store,
        texts(&[]),
        0,
        &target,
        TEXT,
        ts("2024-06-01 11:00:00"),
    )
    .unwrap();
    assert_eq!(result.final_unique_count, 13);
    assert_eq!(result.new_posts, Delta::Decrease(2));
    assert_eq!(result.new_posts.signed(), -2);
}

#[test]
fn test_sweep_is_idempotent_on_disk() {
    let tmp = TempDir::new().unwrap();
    let store = CsvStore::new();
    fs::write(
        tmp.path().join("topic_merged.csv"),
        "ID,Text\n1,a\n1,b\n2,c\n3,c\n",
    )
    .unwrap();

    let now = ts("2024-06-01 12:00:00");
    let first = dedupe_all(&store, tmp.path(), &SweepOptions::default(), now).unwrap();
    let stats = first.succeeded().next().unwrap();
    assert_eq!((stats.size_before, stats.size_after), (4, 2));

    let second = dedupe_all(&store, tmp.path(), &SweepOptions::default(), now).unwrap();
    let stats = second.succeeded().next().unwrap();
    assert_eq!(stats.size_before, stats.size_after);
    assert_eq!(
        fs::read_to_string(tmp.path().join("topic_merged.csv")).unwrap(),
        "ID,Text\n1,a\n2,c\n"
    );
}

// ─── Custom producer ────────────────────────────────────────────────

struct InMemoryProducer {
    posts: Vec<Post>,
}

#[async_trait]
impl Producer for InMemoryProducer {
    fn name(&self) -> &str {
        "inmemory"
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Post>> {
        Ok(self
            .posts
            .iter()
            .filter(|p| p.community == query.community())
            .take(query.limit())
            .cloned()
            .collect())
    }
}

fn post(id: &str, community: &str, text: Option<&str>) -> Post {
    Post {
        title: format!("post {}", id),
        text: text.map(str::to_string),
        author: None,
        id: id.to_string(),
        community: community.to_string(),
        created_utc: 1_700_000_000,
        url: None,
    }
}

#[tokio::test]
async fn test_collector_with_custom_producer() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("corpus.toml");
    fs::write(
        &config_path,
        format!(
            r#"[data]
dir = "{}/data"

[producer]
kind = "file"
root = "{}/unused"

[[topics]]
kind = "communities"
label = "SUBS"
communities = ["alpha", "beta"]
limit = 2
"#,
            tmp.path().display(),
            tmp.path().display()
        ),
    )
    .unwrap();
    let config = load_config(&config_path).unwrap();

    let producer = InMemoryProducer {
        posts: vec![
            post("1", "alpha", Some("one")),
            post("2", "alpha", None),
            post("3", "alpha", Some("three")),
            post("4", "beta", Some("four")),
        ],
    };
    let store = CsvStore::new();
    let collector = Collector::new(&config, &store, &producer);

    let summary = collector.run(None, false).await.unwrap();
    let report = summary.topics[0].result.as_ref().unwrap();
    assert_eq!(report.sources.len(), 2);

    // limit 2 keeps posts 1 and 2; post 2 has no text
    let alpha = &report.sources[0];
    assert_eq!(alpha.merge.raw_total, 2);
    assert_eq!(alpha.clean.removed_blank, 1);
    assert_eq!(alpha.merge.final_unique_count, 1);

    assert_eq!(report.new_posts(), Delta::Increase(2));
    assert_eq!(summary.sweep.as_ref().unwrap().as_ref().unwrap().outcomes.len(), 2);
    assert!(tmp.path().join("data/beta_merged.csv").exists());
    assert!(tmp.path().join("data/beta_log.csv").exists());
}
