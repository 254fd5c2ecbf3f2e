use std::sync::Arc;

use alzar::activity::{ActivityLog, Level};
use alzar::embedding::{HashingEmbeddingModel, MockEmbeddingModel, ModelHandle};
use alzar::error::AppError;
use alzar::library::{Library, Recommendation};
use alzar::ranker::RankingConfig;
use alzar::record::{Field, Submission};
use alzar::store::{JsonlStore, MemoryStore, RecordStore};
use tempfile::TempDir;

fn submission(title: &str, emotions: &str, opinion: &str) -> Submission {
  Submission {
    title: title.to_string(),
    author: format!("author of {title}"),
    genre: "novel".to_string(),
    emotions: emotions.to_string(),
    opinion: opinion.to_string(),
    ..Default::default()
  }
}

fn hashing_library(store: Arc<dyn RecordStore>) -> Library {
  let model = Arc::new(ModelHandle::preloaded(Box::new(HashingEmbeddingModel::new(384))));
  Library::new(store, model, RankingConfig::default())
}

#[tokio::test]
async fn test_blank_opinion_never_reaches_store() {
  let store = Arc::new(MemoryStore::new());
  let library = hashing_library(store.clone());

  let err = library.submit(submission("Dune", "awe", "   ")).await.unwrap_err();
  match err {
    AppError::Validation { missing } => assert_eq!(missing, vec![Field::Opinion]),
    other => panic!("expected validation error, got {other:?}"),
  }
  assert_eq!(store.append_count(), 0);
}

#[tokio::test]
async fn test_blank_query_lists_most_recent_first_without_model() {
  let store = Arc::new(MemoryStore::new());
  let mock = MockEmbeddingModel::new();
  let calls = mock.call_log();
  let library =
    Library::new(store, Arc::new(ModelHandle::preloaded(Box::new(mock))), RankingConfig::default());

  for title in ["first", "second", "third"] {
    library.submit(submission(title, "calm", "fine")).await.unwrap();
  }

  match library.recommend("  , ").await.unwrap() {
    Recommendation::Unranked(records) => {
      let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
      assert_eq!(titles, vec!["third", "second", "first"]);
    }
    other => panic!("expected unranked listing, got {other:?}"),
  }
  assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_store_is_no_data() {
  let library = hashing_library(Arc::new(MemoryStore::new()));
  assert_eq!(library.recommend("hope").await.unwrap(), Recommendation::NoData);
}

#[tokio::test]
async fn test_recommend_ranks_matching_work_first() {
  let library = hashing_library(Arc::new(MemoryStore::new()));
  library.submit(submission("Comedy", "joy, laughter", "a bright wedding farce")).await.unwrap();
  library.submit(submission("Sailor", "loneliness, longing", "lonely nights at sea")).await.unwrap();
  library.submit(submission("Garden", "calm", "flowers and bees")).await.unwrap();

  match library.recommend("loneliness, longing").await.unwrap() {
    Recommendation::Ranked(results) => {
      assert_eq!(results.len(), 3);
      assert_eq!(results[0].record.title, "Sailor");
      assert_eq!(results[0].record.emotions, "loneliness longing");
    }
    other => panic!("expected ranking, got {other:?}"),
  }
}

#[tokio::test]
async fn test_submission_invalidates_cache() {
  let store = Arc::new(MemoryStore::new());
  let library = hashing_library(store.clone());

  library.submit(submission("one", "", "x")).await.unwrap();
  assert_eq!(library.recent(None).await.unwrap().len(), 1);
  assert_eq!(library.recent(None).await.unwrap().len(), 1);
  assert_eq!(store.read_count(), 1);

  library.submit(submission("two", "", "y")).await.unwrap();
  let recent = library.recent(Some(1)).await.unwrap();
  assert_eq!(recent[0].title, "two");
  assert_eq!(store.read_count(), 2);
}

#[tokio::test]
async fn test_store_failure_is_store_unavailable() {
  let store = Arc::new(MemoryStore::new());
  let library = hashing_library(store.clone());
  store.set_unavailable(true);

  assert!(matches!(library.recent(None).await, Err(AppError::StoreUnavailable(_))));
  assert!(matches!(
    library.submit(submission("t", "", "o")).await,
    Err(AppError::StoreUnavailable(_))
  ));
}

#[tokio::test]
async fn test_embedding_failure_is_reported() {
  let store = Arc::new(MemoryStore::new());
  let model = MockEmbeddingModel::new().with_failure_on("hope");
  let library =
    Library::new(store, Arc::new(ModelHandle::preloaded(Box::new(model))), RankingConfig::default());

  library.submit(submission("t", "", "o")).await.unwrap();
  assert!(matches!(library.recommend("hope").await, Err(AppError::EmbeddingFailure(_))));
}

#[tokio::test]
async fn test_jsonl_store_end_to_end_with_activity_log() {
  let dir = TempDir::new().unwrap();
  let store = Arc::new(JsonlStore::new(dir.path().join("works.jsonl")));
  let activity = ActivityLog::new(dir.path().join("activity.jsonl"));
  let library = hashing_library(store).with_activity_log(activity.clone());

  library.submit(submission("소나기", "설렘, 슬픔", "첫사랑의 기억")).await.unwrap();

  let recent = library.recent(None).await.unwrap();
  assert_eq!(recent[0].emotions, "설렘 슬픔");

  let entries = activity.entries(None, Some(Level::Info)).await.unwrap();
  assert!(entries.iter().any(|e| e.message.contains("소나기")));
}
