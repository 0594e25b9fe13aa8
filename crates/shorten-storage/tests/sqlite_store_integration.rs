use std::path::PathBuf;
use std::sync::Arc;

use shorten_core::{MappingId, MappingUpdate, NewMapping, UrlMapping};
use shorten_storage::{MappingStore, ReadStore, SqliteStore, SqliteStoreConfig, StoreError};

struct Fixture {
    store: SqliteStore,
    path: Option<PathBuf>,
}

impl Fixture {
    async fn start() -> Self {
        let store = SqliteStore::in_memory().await.expect("open sqlite");
        Self { store, path: None }
    }

    /// A database file behind a pool with the default connection count, so
    /// concurrent writers contend on SQLite's own locks.
    async fn on_disk(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "shorten-{}-{}.db",
            name,
            std::process::id()
        ));
        remove_database_files(&path);

        let config = SqliteStoreConfig::builder()
            .database_url(format!("sqlite://{}", path.display()))
            .build();
        assert!(config.max_connections > 1);

        let store = SqliteStore::connect_with(config)
            .await
            .expect("open sqlite file");
        Self {
            store,
            path: Some(path),
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            remove_database_files(path);
        }
    }
}

fn remove_database_files(path: &std::path::Path) {
    let _ = std::fs::remove_file(path);
    for suffix in ["-wal", "-shm", "-journal"] {
        let mut sibling = path.as_os_str().to_owned();
        sibling.push(suffix);
        let _ = std::fs::remove_file(sibling);
    }
}

fn candidate(url: &str, token: &str) -> NewMapping {
    NewMapping::builder()
        .original_url(url)
        .shortened_url(token)
        .build()
}

fn candidate_with_id(id: i64, url: &str, token: &str) -> NewMapping {
    NewMapping::builder()
        .id(id)
        .original_url(url)
        .shortened_url(token)
        .build()
}

#[tokio::test]
async fn add_and_get_by_id() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .add(candidate("https://example.com", "abc123"))
        .await
        .unwrap();

    let got = fixture.store.get_by_id(MappingId::new(1)).await.unwrap();
    assert_eq!(
        got,
        UrlMapping {
            id: MappingId::new(1),
            original_url: "https://example.com".to_string(),
            shortened_url: "abc123".to_string(),
        }
    );
}

#[tokio::test]
async fn add_keeps_caller_supplied_id() {
    let fixture = Fixture::start().await;

    let added = fixture
        .store
        .add(candidate_with_id(42, "https://example.com", "abc123"))
        .await
        .unwrap();
    assert_eq!(added.id, MappingId::new(42));

    let next = fixture
        .store
        .add(candidate("https://other.com", "def456"))
        .await
        .unwrap();
    assert_eq!(next.id, MappingId::new(43));
}

#[tokio::test]
async fn add_refuses_to_assign_past_the_largest_id() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .add(candidate_with_id(i64::MAX, "https://example.com", "abc123"))
        .await
        .unwrap();

    let err = fixture
        .store
        .add(candidate("https://other.com", "def456"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));

    let all = fixture.store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, MappingId::new(i64::MAX));

    let explicit = fixture
        .store
        .add(candidate_with_id(5, "https://other.com", "def456"))
        .await
        .unwrap();
    assert_eq!(explicit.id, MappingId::new(5));
}

#[tokio::test]
async fn add_conflicts_when_token_already_exists() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .add(candidate("https://one.example", "abc123"))
        .await
        .unwrap();

    let err = fixture
        .store
        .add(candidate("https://two.example", "abc123"))
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::DuplicateToken("abc123".to_string()));
    assert_eq!(fixture.store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn add_conflicts_when_id_already_exists() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .add(candidate_with_id(1, "https://one.example", "abc123"))
        .await
        .unwrap();

    let err = fixture
        .store
        .add(candidate_with_id(1, "https://two.example", "def456"))
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::DuplicateId(MappingId::new(1)));
}

#[tokio::test]
async fn add_rejects_empty_values_before_writing() {
    let fixture = Fixture::start().await;

    let err = fixture
        .store
        .add(candidate("", "abc123"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidArgument(_)));
    assert!(!fixture.store.exists_by_token("abc123").await.unwrap());
}

#[tokio::test]
async fn get_all_returns_insertion_order() {
    let fixture = Fixture::start().await;

    for (id, token) in [(2, "bbb"), (1, "aaa"), (3, "ccc")] {
        fixture
            .store
            .add(candidate_with_id(id, "https://example.com", token))
            .await
            .unwrap();
    }

    let tokens: Vec<String> = fixture
        .store
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.shortened_url)
        .collect();
    assert_eq!(tokens, vec!["bbb", "aaa", "ccc"]);
}

#[tokio::test]
async fn update_changes_values_in_place() {
    let fixture = Fixture::start().await;
    let first = fixture
        .store
        .add(candidate("https://example.com", "abc123"))
        .await
        .unwrap();
    fixture
        .store
        .add(candidate("https://another.com", "def456"))
        .await
        .unwrap();

    let updated = fixture
        .store
        .update(
            first.id,
            MappingUpdate::builder()
                .original_url("https://newexample.com")
                .shortened_url("new123")
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, first.id);
    assert_eq!(updated.original_url, "https://newexample.com");
    assert_eq!(updated.shortened_url, "new123");

    // still listed first
    let all = fixture.store.get_all().await.unwrap();
    assert_eq!(all[0], updated);
    assert!(!fixture.store.exists_by_token("abc123").await.unwrap());
}

#[tokio::test]
async fn update_rejects_token_held_by_another_mapping() {
    let fixture = Fixture::start().await;
    let first = fixture
        .store
        .add(candidate("https://example.com", "abc123"))
        .await
        .unwrap();
    fixture
        .store
        .add(candidate("https://another.com", "def456"))
        .await
        .unwrap();

    let err = fixture
        .store
        .update(
            first.id,
            MappingUpdate::builder().shortened_url("def456").build(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::DuplicateToken("def456".to_string()));
    let unchanged = fixture.store.get_by_id(first.id).await.unwrap();
    assert_eq!(unchanged.shortened_url, "abc123");
}

#[tokio::test]
async fn update_missing_mapping_is_not_found() {
    let fixture = Fixture::start().await;

    let err = fixture
        .store
        .update(
            MappingId::new(7),
            MappingUpdate::builder().original_url("https://x.com").build(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::NotFound(MappingId::new(7)));
}

#[tokio::test]
async fn remove_frees_token_for_reuse() {
    let fixture = Fixture::start().await;
    let added = fixture
        .store
        .add(candidate("https://example.com", "abc123"))
        .await
        .unwrap();

    fixture.store.remove(added.id).await.unwrap();

    assert_eq!(
        fixture.store.get_by_id(added.id).await.unwrap_err(),
        StoreError::NotFound(added.id)
    );
    assert!(fixture.store.get_by_token("abc123").await.unwrap().is_none());
    assert_eq!(
        fixture.store.remove(added.id).await.unwrap_err(),
        StoreError::NotFound(added.id)
    );

    fixture
        .store
        .add(candidate("https://other.com", "abc123"))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_adds_claim_a_token_once() {
    let fixture = Fixture::on_disk("racing-adds").await;
    let store = Arc::new(fixture.store.clone());
    let mut handles = vec![];

    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .add(candidate(&format!("https://racer{}.com", i), "contested"))
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert!(matches!(err, StoreError::DuplicateToken(_))),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(store.get_all().await.unwrap().len(), 1);
    store.pool().close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_add_and_updates_claim_a_token_once() {
    let fixture = Fixture::on_disk("racing-updates").await;
    let store = Arc::new(fixture.store.clone());

    let mut ids = vec![];
    for i in 0..8 {
        let added = store
            .add(candidate(&format!("https://own{}.com", i), &format!("own-{i}")))
            .await
            .unwrap();
        ids.push(added.id);
    }

    let mut handles = vec![];
    {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .add(candidate("https://newcomer.com", "contested"))
                .await
                .map(|_| ())
        }));
    }
    for id in ids {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .update(id, MappingUpdate::builder().shortened_url("contested").build())
                .await
                .map(|_| ())
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => winners += 1,
            Err(err) => assert!(matches!(err, StoreError::DuplicateToken(_))),
        }
    }

    let holders = store
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.shortened_url == "contested")
        .count();
    assert_eq!(winners, 1);
    assert_eq!(holders, 1);
    store.pool().close().await;
}

#[tokio::test]
async fn records_survive_reopening_a_database_file() {
    let path = std::env::temp_dir().join(format!("shorten-reopen-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}", path.display());

    {
        let store = SqliteStore::connect(&url).await.unwrap();
        store
            .add(candidate_with_id(1, "https://example.com", "abc123"))
            .await
            .unwrap();
        store.pool().close().await;
    }

    let config = SqliteStoreConfig::builder()
        .database_url(url.as_str())
        .max_connections(2)
        .build();
    let store = SqliteStore::connect_with(config).await.unwrap();
    let got = store.get_by_id(MappingId::new(1)).await.unwrap();
    assert_eq!(got.original_url, "https://example.com");
    assert_eq!(got.shortened_url, "abc123");

    store.pool().close().await;
    let _ = std::fs::remove_file(&path);
}
