use async_trait::async_trait;
use shorten_core::{
    MappingId, MappingStore, MappingUpdate, NewMapping, ReadStore, Result, StoreError, UrlMapping,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::error::ErrorKind;
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/sqlite/url_mappings.sql");

/// Connection settings for [`SqliteStore`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct SqliteStoreConfig {
    /// e.g. `sqlite://shorten.db` or `sqlite::memory:`
    #[builder(setter(into))]
    pub database_url: String,
    #[builder(default = 5)]
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing.
    #[builder(default = Duration::from_secs(5))]
    pub busy_timeout: Duration,
    /// Apply the table definition on connect.
    #[builder(default = true)]
    pub create_schema: bool,
}

/// SQLite implementation of the store contract.
///
/// Every mutation is a single statement and the table carries `UNIQUE`
/// constraints on `id` and `shortened_url`, so SQLite itself decides which
/// of two racing writers claims a token. Insertion order is kept in an
/// `AUTOINCREMENT` column that updates never touch.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a store from an existing SQLite connection pool.
    ///
    /// The schema is not applied; call [`SqliteStore::init_schema`] if needed.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url` and applies the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(SqliteStoreConfig::builder().database_url(database_url).build()).await
    }

    /// Opens a pool with explicit settings.
    pub async fn connect_with(config: SqliteStoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        debug!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "connected sqlite store"
        );

        let store = Self::new(pool);
        if config.create_schema {
            store.init_schema().await?;
        }
        Ok(store)
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// The pool holds exactly one connection that never expires, since the
    /// database lives only as long as its connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(map_sqlx_error)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// Creates the `url_mappings` table if it does not exist.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Which constraint a write tripped over.
enum Violation {
    Id,
    Token,
    /// The id column rejected a NULL or non-integer id.
    IdRange,
}

fn constraint_violation(err: &sqlx::Error) -> Option<Violation> {
    let db_err = err.as_database_error()?;
    match db_err.kind() {
        // SQLite names the column: "UNIQUE constraint failed: url_mappings.shortened_url"
        ErrorKind::UniqueViolation if db_err.message().contains("url_mappings.shortened_url") => {
            Some(Violation::Token)
        }
        ErrorKind::UniqueViolation => Some(Violation::Id),
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => Some(Violation::IdRange),
        _ => None,
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

fn mapping_from_row(row: &SqliteRow) -> Result<UrlMapping> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let shortened_url: String = row.try_get("shortened_url").map_err(map_sqlx_error)?;

    Ok(UrlMapping {
        id: MappingId::new(id),
        original_url,
        shortened_url,
    })
}

#[async_trait]
impl ReadStore for SqliteStore {
    async fn get_by_id(&self, id: MappingId) -> Result<UrlMapping> {
        let row = sqlx::query(
            r#"
            SELECT id, original_url, shortened_url
            FROM url_mappings
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => mapping_from_row(&row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn get_all(&self) -> Result<Vec<UrlMapping>> {
        let rows = sqlx::query(
            r#"
            SELECT id, original_url, shortened_url
            FROM url_mappings
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(mapping_from_row).collect()
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(
            r#"
            SELECT id, original_url, shortened_url
            FROM url_mappings
            WHERE shortened_url = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(mapping_from_row).transpose()
    }

    async fn exists_by_token(&self, token: &str) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM url_mappings
            WHERE shortened_url = ?
            LIMIT 1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl MappingStore for SqliteStore {
    async fn add(&self, mapping: NewMapping) -> Result<UrlMapping> {
        mapping.validate()?;

        // Id assignment happens inside the INSERT so it shares the statement's write lock.
        // At the top of the range the assigned id is NULL and the NOT NULL constraint fires.
        let result = sqlx::query(
            r#"
            INSERT INTO url_mappings (id, original_url, shortened_url)
            VALUES (
                COALESCE(?, (
                    SELECT CASE
                        WHEN MAX(id) = 9223372036854775807 THEN NULL
                        ELSE COALESCE(MAX(id), 0) + 1
                    END
                    FROM url_mappings
                )),
                ?,
                ?
            )
            RETURNING id, original_url, shortened_url
            "#,
        )
        .bind(mapping.id.map(MappingId::get))
        .bind(mapping.original_url.as_str())
        .bind(mapping.shortened_url.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                let record = mapping_from_row(&row)?;
                trace!(id = %record.id, token = %record.shortened_url, "inserted mapping");
                Ok(record)
            }
            Err(err) => match (constraint_violation(&err), mapping.id) {
                (Some(Violation::Token), _) => Err(StoreError::DuplicateToken(mapping.shortened_url)),
                (Some(Violation::Id), Some(id)) => Err(StoreError::DuplicateId(id)),
                (Some(Violation::IdRange), None) => Err(StoreError::InvalidArgument(
                    "no mapping id left to assign".to_string(),
                )),
                _ => Err(map_sqlx_error(err)),
            },
        }
    }

    async fn update(&self, id: MappingId, update: MappingUpdate) -> Result<UrlMapping> {
        update.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE url_mappings
            SET original_url = COALESCE(?, original_url),
                shortened_url = COALESCE(?, shortened_url)
            WHERE id = ?
            RETURNING id, original_url, shortened_url
            "#,
        )
        .bind(update.original_url.as_deref())
        .bind(update.shortened_url.as_deref())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => {
                trace!(id = %id, "updated mapping");
                mapping_from_row(&row)
            }
            Ok(None) => Err(StoreError::NotFound(id)),
            Err(err) => match constraint_violation(&err) {
                Some(Violation::Token) => Err(StoreError::DuplicateToken(
                    update.shortened_url.unwrap_or_default(),
                )),
                _ => Err(map_sqlx_error(err)),
            },
        }
    }

    async fn remove(&self, id: MappingId) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM url_mappings
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        trace!(id = %id, "removed mapping");
        Ok(())
    }
}
