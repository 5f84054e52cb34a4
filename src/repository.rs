// Generic data-access layer shared by every resource repository
// Provides CRUD plus a cheap existence probe over a single entity table,
// with optimistic concurrency enforced on update via a row_version column

use std::marker::PhantomData;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Postgres};

/// Query type produced by `sqlx::query_as` for an entity row
pub type EntityQuery<'q, T> = sqlx::query::QueryAs<'q, Postgres, T, PgArguments>;

/// Schema descriptor implemented once per persisted entity type
///
/// The engine below is written entirely against this trait, so adding a
/// new resource means providing table metadata and bind hooks, not
/// re-implementing persistence logic.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Table name
    const TABLE: &'static str;

    /// Select list, must include `id` and `row_version`
    const COLUMNS: &'static str;

    /// Full insert statement returning `COLUMNS`; binds are supplied by
    /// `bind_insert` in declaration order
    const INSERT_SQL: &'static str;

    /// Versioned update statement returning `COLUMNS`. Field binds come
    /// from `bind_update`; the engine appends the `id` and expected
    /// `row_version` binds for the compare-and-swap predicate.
    const UPDATE_SQL: &'static str;

    fn id(&self) -> i32;

    fn row_version(&self) -> i32;

    fn bind_insert<'q>(&self, query: EntityQuery<'q, Self>) -> EntityQuery<'q, Self>
    where
        Self: Sized;

    fn bind_update<'q>(&self, query: EntityQuery<'q, Self>) -> EntityQuery<'q, Self>
    where
        Self: Sized;
}

/// Error types for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The requested row does not exist
    #[error("record not found")]
    NotFound,

    /// The row was modified or removed by another writer since it was
    /// loaded; the caller decides whether to re-fetch, merge, or report
    #[error("record was changed by another writer")]
    ConcurrencyConflict,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// CRUD engine parameterized by an `Entity` schema descriptor
///
/// Stateless apart from the pool handle; all concurrency control is
/// delegated to the store's row_version comparison.
pub struct GenericRepository<T> {
    pool: PgPool,
    _entity: PhantomData<T>,
}

impl<T> Clone for GenericRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> GenericRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// Pool handle for specializations that add relationship queries
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch one entity by id; `None` id or absent row is "not found",
    /// never an error
    pub async fn get(&self, id: Option<i32>) -> Result<Option<T>, RepositoryError> {
        let Some(id) = id else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            T::COLUMNS,
            T::TABLE
        );
        let entity = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entity)
    }

    /// Fetch every entity of this type in storage (id) order
    pub async fn get_all(&self) -> Result<Vec<T>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            T::COLUMNS,
            T::TABLE
        );
        let entities = sqlx::query_as::<_, T>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(entities)
    }

    /// Persist a new row and return it with the store-assigned id and
    /// initial row_version populated
    pub async fn add(&self, entity: &T) -> Result<T, RepositoryError> {
        let query = sqlx::query_as::<_, T>(T::INSERT_SQL);
        let created = entity.bind_insert(query).fetch_one(&self.pool).await?;

        tracing::debug!("inserted {} row with id {}", T::TABLE, created.id());
        Ok(created)
    }

    /// Persist changes to an existing row, matched by id AND the
    /// row_version the entity was loaded with
    ///
    /// Exactly one of two concurrent updates against the same version
    /// succeeds; the loser gets `ConcurrencyConflict` and must probe
    /// `exists` to tell "modified meanwhile" from "deleted meanwhile".
    pub async fn update(&self, entity: &T) -> Result<T, RepositoryError> {
        let query = sqlx::query_as::<_, T>(T::UPDATE_SQL);
        let updated = entity
            .bind_update(query)
            .bind(entity.id())
            .bind(entity.row_version())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(entity) => Ok(entity),
            None => {
                tracing::warn!(
                    "optimistic concurrency conflict on {} id {}",
                    T::TABLE,
                    entity.id()
                );
                Err(RepositoryError::ConcurrencyConflict)
            }
        }
    }

    /// Remove the row with the given id
    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::debug!("deleted {} row with id {}", T::TABLE, id);
        Ok(())
    }

    /// Existence probe that never loads the entity
    pub async fn exists(&self, id: i32) -> Result<bool, RepositoryError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            T::TABLE
        );
        let exists: (bool,) = sqlx::query_as(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }
}
