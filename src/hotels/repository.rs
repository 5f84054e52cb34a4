// Hotel persistence: a thin alias over the generic engine

use std::ops::Deref;

use sqlx::PgPool;

use crate::models::Hotel;
use crate::repository::GenericRepository;

/// Repository for hotels; no relationship queries of its own
#[derive(Clone)]
pub struct HotelsRepository {
    base: GenericRepository<Hotel>,
}

impl HotelsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: GenericRepository::new(pool),
        }
    }
}

impl Deref for HotelsRepository {
    type Target = GenericRepository<Hotel>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
