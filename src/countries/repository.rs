// Country persistence: the generic engine plus one relationship query

use std::ops::Deref;

use sqlx::PgPool;

use crate::models::{Country, CountryDetails, Hotel};
use crate::repository::{Entity, GenericRepository, RepositoryError};

/// Repository for countries
///
/// Everything except the details fetch is inherited from the generic
/// engine via `Deref`.
#[derive(Clone)]
pub struct CountriesRepository {
    base: GenericRepository<Country>,
}

impl CountriesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: GenericRepository::new(pool),
        }
    }

    /// Fetch a country with every hotel that references it, in id order
    ///
    /// `None` means the country does not exist; a country with no hotels
    /// comes back with an empty list, which is not an error.
    pub async fn get_details(&self, id: i32) -> Result<Option<CountryDetails>, RepositoryError> {
        let Some(country) = self.base.get(Some(id)).await? else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {} FROM {} WHERE country_id = $1 ORDER BY id",
            Hotel::COLUMNS,
            Hotel::TABLE
        );
        let hotels = sqlx::query_as::<_, Hotel>(&sql)
            .bind(id)
            .fetch_all(self.base.pool())
            .await?;

        Ok(Some(CountryDetails::new(country, hotels)))
    }
}

impl Deref for CountriesRepository {
    type Target = GenericRepository<Country>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
