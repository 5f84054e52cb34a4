use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::repository::{Entity, EntityQuery};

/// A country that owns zero or more hotels
///
/// `row_version` starts at 0 on insert and is incremented by the store on
/// every successful update; it backs the optimistic-concurrency check.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Country {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Jamaica")]
    pub name: String,
    #[schema(example = "JM")]
    pub short_name: String,
    pub row_version: i32,
}

impl Entity for Country {
    const TABLE: &'static str = "countries";
    const COLUMNS: &'static str = "id, name, short_name, row_version";
    const INSERT_SQL: &'static str = "INSERT INTO countries (name, short_name) \
         VALUES ($1, $2) \
         RETURNING id, name, short_name, row_version";
    const UPDATE_SQL: &'static str = "UPDATE countries \
         SET name = $1, short_name = $2, row_version = row_version + 1 \
         WHERE id = $3 AND row_version = $4 \
         RETURNING id, name, short_name, row_version";

    fn id(&self) -> i32 {
        self.id
    }

    fn row_version(&self) -> i32 {
        self.row_version
    }

    fn bind_insert<'q>(&self, query: EntityQuery<'q, Self>) -> EntityQuery<'q, Self> {
        query.bind(self.name.clone()).bind(self.short_name.clone())
    }

    fn bind_update<'q>(&self, query: EntityQuery<'q, Self>) -> EntityQuery<'q, Self> {
        query.bind(self.name.clone()).bind(self.short_name.clone())
    }
}

/// A hotel holding a required foreign reference to exactly one country
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Hotel {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Sandals Resort and Spa")]
    pub name: String,
    #[schema(example = "Negril")]
    pub address: String,
    #[schema(example = 4.5, minimum = 0.0, maximum = 5.0)]
    pub rating: f64,
    #[schema(example = 1)]
    pub country_id: i32,
    pub row_version: i32,
}

impl Entity for Hotel {
    const TABLE: &'static str = "hotels";
    const COLUMNS: &'static str = "id, name, address, rating, country_id, row_version";
    const INSERT_SQL: &'static str = "INSERT INTO hotels (name, address, rating, country_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, name, address, rating, country_id, row_version";
    const UPDATE_SQL: &'static str = "UPDATE hotels \
         SET name = $1, address = $2, rating = $3, country_id = $4, \
             row_version = row_version + 1 \
         WHERE id = $5 AND row_version = $6 \
         RETURNING id, name, address, rating, country_id, row_version";

    fn id(&self) -> i32 {
        self.id
    }

    fn row_version(&self) -> i32 {
        self.row_version
    }

    fn bind_insert<'q>(&self, query: EntityQuery<'q, Self>) -> EntityQuery<'q, Self> {
        query
            .bind(self.name.clone())
            .bind(self.address.clone())
            .bind(self.rating)
            .bind(self.country_id)
    }

    fn bind_update<'q>(&self, query: EntityQuery<'q, Self>) -> EntityQuery<'q, Self> {
        query
            .bind(self.name.clone())
            .bind(self.address.clone())
            .bind(self.rating)
            .bind(self.country_id)
    }
}

/// A country together with its related hotels, as returned by the
/// details fetch; plain gets never load the relation
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CountryDetails {
    pub id: i32,
    pub name: String,
    pub short_name: String,
    pub hotels: Vec<Hotel>,
}

impl CountryDetails {
    pub fn new(country: Country, hotels: Vec<Hotel>) -> Self {
        Self {
            id: country.id,
            name: country.name,
            short_name: country.short_name,
            hotels,
        }
    }
}

/// Payload for POST /api/countries
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCountry {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Jamaica")]
    pub name: String,
    #[validate(length(min = 1, max = 10))]
    #[schema(example = "JM")]
    pub short_name: String,
}

/// Payload for PUT /api/countries/{id}; carries the record id so the
/// handler can reject mismatched routes
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCountry {
    pub id: i32,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 10))]
    pub short_name: String,
}

/// Payload for POST /api/hotels
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateHotel {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Sandals Resort and Spa")]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Negril")]
    pub address: String,
    #[validate(range(min = 0.0, max = 5.0))]
    #[schema(example = 4.5, minimum = 0.0, maximum = 5.0)]
    pub rating: f64,
    #[schema(example = 1)]
    pub country_id: i32,
}

/// Payload for PUT /api/hotels/{id}
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateHotel {
    pub id: i32,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub address: String,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    pub country_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Update statements must carry the compare-and-swap predicate and
    /// the version increment, or lost updates go undetected
    #[test]
    fn test_country_update_sql_is_versioned() {
        assert!(Country::UPDATE_SQL.contains("row_version = row_version + 1"));
        assert!(Country::UPDATE_SQL.contains("AND row_version ="));
    }

    #[test]
    fn test_hotel_update_sql_is_versioned() {
        assert!(Hotel::UPDATE_SQL.contains("row_version = row_version + 1"));
        assert!(Hotel::UPDATE_SQL.contains("AND row_version ="));
    }

    /// Insert must never set id or row_version; the store assigns both
    #[test]
    fn test_insert_sql_leaves_id_and_version_to_store() {
        for sql in [Country::INSERT_SQL, Hotel::INSERT_SQL] {
            let (columns, _) = sql.split_once("VALUES").expect("insert has VALUES");
            assert!(!columns.contains("id,"));
            assert!(!columns.contains("row_version"));
        }
    }

    #[test]
    fn test_country_details_flattens_country_fields() {
        let country = Country {
            id: 5,
            name: "Jamaica".to_string(),
            short_name: "JM".to_string(),
            row_version: 2,
        };
        let hotel = Hotel {
            id: 9,
            name: "Sandals Resort and Spa".to_string(),
            address: "Negril".to_string(),
            rating: 4.5,
            country_id: 5,
            row_version: 0,
        };

        let details = CountryDetails::new(country, vec![hotel]);
        assert_eq!(details.id, 5);
        assert_eq!(details.name, "Jamaica");
        assert_eq!(details.hotels.len(), 1);
        assert_eq!(details.hotels[0].country_id, 5);
    }

    #[test]
    fn test_create_hotel_rejects_out_of_range_rating() {
        let payload = CreateHotel {
            name: "Test Hotel".to_string(),
            address: "Test Address".to_string(),
            rating: 5.5,
            country_id: 1,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_create_country_deserialization() {
        let json = r#"{"name": "Cayman Islands", "short_name": "KY"}"#;
        let payload: CreateCountry =
            serde_json::from_str(json).expect("Failed to deserialize CreateCountry");

        assert_eq!(payload.name, "Cayman Islands");
        assert_eq!(payload.short_name, "KY");
    }
}
