use crate::entities::{geolocation, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set, SqlErr,
};
use thiserror::Error;
use tracing::info;

/// Repository for geolocation record operations
pub struct GeolocationRepository {
    conn: DatabaseConnection,
}

impl GeolocationRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_record(m: geolocation::Model) -> GeoRecord {
        GeoRecord {
            ip_address: m.ip_address,
            country: m.country,
            region: m.region,
            city: m.city,
            zip_code: m.zip,
            latitude: m.latitude,
            longitude: m.longitude,
        }
    }

    // ========================================================================
    // Record Operations
    // ========================================================================

    pub async fn find_by_ip(&self, ip: &str) -> Result<Vec<GeoRecord>> {
        let rows = Geolocation::find()
            .filter(geolocation::Column::IpAddress.eq(ip))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_record).collect())
    }

    pub async fn search(&self, filter: &RecordFilter, limit: u64) -> Result<Vec<GeoRecord>> {
        let rows = Geolocation::find()
            .filter(filter.to_condition())
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_record).collect())
    }

    /// Inserts a new record. The unique index on `ip_address` is the single
    /// source of truth for duplicates; a constraint violation surfaces as
    /// [`RecordInsertError::Duplicate`] instead of a pre-check read.
    pub async fn insert(&self, record: NewRecord) -> Result<(), RecordInsertError> {
        let ip = record.ip_address.clone();

        let active_model = geolocation::ActiveModel {
            ip_address: Set(record.ip_address),
            country: Set(record.country),
            region: Set(record.region),
            city: Set(record.city),
            zip: Set(record.zip),
            latitude: Set(record.latitude),
            longitude: Set(record.longitude),
            ..Default::default()
        };

        match Geolocation::insert(active_model).exec(&self.conn).await {
            Ok(_) => {
                info!("Added geolocation record for {}", ip);
                Ok(())
            }
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    Err(RecordInsertError::Duplicate(ip))
                } else {
                    Err(RecordInsertError::Db(e))
                }
            }
        }
    }

    /// Applies the supplied assignments to the row for `ip`. Returns the
    /// affected-row count; zero means no record exists for that address.
    pub async fn update_by_ip(&self, ip: &str, changes: &RecordChanges) -> Result<u64> {
        let mut update =
            Geolocation::update_many().filter(geolocation::Column::IpAddress.eq(ip));

        if let Some(country) = &changes.country {
            update = update.col_expr(geolocation::Column::Country, Expr::value(country.clone()));
        }
        if let Some(region) = &changes.region {
            update = update.col_expr(geolocation::Column::Region, Expr::value(region.clone()));
        }
        if let Some(city) = &changes.city {
            update = update.col_expr(geolocation::Column::City, Expr::value(city.clone()));
        }
        if let Some(zip) = changes.zip {
            update = update.col_expr(geolocation::Column::Zip, Expr::value(zip));
        }
        if let Some(latitude) = changes.latitude {
            update = update.col_expr(geolocation::Column::Latitude, Expr::value(latitude));
        }
        if let Some(longitude) = changes.longitude {
            update = update.col_expr(geolocation::Column::Longitude, Expr::value(longitude));
        }

        let result = update.exec(&self.conn).await?;

        Ok(result.rows_affected)
    }
}

// ============================================================================
// Data Types
// ============================================================================

/// A stored record in domain form, with the `zip` column surfaced under its
/// wire name `zip_code`.
#[derive(Debug, Clone)]
pub struct GeoRecord {
    pub ip_address: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewRecord {
    pub ip_address: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Sparse conjunctive filter. Only fixed column identifiers from the entity
/// ever reach statement text; every present value is bound.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RecordFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ip_address.is_none()
            && self.country.is_none()
            && self.region.is_none()
            && self.city.is_none()
            && self.zip.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    fn to_condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(ip) = &self.ip_address {
            cond = cond.add(geolocation::Column::IpAddress.eq(ip.clone()));
        }
        if let Some(country) = &self.country {
            cond = cond.add(geolocation::Column::Country.eq(country.clone()));
        }
        if let Some(region) = &self.region {
            cond = cond.add(geolocation::Column::Region.eq(region.clone()));
        }
        if let Some(city) = &self.city {
            cond = cond.add(geolocation::Column::City.eq(city.clone()));
        }
        if let Some(zip) = self.zip {
            cond = cond.add(geolocation::Column::Zip.eq(zip));
        }
        if let Some(latitude) = self.latitude {
            cond = cond.add(geolocation::Column::Latitude.eq(latitude));
        }
        if let Some(longitude) = self.longitude {
            cond = cond.add(geolocation::Column::Longitude.eq(longitude));
        }

        cond
    }
}

/// Sparse partial-update set. `ip_address` is deliberately absent; the target
/// address is never updatable.
#[derive(Debug, Clone, Default)]
pub struct RecordChanges {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RecordChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.country.is_none()
            && self.region.is_none()
            && self.city.is_none()
            && self.zip.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

#[derive(Debug, Error)]
pub enum RecordInsertError {
    #[error("record for ip {0} already exists")]
    Duplicate(String),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_is_empty() {
        assert!(RecordFilter::default().is_empty());

        let filter = RecordFilter {
            country: Some("Poland".to_string()),
            ..Default::default()
        };
        assert!(!filter.is_empty());

        let filter = RecordFilter {
            zip: Some(0),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(RecordChanges::default().is_empty());

        let changes = RecordChanges {
            city: Some("Krakow".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
