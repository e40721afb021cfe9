use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::geolocation::{
    GeoRecord, NewRecord, RecordChanges, RecordFilter, RecordInsertError,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn geolocation_repo(&self) -> repositories::geolocation::GeolocationRepository {
        repositories::geolocation::GeolocationRepository::new(self.conn.clone())
    }

    pub async fn find_records_by_ip(&self, ip: &str) -> Result<Vec<GeoRecord>> {
        self.geolocation_repo().find_by_ip(ip).await
    }

    pub async fn search_records(&self, filter: &RecordFilter, limit: u64) -> Result<Vec<GeoRecord>> {
        self.geolocation_repo().search(filter, limit).await
    }

    pub async fn add_record(&self, record: NewRecord) -> Result<(), RecordInsertError> {
        self.geolocation_repo().insert(record).await
    }

    pub async fn update_record_by_ip(&self, ip: &str, changes: &RecordChanges) -> Result<u64> {
        self.geolocation_repo().update_by_ip(ip, changes).await
    }
}
