use sea_orm::entity::prelude::*;

/// One stored IP -> location row. `ip_address` carries a unique index so the
/// database, not the handlers, is the authority on duplicates.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "geolocation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub ip_address: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
