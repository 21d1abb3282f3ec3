//! Sea-ORM entity for the presentation session table.

use sea_orm::entity::prelude::*;

/// Database row backing one [`Session`](crate::Session).
///
/// The full session record is serialized into the `data` blob with
/// MessagePack; the correlation values and the creation timestamp are
/// additionally broken out into their own columns so the store can filter on
/// them without decoding every row.
///
/// # Database Schema
///
/// | Column      | Type                | Description                              |
/// |-------------|---------------------|------------------------------------------|
/// | id          | TEXT (Primary Key)  | Session identifier                       |
/// | data        | BYTEA               | MessagePack serialized session record    |
/// | nonce       | TEXT (Indexed)      | Correlation nonce                        |
/// | state       | TEXT (Nullable)     | Optional correlation state               |
/// | created_at  | TIMESTAMPTZ         | Creation timestamp, drives eviction      |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rp_session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// MessagePack blob holding the serialized session record.
    pub data: Vec<u8>,

    /// Correlation nonce, duplicated out of the blob for indexed lookup of
    /// the response leg.
    #[sea_orm(column_type = "Text")]
    pub nonce: String,

    /// Optional correlation state, duplicated out of the blob alongside the
    /// nonce.
    #[sea_orm(column_type = "Text", nullable)]
    pub state: Option<String>,

    /// Creation timestamp; rows older than the configured session max-age
    /// are bulk-deleted by the eviction sweep.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
