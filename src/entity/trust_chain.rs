//! Sea-ORM entity for the trust chain table.

use sea_orm::entity::prelude::*;

/// Database row backing one [`TrustChainRecord`](crate::TrustChainRecord).
///
/// As with sessions, the full record lives in the MessagePack `data` blob and
/// the expiration is broken out into its own column so the hot-path read can
/// exclude expired chains at the query level.
///
/// # Database Schema
///
/// | Column      | Type                | Description                              |
/// |-------------|---------------------|------------------------------------------|
/// | entity_id   | TEXT (Primary Key)  | Federation entity identifier             |
/// | data        | BYTEA               | MessagePack serialized chain record      |
/// | expires_at  | TIMESTAMPTZ         | End of the chain's trust validity        |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "trust_chain")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub entity_id: String,

    /// MessagePack blob holding the serialized chain record.
    pub data: Vec<u8>,

    /// Trust validity deadline, duplicated out of the blob so `find_chain`
    /// can filter expired rows in the query and the eviction sweep can
    /// bulk-delete past-retention rows.
    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
