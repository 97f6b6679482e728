//! Users table.
//!
//! Groups and personal expenses reference a user by `username`.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Public view of a user, without credentials.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for Profile {
    fn from(model: Model) -> Self {
        Self {
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            email_verified: model.email_verified,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub email_verified: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(has_many = "super::groups::Entity")]
    Groups,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
