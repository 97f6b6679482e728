//! The module contains the `Expense` type representing a personal expense.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{ExpenseCategory, MoneyCents};

/// A personal expense.
#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub name: String,
    pub amount: MoneyCents,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
}

impl Expense {
    pub fn new(
        name: impl Into<String>,
        amount: MoneyCents,
        category: ExpenseCategory,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            category,
            date,
        }
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            amount: MoneyCents::new(model.amount_minor),
            category: model.category,
            date: model.date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "personal_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub category: ExpenseCategory,
    pub date: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
