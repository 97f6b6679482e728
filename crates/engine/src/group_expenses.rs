//! Expenses recorded against a group, each paid in full by one member.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{MoneyCents, settlement::LedgerEntry};

#[derive(Clone, Debug, PartialEq)]
pub struct GroupExpense {
    pub id: Uuid,
    pub name: String,
    pub amount: MoneyCents,
    pub paid_by: String,
    pub date: NaiveDate,
}

impl From<Model> for GroupExpense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            amount: MoneyCents::new(model.amount_minor),
            paid_by: model.paid_by,
            date: model.date,
        }
    }
}

impl From<&GroupExpense> for LedgerEntry {
    fn from(expense: &GroupExpense) -> Self {
        LedgerEntry::new(expense.paid_by.clone(), expense.amount.as_major())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "group_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub amount_minor: i64,
    pub paid_by: String,
    pub date: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
