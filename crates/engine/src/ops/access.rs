use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, expenses, group_expenses, groups, users};

use super::Engine;

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Loads a group only when `owner` owns it. Foreign groups are reported as
    /// missing so their existence is not leaked.
    pub(super) async fn require_group_owner(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        owner: &str,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id)
            .filter(groups::Column::Owner.eq(owner.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))
    }

    pub(super) async fn require_expense_owner(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))
    }

    pub(super) async fn require_group_expense(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
        expense_id: Uuid,
    ) -> ResultEngine<group_expenses::Model> {
        group_expenses::Entity::find_by_id(expense_id)
            .filter(group_expenses::Column::GroupId.eq(group_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group expense not exists".to_string()))
    }
}
