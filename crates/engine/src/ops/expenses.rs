use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Expense, ExpenseAnalytics, ExpenseCategory, MoneyCents, MonthSummary, ResultEngine, analytics,
    expenses,
    util::{positive_amount, required_name},
};

use super::{Engine, with_tx};

/// Fields of a personal expense, used both to create and to update one.
#[derive(Clone, Debug)]
pub struct ExpenseInput {
    pub name: String,
    pub amount: MoneyCents,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
}

impl ExpenseInput {
    fn validated(self) -> ResultEngine<Self> {
        Ok(Self {
            name: required_name(&self.name, "expense")?,
            amount: positive_amount(self.amount)?,
            ..self
        })
    }
}

impl Engine {
    /// Records a personal expense for `user_id`.
    pub async fn new_expense(&self, user_id: &str, input: ExpenseInput) -> ResultEngine<Uuid> {
        let input = input.validated()?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let id = Uuid::new_v4();
            expenses::ActiveModel {
                id: ActiveValue::Set(id),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(input.name),
                amount_minor: ActiveValue::Set(input.amount.cents()),
                category: ActiveValue::Set(input.category),
                date: ActiveValue::Set(input.date),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// Personal expenses of `user_id`, newest first.
    pub async fn expenses(&self, user_id: &str) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| self.load_expenses(&db_tx, user_id).await)
    }

    /// Replaces every field of an existing expense.
    pub async fn update_expense(
        &self,
        user_id: &str,
        expense_id: Uuid,
        input: ExpenseInput,
    ) -> ResultEngine<Expense> {
        let input = input.validated()?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_owner(&db_tx, expense_id, user_id)
                .await?;
            let mut active: expenses::ActiveModel = model.into();
            active.name = ActiveValue::Set(input.name);
            active.amount_minor = ActiveValue::Set(input.amount.cents());
            active.category = ActiveValue::Set(input.category);
            active.date = ActiveValue::Set(input.date);
            let model = active.update(&db_tx).await?;
            Ok(Expense::from(model))
        })
    }

    pub async fn delete_expense(&self, user_id: &str, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_owner(&db_tx, expense_id, user_id)
                .await?;
            model.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// Dashboard analytics computed over every expense of `user_id`.
    pub async fn expense_analytics(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ResultEngine<ExpenseAnalytics> {
        let expenses = self.expenses(user_id).await?;
        analytics::expense_analytics(&expenses, today)
    }

    pub async fn month_summary(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ResultEngine<MonthSummary> {
        let expenses = self.expenses(user_id).await?;
        analytics::month_summary(&expenses, year, month)
    }

    async fn load_expenses(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<Expense>> {
        self.require_user(db, user_id).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Expense::from).collect())
    }
}
