use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Group, GroupExpense, MoneyCents, ResultEngine, group_expenses, group_members,
    groups,
    settlement::{self, Balance, LedgerEntry, Settlement},
    util::{name_key, normalize_display, positive_amount, required_name},
};

use super::{Engine, with_tx};

/// A group expense as entered by the owner.
#[derive(Clone, Debug)]
pub struct GroupExpenseInput {
    pub name: String,
    pub amount: MoneyCents,
    pub paid_by: String,
    pub date: NaiveDate,
}

/// Settlement plan of a stored group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSettlement {
    pub group: Group,
    pub expense_count: usize,
    pub total: MoneyCents,
    /// Net position of every member, in roster order.
    pub balances: Vec<Balance>,
    pub settlement: Settlement,
}

impl Engine {
    /// Creates an empty group owned by `owner` that will hold `member_count`
    /// members.
    pub async fn new_group(&self, owner: &str, name: &str, member_count: u32) -> ResultEngine<Uuid> {
        let name = required_name(name, "group")?;
        if member_count == 0 {
            return Err(EngineError::InvalidMembers(
                "a group needs at least one member".to_string(),
            ));
        }
        let member_count = i32::try_from(member_count).map_err(|_| {
            EngineError::InvalidMembers(format!("too many members: {member_count}"))
        })?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, owner).await?;

            let id = Uuid::new_v4();
            groups::ActiveModel {
                id: ActiveValue::Set(id),
                owner: ActiveValue::Set(owner.to_string()),
                name: ActiveValue::Set(name),
                member_count: ActiveValue::Set(member_count),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(owner, group = %id, "group created");
            Ok(id)
        })
    }

    /// Groups owned by `owner` with their rosters, newest first.
    pub async fn groups(&self, owner: &str) -> ResultEngine<Vec<Group>> {
        with_tx!(self, |db_tx| {
            let models = groups::Entity::find()
                .filter(groups::Column::Owner.eq(owner.to_string()))
                .order_by_desc(groups::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let members = load_members(&db_tx, model.id).await?;
                out.push(to_group(model, members));
            }
            Ok(out)
        })
    }

    /// Delete a group together with its roster and expenses (owner-only).
    pub async fn delete_group(&self, owner: &str, group_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_owner(&db_tx, group_id, owner).await?;

            group_expenses::Entity::delete_many()
                .filter(group_expenses::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?;
            group_members::Entity::delete_many()
                .filter(group_members::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?;
            groups::Entity::delete_by_id(group_id).exec(&db_tx).await?;

            tracing::info!(owner, group = %group_id, "group deleted");
            Ok(())
        })
    }

    /// Registers the member names of a group (owner-only).
    ///
    /// Names are normalized and must be unique ignoring case and accents. The
    /// roster must match the declared member count and can be set only once.
    pub async fn set_group_members(
        &self,
        owner: &str,
        group_id: Uuid,
        names: &[String],
    ) -> ResultEngine<Vec<String>> {
        let names = normalize_roster(names)?;

        with_tx!(self, |db_tx| {
            let group = self.require_group_owner(&db_tx, group_id, owner).await?;
            if usize::try_from(group.member_count).ok() != Some(names.len()) {
                return Err(EngineError::InvalidMembers(format!(
                    "expected {} names, got {}",
                    group.member_count,
                    names.len()
                )));
            }
            if !load_members(&db_tx, group_id).await?.is_empty() {
                return Err(EngineError::ExistingKey("group members".to_string()));
            }

            let rows = names
                .iter()
                .enumerate()
                .map(|(position, name)| group_members::ActiveModel {
                    group_id: ActiveValue::Set(group_id),
                    position: ActiveValue::Set(position as i32),
                    name: ActiveValue::Set(name.clone()),
                });
            group_members::Entity::insert_many(rows)
                .exec(&db_tx)
                .await?;

            Ok(names)
        })
    }

    /// Member names in roster order. Empty until the roster is registered.
    pub async fn group_members(&self, owner: &str, group_id: Uuid) -> ResultEngine<Vec<String>> {
        with_tx!(self, |db_tx| {
            self.require_group_owner(&db_tx, group_id, owner).await?;
            load_members(&db_tx, group_id).await
        })
    }

    /// Records an expense paid by one of the group members.
    pub async fn new_group_expense(
        &self,
        owner: &str,
        group_id: Uuid,
        input: GroupExpenseInput,
    ) -> ResultEngine<Uuid> {
        let name = required_name(&input.name, "expense")?;
        let amount = positive_amount(input.amount)?;

        with_tx!(self, |db_tx| {
            self.require_group_owner(&db_tx, group_id, owner).await?;
            let members = load_members(&db_tx, group_id).await?;
            if members.is_empty() {
                return Err(EngineError::InvalidMembers(
                    "group members are not set".to_string(),
                ));
            }
            let paid_by = find_member(&members, &input.paid_by)?;

            let id = Uuid::new_v4();
            group_expenses::ActiveModel {
                id: ActiveValue::Set(id),
                group_id: ActiveValue::Set(group_id),
                name: ActiveValue::Set(name),
                amount_minor: ActiveValue::Set(amount.cents()),
                paid_by: ActiveValue::Set(paid_by),
                date: ActiveValue::Set(input.date),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// Expenses of a group, newest first.
    pub async fn group_expenses(
        &self,
        owner: &str,
        group_id: Uuid,
    ) -> ResultEngine<Vec<GroupExpense>> {
        with_tx!(self, |db_tx| {
            self.require_group_owner(&db_tx, group_id, owner).await?;
            let models = group_expenses::Entity::find()
                .filter(group_expenses::Column::GroupId.eq(group_id))
                .order_by_desc(group_expenses::Column::Date)
                .order_by_desc(group_expenses::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(GroupExpense::from).collect())
        })
    }

    pub async fn delete_group_expense(
        &self,
        owner: &str,
        group_id: Uuid,
        expense_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_owner(&db_tx, group_id, owner).await?;
            let model = self
                .require_group_expense(&db_tx, group_id, expense_id)
                .await?;
            model.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// Computes who pays whom to settle the group.
    ///
    /// The ledger is replayed oldest first. Skipped entries are logged and
    /// returned in [`Settlement::diagnostics`].
    pub async fn settle_group(&self, owner: &str, group_id: Uuid) -> ResultEngine<GroupSettlement> {
        let (group, expenses) = with_tx!(self, |db_tx| {
            let model = self.require_group_owner(&db_tx, group_id, owner).await?;
            let members = load_members(&db_tx, group_id).await?;
            let expenses: Vec<GroupExpense> = group_expenses::Entity::find()
                .filter(group_expenses::Column::GroupId.eq(group_id))
                .order_by_asc(group_expenses::Column::Date)
                .order_by_asc(group_expenses::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(GroupExpense::from)
                .collect();
            Ok::<_, EngineError>((to_group(model, members), expenses))
        })?;

        let ledger: Vec<LedgerEntry> = expenses.iter().map(LedgerEntry::from).collect();
        let (balances, _) = settlement::compute_balances(&group.members, &ledger);
        let settlement = settlement::settle(&group.members, &ledger);
        for diagnostic in &settlement.diagnostics {
            tracing::warn!(group = %group_id, %diagnostic, "settlement entry skipped");
        }
        tracing::debug!(
            group = %group_id,
            transfers = settlement.transfers.len(),
            "group settled"
        );

        Ok(GroupSettlement {
            expense_count: expenses.len(),
            total: MoneyCents::total(expenses.iter().map(|e| e.amount))?,
            group,
            balances,
            settlement,
        })
    }
}

async fn load_members(db: &DatabaseTransaction, group_id: Uuid) -> ResultEngine<Vec<String>> {
    let rows = group_members::Entity::find()
        .filter(group_members::Column::GroupId.eq(group_id))
        .order_by_asc(group_members::Column::Position)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.name).collect())
}

fn to_group(model: groups::Model, members: Vec<String>) -> Group {
    Group {
        id: model.id,
        name: model.name,
        member_count: u32::try_from(model.member_count).unwrap_or_default(),
        members,
        created_at: model.created_at,
    }
}

fn normalize_roster(names: &[String]) -> ResultEngine<Vec<String>> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());
    for raw in names {
        let name = normalize_display(raw).ok_or_else(|| {
            EngineError::InvalidName("member name must not be empty".to_string())
        })?;
        if !seen.insert(name_key(&name)) {
            return Err(EngineError::InvalidMembers(format!(
                "duplicate member name: {name}"
            )));
        }
        out.push(name);
    }
    Ok(out)
}

/// Roster spelling of `payer`, matched ignoring case and accents.
fn find_member(members: &[String], payer: &str) -> ResultEngine<String> {
    let wanted = normalize_display(payer).map(|name| name_key(&name));
    members
        .iter()
        .find(|member| Some(name_key(member)) == wanted)
        .cloned()
        .ok_or_else(|| EngineError::KeyNotFound(format!("member {}", payer.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn roster_is_normalized() {
        let roster = normalize_roster(&names(&["  Alice ", "Bob   Smith"])).unwrap();
        assert_eq!(roster, names(&["Alice", "Bob Smith"]));
    }

    #[test]
    fn roster_rejects_blank_and_duplicates() {
        assert!(matches!(
            normalize_roster(&names(&["Alice", "  "])),
            Err(EngineError::InvalidName(_))
        ));
        assert!(matches!(
            normalize_roster(&names(&["René", "rene"])),
            Err(EngineError::InvalidMembers(_))
        ));
    }

    #[test]
    fn payer_matches_roster_spelling() {
        let roster = names(&["Alice", "René"]);
        assert_eq!(find_member(&roster, " alice").unwrap(), "Alice");
        assert_eq!(find_member(&roster, "RENE").unwrap(), "René");
        assert!(matches!(
            find_member(&roster, "Carol"),
            Err(EngineError::KeyNotFound(_))
        ));
    }
}
