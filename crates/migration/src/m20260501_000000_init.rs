//! Initial schema for TrackTally:
//!
//! - `users`: accounts and credentials
//! - `personal_expenses`: expenses tracked by a single user
//! - `groups`: split groups owned by a user
//! - `group_members`: ordered roster of each group
//! - `group_expenses`: expenses paid by one member for the whole group

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    PasswordHash,
    Email,
    FullName,
    EmailVerified,
    CreatedAt,
}

#[derive(Iden)]
enum PersonalExpenses {
    Table,
    Id,
    UserId,
    Name,
    AmountMinor,
    Category,
    Date,
    CreatedAt,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Owner,
    Name,
    MemberCount,
    CreatedAt,
}

#[derive(Iden)]
enum GroupMembers {
    Table,
    GroupId,
    Position,
    Name,
}

#[derive(Iden)]
enum GroupExpenses {
    Table,
    Id,
    GroupId,
    Name,
    AmountMinor,
    PaidBy,
    Date,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Users::EmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Personal expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PersonalExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PersonalExpenses::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PersonalExpenses::UserId).string().not_null())
                    .col(ColumnDef::new(PersonalExpenses::Name).string().not_null())
                    .col(
                        ColumnDef::new(PersonalExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PersonalExpenses::Category).string().not_null())
                    .col(ColumnDef::new(PersonalExpenses::Date).date().not_null())
                    .col(
                        ColumnDef::new(PersonalExpenses::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-personal_expenses-user_id")
                            .from(PersonalExpenses::Table, PersonalExpenses::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-personal_expenses-user_id-date")
                    .table(PersonalExpenses::Table)
                    .col(PersonalExpenses::UserId)
                    .col(PersonalExpenses::Date)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Owner).string().not_null())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(ColumnDef::new(Groups::MemberCount).integer().not_null())
                    .col(ColumnDef::new(Groups::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-groups-owner")
                            .from(Groups::Table, Groups::Owner)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-groups-owner")
                    .table(Groups::Table)
                    .col(Groups::Owner)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Group members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GroupMembers::GroupId).blob().not_null())
                    .col(ColumnDef::new(GroupMembers::Position).integer().not_null())
                    .col(ColumnDef::new(GroupMembers::Name).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(GroupMembers::GroupId)
                            .col(GroupMembers::Position),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-group_id")
                            .from(GroupMembers::Table, GroupMembers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Group expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupExpenses::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupExpenses::GroupId).blob().not_null())
                    .col(ColumnDef::new(GroupExpenses::Name).string().not_null())
                    .col(
                        ColumnDef::new(GroupExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupExpenses::PaidBy).string().not_null())
                    .col(ColumnDef::new(GroupExpenses::Date).date().not_null())
                    .col(
                        ColumnDef::new(GroupExpenses::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_expenses-group_id")
                            .from(GroupExpenses::Table, GroupExpenses::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_expenses-group_id-date")
                    .table(GroupExpenses::Table)
                    .col(GroupExpenses::GroupId)
                    .col(GroupExpenses::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PersonalExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
