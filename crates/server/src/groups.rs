//! Group, roster and group expense API endpoints

use api_types::expense::ExpenseCreated;
use api_types::group::{
    Group as GroupView, GroupCreated, GroupExpense as GroupExpenseView, GroupExpenseNew,
    GroupNew, Members, MembersSet,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Group, GroupExpense, GroupExpenseInput, MoneyCents, Profile};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn to_view(group: Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        member_count: group.member_count,
        members: group.members,
        created_at: group.created_at,
    }
}

fn expense_view(expense: GroupExpense) -> GroupExpenseView {
    GroupExpenseView {
        id: expense.id,
        name: expense.name,
        amount_minor: expense.amount.cents(),
        amount: expense.amount.to_string(),
        paid_by: expense.paid_by,
        date: expense.date,
    }
}

/// Handle requests for listing the user groups
pub async fn list(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupView>>, ServerError> {
    let groups = state.engine.groups(&user.username).await?;
    Ok(Json(groups.into_iter().map(to_view).collect()))
}

/// Handle requests for creating a new group
pub async fn create(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupCreated>), ServerError> {
    let id = state
        .engine
        .new_group(&user.username, &payload.name, payload.member_count)
        .await?;
    Ok((StatusCode::CREATED, Json(GroupCreated { id })))
}

pub async fn remove(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn members(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Members>, ServerError> {
    let names = state
        .engine
        .group_members(&user.username, group_id)
        .await?;
    Ok(Json(Members { group_id, names }))
}

/// Registers the roster. Returns the names as stored, after normalization.
pub async fn set_members(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<MembersSet>,
) -> Result<(StatusCode, Json<Members>), ServerError> {
    let names = state
        .engine
        .set_group_members(&user.username, payload.group_id, &payload.names)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Members {
            group_id: payload.group_id,
            names,
        }),
    ))
}

pub async fn expenses(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<GroupExpenseView>>, ServerError> {
    let expenses = state
        .engine
        .group_expenses(&user.username, group_id)
        .await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

pub async fn expense_new(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let input = GroupExpenseInput {
        amount: payload.amount.parse::<MoneyCents>()?,
        name: payload.name,
        paid_by: payload.paid_by,
        date: payload.date,
    };
    let id = state
        .engine
        .new_group_expense(&user.username, payload.group_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ExpenseCreated { id })))
}

pub async fn expense_remove(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path((group_id, expense_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_group_expense(&user.username, group_id, expense_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
