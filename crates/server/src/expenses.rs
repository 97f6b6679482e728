//! Personal expense API endpoints

use api_types::expense::{
    Analytics, AnalyticsQuery, CategoryTotal as CategoryTotalView, DailyTotal as DailyTotalView,
    Expense as ExpenseView, ExpenseCategory as CategoryView, ExpenseCreated, ExpenseNew,
    Insights as InsightsView, MonthSummary as MonthSummaryView, MonthlyTotal as MonthlyTotalView,
    TopCategory,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{CategoryTotal, Expense, ExpenseCategory, ExpenseInput, MoneyCents, Profile};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn category_to_engine(category: CategoryView) -> ExpenseCategory {
    match category {
        CategoryView::Food => ExpenseCategory::Food,
        CategoryView::Transport => ExpenseCategory::Transport,
        CategoryView::Utilities => ExpenseCategory::Utilities,
        CategoryView::Entertainment => ExpenseCategory::Entertainment,
        CategoryView::Shopping => ExpenseCategory::Shopping,
        CategoryView::Healthcare => ExpenseCategory::Healthcare,
        CategoryView::Education => ExpenseCategory::Education,
        CategoryView::Others => ExpenseCategory::Others,
    }
}

fn category_to_view(category: ExpenseCategory) -> CategoryView {
    match category {
        ExpenseCategory::Food => CategoryView::Food,
        ExpenseCategory::Transport => CategoryView::Transport,
        ExpenseCategory::Utilities => CategoryView::Utilities,
        ExpenseCategory::Entertainment => CategoryView::Entertainment,
        ExpenseCategory::Shopping => CategoryView::Shopping,
        ExpenseCategory::Healthcare => CategoryView::Healthcare,
        ExpenseCategory::Education => CategoryView::Education,
        ExpenseCategory::Others => CategoryView::Others,
    }
}

fn to_input(payload: ExpenseNew) -> Result<ExpenseInput, ServerError> {
    Ok(ExpenseInput {
        amount: payload.amount.parse::<MoneyCents>()?,
        name: payload.name,
        category: category_to_engine(payload.category),
        date: payload.date,
    })
}

fn to_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        name: expense.name,
        amount_minor: expense.amount.cents(),
        amount: expense.amount.to_string(),
        category: category_to_view(expense.category),
        date: expense.date,
    }
}

fn category_totals(totals: Vec<CategoryTotal>) -> Vec<CategoryTotalView> {
    totals
        .into_iter()
        .map(|total| CategoryTotalView {
            category: category_to_view(total.category),
            total_minor: total.total.cents(),
            count: total.count,
        })
        .collect()
}

/// Handle requests for listing the user expenses, newest first
pub async fn list(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state.engine.expenses(&user.username).await?;
    Ok(Json(expenses.into_iter().map(to_view).collect()))
}

pub async fn create(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let id = state
        .engine
        .new_expense(&user.username, to_input(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(ExpenseCreated { id })))
}

pub async fn update(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state
        .engine
        .update_expense(&user.username, id, to_input(payload)?)
        .await?;
    Ok(Json(to_view(expense)))
}

pub async fn remove(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Dashboard numbers. `today` defaults to the current UTC date.
pub async fn analytics(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Analytics>, ServerError> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let analytics = state
        .engine
        .expense_analytics(&user.username, today)
        .await?;

    let insights = analytics.insights;
    Ok(Json(Analytics {
        categories: category_totals(analytics.categories),
        months: analytics
            .months
            .into_iter()
            .map(|month| MonthlyTotalView {
                year: month.year,
                month: month.month,
                label: month.label,
                total_minor: month.total.cents(),
                count: month.count,
            })
            .collect(),
        insights: InsightsView {
            total_minor: insights.total.cents(),
            count: insights.count,
            average_minor: insights.average.cents(),
            this_month_minor: insights.this_month.cents(),
            last_month_minor: insights.last_month.cents(),
            monthly_change_pct: insights.monthly_change_pct,
            top_category: insights.top_category.map(|top| TopCategory {
                category: category_to_view(top.category),
                total_minor: top.total.cents(),
                percentage: top.percentage,
            }),
        },
    }))
}

pub async fn monthly(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthSummaryView>, ServerError> {
    let summary = state
        .engine
        .month_summary(&user.username, year, month)
        .await?;

    Ok(Json(MonthSummaryView {
        year: summary.year,
        month: summary.month,
        total_minor: summary.total.cents(),
        count: summary.count,
        categories: category_totals(summary.categories),
        days: summary
            .days
            .into_iter()
            .map(|day| DailyTotalView {
                date: day.date,
                total_minor: day.total.cents(),
                count: day.count,
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip() {
        for category in ExpenseCategory::ALL {
            assert_eq!(category_to_engine(category_to_view(category)), category);
        }
    }
}
