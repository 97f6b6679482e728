use chrono::NaiveDate;
use sea_orm::Database;
use uuid::Uuid;

use engine::{Engine, EngineError, ExpenseCategory, ExpenseInput, MoneyCents, NewUser};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    for username in ["alice", "bob"] {
        engine
            .create_user(NewUser {
                username: username.to_string(),
                password: "password".to_string(),
                email: format!("{username}@example.com"),
                full_name: username.to_string(),
            })
            .await
            .unwrap();
    }
    engine
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn input(name: &str, cents: i64, category: ExpenseCategory, date: NaiveDate) -> ExpenseInput {
    ExpenseInput {
        name: name.to_string(),
        amount: MoneyCents::new(cents),
        category,
        date,
    }
}

#[tokio::test]
async fn expenses_listed_newest_first() {
    let engine = engine_with_db().await;

    engine
        .new_expense("alice", input("Rent", 50000, ExpenseCategory::Utilities, day(2026, 1, 1)))
        .await
        .unwrap();
    engine
        .new_expense("alice", input("Bus", 250, ExpenseCategory::Transport, day(2026, 2, 3)))
        .await
        .unwrap();
    engine
        .new_expense("bob", input("Cinema", 1200, ExpenseCategory::Entertainment, day(2026, 2, 4)))
        .await
        .unwrap();

    let expenses = engine.expenses("alice").await.unwrap();
    let names: Vec<&str> = expenses.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Bus", "Rent"]);
    assert_eq!(expenses[0].amount, MoneyCents::new(250));
    assert_eq!(expenses[0].category, ExpenseCategory::Transport);
}

#[tokio::test]
async fn new_expense_validates_input() {
    let engine = engine_with_db().await;

    assert!(matches!(
        engine
            .new_expense("alice", input("  ", 100, ExpenseCategory::Food, day(2026, 1, 1)))
            .await,
        Err(EngineError::InvalidName(_))
    ));
    assert!(matches!(
        engine
            .new_expense("alice", input("Lunch", 0, ExpenseCategory::Food, day(2026, 1, 1)))
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .new_expense("ghost", input("Lunch", 100, ExpenseCategory::Food, day(2026, 1, 1)))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn update_and_delete_are_owner_scoped() {
    let engine = engine_with_db().await;
    let id = engine
        .new_expense("alice", input("Lunch", 1500, ExpenseCategory::Food, day(2026, 3, 1)))
        .await
        .unwrap();

    let foreign = engine
        .update_expense("bob", id, input("Mine", 1, ExpenseCategory::Others, day(2026, 3, 1)))
        .await;
    assert!(matches!(foreign, Err(EngineError::KeyNotFound(_))));
    assert!(matches!(
        engine.delete_expense("bob", id).await,
        Err(EngineError::KeyNotFound(_))
    ));

    let updated = engine
        .update_expense(
            "alice",
            id,
            input("Dinner", 3200, ExpenseCategory::Food, day(2026, 3, 2)),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, id);
    assert_eq!(updated.name, "Dinner");
    assert_eq!(updated.amount, MoneyCents::new(3200));

    engine.delete_expense("alice", id).await.unwrap();
    assert!(engine.expenses("alice").await.unwrap().is_empty());
    assert!(matches!(
        engine.delete_expense("alice", Uuid::new_v4()).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn analytics_and_month_summary() {
    let engine = engine_with_db().await;
    for (name, cents, category, date) in [
        ("Groceries", 4000, ExpenseCategory::Food, day(2026, 3, 5)),
        ("Pharmacy", 1000, ExpenseCategory::Healthcare, day(2026, 3, 5)),
        ("Train", 2000, ExpenseCategory::Transport, day(2026, 2, 20)),
    ] {
        engine
            .new_expense("alice", input(name, cents, category, date))
            .await
            .unwrap();
    }

    let analytics = engine
        .expense_analytics("alice", day(2026, 3, 31))
        .await
        .unwrap();
    assert_eq!(analytics.categories[0].category, ExpenseCategory::Food);
    assert_eq!(analytics.months.len(), 6);
    assert_eq!(analytics.months[5].label, "Mar 2026");
    assert_eq!(analytics.insights.total, MoneyCents::new(7000));
    assert_eq!(analytics.insights.this_month, MoneyCents::new(5000));
    assert_eq!(analytics.insights.last_month, MoneyCents::new(2000));
    assert!((analytics.insights.monthly_change_pct - 150.0).abs() < 1e-9);

    let march = engine.month_summary("alice", 2026, 3).await.unwrap();
    assert_eq!(march.total, MoneyCents::new(5000));
    assert_eq!(march.days.len(), 1);
    assert_eq!(march.days[0].count, 2);

    assert!(matches!(
        engine.month_summary("alice", 2026, 0).await,
        Err(EngineError::InvalidDate(_))
    ));
}
