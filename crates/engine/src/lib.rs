//! TrackTally engine.
//!
//! - [`settlement`]: the pure group settlement algorithm.
//! - [`analytics`]: pure reductions over personal expenses.
//! - [`Engine`]: database-backed operations for users, personal expenses,
//!   groups and group expenses.
pub use analytics::{
    CategoryShare, CategoryTotal, DailyTotal, ExpenseAnalytics, Insights, MonthSummary,
    MonthlyTotal,
};
pub use categories::ExpenseCategory;
pub use error::EngineError;
pub use expenses::Expense;
pub use group_expenses::GroupExpense;
pub use groups::Group;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, ExpenseInput, GroupExpenseInput, GroupSettlement, NewUser};
pub use settlement::{Diagnostic, LedgerEntry, Settlement, SettlementError, Transfer};
pub use users::Profile;

pub mod analytics;
mod categories;
mod error;
mod expenses;
mod group_expenses;
mod group_members;
mod groups;
mod money;
mod ops;
pub mod settlement;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
