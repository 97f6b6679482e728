use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
        pub timestamp: DateTime<Utc>,
        /// `true` when verification codes go to a real mail relay.
        pub email_configured: bool,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignUp {
        pub username: String,
        pub password: String,
        pub email: String,
        pub full_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Profile {
        pub username: String,
        pub email: String,
        pub full_name: String,
        pub email_verified: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub full_name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub current_password: String,
        pub new_password: String,
    }
}

pub mod otp {
    use super::*;

    /// Missing fields deserialize as empty strings so the server can answer
    /// with its own message.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct SendOtp {
        pub email: String,
        #[serde(alias = "fullName")]
        pub full_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SendOtpResponse {
        pub success: bool,
        pub message: String,
        /// Only filled in when the server runs with `expose_otp`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub otp: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct VerifyOtp {
        pub email: String,
        pub otp: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VerifyOtpResponse {
        pub success: bool,
        pub message: String,
    }
}

pub mod password {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ForgotPassword {
        pub email: String,
    }

    /// Same answer whether or not the address has an account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ForgotPasswordResponse {
        pub success: bool,
        pub message: String,
        /// Only filled in when the server runs with `expose_otp` and a code
        /// was actually issued.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub otp: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ResetPassword {
        pub email: String,
        pub otp: String,
        #[serde(alias = "newPassword")]
        pub new_password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ResetPasswordResponse {
        pub success: bool,
        pub message: String,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ExpenseCategory {
        Food,
        Transport,
        Utilities,
        Entertainment,
        Shopping,
        Healthcare,
        Education,
        Others,
    }

    /// Body of both create and update.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub name: String,
        /// Decimal amount in euros, `.` or `,` as separator (e.g. `"12,50"`).
        pub amount: String,
        pub category: ExpenseCategory,
        pub date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Expense {
        pub id: Uuid,
        pub name: String,
        pub amount_minor: i64,
        /// Formatted amount, e.g. `€12.50`.
        pub amount: String,
        pub category: ExpenseCategory,
        pub date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category: ExpenseCategory,
        pub total_minor: i64,
        pub count: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyTotal {
        pub year: i32,
        pub month: u32,
        pub label: String,
        pub total_minor: i64,
        pub count: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopCategory {
        pub category: ExpenseCategory,
        pub total_minor: i64,
        pub percentage: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Insights {
        pub total_minor: i64,
        pub count: usize,
        pub average_minor: i64,
        pub this_month_minor: i64,
        pub last_month_minor: i64,
        pub monthly_change_pct: f64,
        pub top_category: Option<TopCategory>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Analytics {
        pub categories: Vec<CategoryTotal>,
        pub months: Vec<MonthlyTotal>,
        pub insights: Insights,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AnalyticsQuery {
        /// Reference day for the monthly window, defaults to the server date.
        pub today: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DailyTotal {
        pub date: NaiveDate,
        pub total_minor: i64,
        pub count: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthSummary {
        pub year: i32,
        pub month: u32,
        pub total_minor: i64,
        pub count: usize,
        pub categories: Vec<CategoryTotal>,
        pub days: Vec<DailyTotal>,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub member_count: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Group {
        pub id: Uuid,
        pub name: String,
        pub member_count: u32,
        /// Empty until the roster is registered.
        pub members: Vec<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersSet {
        pub group_id: Uuid,
        pub names: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Members {
        pub group_id: Uuid,
        pub names: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupExpenseNew {
        pub group_id: Uuid,
        pub name: String,
        /// Decimal amount in euros, `.` or `,` as separator.
        pub amount: String,
        pub paid_by: String,
        pub date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupExpense {
        pub id: Uuid,
        pub name: String,
        pub amount_minor: i64,
        pub amount: String,
        pub paid_by: String,
        pub date: NaiveDate,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct LedgerEntry {
        pub payer: String,
        pub amount: f64,
    }

    /// Ad-hoc settlement input, either as paired records or as the two
    /// parallel arrays `paid_by` and `amounts`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum SettleRequest {
        Records {
            members: Vec<String>,
            ledger: Vec<LedgerEntry>,
        },
        Parallel {
            members: Vec<String>,
            paid_by: Vec<String>,
            amounts: Vec<f64>,
        },
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    pub struct Transfer {
        pub from: String,
        pub to: String,
        /// Rounded to two decimals.
        pub amount: f64,
        /// e.g. `Bob will pay €50.00 to Alice`.
        pub instruction: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    pub struct Balance {
        pub member: String,
        /// Rounded to two decimals. Positive means the member is owed money.
        pub amount: f64,
    }

    /// Ledger entries skipped while settling.
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum Diagnostic {
        EmptyMembers,
        UnknownPayer { index: usize, payer: String },
        InvalidAmount { index: usize, amount: f64 },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        /// `true` when nobody owes anything.
        pub settled: bool,
        pub transfers: Vec<Transfer>,
        pub balances: Vec<Balance>,
        pub diagnostics: Vec<Diagnostic>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupSettlement {
        pub group_id: Uuid,
        pub name: String,
        pub expense_count: usize,
        pub total_minor: i64,
        #[serde(flatten)]
        pub plan: SettlementView,
    }
}
