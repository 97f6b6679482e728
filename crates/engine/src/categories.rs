//! Expense categories.
//!
//! The set is closed: every personal expense belongs to exactly one of these.

use std::{fmt, str::FromStr};

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ExpenseCategory {
    #[sea_orm(string_value = "Food")]
    Food,
    #[sea_orm(string_value = "Transport")]
    Transport,
    #[sea_orm(string_value = "Utilities")]
    Utilities,
    #[sea_orm(string_value = "Entertainment")]
    Entertainment,
    #[sea_orm(string_value = "Shopping")]
    Shopping,
    #[sea_orm(string_value = "Healthcare")]
    Healthcare,
    #[sea_orm(string_value = "Education")]
    Education,
    #[sea_orm(string_value = "Others")]
    Others,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 8] = [
        Self::Food,
        Self::Transport,
        Self::Utilities,
        Self::Entertainment,
        Self::Shopping,
        Self::Healthcare,
        Self::Education,
        Self::Others,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Utilities => "Utilities",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Healthcare => "Healthcare",
            Self::Education => "Education",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = EngineError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EngineError::InvalidName(format!("unknown category: {trimmed}")))
    }
}
