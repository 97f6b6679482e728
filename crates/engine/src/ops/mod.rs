use sea_orm::{DatabaseConnection, DbErr};

use crate::{EngineError, ResultEngine};

mod access;
mod expenses;
mod groups;
mod users;

pub use expenses::ExpenseInput;
pub use groups::{GroupExpenseInput, GroupSettlement};
pub use users::NewUser;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Persistence-backed facade over users, personal expenses and groups.
///
/// Every operation is scoped to the calling user: rows owned by someone else
/// are reported as missing. Settlement itself stays pure, see
/// [`crate::settlement`].
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
}

impl EngineBuilder {
    /// Database with the schema already migrated.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = Some(db);
        self
    }

    /// Construct `Engine`, checking that the database answers.
    pub async fn build(self) -> ResultEngine<Engine> {
        let database = self.database.ok_or_else(|| {
            EngineError::Database(DbErr::Custom("no database configured".to_string()))
        })?;
        database.ping().await?;
        Ok(Engine { database })
    }
}
