use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, Profile, ResultEngine, expenses, group_expenses, group_members, groups, users,
    util::required_name,
};

use super::{Engine, with_tx};

/// Signup data. The password is hashed before it reaches the database.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
}

impl Engine {
    /// Registers a new user.
    pub async fn create_user(&self, new_user: NewUser) -> ResultEngine<Profile> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(EngineError::InvalidName(
                "username must not be empty".to_string(),
            ));
        }
        let email = normalize_email(&new_user.email)?;
        let full_name = required_name(&new_user.full_name, "full")?;
        let password_hash = hash_off_thread(new_user.password).await?;

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            self.require_email_free(&db_tx, &email, None).await?;

            let model = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password_hash: ActiveValue::Set(password_hash),
                email: ActiveValue::Set(email),
                full_name: ActiveValue::Set(full_name),
                email_verified: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(username = %model.username, "user created");
            Ok(Profile::from(model))
        })
    }

    /// Checks the credentials and returns the profile.
    ///
    /// Unknown users and wrong passwords both yield `Forbidden`.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Profile> {
        let model = users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?;
        let Some(model) = model else {
            return Err(EngineError::Forbidden("invalid credentials".to_string()));
        };
        if !verify_off_thread(password, &model.password_hash).await? {
            return Err(EngineError::Forbidden("invalid credentials".to_string()));
        }
        Ok(Profile::from(model))
    }

    pub async fn profile(&self, username: &str) -> ResultEngine<Profile> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, username).await.map(Profile::from)
        })
    }

    /// Updates name and email. Changing the email resets its verification.
    pub async fn update_profile(
        &self,
        username: &str,
        full_name: &str,
        email: &str,
    ) -> ResultEngine<Profile> {
        let full_name = required_name(full_name, "full")?;
        let email = normalize_email(email)?;

        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, username).await?;
            self.require_email_free(&db_tx, &email, Some(username))
                .await?;

            let email_changed = model.email != email;
            let mut active: users::ActiveModel = model.into();
            active.full_name = ActiveValue::Set(full_name);
            if email_changed {
                active.email = ActiveValue::Set(email);
                active.email_verified = ActiveValue::Set(false);
            }
            let model = active.update(&db_tx).await?;
            Ok(Profile::from(model))
        })
    }

    /// Replaces the password after verifying the current one.
    pub async fn change_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> ResultEngine<()> {
        let password_hash = hash_off_thread(new.to_string()).await?;

        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, username).await?;
            if !verify_off_thread(current, &model.password_hash).await? {
                return Err(EngineError::Forbidden(
                    "current password does not match".to_string(),
                ));
            }
            let mut active: users::ActiveModel = model.into();
            active.password_hash = ActiveValue::Set(password_hash);
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Removes the user with every personal expense and owned group.
    pub async fn delete_account(&self, username: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, username).await?;

            let group_ids: Vec<Uuid> = groups::Entity::find()
                .filter(groups::Column::Owner.eq(username.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|group| group.id)
                .collect();

            if !group_ids.is_empty() {
                group_expenses::Entity::delete_many()
                    .filter(group_expenses::Column::GroupId.is_in(group_ids.clone()))
                    .exec(&db_tx)
                    .await?;
                group_members::Entity::delete_many()
                    .filter(group_members::Column::GroupId.is_in(group_ids.clone()))
                    .exec(&db_tx)
                    .await?;
                groups::Entity::delete_many()
                    .filter(groups::Column::Id.is_in(group_ids))
                    .exec(&db_tx)
                    .await?;
            }
            expenses::Entity::delete_many()
                .filter(expenses::Column::UserId.eq(username.to_string()))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(username.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(username, "account deleted");
            Ok(())
        })
    }

    /// Flags the account owning `email` as verified. Returns `false` when no
    /// account uses that address.
    pub async fn mark_email_verified(&self, email: &str) -> ResultEngine<bool> {
        let email = normalize_email(email)?;
        with_tx!(self, |db_tx| {
            let result = users::Entity::update_many()
                .col_expr(users::Column::EmailVerified, Expr::value(true))
                .filter(users::Column::Email.eq(email))
                .exec(&db_tx)
                .await?;
            Ok(result.rows_affected > 0)
        })
    }

    /// `true` when an account uses `email`.
    pub async fn email_registered(&self, email: &str) -> ResultEngine<bool> {
        let email = normalize_email(email)?;
        let found = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?;
        Ok(found.is_some())
    }

    /// Sets a new password for the account owning `email`, without the old
    /// one. Callers must have proven control of the address first; the
    /// address is flagged as verified as well.
    pub async fn reset_password(&self, email: &str, new: &str) -> ResultEngine<()> {
        let email = normalize_email(email)?;
        let password_hash = hash_off_thread(new.to_string()).await?;

        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(email.clone()))?;

            let username = model.username.clone();
            let mut active: users::ActiveModel = model.into();
            active.password_hash = ActiveValue::Set(password_hash);
            active.email_verified = ActiveValue::Set(true);
            active.update(&db_tx).await?;

            tracing::info!(%username, "password reset");
            Ok(())
        })
    }

    async fn require_email_free(
        &self,
        db: &DatabaseTransaction,
        email: &str,
        except: Option<&str>,
    ) -> ResultEngine<()> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email.to_string()));
        if let Some(username) = except {
            query = query.filter(users::Column::Username.ne(username.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(email.to_string()));
        }
        Ok(())
    }
}

fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(EngineError::InvalidName(format!(
            "\"{}\" is not an email address",
            value.trim()
        ))),
    }
}

fn hash_password(password: &str) -> ResultEngine<String> {
    if password.is_empty() {
        return Err(EngineError::InvalidName(
            "password must not be empty".to_string(),
        ));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// Argon2 is CPU bound: run it on the blocking pool, not on the async workers.

async fn hash_off_thread(password: String) -> ResultEngine<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?
}

async fn verify_off_thread(password: &str, hash: &str) -> ResultEngine<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}
