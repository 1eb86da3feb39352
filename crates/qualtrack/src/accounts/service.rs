use std::sync::Arc;

use super::domain::{NewUser, User, UserId, UserView};
use super::password::{hash_password, verify_password, PasswordError};
use super::repository::{SettingsRepository, UserRepository, ADMIN_NOTIFY_EMAIL};
use crate::qualifications::repository::RepositoryError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Unknown username and wrong password are deliberately the same error.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("a user with this username already exists")]
    DuplicateUsername,
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("this action requires an administrator account")]
    NotAdmin,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn validation(field: &'static str, reason: impl Into<String>) -> AccountError {
    AccountError::Validation {
        field,
        reason: reason.into(),
    }
}

/// Account and settings service. Admin gating takes the acting username
/// explicitly; there is no ambient current-user context.
pub struct AccountService<U, S> {
    users: Arc<U>,
    settings: Arc<S>,
}

impl<U, S> AccountService<U, S>
where
    U: UserRepository + 'static,
    S: SettingsRepository + 'static,
{
    pub fn new(users: Arc<U>, settings: Arc<S>) -> Self {
        Self { users, settings }
    }

    pub fn register(&self, new_user: NewUser) -> Result<UserView, AccountError> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(validation("username", "must not be empty"));
        }
        let email = new_user.email.trim().to_string();
        if !email.contains('@') {
            return Err(validation("email", "must be an email address"));
        }
        if new_user.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let user = User {
            id: UserId(0),
            username,
            email,
            password_hash: hash_password(&new_user.password)?,
            is_admin: new_user.is_admin,
        };

        match self.users.insert_user(user) {
            Ok(stored) => Ok(UserView::from(&stored)),
            Err(RepositoryError::Conflict) => Err(AccountError::DuplicateUsername),
            Err(other) => Err(other.into()),
        }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserView, AccountError> {
        let Some(user) = self.users.fetch_user_by_username(username.trim())? else {
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(UserView::from(&user))
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserView>, AccountError> {
        Ok(self
            .users
            .fetch_user_by_username(username.trim())?
            .as_ref()
            .map(UserView::from))
    }

    fn require_admin(&self, actor: &str) -> Result<UserView, AccountError> {
        match self.get_user(actor)? {
            Some(user) if user.is_admin => Ok(user),
            _ => Err(AccountError::NotAdmin),
        }
    }

    pub fn admin_notification_email(&self) -> Result<Option<String>, AccountError> {
        Ok(self.settings.get_setting(ADMIN_NOTIFY_EMAIL)?)
    }

    pub fn set_admin_notification_email(
        &self,
        actor: &str,
        address: &str,
    ) -> Result<(), AccountError> {
        self.require_admin(actor)?;
        let address = address.trim();
        if !address.contains('@') {
            return Err(validation("notification email", "must be an email address"));
        }
        Ok(self.settings.put_setting(ADMIN_NOTIFY_EMAIL, address)?)
    }
}
