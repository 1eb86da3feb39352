use super::domain::{User, UserId};
use crate::qualifications::repository::RepositoryError;

/// Settings key holding the admin notification address.
pub const ADMIN_NOTIFY_EMAIL: &str = "admin.notification_email";

/// Storage abstraction over operator accounts.
pub trait UserRepository: Send + Sync {
    /// Inserts a user, assigning its id. `Conflict` on a duplicate username.
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
}

/// Generic key-value settings store; the application uses a single key,
/// [`ADMIN_NOTIFY_EMAIL`].
pub trait SettingsRepository: Send + Sync {
    fn get_setting(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    fn put_setting(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
}
