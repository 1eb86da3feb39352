//! Operator accounts, authentication, and the admin notification setting.

pub mod domain;
mod password;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{NewUser, User, UserId, UserView};
pub use repository::{SettingsRepository, UserRepository, ADMIN_NOTIFY_EMAIL};
pub use router::account_router;
pub use service::{AccountError, AccountService};
