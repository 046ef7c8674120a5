//! Users command - Role management from the shell.

use crate::cli::args::{UsersAction, UsersArgs};
use crate::config::Config;
use crate::domain::UserRole;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::services::{ServiceContainer, Services};

pub async fn execute(args: UsersArgs, config: Config) -> AppResult<()> {
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let services = Services::from_connection(db.get_connection(), config);

    let (email, role) = match args.action {
        UsersAction::Promote { email } => (email, UserRole::Admin),
        UsersAction::Demote { email } => (email, UserRole::Customer),
    };

    let user = services.users().set_role(&email, role).await?;
    println!("{} is now {}", user.email, user.role);

    Ok(())
}
