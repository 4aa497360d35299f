//! Operator-mode CLI handlers for `quiver user` subcommands.
//!
//! Implements:
//! - `quiver user add`   -- create a user account with a hashed password
//! - `quiver user list`  -- list accounts in table format

use anyhow::{Context, Result};
use sqlx::PgPool;

use quiver_core::auth::password;
use quiver_db::models::Role;
use quiver_db::queries::users;

use crate::UserCommands;

/// Dispatch a `UserCommands` variant to the appropriate handler.
pub async fn run_user_command(command: UserCommands, pool: &PgPool) -> Result<()> {
    match command {
        UserCommands::Add {
            username,
            password,
            role,
        } => cmd_add(pool, &username, &password, &role).await,
        UserCommands::List => cmd_list(pool).await,
    }
}

/// Create a user account and insert it into the database.
async fn cmd_add(pool: &PgPool, username: &str, plain: &str, role: &str) -> Result<()> {
    let role: Role = role.parse().map_err(|_| {
        anyhow::anyhow!(
            "invalid role {:?}; expected one of: admin, coach, archer",
            role,
        )
    })?;

    let password_hash = password::hash_password(plain).context("failed to hash password")?;

    let user = users::insert_user(pool, username, &password_hash, role)
        .await
        .with_context(|| {
            format!("failed to add user {username:?} (is the name already taken?)")
        })?;

    println!("User created:");
    println!("  ID:       {}", user.id);
    println!("  Username: {}", user.username);
    println!("  Role:     {}", user.role);

    Ok(())
}

/// List all user accounts in a table format.
async fn cmd_list(pool: &PgPool) -> Result<()> {
    let accounts = users::list_users(pool).await?;

    if accounts.is_empty() {
        println!("No users found. Use `quiver user add` to create one.");
        return Ok(());
    }

    // Table format: fixed-width columns.
    let name_w = accounts
        .iter()
        .map(|u| u.username.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let role_w = accounts
        .iter()
        .map(|u| u.role.to_string().len())
        .max()
        .unwrap_or(4)
        .max(4);

    // Header
    println!(
        "{:<name_w$}  {:<role_w$}  {:<6}  CREATED",
        "USERNAME", "ROLE", "ACTIVE",
    );

    // Rows
    for user in &accounts {
        println!(
            "{:<name_w$}  {:<role_w$}  {:<6}  {}",
            user.username,
            user.role,
            if user.is_active { "yes" } else { "no" },
            user.created_at.format("%Y-%m-%d"),
        );
    }

    Ok(())
}
