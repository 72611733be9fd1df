//! Session commands: `login`, `register`, `logout`, `whoami`.

use shop_sync_storefront::models::{Credentials, Registration, UserInfo};
use shop_sync_storefront::services::AuthError;
use shop_sync_storefront::state::AppState;

use super::{CliError, Output};

fn describe(user: &UserInfo) -> String {
    if user.email.is_empty() {
        format!("{} (#{})", user.username, user.id)
    } else {
        format!("{} <{}> (#{})", user.username, user.email, user.id)
    }
}

pub async fn login(
    state: &AppState,
    out: &Output,
    username: String,
    password: String,
) -> Result<(), CliError> {
    let user = state
        .session()
        .login(&Credentials::new(username, password))
        .await?;
    out.emit(&user, || format!("Logged in as {}", describe(&user)))
}

pub async fn register(
    state: &AppState,
    out: &Output,
    username: String,
    password: String,
    email: String,
) -> Result<(), CliError> {
    let user = state
        .session()
        .register(&Registration::new(username, password, email))
        .await?;
    out.emit(&user, || format!("Registered {}", describe(&user)))
}

pub fn logout(state: &AppState) -> Result<(), CliError> {
    state.logout()?;
    tracing::info!("Session cleared");
    Ok(())
}

pub async fn whoami(state: &AppState, out: &Output, refresh: bool) -> Result<(), CliError> {
    let user = if refresh {
        Some(state.session().refresh_user().await?)
    } else {
        state.session().current_user()
    };

    let user = user.ok_or(AuthError::NotAuthenticated)?;
    out.emit(&user, || describe(&user))
}
