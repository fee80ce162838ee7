use std::future::Future;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use super::{
    google::{GoogleProfile, ProviderError},
    jwt::{JwtKeys, TokenError},
};
use crate::{
    activity::{log_activity, Activity},
    state::AppState,
    users::{
        repo::{self, GOOGLE_ID_CONSTRAINT},
        repo_types::NewUser,
        User,
    },
};

pub const USERNAME_ATTEMPTS: usize = 10;
const USERNAME_BASE_MAX: usize = 15;
const STATE_LEN: usize = 32;

lazy_static! {
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-z0-9]").unwrap();
}

/// Terminal failures of the OAuth callback, each mapped to a frontend error code.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("authorization code missing")]
    NoCode,
    #[error("oauth state mismatch")]
    InvalidState,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("user resolution failed: {0}")]
    CreateFailed(anyhow::Error),
    #[error("session token could not be issued: {0}")]
    Token(#[from] TokenError),
}

impl LoginError {
    pub fn code(&self) -> &'static str {
        match self {
            LoginError::NoCode => "no_code",
            LoginError::InvalidState => "invalid_state",
            LoginError::Provider(ProviderError::Exchange(_)) => "exchange_failed",
            LoginError::Provider(ProviderError::UserInfo(_)) => "userinfo_failed",
            LoginError::Provider(ProviderError::Parse(_)) => "parse_failed",
            LoginError::CreateFailed(_) => "create_failed",
            LoginError::Token(_) => "jwt_failed",
        }
    }
}

/// Random value tying a callback to the browser that started the flow.
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

/// `state` must be present and equal the value stored in the browser cookie.
pub fn verify_state(expected: Option<&str>, received: Option<&str>) -> Result<(), LoginError> {
    match (expected, received) {
        (Some(e), Some(r)) if !e.is_empty() && e == r => Ok(()),
        _ => Err(LoginError::InvalidState),
    }
}

fn username_base(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut base: String = NON_ALNUM_RE.replace_all(&lowered, "").into_owned();
    // only ASCII remains, so byte truncation is safe
    base.truncate(USERNAME_BASE_MAX);
    if base.is_empty() {
        base.push_str("user");
    }
    base
}

/// Display name reduced to `[a-z0-9]{1,15}` followed by a number in 1..=9999.
pub fn username_candidate(name: &str) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1..=9999);
    format!("{}{}", username_base(name), suffix)
}

/// Regenerates while `is_taken` reports a collision, at most [`USERNAME_ATTEMPTS`] lookups.
/// The last candidate is returned unchecked once attempts run out; the unique
/// constraint on `users.username` rejects it if it really is a duplicate.
pub async fn unique_username<F, Fut>(name: &str, mut is_taken: F) -> anyhow::Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let mut candidate = username_candidate(name);
    for _ in 0..USERNAME_ATTEMPTS {
        if !is_taken(candidate.clone()).await? {
            return Ok(candidate);
        }
        candidate = username_candidate(name);
    }
    warn!(candidate = %candidate, "username attempts exhausted");
    Ok(candidate)
}

async fn create_user(db: &PgPool, profile: &GoogleProfile) -> anyhow::Result<User> {
    let username =
        unique_username(&profile.name, |c| async move { repo::username_taken(db, &c).await })
            .await?;
    repo::create(
        db,
        &NewUser {
            google_id: &profile.id,
            name: &profile.name,
            email: &profile.email,
            image: &profile.picture,
            username: &username,
        },
    )
    .await
}

async fn login_existing(db: &PgPool, existing: User) -> User {
    match repo::record_login(db, existing.id).await {
        Ok(Some(updated)) => updated,
        Ok(None) => existing,
        Err(e) => {
            warn!(error = %e, user_id = %existing.id, "failed to increment login count");
            existing
        }
    }
}

/// Maps a provider profile to a local user. Returns `true` when the account is new.
pub async fn resolve_user(db: &PgPool, profile: &GoogleProfile) -> anyhow::Result<(User, bool)> {
    if let Some(existing) = repo::find_by_google_id(db, &profile.id).await? {
        return Ok((login_existing(db, existing).await, false));
    }

    match create_user(db, profile).await {
        Ok(user) => Ok((user, true)),
        // a concurrent callback created the same account first
        Err(e) if repo::is_unique_violation(&e, GOOGLE_ID_CONSTRAINT) => {
            let existing = repo::find_by_google_id(db, &profile.id)
                .await?
                .ok_or(e)?;
            Ok((login_existing(db, existing).await, false))
        }
        Err(e) => Err(e),
    }
}

/// Code exchange through token issuance. Returns the user and a signed session token.
pub async fn complete_login(state: &AppState, code: &str) -> Result<(User, String), LoginError> {
    let access_token = state.provider.exchange_code(code).await?;
    let profile = state.provider.fetch_profile(&access_token).await?;

    let (user, created) = resolve_user(&state.db, &profile)
        .await
        .map_err(LoginError::CreateFailed)?;

    if created {
        info!(user_id = %user.id, username = %user.username, "account created");
        log_activity(&state.db, user.id, Activity::AccountCreated).await;
    }
    log_activity(&state.db, user.id, Activity::LoggedIn).await;

    let token = JwtKeys::from_ref(state).issue(user.id, &user.email, &user.username)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}
