use super::repo_types::User;
use crate::error::AppError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AppError::Validation("username must be 3-50 characters".into()));
    }
    Ok(())
}

/// Share of filled profile fields (name, bio, phone, location, image), 0..=100.
pub fn profile_completion(user: &User) -> u8 {
    let fields = [&user.name, &user.bio, &user.phone, &user.location, &user.image];
    let filled = fields.iter().filter(|f| !f.is_empty()).count();
    ((filled * 100) / fields.len()) as u8
}
