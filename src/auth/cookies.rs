use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const SESSION_COOKIE: &str = "token";
pub const STATE_COOKIE: &str = "oauth_state";

const STATE_TTL_MINUTES: i64 = 10;

pub fn session_cookie(token: String, ttl: std::time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(Duration::seconds(ttl.as_secs() as i64))
        .build()
}

pub fn state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, state))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(Duration::minutes(STATE_TTL_MINUTES))
        .build()
}

/// Clearing cookie, emitted whether or not the request carried `name`.
/// Must repeat the path the original was set with.
pub fn expired(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc".into(), std::time::Duration::from_secs(7 * 24 * 3600), false);
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn expired_cookie_clears_value() {
        let cookie = expired(SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn state_cookie_is_short_lived() {
        let cookie = state_cookie("s".into(), true);
        assert_eq!(cookie.name(), STATE_COOKIE);
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::minutes(10)));
    }
}
