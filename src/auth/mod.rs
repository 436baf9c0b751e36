pub mod handlers;
pub mod password;
pub mod session;

use url::form_urlencoded;

pub const LOGIN_PATH: &str = "/auth/login/";

/// Login page URL that returns to `next` afterwards.
pub fn login_url(next: &str) -> String {
    // Slashes stay readable: `/auth/login/?next=/create/`
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", LOGIN_PATH, encoded.replace("%2F", "/"))
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}
