use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use percent_encoding::{utf8_percent_encode, CONTROLS};
use serde::Deserialize;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{safe_next, session};
use crate::db::{self, users};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::Html;
use crate::state::AppState;

pub const INVALID_LOGIN: &str = "Please enter a correct username and password.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const USERNAME_INVALID: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

const MIN_PASSWORD_LEN: usize = 8;

// -- Templates --

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub actor: Option<CurrentUser>,
    pub username: String,
    pub next: String,
    pub error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub actor: Option<CurrentUser>,
    pub username: String,
    pub errors: SignupErrors,
}

// -- Request types --

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignupErrors {
    pub username: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl SignupErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

impl SignupForm {
    /// Field checks that need no database access.
    fn check(&self) -> SignupErrors {
        let mut errors = SignupErrors::default();
        if self.username.trim().is_empty() {
            errors.username = Some(crate::forms::REQUIRED);
        } else if !users::is_valid_username(self.username.trim()) {
            errors.username = Some(USERNAME_INVALID);
        }

        if self.password1.is_empty() {
            errors.password = Some(crate::forms::REQUIRED);
        } else if self.password1 != self.password2 {
            errors.password = Some(PASSWORD_MISMATCH);
        } else if self.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.password = Some(PASSWORD_TOO_SHORT);
        }
        errors
    }
}

/// Redirect that also installs a fresh session cookie.
/// `to` may carry raw non-ASCII from a submitted `next`; it goes out percent-encoded.
fn logged_in_redirect(state: &AppState, token: &str, to: &str) -> Response {
    let cookie = session::session_cookie(
        &state.config.auth.cookie_name,
        token,
        state.config.auth.session_hours,
    );
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, utf8_percent_encode(to, CONTROLS).to_string()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response()
}

// -- Login handlers --

/// GET /auth/login/: render login page
pub async fn login_page(
    MaybeUser(actor): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        actor,
        username: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
        error: None,
    })
}

/// POST /auth/login/: check credentials, start a session, follow `next`
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = safe_next(form.next.as_deref()).to_string();
    let username = form.username.trim();

    let conn = state.db.get()?;
    let user = users::find_by_username(&conn, username)?
        .filter(|user| verify_password(&form.password, &user.password_hash));

    let Some(user) = user else {
        tracing::warn!("Failed login for {:?}", username);
        return Ok(Html(LoginTemplate {
            actor: None,
            username: username.to_string(),
            next,
            error: Some(INVALID_LOGIN),
        })
        .into_response());
    };

    let token = session::create_session(&conn, &user.id, state.config.auth.session_hours)?;
    tracing::info!("User {} logged in", user.username);
    Ok(logged_in_redirect(&state, &token, &next))
}

// -- Signup handlers --

/// GET /auth/signup/: render registration form
pub async fn signup_page(MaybeUser(actor): MaybeUser) -> Html<SignupTemplate> {
    Html(SignupTemplate {
        actor,
        username: String::new(),
        errors: SignupErrors::default(),
    })
}

fn signup_rejected(username: String, errors: SignupErrors) -> Response {
    Html(SignupTemplate {
        actor: None,
        username,
        errors,
    })
    .into_response()
}

/// POST /auth/signup/: create the account and log it in
pub async fn signup_submit(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let mut errors = form.check();

    let conn = state.db.get()?;
    if errors.username.is_none() && users::find_by_username(&conn, &username)?.is_some() {
        errors.username = Some(USERNAME_TAKEN);
    }

    if !errors.is_empty() {
        return Ok(signup_rejected(username, errors));
    }

    let hash = hash_password(&form.password1, state.config.auth.bcrypt_cost)?;
    // The name can still be claimed between the lookup above and this insert.
    let user_id = match users::insert(&conn, &username, &hash) {
        Ok(id) => id,
        Err(e) if db::is_unique_violation(&e) => {
            tracing::warn!("Username {} was registered concurrently", username);
            errors.username = Some(USERNAME_TAKEN);
            return Ok(signup_rejected(username, errors));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!("Registered user {}", username);

    let token = session::create_session(&conn, &user_id, state.config.auth.session_hours)?;
    Ok(logged_in_redirect(&state, &token, "/"))
}

// -- Logout handler --

/// POST /auth/logout/: delete session and redirect
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = session::cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, session::clear_session_cookie(cookie_name)),
        ],
    )
        .into_response())
}
