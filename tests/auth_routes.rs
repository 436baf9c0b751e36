//! Login, signup and logout through the real router.

mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn login_page_carries_next() {
    let app = TestApp::new();
    let response = app.get("/auth/login/?next=/create/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<title>Log in</title>"));
    assert!(response.body.contains("name=\"next\" value=\"/create/\""));
}

#[tokio::test]
async fn login_redirects_to_next_with_session() {
    let app = TestApp::new();
    app.user_with_password("alice", "s3cret-pass");

    let response = app
        .post_form(
            "/auth/login/",
            "username=alice&password=s3cret-pass&next=%2Fcreate%2F",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/create/"));

    let cookie = response.session_cookie().expect("session cookie set");
    assert!(cookie.starts_with("yatube_session="));

    let create = app.get("/create/", Some(&cookie)).await;
    assert_eq!(create.status, StatusCode::OK);
}

#[tokio::test]
async fn login_ignores_offsite_next() {
    let app = TestApp::new();
    app.user_with_password("alice", "s3cret-pass");

    let response = app
        .post_form(
            "/auth/login/",
            "username=alice&password=s3cret-pass&next=https%3A%2F%2Fevil.example%2F",
            None,
        )
        .await;
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn login_encodes_non_ascii_next() {
    let app = TestApp::new();
    app.user_with_password("alice", "s3cret-pass");

    let response = app
        .post_form(
            "/auth/login/",
            "username=alice&password=s3cret-pass&next=%2Fprofile%2F%D0%BF%D1%91%D1%82%D1%80%2F",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location(),
        Some("/profile/%D0%BF%D1%91%D1%82%D1%80/")
    );
}

#[tokio::test]
async fn wrong_password_redisplays_login() {
    let app = TestApp::new();
    app.user_with_password("alice", "s3cret-pass");

    for form in [
        "username=alice&password=nope",
        "username=nobody&password=s3cret-pass",
    ] {
        let response = app.post_form("/auth/login/", form, None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains(yatube::auth::handlers::INVALID_LOGIN));
        assert!(response.session_cookie().is_none());
    }
}

#[tokio::test]
async fn signup_creates_account_and_logs_in() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/auth/signup/",
            "username=newbie&password1=long-enough&password2=long-enough",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    let cookie = response.session_cookie().expect("session cookie set");

    let created = app
        .post_form("/create/", "text=Hello+from+newbie", Some(&cookie))
        .await;
    assert_eq!(created.location(), Some("/profile/newbie/"));

    let profile = app.get("/profile/newbie/", None).await;
    assert!(profile.body.contains("Hello from newbie"));

    // And the password works for a later login.
    let login = app
        .post_form("/auth/login/", "username=newbie&password=long-enough", None)
        .await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn signup_rejects_taken_username() {
    let app = TestApp::new();
    app.user("taken");

    let response = app
        .post_form(
            "/auth/signup/",
            "username=taken&password1=long-enough&password2=long-enough",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(yatube::auth::handlers::USERNAME_TAKEN));
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn signup_rejects_short_password() {
    let app = TestApp::new();
    let response = app
        .post_form(
            "/auth/signup/",
            "username=shorty&password1=short&password2=short",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body
        .contains(yatube::auth::handlers::PASSWORD_TOO_SHORT));
    assert_eq!(app.get("/profile/shorty/", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_ends_session() {
    let app = TestApp::new();
    let id = app.user("alice");
    let cookie = app.login(&id);
    assert_eq!(app.get("/create/", Some(&cookie)).await.status, StatusCode::OK);

    let response = app.post_form("/auth/logout/", "", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    assert_eq!(response.session_cookie().as_deref(), Some("yatube_session="));

    let after = app.get("/create/", Some(&cookie)).await;
    assert_eq!(after.location(), Some("/auth/login/?next=/create/"));
}

#[tokio::test]
async fn header_reflects_login_state() {
    let app = TestApp::new();
    let id = app.user("alice");

    let guest = app.get("/", None).await;
    assert!(guest.body.contains("href=\"/auth/login/\""));

    let member = app.get("/", Some(&app.login(&id))).await;
    assert!(member.body.contains("href=\"/profile/alice/\""));
    assert!(member.body.contains("action=\"/auth/logout/\""));
}
