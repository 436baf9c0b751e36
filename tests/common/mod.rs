//! Shared harness: a fresh database per test and the real router driven with `oneshot`.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube::auth::{password, session};
use yatube::config::Config;
use yatube::db::models::PostView;
use yatube::db::posts::{self, PostFilter};
use yatube::db::{self, groups, users};
use yatube::routes;
use yatube::state::AppState;

pub struct TestApp {
    _dir: TempDir,
    pub state: AppState,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` part of the Set-Cookie header, ready to send back.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    /// Number of post cards rendered on a listing page.
    pub fn card_count(&self) -> usize {
        self.body.matches("<article class=\"card\">").count()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let pool = db::create_pool(&dir.path().join("test.db")).expect("create test database");
        db::run_migrations(&pool).expect("run migrations");

        let mut config = Config::default();
        config.auth.bcrypt_cost = 4;

        let state = AppState { db: pool, config };
        let router = routes::app(state.clone());
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    /// A user that cannot log in with a password; use [`TestApp::login`] instead.
    pub fn user(&self, username: &str) -> String {
        let conn = self.state.db.get().unwrap();
        users::insert(&conn, username, "!").unwrap()
    }

    pub fn user_with_password(&self, username: &str, password: &str) -> String {
        let hash = password::hash_password(password, 4).unwrap();
        let conn = self.state.db.get().unwrap();
        users::insert(&conn, username, &hash).unwrap()
    }

    /// Cookie header value for a fresh session of `user_id`.
    pub fn login(&self, user_id: &str) -> String {
        let conn = self.state.db.get().unwrap();
        let token = session::create_session(&conn, user_id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub fn group(&self, title: &str, slug: &str) -> i64 {
        let conn = self.state.db.get().unwrap();
        groups::insert(&conn, title, slug, "").unwrap()
    }

    pub fn post(&self, author_id: &str, text: &str, group_id: Option<i64>) -> i64 {
        let conn = self.state.db.get().unwrap();
        posts::insert(&conn, author_id, text, group_id).unwrap()
    }

    pub fn post_count(&self) -> usize {
        let conn = self.state.db.get().unwrap();
        posts::count(&conn, PostFilter::All).unwrap()
    }

    pub fn find_post(&self, id: i64) -> PostView {
        let conn = self.state.db.get().unwrap();
        posts::find(&conn, id).unwrap().expect("post exists")
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }
}
