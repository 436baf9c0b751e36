use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rusqlite::Connection;

use crate::db::models::{Group, PostView};
use crate::db::posts::{self, PostFilter};
use crate::db::{groups, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{FormErrors, PostForm, PostFormView};
use crate::pagination::{Page, PageQuery, PageWindow, POSTS_PER_PAGE};
use crate::routes::Html;
use crate::state::AppState;

const CREATE_PATH: &str = "/create/";

/// Bytes escaped inside one URL path segment; non-ASCII is always escaped.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// -- Templates --

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub actor: Option<CurrentUser>,
    pub page: Page<PostView>,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub actor: Option<CurrentUser>,
    pub group: Group,
    pub page: Page<PostView>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub actor: Option<CurrentUser>,
    pub author: String,
    pub post_count: usize,
    pub page: Page<PostView>,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub actor: Option<CurrentUser>,
    pub post: PostView,
    pub author_post_count: usize,
    pub can_edit: bool,
}

/// Shared by create and edit; `is_edit` switches headings and the submit label.
#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct CreatePostTemplate {
    pub actor: Option<CurrentUser>,
    pub form: PostFormView,
    pub is_edit: bool,
    pub action: String,
}

// -- URLs --

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", utf8_percent_encode(username, PATH_SEGMENT))
}

pub fn post_url(id: i64) -> String {
    format!("/posts/{}/", id)
}

pub fn edit_url(id: i64) -> String {
    format!("/posts/{}/edit/", id)
}

// -- Helpers --

fn load_page(
    conn: &Connection,
    filter: PostFilter<'_>,
    query: &PageQuery,
) -> rusqlite::Result<Page<PostView>> {
    let total = posts::count(conn, filter)?;
    let window = PageWindow::new(total, POSTS_PER_PAGE, query.raw());
    let items = posts::list(conn, filter, window.limit(), window.offset())?;
    Ok(Page::new(items, window, total))
}

/// Post ids in URLs are integers; anything else is simply not found.
fn find_post(
    conn: &Connection,
    raw_id: &str,
    actor: Option<&CurrentUser>,
) -> AppResult<PostView> {
    let not_found = || AppError::NotFound(actor.cloned());
    let id: i64 = raw_id.parse().map_err(|_| not_found())?;
    posts::find(conn, id)?.ok_or_else(not_found)
}

// -- Listings --

/// GET /: every post, newest first
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(actor): MaybeUser,
    query: PageQuery,
) -> AppResult<Html<IndexTemplate>> {
    let conn = state.db.get()?;
    let page = load_page(&conn, PostFilter::All, &query)?;
    Ok(Html(IndexTemplate { actor, page }))
}

/// GET /group/{slug}/: posts filed under one group
pub async fn group_posts(
    State(state): State<AppState>,
    MaybeUser(actor): MaybeUser,
    Path(slug): Path<String>,
    query: PageQuery,
) -> AppResult<Html<GroupListTemplate>> {
    let conn = state.db.get()?;
    let group = groups::find_by_slug(&conn, &slug)?
        .ok_or_else(|| AppError::NotFound(actor.clone()))?;
    let page = load_page(&conn, PostFilter::Group(group.id), &query)?;
    Ok(Html(GroupListTemplate { actor, group, page }))
}

/// GET /profile/{username}/: one author's posts and their total
pub async fn profile(
    State(state): State<AppState>,
    MaybeUser(actor): MaybeUser,
    Path(username): Path<String>,
    query: PageQuery,
) -> AppResult<Html<ProfileTemplate>> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?
        .ok_or_else(|| AppError::NotFound(actor.clone()))?;
    let page = load_page(&conn, PostFilter::Author(&author.id), &query)?;
    Ok(Html(ProfileTemplate {
        actor,
        author: author.username,
        post_count: page.total,
        page,
    }))
}

// -- Single post --

/// GET /posts/{post_id}/
pub async fn post_detail(
    State(state): State<AppState>,
    MaybeUser(actor): MaybeUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<PostDetailTemplate>> {
    let conn = state.db.get()?;
    let post = find_post(&conn, &post_id, actor.as_ref())?;
    let author_post_count = posts::count(&conn, PostFilter::Author(&post.author_id))?;
    let can_edit = actor.as_ref().is_some_and(|a| a.id == post.author_id);

    Ok(Html(PostDetailTemplate {
        actor,
        post,
        author_post_count,
        can_edit,
    }))
}

// -- Create --

/// GET /create/: empty form
pub async fn create_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<CreatePostTemplate>> {
    let conn = state.db.get()?;
    let groups = groups::list_all(&conn)?;
    Ok(Html(CreatePostTemplate {
        actor: Some(user),
        form: PostFormView::blank(&groups),
        is_edit: false,
        action: CREATE_PATH.to_string(),
    }))
}

/// POST /create/: the actor always becomes the author
pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let groups = groups::list_all(&conn)?;

    match form.validate(&groups) {
        Ok(valid) => {
            let id = posts::insert(&conn, &user.id, &valid.text, valid.group_id)?;
            tracing::info!("Post {} created by {}", id, user.username);
            Ok(Redirect::to(&profile_url(&user.username)).into_response())
        }
        Err(errors) => Ok(Html(CreatePostTemplate {
            actor: Some(user),
            form: PostFormView::new(&form, &groups, errors),
            is_edit: false,
            action: CREATE_PATH.to_string(),
        })
        .into_response()),
    }
}

// -- Edit --

/// The post, if `user` may edit it; otherwise the redirect to the user's own profile.
fn editable_post(
    conn: &Connection,
    user: &CurrentUser,
    raw_id: &str,
) -> AppResult<Result<PostView, Response>> {
    let post = find_post(conn, raw_id, Some(user))?;
    if post.author_id != user.id {
        tracing::warn!(
            "{} tried to edit post {} by {}",
            user.username,
            post.id,
            post.author_username
        );
        return Ok(Err(Redirect::to(&profile_url(&user.username)).into_response()));
    }
    Ok(Ok(post))
}

/// GET /posts/{post_id}/edit/: form pre-filled with the post
pub async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = match editable_post(&conn, &user, &post_id)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    let groups = groups::list_all(&conn)?;

    Ok(Html(CreatePostTemplate {
        actor: Some(user),
        form: PostFormView::new(&PostForm::from_post(&post), &groups, FormErrors::default()),
        is_edit: true,
        action: edit_url(post.id),
    })
    .into_response())
}

/// POST /posts/{post_id}/edit/: update text and group in place
pub async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = match editable_post(&conn, &user, &post_id)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    let groups = groups::list_all(&conn)?;

    match form.validate(&groups) {
        Ok(valid) => {
            posts::update(&conn, post.id, &valid.text, valid.group_id)?;
            tracing::info!("Post {} updated by {}", post.id, user.username);
            Ok(Redirect::to(&post_url(post.id)).into_response())
        }
        Err(errors) => Ok(Html(CreatePostTemplate {
            actor: Some(user),
            form: PostFormView::new(&form, &groups, errors),
            is_edit: true,
            action: edit_url(post.id),
        })
        .into_response()),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .route(CREATE_PATH, get(create_page).post(create_post))
        .route("/posts/{post_id}/edit/", get(edit_page).post(edit_post))
}
