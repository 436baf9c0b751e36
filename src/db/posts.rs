use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::db::models::{GroupRef, PostView};

const POST_SELECT: &str = "SELECT p.id, p.text, p.author_id, u.username, \
     g.id, g.slug, g.title, p.created_at \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

/// Newest first; id breaks ties between posts created in the same millisecond.
const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter<'a> {
    All,
    Group(i64),
    Author(&'a str),
}

impl PostFilter<'_> {
    fn where_clause(&self) -> (&'static str, Vec<Value>) {
        match self {
            PostFilter::All => ("", Vec::new()),
            PostFilter::Group(id) => ("WHERE p.group_id = ?", vec![Value::Integer(*id)]),
            PostFilter::Author(id) => ("WHERE p.author_id = ?", vec![Value::Text(id.to_string())]),
        }
    }
}

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostView> {
    let group_id: Option<i64> = row.get(4)?;
    let group = match group_id {
        Some(id) => Some(GroupRef {
            id,
            slug: row.get(5)?,
            title: row.get(6)?,
        }),
        None => None,
    };

    Ok(PostView {
        id: row.get(0)?,
        text: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        group,
        created_at: row.get(7)?,
    })
}

pub fn count(conn: &Connection, filter: PostFilter<'_>) -> rusqlite::Result<usize> {
    let (clause, values) = filter.where_clause();
    let sql = format!("SELECT COUNT(*) FROM posts p {clause}");
    let total: i64 = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
    Ok(total as usize)
}

/// One slice of the filtered listing, newest first.
pub fn list(
    conn: &Connection,
    filter: PostFilter<'_>,
    limit: usize,
    offset: usize,
) -> rusqlite::Result<Vec<PostView>> {
    let (clause, mut values) = filter.where_clause();
    values.push(Value::Integer(limit as i64));
    values.push(Value::Integer(offset as i64));

    let sql = format!("{POST_SELECT} {clause} {NEWEST_FIRST} LIMIT ? OFFSET ?");
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params_from_iter(values), map_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<PostView>> {
    conn.query_row(
        &format!("{POST_SELECT} WHERE p.id = ?1"),
        params![id],
        map_post,
    )
    .optional()
}

/// Insert a post and return its id; `created_at` is assigned by the database.
pub fn insert(
    conn: &Connection,
    author_id: &str,
    text: &str,
    group_id: Option<i64>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (text, author_id, group_id) VALUES (?1, ?2, ?3)",
        params![text, author_id, group_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace text and group of an existing post. Author and id never change.
pub fn update(
    conn: &Connection,
    id: i64,
    text: &str,
    group_id: Option<i64>,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE posts SET text = ?1, group_id = ?2 WHERE id = ?3",
        params![text, group_id, id],
    )?;
    Ok(rows > 0)
}
