use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Group;

const GROUP_COLUMNS: &str = "id, title, slug, description";

fn map_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        &format!("SELECT {GROUP_COLUMNS} FROM post_groups WHERE slug = ?1"),
        params![slug],
        map_group,
    )
    .optional()
}

/// All groups ordered by title, as offered in the post form.
pub fn list_all(conn: &Connection) -> rusqlite::Result<Vec<Group>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GROUP_COLUMNS} FROM post_groups ORDER BY title, id"
    ))?;
    let groups = stmt
        .query_map([], map_group)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

pub fn insert(
    conn: &Connection,
    title: &str,
    slug: &str,
    description: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
        params![title, slug, description],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Slugs are non-empty runs of ASCII letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
