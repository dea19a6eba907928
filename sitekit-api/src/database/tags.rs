use rusqlite::{params, Connection, OptionalExtension};
use shared_types::Tag;
use std::collections::HashMap;

use crate::database::{lookup_key, AsyncDbConnection};
use anyhow::Result;

const TAG_COLUMNS: &str = "t.id, t.website_id, t.name, t.color, t.is_system, t.created_at";

fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        website_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        is_system: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub async fn list_tags(conn: AsyncDbConnection, website_id: i64) -> Result<Vec<Tag>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {TAG_COLUMNS}
         FROM tags t
         WHERE t.website_id = ?
         ORDER BY t.is_system DESC, t.name"
    ))?;

    let tags = stmt
        .query_map([website_id], row_to_tag)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tags)
}

pub async fn get_tag(conn: AsyncDbConnection, tag_id: i64) -> Result<Tag> {
    let conn = conn.lock().await?;

    conn.query_row(
        &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.id = ?"),
        [tag_id],
        row_to_tag,
    )
    .map_err(|e| anyhow::anyhow!("Failed to get tag {}: {}", tag_id, e))
}

/// Creates a tag, or returns the existing one whose name matches ignoring case.
pub async fn create_tag(
    conn: AsyncDbConnection,
    website_id: i64,
    name: &str,
    color: &str,
    is_system: bool,
) -> Result<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow::anyhow!("Tag name must not be empty"));
    }

    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let key = lookup_key(name);

    conn.execute(
        "INSERT INTO tags (website_id, name, name_key, color, is_system, created_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(website_id, name_key) DO NOTHING",
        params![website_id, name, key, color, is_system, now],
    )?;

    let tag = conn.query_row(
        &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.website_id = ? AND t.name_key = ?"),
        params![website_id, key],
        row_to_tag,
    )?;

    Ok(tag)
}

pub async fn delete_tag(conn: AsyncDbConnection, tag_id: i64) -> Result<()> {
    let conn = conn.lock().await?;

    let deleted = conn.execute("DELETE FROM tags WHERE id = ?", [tag_id])?;
    if deleted == 0 {
        return Err(anyhow::anyhow!("Tag {} not found", tag_id));
    }

    Ok(())
}

/// Assigns a tag to a contact; assigning twice is not an error.
pub async fn assign_tag(conn: AsyncDbConnection, contact_id: i64, tag_id: i64) -> Result<()> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let websites: Option<(i64, i64)> = conn
        .query_row(
            "SELECT c.website_id, t.website_id
             FROM contacts c, tags t
             WHERE c.id = ? AND t.id = ?",
            params![contact_id, tag_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match websites {
        None => Err(anyhow::anyhow!(
            "Contact {} or tag {} not found",
            contact_id,
            tag_id
        )),
        Some((contact_site, tag_site)) if contact_site != tag_site => Err(anyhow::anyhow!(
            "Tag {} does not belong to the website of contact {}",
            tag_id,
            contact_id
        )),
        Some(_) => {
            conn.execute(
                "INSERT OR IGNORE INTO contact_tags (contact_id, tag_id, created_at)
                 VALUES (?, ?, ?)",
                params![contact_id, tag_id, now],
            )?;
            Ok(())
        }
    }
}

pub async fn unassign_tag(conn: AsyncDbConnection, contact_id: i64, tag_id: i64) -> Result<()> {
    let conn = conn.lock().await?;

    conn.execute(
        "DELETE FROM contact_tags WHERE contact_id = ? AND tag_id = ?",
        params![contact_id, tag_id],
    )?;

    Ok(())
}

/// Tags of every contact of a website, keyed by contact id.
pub(crate) fn tags_by_contact(conn: &Connection, website_id: i64) -> Result<HashMap<i64, Vec<Tag>>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT ct.contact_id, {TAG_COLUMNS}
         FROM contact_tags ct
         INNER JOIN tags t ON t.id = ct.tag_id
         WHERE t.website_id = ?
         ORDER BY t.name"
    ))?;

    let mut by_contact: HashMap<i64, Vec<Tag>> = HashMap::new();
    let rows = stmt.query_map([website_id], |row| {
        let contact_id: i64 = row.get(0)?;
        let tag = Tag {
            id: row.get(1)?,
            website_id: row.get(2)?,
            name: row.get(3)?,
            color: row.get(4)?,
            is_system: row.get(5)?,
            created_at: row.get(6)?,
        };
        Ok((contact_id, tag))
    })?;

    for row in rows {
        let (contact_id, tag) = row?;
        by_contact.entry(contact_id).or_default().push(tag);
    }

    Ok(by_contact)
}

pub(crate) fn tags_for_contact(conn: &Connection, contact_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TAG_COLUMNS}
         FROM tags t
         INNER JOIN contact_tags ct ON t.id = ct.tag_id
         WHERE ct.contact_id = ?
         ORDER BY t.name"
    ))?;

    let tags = stmt
        .query_map([contact_id], row_to_tag)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tags)
}
