use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::params;
use shared_types::Website;

pub async fn create_website(
    conn: AsyncDbConnection,
    name: &str,
    domain: Option<&str>,
) -> Result<Website> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let id: i64 = conn.query_row(
        "INSERT INTO websites (name, domain, created_at) VALUES (?, ?, ?) RETURNING id",
        params![name, domain, now],
        |row| row.get(0),
    )?;

    Ok(Website {
        id,
        name: name.to_string(),
        domain: domain.map(|d| d.to_string()),
        created_at: now,
    })
}

pub async fn get_website(conn: AsyncDbConnection, id: i64) -> Result<Website> {
    let conn = conn.lock().await?;

    conn.query_row(
        "SELECT id, name, domain, created_at FROM websites WHERE id = ?",
        [id],
        |row| {
            Ok(Website {
                id: row.get(0)?,
                name: row.get(1)?,
                domain: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .map_err(|e| anyhow::anyhow!("Failed to get website {}: {}", id, e))
}

pub async fn list_websites(conn: AsyncDbConnection) -> Result<Vec<Website>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare("SELECT id, name, domain, created_at FROM websites ORDER BY name")?;

    let websites = stmt
        .query_map([], |row| {
            Ok(Website {
                id: row.get(0)?,
                name: row.get(1)?,
                domain: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(websites)
}
