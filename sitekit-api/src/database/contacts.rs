use crate::database::tags::{tags_by_contact, tags_for_contact};
use crate::database::{lookup_key, AsyncDbConnection};
use anyhow::Result;
use regex::Regex;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use shared_types::{
    CandidateContact, Contact, ContactStatus, ImportResult, ImportRowError, UpdateContactRequest,
};
use std::sync::OnceLock;

const CONTACT_COLUMNS: &str =
    "id, website_id, email, first_name, last_name, status, created_at, updated_at";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
    let status: String = row.get(5)?;
    let status = status.parse::<ContactStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
    })?;

    Ok(Contact {
        id: row.get(0)?,
        website_id: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        status,
        tags: Vec::new(),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub async fn create_contact(
    conn: AsyncDbConnection,
    website_id: i64,
    email: &str,
    first_name: &str,
    last_name: &str,
    status: ContactStatus,
) -> Result<Contact> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(anyhow::anyhow!("Invalid email address: {}", email));
    }

    let id = {
        let conn = conn.lock().await?;
        let now = chrono::Utc::now().timestamp();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM contacts WHERE website_id = ? AND email_key = ? LIMIT 1",
                params![website_id, lookup_key(email)],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Err(anyhow::anyhow!("Contact with email {} already exists", email));
        }

        conn.query_row(
            "INSERT INTO contacts
             (website_id, email, email_key, first_name, last_name, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            params![
                website_id,
                email,
                lookup_key(email),
                first_name.trim(),
                last_name.trim(),
                status.as_str(),
                now,
                now
            ],
            |row| row.get::<_, i64>(0),
        )?
    };

    get_contact(conn, id).await
}

pub async fn get_contact(conn: AsyncDbConnection, id: i64) -> Result<Contact> {
    let conn = conn.lock().await?;

    let mut contact = conn
        .query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"),
            [id],
            row_to_contact,
        )
        .map_err(|e| anyhow::anyhow!("Failed to get contact: {}", e))?;

    contact.tags = tags_for_contact(&conn, id)?;

    Ok(contact)
}

pub async fn list_contacts(conn: AsyncDbConnection, website_id: i64) -> Result<Vec<Contact>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE website_id = ? ORDER BY created_at DESC, id DESC"
    ))?;

    let mut contacts = stmt
        .query_map([website_id], row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tags = tags_by_contact(&conn, website_id)?;
    for contact in &mut contacts {
        contact.tags = tags.remove(&contact.id).unwrap_or_default();
    }

    Ok(contacts)
}

pub async fn update_contact(
    conn: AsyncDbConnection,
    id: i64,
    update: UpdateContactRequest,
) -> Result<Contact> {
    let current = get_contact(conn.clone(), id).await?;

    let email = update
        .email
        .map(|e| e.trim().to_string())
        .unwrap_or(current.email);
    if !is_valid_email(&email) {
        return Err(anyhow::anyhow!("Invalid email address: {}", email));
    }
    let first_name = update.first_name.unwrap_or(current.first_name);
    let last_name = update.last_name.unwrap_or(current.last_name);
    let status = update.status.unwrap_or(current.status);

    {
        let conn = conn.lock().await?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "UPDATE contacts
             SET email = ?, email_key = ?, first_name = ?, last_name = ?, status = ?, updated_at = ?
             WHERE id = ?",
            params![
                email,
                lookup_key(&email),
                first_name,
                last_name,
                status.as_str(),
                now,
                id
            ],
        )?;
    }

    get_contact(conn, id).await
}

pub async fn delete_contact(conn: AsyncDbConnection, id: i64) -> Result<()> {
    let conn = conn.lock().await?;

    let deleted = conn.execute("DELETE FROM contacts WHERE id = ?", [id])?;
    if deleted == 0 {
        return Err(anyhow::anyhow!("Contact {} not found", id));
    }

    Ok(())
}

/// Inserts one batch of imported contacts.
///
/// Emails already stored for the website are counted as skipped. Invalid
/// emails and failed inserts are reported per row and do not stop the batch.
/// Only a missing website or a connection problem fails the whole call.
pub async fn bulk_create_contacts(
    conn: AsyncDbConnection,
    website_id: i64,
    rows: &[CandidateContact],
) -> Result<ImportResult> {
    let mut conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let website: Option<i64> = conn
        .query_row("SELECT id FROM websites WHERE id = ?", [website_id], |row| {
            row.get(0)
        })
        .optional()?;
    if website.is_none() {
        return Err(anyhow::anyhow!("Website {} not found", website_id));
    }

    let tx = conn.transaction()?;
    let mut result = ImportResult::default();

    for row in rows {
        let email = row.email.trim();

        if !is_valid_email(email) {
            result.errors.push(ImportRowError {
                email: row.email.clone(),
                error: "Invalid email address".to_string(),
            });
            continue;
        }

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM contacts WHERE website_id = ? AND email_key = ? LIMIT 1",
                params![website_id, lookup_key(email)],
                |r| r.get(0),
            )
            .optional()?;
        if existing.is_some() {
            result.skipped += 1;
            continue;
        }

        match tx.execute(
            "INSERT INTO contacts
             (website_id, email, email_key, first_name, last_name, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                website_id,
                email,
                lookup_key(email),
                row.first_name.trim(),
                row.last_name.trim(),
                row.status.as_str(),
                now,
                now
            ],
        ) {
            Ok(_) => result.imported += 1,
            Err(e) => result.errors.push(ImportRowError {
                email: row.email.clone(),
                error: e.to_string(),
            }),
        }
    }

    tx.commit()?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::test_database;
    use crate::database::websites;

    fn candidate(email: &str, first: &str) -> CandidateContact {
        let mut c = CandidateContact::new(email);
        c.first_name = first.to_string();
        c
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ann@example.com"));
        assert!(is_valid_email("a.b+tag@sub.example.co.uk"));
        assert!(!is_valid_email("ann"));
        assert!(!is_valid_email("ann@example"));
        assert!(!is_valid_email("ann smith@example.com"));
    }

    #[tokio::test]
    async fn test_bulk_create_counts_rows() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let site = websites::create_website(conn.clone(), "Bakery", None).await.unwrap();

        create_contact(conn.clone(), site.id, "old@x.com", "Old", "", ContactStatus::Active)
            .await
            .unwrap();

        let rows = vec![
            candidate("new@x.com", "New"),
            candidate("OLD@x.com", "Old again"),
            candidate("not-an-email", "Broken"),
            candidate("New@X.com", "Same file"),
        ];

        let result = bulk_create_contacts(conn.clone(), site.id, &rows).await.unwrap();

        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].email, "not-an-email");

        let contacts = list_contacts(conn, site.id).await.unwrap();
        assert_eq!(contacts.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_create_unknown_website_fails() {
        let (_dir, db) = test_database();
        let rows = vec![candidate("a@x.com", "A")];
        assert!(bulk_create_contacts(db.async_connection.clone(), 42, &rows)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_contacts_are_scoped_per_website() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let bakery = websites::create_website(conn.clone(), "Bakery", None).await.unwrap();
        let florist = websites::create_website(conn.clone(), "Florist", None).await.unwrap();

        create_contact(conn.clone(), bakery.id, "ann@x.com", "Ann", "", ContactStatus::Pending)
            .await
            .unwrap();
        create_contact(conn.clone(), florist.id, "ANN@x.com", "Ann", "", ContactStatus::Pending)
            .await
            .unwrap();
        assert!(
            create_contact(conn.clone(), bakery.id, "Ann@X.com", "Ann", "", ContactStatus::Pending)
                .await
                .is_err()
        );

        assert_eq!(list_contacts(conn.clone(), bakery.id).await.unwrap().len(), 1);
        assert_eq!(list_contacts(conn, florist.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_uniqueness_folds_non_ascii_case() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let site = websites::create_website(conn.clone(), "Bäckerei", None).await.unwrap();

        create_contact(conn.clone(), site.id, "ÄNN@x.com", "Änn", "", ContactStatus::Pending)
            .await
            .unwrap();
        assert!(
            create_contact(conn.clone(), site.id, "änn@x.com", "Änn", "", ContactStatus::Pending)
                .await
                .is_err()
        );

        let result = bulk_create_contacts(conn.clone(), site.id, &[candidate("Änn@X.com", "Änn")])
            .await
            .unwrap();
        assert_eq!(result.imported, 0);
        assert_eq!(result.skipped, 1);
        assert_eq!(list_contacts(conn, site.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_contact() {
        let (_dir, db) = test_database();
        let conn = db.async_connection.clone();
        let site = websites::create_website(conn.clone(), "Bakery", None).await.unwrap();
        let contact =
            create_contact(conn.clone(), site.id, "ann@x.com", "Ann", "", ContactStatus::Pending)
                .await
                .unwrap();

        let updated = update_contact(
            conn.clone(),
            contact.id,
            UpdateContactRequest {
                email: None,
                first_name: None,
                last_name: Some("Lee".to_string()),
                status: Some(ContactStatus::Unsubscribed),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.first_name, "Ann");
        assert_eq!(updated.last_name, "Lee");
        assert_eq!(updated.status, ContactStatus::Unsubscribed);

        delete_contact(conn.clone(), contact.id).await.unwrap();
        assert!(get_contact(conn.clone(), contact.id).await.is_err());
        assert!(delete_contact(conn, contact.id).await.is_err());
    }
}
