use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // Create websites table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS websites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR NOT NULL,
            domain VARCHAR,
            created_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Create contacts table; email_key is the lowercased email, unique per website
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            website_id INTEGER NOT NULL,
            email VARCHAR NOT NULL,
            email_key VARCHAR NOT NULL,
            first_name VARCHAR NOT NULL DEFAULT '',
            last_name VARCHAR NOT NULL DEFAULT '',
            status VARCHAR NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'active', 'confirmed', 'unsubscribed')),
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            UNIQUE (website_id, email_key),
            FOREIGN KEY (website_id) REFERENCES websites (id) ON DELETE CASCADE
        )",
        [],
    )?;

    // Create tags table; name_key is the lowercased name, unique per website
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            website_id INTEGER NOT NULL,
            name VARCHAR NOT NULL,
            name_key VARCHAR NOT NULL,
            color VARCHAR NOT NULL,
            is_system BOOLEAN NOT NULL DEFAULT false,
            created_at BIGINT NOT NULL,
            UNIQUE (website_id, name_key),
            FOREIGN KEY (website_id) REFERENCES websites (id) ON DELETE CASCADE
        )",
        [],
    )?;

    // Create contact_tags join table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contact_tags (
            contact_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            created_at BIGINT NOT NULL,
            PRIMARY KEY (contact_id, tag_id),
            FOREIGN KEY (contact_id) REFERENCES contacts (id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags (id) ON DELETE CASCADE
        )",
        [],
    )?;

    // Create indexes for performance
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_website
            ON contacts(website_id, created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contact_tags_tag
            ON contact_tags(tag_id)",
        [],
    )?;

    Ok(())
}
