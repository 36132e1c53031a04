//! Database schema migrations for feedhub.
//!
//! Migrations are applied in order; each entry is one schema version.

/// Ordered list of schema migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users, feeds, posts
    r#"
    CREATE TABLE users (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE feeds (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        name            TEXT NOT NULL,
        url             TEXT NOT NULL UNIQUE,
        user_id         INTEGER NOT NULL REFERENCES users(id),
        last_fetched_at TEXT,
        created_at      TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX idx_feeds_last_fetched_at ON feeds(last_fetched_at);
    CREATE INDEX idx_feeds_user_id ON feeds(user_id);

    CREATE TABLE posts (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        feed_id      INTEGER NOT NULL REFERENCES feeds(id),
        title        TEXT NOT NULL,
        url          TEXT NOT NULL,
        description  TEXT,
        published_at TEXT NOT NULL,
        created_at   TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at   TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(feed_id, url)
    );

    CREATE INDEX idx_posts_feed_id ON posts(feed_id);
    CREATE INDEX idx_posts_published_at ON posts(published_at);
    "#,
];
