//! Sqlite-backed preferences: named key-value slots plus the settings row.

use std::path::Path;

use anyhow::Context as _;
use marginalia_core::Settings;
use rusqlite::{Connection, OptionalExtension as _};

#[derive(Debug)]
pub struct Prefs {
    conn: Connection,
}

impl Prefs {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let prefs = Self { conn };
        prefs.migrate()?;
        Ok(prefs)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let prefs = Self { conn };
        prefs.migrate()?;
        Ok(prefs)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS prefs (
                name TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
                PRIMARY KEY (name, key)
            );

            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                assets_dir TEXT
            );
            INSERT OR IGNORE INTO settings (id, assets_dir) VALUES (1, NULL);
            "#,
        )?;
        Ok(())
    }

    pub fn get_string(&self, name: &str, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM prefs WHERE name = ? AND key = ?",
                (name, key),
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read pref {name}/{key}"))?;
        Ok(value)
    }

    pub fn put_string(&self, name: &str, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO prefs (name, key, value, updated_at) VALUES (?, ?, ?, unixepoch())
                ON CONFLICT(name, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                (name, key, value),
            )
            .with_context(|| format!("write pref {name}/{key}"))?;
        Ok(())
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let assets_dir = self
            .conn
            .query_row("SELECT assets_dir FROM settings WHERE id = 1", [], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?
            .flatten();

        let mut settings = Settings { assets_dir };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        self.conn.execute(
            "UPDATE settings SET assets_dir = ? WHERE id = 1",
            [settings.assets_dir.as_deref()],
        )?;
        Ok(())
    }
}
