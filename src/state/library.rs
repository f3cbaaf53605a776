use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::data::{AppFlags, StatusFlags};
use crate::error::{Error, Result};
use crate::settings::catalog::SettingsCatalog;
use crate::settings::setting::{AppPrivacySetting, CustomValue, PrivacySetting};

/// An application as written by the inventory scanner.
#[derive(Debug, Clone)]
pub struct ApplicationRecord<'a> {
    pub package_name: &'a str,
    pub label: &'a str,
    pub version_code: i32,
    pub app_flags: AppFlags,
    pub status_flags: StatusFlags,
    pub uid: u32,
    /// Encoded icon image (PNG, JPEG, ...)
    pub icon: &'a [u8],
}

/// The Library manages the SQLite store of applications and their privacy state.
/// It hands out its connection to loaders; nothing here is a process-wide singleton.
pub struct Library {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open or create the store at `path` and initialize its schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "database opened");

        let library = Library {
            conn,
            db_path: Some(path.to_path_buf()),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// A throwaway store, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS application (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                package_name    TEXT NOT NULL UNIQUE,
                label           TEXT NOT NULL,
                version_code    INTEGER NOT NULL,
                app_type        INTEGER NOT NULL DEFAULT 0,
                flags           INTEGER NOT NULL DEFAULT 0,
                uid             INTEGER NOT NULL,
                icon            BLOB
            );

            CREATE TABLE IF NOT EXISTS application_status (
                package_name    TEXT PRIMARY KEY
                                REFERENCES application(package_name) ON DELETE CASCADE,
                flags           INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS permission_application (
                permission      TEXT NOT NULL,
                package_name    TEXT NOT NULL,
                PRIMARY KEY (permission, package_name)
            );

            CREATE TABLE IF NOT EXISTS setting (
                id              TEXT PRIMARY KEY,
                group_id        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS permission_setting (
                permission      TEXT NOT NULL,
                setting_id      TEXT NOT NULL,
                PRIMARY KEY (permission, setting_id)
            );

            CREATE TABLE IF NOT EXISTS application_setting (
                package_name        TEXT NOT NULL,
                setting_id          TEXT NOT NULL,
                selected_option_bit INTEGER NOT NULL,
                custom_value        TEXT,
                PRIMARY KEY (package_name, setting_id)
            );

            CREATE INDEX IF NOT EXISTS idx_application_label
                ON application(label);
            CREATE INDEX IF NOT EXISTS idx_permission_application_package
                ON permission_application(package_name);",
        )?;

        debug!("database schema initialized");
        Ok(())
    }

    /// Get the path to the database file (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Connection for loaders. Callers sharing a `Library` across threads
    /// must serialize access themselves.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a count of applications in the store
    pub fn application_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM application", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert or replace an application together with its status row
    pub fn upsert_application(&self, record: &ApplicationRecord<'_>) -> Result<()> {
        let app_type = i64::from(record.app_flags.contains(AppFlags::IS_SYSTEM_APP));
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO application (package_name, label, version_code, app_type, flags, uid, icon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(package_name) DO UPDATE SET
                label = excluded.label,
                version_code = excluded.version_code,
                app_type = excluded.app_type,
                flags = excluded.flags,
                uid = excluded.uid,
                icon = excluded.icon",
            params![
                record.package_name,
                record.label,
                record.version_code,
                app_type,
                record.app_flags.bits(),
                record.uid,
                record.icon,
            ],
        )?;
        tx.execute(
            "INSERT INTO application_status (package_name, flags) VALUES (?1, ?2)
             ON CONFLICT(package_name) DO UPDATE SET flags = excluded.flags",
            params![record.package_name, record.status_flags.bits()],
        )?;

        tx.commit()?;
        debug!(package = record.package_name, "application stored");
        Ok(())
    }

    /// Replace the cached privacy status of an application
    pub fn set_status_flags(&self, package_name: &str, flags: StatusFlags) -> Result<()> {
        self.conn.execute(
            "INSERT INTO application_status (package_name, flags) VALUES (?1, ?2)
             ON CONFLICT(package_name) DO UPDATE SET flags = excluded.flags",
            params![package_name, flags.bits()],
        )?;
        Ok(())
    }

    pub fn add_permission(&self, package_name: &str, permission: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO permission_application (permission, package_name) VALUES (?1, ?2)",
            params![permission, package_name],
        )?;
        Ok(())
    }

    /// Record a setting's group and the permissions that make it relevant
    pub fn register_setting(&self, setting: &PrivacySetting, permissions: &[&str]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO setting (id, group_id) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET group_id = excluded.group_id",
            params![setting.id, setting.group],
        )?;
        for permission in permissions {
            tx.execute(
                "INSERT OR IGNORE INTO permission_setting (permission, setting_id) VALUES (?1, ?2)",
                params![permission, setting.id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Persist an application's selection for one setting.
    /// The selection is stored as raw option bits, the override as JSON.
    pub fn save_app_setting(&self, package_name: &str, setting: &AppPrivacySetting) -> Result<()> {
        let custom = match setting.custom_value() {
            CustomValue::None => None,
            custom => Some(serde_json::to_string(custom)?),
        };

        self.conn.execute(
            "INSERT INTO application_setting (package_name, setting_id, selected_option_bit, custom_value)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(package_name, setting_id) DO UPDATE SET
                selected_option_bit = excluded.selected_option_bit,
                custom_value = excluded.custom_value",
            params![
                package_name,
                setting.setting().id,
                setting.selected_option_bits(),
                custom,
            ],
        )?;
        Ok(())
    }

    /// Rebuild an application's selections from the store.
    ///
    /// Settings without a stored row come back with the default selection.
    /// Stored rows naming a setting the catalog does not know are an error.
    pub fn load_app_settings(
        &self,
        package_name: &str,
        catalog: &SettingsCatalog,
    ) -> Result<Vec<AppPrivacySetting>> {
        let mut stmt = self.conn.prepare(
            "SELECT setting_id FROM application_setting WHERE package_name = ?1",
        )?;
        let stored: Vec<String> = stmt
            .query_map([package_name], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        if let Some(unknown) = stored.iter().find(|id| catalog.get(id).is_none()) {
            return Err(Error::UnknownSetting(unknown.clone()));
        }

        let mut settings = Vec::with_capacity(catalog.len());
        for definition in catalog.settings() {
            let row: Option<(u32, Option<String>)> = self
                .conn
                .query_row(
                    "SELECT selected_option_bit, custom_value FROM application_setting
                     WHERE package_name = ?1 AND setting_id = ?2",
                    params![package_name, definition.id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let setting = match row {
                None => AppPrivacySetting::new(definition.clone()),
                Some((bits, custom)) => {
                    let mut setting = AppPrivacySetting::with_selected_bits(definition.clone(), bits)?;
                    if let Some(json) = custom {
                        setting.set_custom(serde_json::from_str(&json)?);
                    }
                    setting
                }
            };
            settings.push(setting);
        }

        Ok(settings)
    }

    /// Close the connection, reporting any statement still holding it open.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| Error::Database(err))
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
