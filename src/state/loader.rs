//! Materializes `Application` entities from the store.

use rusqlite::{params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data::{AppFlags, Application, StatusFlags};
use super::query::AppQuery;
use crate::error::{CorruptField, Error, Result};

/// What to do with a row that cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Fail the whole load; a partial inventory is misleading
    #[default]
    Abort,
    /// Log the row and carry on
    Skip,
}

/// Runs an `AppQuery` against a connection and decodes the rows.
#[derive(Debug, Clone, Default)]
pub struct AppListLoader {
    query: AppQuery,
    policy: RowPolicy,
}

impl AppListLoader {
    pub fn new(query: AppQuery) -> Self {
        Self {
            query,
            policy: RowPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn query(&self) -> &AppQuery {
        &self.query
    }

    /// Load every matching application, in store order.
    ///
    /// Zero matching rows is reported as `Error::NoResults` rather than an
    /// empty list; callers use it to detect an uninitialised store. The
    /// statement and its cursor are dropped on every return path.
    pub fn load_matching(&self, conn: &Connection) -> Result<Vec<Application>> {
        let (sql, params) = self.query.application_sql();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut matched = 0usize;
        let mut applications = Vec::new();
        while let Some(row) = rows.next()? {
            matched += 1;
            match decode_row(row) {
                Ok(application) => applications.push(application),
                Err(err) => match self.policy {
                    RowPolicy::Abort => return Err(err),
                    RowPolicy::Skip => warn!(error = %err, "skipping corrupt application row"),
                },
            }
        }

        if matched == 0 {
            return Err(Error::NoResults);
        }

        debug!(
            matched,
            loaded = applications.len(),
            "got matching applications"
        );
        Ok(applications)
    }

    /// Package names of matching applications, in store order.
    pub fn matching_package_names(&self, conn: &Connection) -> Result<Vec<String>> {
        let (sql, params) = self.query.package_name_sql();
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        if names.is_empty() {
            return Err(Error::NoResults);
        }
        Ok(names)
    }
}

fn corrupt(package: &str, source: impl Into<CorruptField>) -> Error {
    Error::RecordCorrupt {
        package: package.to_string(),
        source: source.into(),
    }
}

/// Decode one row. Errors are tagged with the row's package name.
fn decode_row(row: &Row<'_>) -> Result<Application> {
    let package_name: String = row
        .get("package_name")
        .map_err(|err| corrupt("<unknown>", err))?;
    let label: String = row.get("label").map_err(|err| corrupt(&package_name, err))?;
    let version_code: i32 = row
        .get("version_code")
        .map_err(|err| corrupt(&package_name, err))?;
    let app_flags: u32 = row.get("app_flags").map_err(|err| corrupt(&package_name, err))?;
    let status_flags: u32 = row
        .get("status_flags")
        .map_err(|err| corrupt(&package_name, err))?;
    let uid: u32 = row.get("uid").map_err(|err| corrupt(&package_name, err))?;
    let icon_blob: Vec<u8> = row.get("icon").map_err(|err| corrupt(&package_name, err))?;

    let icon = image::load_from_memory(&icon_blob).map_err(|err| corrupt(&package_name, err))?;

    Ok(Application {
        package_name,
        label,
        version_code,
        app_flags: AppFlags::from_bits_retain(app_flags),
        status_flags: StatusFlags::from_bits_retain(status_flags),
        uid,
        icon,
    })
}
