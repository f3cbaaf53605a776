//! Query descriptors for the application inventory
//!
//! An `AppQuery` describes which applications to load. It renders to
//! parameterised SQL over `application` joined with its cached status.

use rusqlite::types::Value;

/// Which applications to match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppFilter {
    #[default]
    All,
    PackageName(String),
    /// Applications holding the given permission
    Permission(String),
    /// Applications holding any permission tied to a setting in this group
    SettingGroup(String),
}

/// Restrict matches to user or system applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppType {
    #[default]
    All,
    User,
    System,
}

impl AppType {
    /// Value of the `app_type` column.
    pub fn column_value(self) -> Option<i64> {
        match self {
            AppType::All => None,
            AppType::User => Some(0),
            AppType::System => Some(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppQuery {
    pub filter: AppFilter,
    pub app_type: AppType,
}

const APPLICATION_COLUMNS: &str = "a.package_name AS package_name, \
     a.label AS label, \
     a.version_code AS version_code, \
     a.flags AS app_flags, \
     COALESCE(s.flags, 0) AS status_flags, \
     a.uid AS uid, \
     a.icon AS icon";

impl AppQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn package(name: impl Into<String>) -> Self {
        Self {
            filter: AppFilter::PackageName(name.into()),
            ..Self::default()
        }
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Self {
            filter: AppFilter::Permission(permission.into()),
            ..Self::default()
        }
    }

    pub fn setting_group(group: impl Into<String>) -> Self {
        Self {
            filter: AppFilter::SettingGroup(group.into()),
            ..Self::default()
        }
    }

    pub fn with_app_type(mut self, app_type: AppType) -> Self {
        self.app_type = app_type;
        self
    }

    /// SQL and parameters selecting every column an `Application` needs.
    pub fn application_sql(&self) -> (String, Vec<Value>) {
        self.build(APPLICATION_COLUMNS)
    }

    /// SQL and parameters selecting only matching package names.
    pub fn package_name_sql(&self) -> (String, Vec<Value>) {
        self.build("a.package_name AS package_name")
    }

    fn build(&self, columns: &str) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        match &self.filter {
            AppFilter::All => {}
            AppFilter::PackageName(name) => {
                clauses.push("a.package_name = ?");
                params.push(Value::Text(name.clone()));
            }
            AppFilter::Permission(permission) => {
                clauses.push(
                    "a.package_name IN (SELECT package_name FROM permission_application \
                     WHERE permission = ?)",
                );
                params.push(Value::Text(permission.clone()));
            }
            AppFilter::SettingGroup(group) => {
                clauses.push(
                    "a.package_name IN (SELECT pa.package_name FROM permission_application pa \
                     JOIN permission_setting ps ON ps.permission = pa.permission \
                     JOIN setting st ON st.id = ps.setting_id \
                     WHERE st.group_id = ?)",
                );
                params.push(Value::Text(group.clone()));
            }
        }

        if let Some(app_type) = self.app_type.column_value() {
            clauses.push("a.app_type = ?");
            params.push(Value::Integer(app_type));
        }

        let mut sql = format!(
            "SELECT {columns} FROM application a \
             LEFT JOIN application_status s ON s.package_name = a.package_name"
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY a.label COLLATE NOCASE, a.package_name");

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_query_has_no_where() {
        let (sql, params) = AppQuery::all().application_sql();
        assert!(!sql.contains("WHERE"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_filters_combine() {
        let (sql, params) = AppQuery::permission("android.permission.INTERNET")
            .with_app_type(AppType::System)
            .package_name_sql();
        assert!(sql.contains("permission_application"));
        assert!(sql.contains("a.app_type = ?"));
        assert_eq!(
            params,
            vec![
                Value::Text("android.permission.INTERNET".to_string()),
                Value::Integer(1)
            ]
        );
    }
}
