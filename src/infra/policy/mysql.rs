//! MySQL policy store.
//!
//! Each machine has at most one row in the `IBEAM` table, keyed by
//! `machine_name`. The decision lives in `use_paper_account` (legacy schema)
//! or `value` (generic schema); a blank legacy value defers to `value`.

use super::store::{PolicyConnection, PolicyConnector, PolicyError, PolicyTarget};
use super::value::PolicyValue;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::debug;

pub const POLICY_QUERY: &str = "SELECT * FROM IBEAM WHERE machine_name = ?";

/// Decision columns in the order they are consulted.
pub const DECISION_COLUMNS: &[&str] = &["use_paper_account", "value"];

/// Opens one direct (unpooled) MySQL connection per check.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlPolicyConnector;

#[async_trait]
impl PolicyConnector for MySqlPolicyConnector {
    async fn connect(
        &self,
        target: &PolicyTarget,
    ) -> Result<Box<dyn PolicyConnection>, PolicyError> {
        let mut options = MySqlConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .username(&target.user)
            .database(&target.database);
        if let Some(password) = &target.password {
            options = options.password(password);
        }

        let conn = tokio::time::timeout(target.connect_timeout, options.connect())
            .await
            .map_err(|_| PolicyError::Timeout("connect", target.connect_timeout))?
            .map_err(|e| PolicyError::Connect(e.to_string()))?;

        Ok(Box::new(MySqlPolicyConnection {
            conn,
            query_timeout: target.query_timeout,
        }))
    }
}

pub struct MySqlPolicyConnection {
    conn: MySqlConnection,
    query_timeout: Duration,
}

#[async_trait]
impl PolicyConnection for MySqlPolicyConnection {
    async fn fetch_decision(
        &mut self,
        identity: &str,
    ) -> Result<Option<PolicyValue>, PolicyError> {
        let query = sqlx::query(POLICY_QUERY)
            .bind(identity)
            .fetch_optional(&mut self.conn);
        let row = tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| PolicyError::Timeout("query", self.query_timeout))?
            .map_err(|e| PolicyError::Query(e.to_string()))?;

        match row {
            Some(row) => decision_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), PolicyError> {
        let this = *self;
        this.conn
            .close()
            .await
            .map_err(|e| PolicyError::Connect(e.to_string()))
    }
}

fn decision_from_row(row: &MySqlRow) -> Result<PolicyValue, PolicyError> {
    let mut columns = Vec::with_capacity(DECISION_COLUMNS.len());
    for column in DECISION_COLUMNS {
        columns.push((*column, column_value(row, column)?));
    }
    Ok(select_decision(columns))
}

/// Choose the decision among `(column, value)` pairs given in
/// [`DECISION_COLUMNS`] order.
///
/// The first non-blank value wins. A blank value (`false`, `0`, `''`) falls
/// through to the next column; when no column is non-blank the last non-null
/// value is used. A row with no value at all yields `Other("NULL")`.
pub fn select_decision<'a>(
    columns: impl IntoIterator<Item = (&'a str, Option<PolicyValue>)>,
) -> PolicyValue {
    let mut fallback = None;
    for (column, value) in columns {
        let Some(value) = value else { continue };
        if !value.is_blank() {
            debug!("Decision taken from column '{column}'");
            return value;
        }
        fallback = Some(value);
    }
    fallback.unwrap_or_else(|| PolicyValue::Other("NULL".to_string()))
}

fn column_value(row: &MySqlRow, column: &str) -> Result<Option<PolicyValue>, PolicyError> {
    if !row.columns().iter().any(|c| c.name() == column) {
        return Ok(None);
    }

    let raw = row
        .try_get_raw(column)
        .map_err(|e| PolicyError::Query(e.to_string()))?;
    if raw.is_null() {
        return Ok(None);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    debug!("Decision column '{column}' has type {type_name}");

    let decode = |e: sqlx::Error| PolicyError::Query(format!("decode {column}: {e}"));
    let value = match sql_type_kind(&type_name) {
        SqlTypeKind::Bool => PolicyValue::Bool(row.try_get::<bool, _>(column).map_err(decode)?),
        SqlTypeKind::Signed => {
            PolicyValue::Int(row.try_get::<i64, _>(column).map_err(decode)?)
        }
        SqlTypeKind::Unsigned => row.try_get::<u64, _>(column).map_err(decode)?.into(),
        SqlTypeKind::Text => PolicyValue::Text(row.try_get::<String, _>(column).map_err(decode)?),
        SqlTypeKind::Other => PolicyValue::Other(type_name),
    };
    Ok(Some(value))
}

#[derive(Debug, PartialEq, Eq)]
enum SqlTypeKind {
    Bool,
    Signed,
    Unsigned,
    Text,
    Other,
}

fn sql_type_kind(type_name: &str) -> SqlTypeKind {
    match type_name {
        "BOOLEAN" => SqlTypeKind::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => SqlTypeKind::Signed,
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => SqlTypeKind::Unsigned,
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" => {
            SqlTypeKind::Text
        }
        _ => SqlTypeKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_map_to_kinds() {
        assert_eq!(sql_type_kind("BOOLEAN"), SqlTypeKind::Bool);
        assert_eq!(sql_type_kind("TINYINT"), SqlTypeKind::Signed);
        assert_eq!(sql_type_kind("BIGINT UNSIGNED"), SqlTypeKind::Unsigned);
        assert_eq!(sql_type_kind("VARCHAR"), SqlTypeKind::Text);
        assert_eq!(sql_type_kind("JSON"), SqlTypeKind::Other);
        assert_eq!(sql_type_kind("BIT"), SqlTypeKind::Other);
    }

    fn row(legacy: Option<PolicyValue>, generic: Option<PolicyValue>) -> PolicyValue {
        select_decision(DECISION_COLUMNS.iter().copied().zip([legacy, generic]))
    }

    #[test]
    fn legacy_schema_only() {
        assert_eq!(row(Some(1_i64.into()), None), PolicyValue::Int(1));
        assert!(!row(Some(false.into()), None).normalize());
        // Generic column absent from the table entirely.
        assert_eq!(
            select_decision([("use_paper_account", Some(PolicyValue::from(true)))]),
            PolicyValue::Bool(true)
        );
    }

    #[test]
    fn generic_schema_only() {
        assert_eq!(
            select_decision([("value", Some(PolicyValue::from("yes")))]),
            PolicyValue::Text("yes".into())
        );
        assert_eq!(row(None, Some("TRUE".into())), PolicyValue::Text("TRUE".into()));
    }

    #[test]
    fn legacy_column_wins_when_set() {
        assert_eq!(row(Some(1_i64.into()), Some("0".into())), PolicyValue::Int(1));
        assert_eq!(
            row(Some("false".into()), Some("1".into())),
            PolicyValue::Text("false".into())
        );
    }

    #[test]
    fn blank_legacy_column_falls_through_to_value() {
        let value = row(Some(0_i64.into()), Some("1".into()));
        assert_eq!(value, PolicyValue::Text("1".into()));
        assert!(value.normalize());

        assert!(row(Some(false.into()), Some(true.into())).normalize());
        assert!(!row(Some(0_i64.into()), Some("0".into())).normalize());
    }

    #[test]
    fn both_null_is_unrecognized() {
        let value = row(None, None);
        assert_eq!(value, PolicyValue::Other("NULL".into()));
        assert!(!value.normalize());
        assert_eq!(
            select_decision(Vec::<(&str, Option<PolicyValue>)>::new()),
            PolicyValue::Other("NULL".into())
        );
    }

    #[test]
    fn query_matches_machine_name() {
        assert!(POLICY_QUERY.ends_with("machine_name = ?"));
    }

    #[tokio::test]
    async fn unreachable_host_fails_to_connect() {
        let target = PolicyTarget {
            host: "127.0.0.1".into(),
            port: 1,
            user: "gate".into(),
            password: None,
            database: "ops".into(),
            identity: "gw-01".into(),
            connect_timeout: Duration::from_secs(2),
            query_timeout: Duration::from_secs(2),
        };
        let result = MySqlPolicyConnector.connect(&target).await;
        assert!(result.is_err());
    }
}
