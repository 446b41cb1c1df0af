//! SQL Server protocol sessions over TDS (tiberius).
//!
//! One connect-execute-close cycle per session. The factory performs the
//! TCP connect and TDS handshake; the executor owns the deadlines, so a
//! connect future dropped mid-flight tears the half-open socket down with
//! it. Every error message leaving this module is scrubbed of credential
//! material before it is classified.

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, ColumnType, Config, EncryptionLevel, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use domain::errors::SessionError;
use domain::models::{ConnectionProfile, QueryParam, Row};
use domain::services::{ProtocolSession, SessionFactory};
use shared::redact::{redact_password_patterns, redact_secret};

/// Opens one TDS session per call. Stateless; no connection reuse.
#[derive(Debug, Default, Clone)]
pub struct TdsSessionFactory;

impl TdsSessionFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionFactory for TdsSessionFactory {
    async fn connect(
        &self,
        profile: &ConnectionProfile,
    ) -> Result<Box<dyn ProtocolSession>, SessionError> {
        let config = build_config(profile)?;
        let addr = target_addr(profile);

        let tcp = TcpStream::connect(&addr).await.map_err(|err| {
            connection_error(format!("failed to reach {addr}: {err}"), profile)
        })?;
        tcp.set_nodelay(true).map_err(|err| {
            connection_error(format!("failed to configure socket: {err}"), profile)
        })?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|err| {
                connection_error(format!("TDS handshake failed: {err}"), profile)
            })?;

        Ok(Box::new(TdsSession {
            client: Some(client),
        }))
    }
}

/// A live TDS connection carrying exactly one statement.
pub struct TdsSession {
    client: Option<Client<Compat<TcpStream>>>,
}

#[async_trait]
impl ProtocolSession for TdsSession {
    async fn run(
        &mut self,
        statement: &str,
        params: &[QueryParam],
    ) -> Result<Vec<Row>, SessionError> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| SessionError::Connection("session already closed".into()))?;

        let rows = if params.is_empty() {
            client
                .simple_query(statement)
                .await
                .map_err(classify_run_error)?
                .into_first_result()
                .await
                .map_err(classify_run_error)?
        } else {
            let bindings = bind_params(params);
            client
                .query(statement, &bindings)
                .await
                .map_err(classify_run_error)?
                .into_first_result()
                .await
                .map_err(classify_run_error)?
        };

        Ok(rows.iter().map(row_to_domain).collect())
    }

    async fn close(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(err) = client.close().await {
                tracing::debug!(error = %err, "TDS close failed");
            }
        }
    }
}

/// The schema constrains ports to 1..=65535; a row that violates it anyway
/// is rejected here instead of being truncated into a different port.
fn build_config(profile: &ConnectionProfile) -> Result<Config, SessionError> {
    let port = u16::try_from(profile.port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| {
            SessionError::Connection(format!("profile port {} is out of range", profile.port))
        })?;

    let mut config = Config::new();
    config.host(&profile.host);
    config.port(port);
    config.database(&profile.database_name);
    config.authentication(AuthMethod::sql_server(&profile.username, &profile.password));
    // Encrypted transport with the server certificate taken on trust; the
    // targets are internal legacy hosts without a PKI.
    config.trust_cert();
    config.encryption(EncryptionLevel::Required);
    Ok(config)
}

fn target_addr(profile: &ConnectionProfile) -> String {
    format!("{}:{}", profile.host, profile.port)
}

/// Typed bindings in declaration order. Values are bound as parameters,
/// never interpolated into the statement text.
fn bind_params(params: &[QueryParam]) -> Vec<&dyn ToSql> {
    params
        .iter()
        .map(|param| match param {
            QueryParam::Text(v) => v as &dyn ToSql,
            QueryParam::Int(v) => v as &dyn ToSql,
            QueryParam::Float(v) => v as &dyn ToSql,
            QueryParam::Bool(v) => v as &dyn ToSql,
            QueryParam::DateTime(v) => v as &dyn ToSql,
        })
        .collect()
}

fn connection_error(message: String, profile: &ConnectionProfile) -> SessionError {
    SessionError::Connection(scrub(&message, &profile.password))
}

/// Errors during statement execution: engine rejections become `Execution`,
/// transport failures become `Connection`.
fn classify_run_error(err: tiberius::error::Error) -> SessionError {
    match err {
        tiberius::error::Error::Server(token) => {
            SessionError::Execution(redact_password_patterns(&token.to_string()))
        }
        other => SessionError::Connection(redact_password_patterns(&other.to_string())),
    }
}

fn scrub(message: &str, secret: &str) -> String {
    redact_secret(&redact_password_patterns(message), secret)
}

/// Decodes a tiberius row into an ordered (column, value) row. Columns are
/// addressed by index so duplicate names survive intact.
fn row_to_domain(row: &tiberius::Row) -> Row {
    let mut out = Row::new();
    let columns: Vec<(String, ColumnType)> = row
        .columns()
        .iter()
        .map(|col| (col.name().to_string(), col.column_type()))
        .collect();

    for (idx, (name, column_type)) in columns.into_iter().enumerate() {
        out.push(name, column_to_json(row, idx, column_type));
    }
    out
}

fn column_to_json(row: &tiberius::Row, idx: usize, column_type: ColumnType) -> serde_json::Value {
    match column_type {
        ColumnType::Null => serde_json::Value::Null,
        ColumnType::Bit | ColumnType::Bitn => match row.try_get::<bool, _>(idx) {
            Ok(Some(v)) => serde_json::Value::Bool(v),
            _ => serde_json::Value::Null,
        },
        ColumnType::Int1 => match row.try_get::<u8, _>(idx) {
            Ok(Some(v)) => serde_json::json!(v),
            _ => serde_json::Value::Null,
        },
        ColumnType::Int2 => match row.try_get::<i16, _>(idx) {
            Ok(Some(v)) => serde_json::json!(v),
            _ => serde_json::Value::Null,
        },
        ColumnType::Int4 => match row.try_get::<i32, _>(idx) {
            Ok(Some(v)) => serde_json::json!(v),
            _ => serde_json::Value::Null,
        },
        ColumnType::Int8 => match row.try_get::<i64, _>(idx) {
            Ok(Some(v)) => serde_json::json!(v),
            _ => serde_json::Value::Null,
        },
        ColumnType::Intn => {
            if let Ok(Some(v)) = row.try_get::<i64, _>(idx) {
                serde_json::json!(v)
            } else if let Ok(Some(v)) = row.try_get::<i32, _>(idx) {
                serde_json::json!(v)
            } else if let Ok(Some(v)) = row.try_get::<i16, _>(idx) {
                serde_json::json!(v)
            } else if let Ok(Some(v)) = row.try_get::<u8, _>(idx) {
                serde_json::json!(v)
            } else {
                serde_json::Value::Null
            }
        }
        ColumnType::Float4 => match row.try_get::<f32, _>(idx) {
            Ok(Some(v)) => serde_json::json!(v),
            _ => serde_json::Value::Null,
        },
        ColumnType::Float8 => match row.try_get::<f64, _>(idx) {
            Ok(Some(v)) => serde_json::json!(v),
            _ => serde_json::Value::Null,
        },
        ColumnType::Floatn => {
            if let Ok(Some(v)) = row.try_get::<f64, _>(idx) {
                serde_json::json!(v)
            } else if let Ok(Some(v)) = row.try_get::<f32, _>(idx) {
                serde_json::json!(v)
            } else {
                serde_json::Value::Null
            }
        }
        ColumnType::Numericn | ColumnType::Decimaln => match row.try_get::<f64, _>(idx) {
            Ok(Some(v)) => serde_json::json!(v),
            _ => match row.try_get::<&str, _>(idx) {
                Ok(Some(v)) => serde_json::Value::String(v.to_string()),
                _ => serde_json::Value::Null,
            },
        },
        ColumnType::Datetime
        | ColumnType::Datetime2
        | ColumnType::Datetimen
        | ColumnType::Datetime4 => match row.try_get::<chrono::NaiveDateTime, _>(idx) {
            Ok(Some(v)) => {
                serde_json::Value::String(v.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
            }
            _ => serde_json::Value::Null,
        },
        ColumnType::Daten => match row.try_get::<chrono::NaiveDate, _>(idx) {
            Ok(Some(v)) => serde_json::Value::String(v.to_string()),
            _ => serde_json::Value::Null,
        },
        ColumnType::Timen => match row.try_get::<chrono::NaiveTime, _>(idx) {
            Ok(Some(v)) => serde_json::Value::String(v.to_string()),
            _ => serde_json::Value::Null,
        },
        ColumnType::Guid => match row.try_get::<uuid::Uuid, _>(idx) {
            Ok(Some(v)) => serde_json::Value::String(v.to_string()),
            _ => serde_json::Value::Null,
        },
        _ => {
            // Character, text and remaining types surface as strings.
            match row.try_get::<&str, _>(idx) {
                Ok(Some(v)) => serde_json::Value::String(v.to_string()),
                _ => serde_json::Value::Null,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            id: Uuid::new_v4(),
            name: "legacy-erp".into(),
            host: "erp-db.internal".into(),
            port: 1433,
            database_name: "ERP".into(),
            username: "reporting".into(),
            password: "hunter2".into(),
            active: true,
            deleted: false,
            created_by: None,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: Utc::now(),
            deleted_by: None,
            deleted_at: None,
        }
    }

    #[test]
    fn test_target_addr() {
        assert_eq!(target_addr(&profile()), "erp-db.internal:1433");
    }

    #[test]
    fn test_bind_params_preserves_order_and_arity() {
        let when = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let params = vec![
            QueryParam::Text("abc".into()),
            QueryParam::Int(7),
            QueryParam::Float(1.5),
            QueryParam::Bool(true),
            QueryParam::DateTime(when),
        ];
        let bindings = bind_params(&params);
        assert_eq!(bindings.len(), 5);
    }

    #[test]
    fn test_build_config_rejects_out_of_range_port() {
        for port in [0, -1, 70_000] {
            let mut p = profile();
            p.port = port;
            let err = build_config(&p).unwrap_err();
            match err {
                SessionError::Connection(msg) => {
                    assert!(msg.contains("out of range"), "unexpected message: {msg}");
                }
                other => panic!("expected Connection, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_build_config_accepts_valid_port() {
        assert!(build_config(&profile()).is_ok());
    }

    #[test]
    fn test_connection_error_redacts_secret() {
        let err = connection_error(
            "login failed for hunter2 with Password=hunter2".into(),
            &profile(),
        );
        let message = err.to_string();
        assert!(!message.contains("hunter2"), "secret leaked: {message}");
    }

    #[test]
    fn test_classify_io_error_is_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify_run_error(tiberius::error::Error::from(io));
        assert!(matches!(err, SessionError::Connection(_)));
    }

    #[test]
    fn test_scrub_applies_both_layers() {
        let scrubbed = scrub("auth pwd=hunter2 rejected for hunter2", "hunter2");
        assert!(!scrubbed.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_run_after_close_fails_cleanly() {
        let mut session = TdsSession { client: None };
        let err = session.run("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, SessionError::Connection(_)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_on_empty_session() {
        let mut session = TdsSession { client: None };
        session.close().await;
        session.close().await;
    }
}
