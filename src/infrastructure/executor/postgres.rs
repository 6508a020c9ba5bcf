//! Read-only statement execution against PostgreSQL

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{PgPool, PgRow, PgTypeKind};
use sqlx::{Column, Executor, Postgres, Row, Statement, TypeInfo};
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::query::{ExecutionError, Interval, QueryExecutor, QueryResult, SqlValue};
use crate::domain::sql::validate_read_only;

/// Fractional digits of `money` under the default `lc_monetary`
const MONEY_SCALE: u32 = 2;

/// Executes one statement per call inside a read-only transaction that is
/// always rolled back
#[derive(Clone)]
pub struct PostgresQueryExecutor {
    pool: PgPool,
    timeout: Duration,
}

impl Debug for PostgresQueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresQueryExecutor")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PostgresQueryExecutor {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// SQLSTATE raised when `statement_timeout` cancels a statement
const QUERY_CANCELED: &str = "57014";

fn database_error(e: sqlx::Error) -> ExecutionError {
    ExecutionError::Database(e.to_string())
}

fn statement_error(e: sqlx::Error, timeout: Duration) -> ExecutionError {
    match e {
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
            ExecutionError::Timeout(timeout)
        }
        other => database_error(other),
    }
}

fn cell<T>(row: &PgRow, idx: usize, wrap: impl FnOnce(T) -> SqlValue) -> Result<SqlValue, ExecutionError>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    Ok(row
        .try_get::<Option<T>, _>(idx)
        .map_err(database_error)?
        .map_or(SqlValue::Null, wrap))
}

fn array<T>(row: &PgRow, idx: usize, wrap: impl Fn(T) -> SqlValue) -> Result<SqlValue, ExecutionError>
where
    Vec<Option<T>>: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    cell::<Vec<Option<T>>>(row, idx, |items| {
        SqlValue::Array(
            items
                .into_iter()
                .map(|item| item.map_or(SqlValue::Null, &wrap))
                .collect(),
        )
    })
}

fn interval(value: PgInterval) -> SqlValue {
    SqlValue::Interval(Interval {
        months: value.months,
        days: value.days,
        microseconds: value.microseconds,
    })
}

/// Decode one cell by its PostgreSQL type
fn decode_cell(row: &PgRow, idx: usize) -> Result<SqlValue, ExecutionError> {
    let column = &row.columns()[idx];
    let type_info = column.type_info();

    match type_info.name() {
        "BOOL" => cell::<bool>(row, idx, SqlValue::Bool),
        "INT2" => cell::<i16>(row, idx, |v| SqlValue::Int(v.into())),
        "INT4" => cell::<i32>(row, idx, |v| SqlValue::Int(v.into())),
        "INT8" => cell::<i64>(row, idx, SqlValue::Int),
        "OID" => cell::<Oid>(row, idx, |v| SqlValue::Int(v.0.into())),
        "FLOAT4" => cell::<f32>(row, idx, |v| SqlValue::Float(v.into())),
        "FLOAT8" => cell::<f64>(row, idx, SqlValue::Float),
        "NUMERIC" => cell::<Decimal>(row, idx, SqlValue::Numeric),
        "MONEY" => cell::<PgMoney>(row, idx, |v| SqlValue::Numeric(v.to_decimal(MONEY_SCALE))),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" => {
            cell::<String>(row, idx, SqlValue::Text)
        }
        "BYTEA" => cell::<Vec<u8>>(row, idx, SqlValue::Bytes),
        "DATE" => cell::<NaiveDate>(row, idx, SqlValue::Date),
        "TIME" => cell::<NaiveTime>(row, idx, SqlValue::Time),
        "TIMETZ" => cell::<PgTimeTz<NaiveTime, FixedOffset>>(row, idx, |v| {
            SqlValue::Text(format!("{}{}", v.time, v.offset))
        }),
        "TIMESTAMP" => cell::<NaiveDateTime>(row, idx, SqlValue::Timestamp),
        "TIMESTAMPTZ" => cell::<DateTime<Utc>>(row, idx, SqlValue::TimestampTz),
        "INTERVAL" => cell::<PgInterval>(row, idx, interval),
        "UUID" => cell::<Uuid>(row, idx, SqlValue::Uuid),
        "JSON" | "JSONB" => cell::<Value>(row, idx, SqlValue::Json),
        "VOID" => Ok(SqlValue::Null),
        "BOOL[]" => array::<bool>(row, idx, SqlValue::Bool),
        "INT2[]" => array::<i16>(row, idx, |v| SqlValue::Int(v.into())),
        "INT4[]" => array::<i32>(row, idx, |v| SqlValue::Int(v.into())),
        "INT8[]" => array::<i64>(row, idx, SqlValue::Int),
        "FLOAT4[]" => array::<f32>(row, idx, |v| SqlValue::Float(v.into())),
        "FLOAT8[]" => array::<f64>(row, idx, SqlValue::Float),
        "NUMERIC[]" => array::<Decimal>(row, idx, SqlValue::Numeric),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "CHAR[]" | "NAME[]" => {
            array::<String>(row, idx, SqlValue::Text)
        }
        "DATE[]" => array::<NaiveDate>(row, idx, SqlValue::Date),
        "TIMESTAMP[]" => array::<NaiveDateTime>(row, idx, SqlValue::Timestamp),
        "TIMESTAMPTZ[]" => array::<DateTime<Utc>>(row, idx, SqlValue::TimestampTz),
        "UUID[]" => array::<Uuid>(row, idx, SqlValue::Uuid),
        // Enum labels travel as text in both wire formats
        _ if matches!(type_info.kind(), PgTypeKind::Enum(_)) => Ok(row
            .try_get_unchecked::<Option<String>, _>(idx)
            .map_err(database_error)?
            .map_or(SqlValue::Null, SqlValue::Text)),
        other => Err(ExecutionError::UnsupportedType {
            column: column.name().to_string(),
            type_name: other.to_string(),
        }),
    }
}

fn decode_row(row: &PgRow) -> Result<Vec<SqlValue>, ExecutionError> {
    (0..row.columns().len())
        .map(|idx| decode_cell(row, idx))
        .collect()
}

#[async_trait]
impl QueryExecutor for PostgresQueryExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult, ExecutionError> {
        validate_read_only(sql)?;

        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        let statement = (&mut *tx).prepare(sql).await.map_err(|e| {
            error!(error = %e, "Failed to prepare statement");
            statement_error(e, self.timeout)
        })?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = tokio::time::timeout(self.timeout, sqlx::query(sql).fetch_all(&mut *tx))
            .await
            .map_err(|_| ExecutionError::Timeout(self.timeout))?
            .map_err(|e| {
                error!(error = %e, "Statement failed");
                statement_error(e, self.timeout)
            })?;

        let rows = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| error!(error = %e, "Failed to decode result row"))?;

        tx.rollback().await.map_err(database_error)?;

        debug!(rows = rows.len(), columns = columns.len(), "Statement executed");
        Ok(QueryResult::new(columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sql::SqlRejection;
    use sqlx::postgres::PgPoolOptions;
    use std::str::FromStr;

    /// Live database used by the execution tests; they are skipped when unset
    const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

    fn executor() -> PostgresQueryExecutor {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/ledger")
            .unwrap();
        PostgresQueryExecutor::new(pool, Duration::from_secs(10))
    }

    async fn live_pool() -> Option<PgPool> {
        let Ok(url) = std::env::var(TEST_DATABASE_URL) else {
            eprintln!("{} not set, skipping", TEST_DATABASE_URL);
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        Some(pool)
    }

    async fn live_executor(timeout: Duration) -> Option<PostgresQueryExecutor> {
        live_pool()
            .await
            .map(|pool| PostgresQueryExecutor::new(pool, timeout))
    }

    #[tokio::test]
    async fn test_rejects_write_before_touching_database() {
        let result = executor().execute("DROP TABLE nasabah").await;

        assert!(matches!(
            result,
            Err(ExecutionError::Rejected(SqlRejection::NotReadOnly))
        ));
    }

    #[tokio::test]
    async fn test_rejects_forbidden_keyword() {
        let result = executor()
            .execute("SELECT 1; DELETE FROM rekening")
            .await;

        assert!(matches!(
            result,
            Err(ExecutionError::Rejected(SqlRejection::ForbiddenKeyword(_)))
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_statement() {
        let result = executor().execute("   ").await;
        assert!(matches!(result, Err(ExecutionError::Rejected(SqlRejection::Empty))));
    }

    #[test]
    fn test_other_statement_errors_stay_database_errors() {
        let err = statement_error(sqlx::Error::PoolTimedOut, Duration::from_secs(1));
        assert!(matches!(err, ExecutionError::Database(_)));
    }

    #[tokio::test]
    async fn test_read_only_transaction_refuses_sequence_write() {
        let Some(pool) = live_pool().await else { return };
        sqlx::query("CREATE SEQUENCE IF NOT EXISTS ledger_executor_seq")
            .execute(&pool)
            .await
            .unwrap();
        let executor = PostgresQueryExecutor::new(pool, Duration::from_secs(5));

        let result = executor
            .execute("SELECT nextval('ledger_executor_seq') AS next_id")
            .await;

        match result {
            Err(ExecutionError::Database(message)) => assert!(message.contains("read-only")),
            other => panic!("expected read-only refusal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_only_transaction_refuses_select_into() {
        let Some(executor) = live_executor(Duration::from_secs(5)).await else { return };

        let result = executor
            .execute("SELECT 1 AS jumlah INTO ledger_executor_copy")
            .await;

        assert!(matches!(result, Err(ExecutionError::Database(_))));
    }

    #[tokio::test]
    async fn test_slow_statement_times_out() {
        let Some(executor) = live_executor(Duration::from_secs(1)).await else { return };

        let result = executor.execute("SELECT pg_sleep(3)").await;

        assert!(matches!(result, Err(ExecutionError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_empty_result_keeps_column_names() {
        let Some(executor) = live_executor(Duration::from_secs(5)).await else { return };

        let result = executor
            .execute("SELECT 1 AS jumlah, 'Budi'::text AS nama WHERE false")
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["jumlah", "nama"]);
        assert_eq!(result.row_count(), 0);
    }

    #[tokio::test]
    async fn test_decodes_scalar_types() {
        let Some(executor) = live_executor(Duration::from_secs(5)).await else { return };

        let result = executor
            .execute(
                "SELECT 42::int4 AS i, 1500000.50::numeric AS saldo, 'Budi'::varchar AS nama, \
                 true AS aktif, NULL::text AS catatan, DATE '2024-01-31' AS tanggal",
            )
            .await
            .unwrap();

        assert_eq!(
            result.rows[0],
            vec![
                SqlValue::Int(42),
                SqlValue::Numeric(Decimal::from_str("1500000.50").unwrap()),
                SqlValue::Text("Budi".to_string()),
                SqlValue::Bool(true),
                SqlValue::Null,
                SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            ]
        );
    }

    #[tokio::test]
    async fn test_decodes_binary_encoded_types() {
        let Some(executor) = live_executor(Duration::from_secs(5)).await else { return };

        let result = executor
            .execute(
                "SELECT interval '3 days' AS iv, ARRAY[1,2,3] AS arr, \
                 ARRAY['a', NULL]::text[] AS labels, 42::money AS m, \
                 '\\x0aff'::bytea AS raw, 26::oid AS o, '10:00:00+07'::timetz AS t",
            )
            .await
            .unwrap();

        assert_eq!(
            result.rows[0],
            vec![
                SqlValue::Interval(Interval {
                    months: 0,
                    days: 3,
                    microseconds: 0
                }),
                SqlValue::Array(vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]),
                SqlValue::Array(vec![SqlValue::Text("a".to_string()), SqlValue::Null]),
                SqlValue::Numeric(Decimal::new(4200, 2)),
                SqlValue::Bytes(vec![0x0a, 0xff]),
                SqlValue::Int(26),
                SqlValue::Text("10:00:00+07:00".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_interval_from_timestamp_subtraction() {
        let Some(executor) = live_executor(Duration::from_secs(5)).await else { return };

        let result = executor
            .execute("SELECT TIMESTAMP '2024-01-02 00:00' - TIMESTAMP '2024-01-01 12:00' AS selisih")
            .await
            .unwrap();

        assert_eq!(
            result.rows[0][0],
            SqlValue::Interval(Interval {
                months: 0,
                days: 0,
                microseconds: 12 * 3600 * 1_000_000
            })
        );
    }

    #[tokio::test]
    async fn test_decodes_enum_as_text() {
        let Some(pool) = live_pool().await else { return };
        sqlx::query(
            "DO $$ BEGIN CREATE TYPE ledger_status_rekening AS ENUM ('aktif', 'tutup'); \
             EXCEPTION WHEN duplicate_object THEN NULL; END $$",
        )
        .execute(&pool)
        .await
        .unwrap();
        let executor = PostgresQueryExecutor::new(pool, Duration::from_secs(5));

        let result = executor
            .execute("SELECT 'aktif'::ledger_status_rekening AS status")
            .await
            .unwrap();

        assert_eq!(result.rows[0][0], SqlValue::Text("aktif".to_string()));
    }

    #[tokio::test]
    async fn test_unsupported_type_is_an_error() {
        let Some(executor) = live_executor(Duration::from_secs(5)).await else { return };

        let result = executor.execute("SELECT '10.0.0.1'::inet AS ip").await;

        match result {
            Err(ExecutionError::UnsupportedType { column, type_name }) => {
                assert_eq!(column, "ip");
                assert_eq!(type_name, "INET");
            }
            other => panic!("expected unsupported type, got {:?}", other),
        }
    }
}
