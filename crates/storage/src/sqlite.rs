//! SQLite store
//!
//! One connection guarded by a mutex implements every port. Timestamps are
//! stored as fixed-width RFC 3339 strings (nanosecond precision, `Z`
//! suffix) so that text comparison orders them chronologically.
//!
//! SQLite has no NaN: observation values that are NaN are written as NULL
//! and read back as NaN.

use blocks_core::{
    Block, BlockId, ErrorObservation, ErrorStatistics, FormulaBlockParameters, OptimizationRecord,
    StoredBlock, Timestamp,
};
use blocks_ports::{
    BlockQuery, BlockReader, BlockWriter, ErrorQuery, ErrorStream, ErrorStreamWriter,
    OptimizationLog, ParameterReader, ParameterWriter, StoreError, StoreResult,
};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Row, params, params_from_iter};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS error_history (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp        TEXT NOT NULL,
    formula_id       TEXT NOT NULL,
    prediction       REAL,
    actual           REAL,
    error_absolute   REAL,
    error_relative   REAL,
    error_normalized REAL,
    volatility       REAL,
    confidence       REAL,
    method           TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_error_history_timestamp ON error_history(timestamp);
CREATE INDEX IF NOT EXISTS idx_error_history_formula ON error_history(formula_id);

CREATE TABLE IF NOT EXISTS blocks (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time       TEXT NOT NULL,
    end_time         TEXT NOT NULL,
    start_index      INTEGER NOT NULL,
    end_index        INTEGER NOT NULL,
    block_type       TEXT NOT NULL,
    confidence       REAL NOT NULL,
    mean_error       REAL NOT NULL,
    std_error        REAL NOT NULL,
    max_error        REAL NOT NULL,
    min_error        REAL NOT NULL,
    error_trend      REAL NOT NULL,
    volatility       REAL NOT NULL,
    prediction_count INTEGER NOT NULL,
    created_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_blocks_start_time ON blocks(start_time);

CREATE TABLE IF NOT EXISTS formula_block_parameters (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    formula_id        TEXT NOT NULL,
    block_id          INTEGER NOT NULL,
    market_regime     TEXT NOT NULL,
    parameters        TEXT NOT NULL,
    performance_score REAL NOT NULL,
    created_at        TEXT NOT NULL,
    UNIQUE(formula_id, block_id)
);

CREATE TABLE IF NOT EXISTS parameter_optimization (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    formula_id          TEXT NOT NULL,
    market_regime       TEXT NOT NULL,
    optimization_method TEXT NOT NULL,
    best_parameters     TEXT NOT NULL,
    score               REAL NOT NULL,
    timestamp           TEXT NOT NULL
);
"#;

const BLOCK_COLUMNS: &str = "id, start_time, end_time, start_index, end_index, block_type, \
     confidence, mean_error, std_error, max_error, min_error, error_trend, volatility, \
     prediction_count";

const ERROR_COLUMNS: &str = "timestamp, formula_id, prediction, actual, error_absolute, \
     error_relative, error_normalized, volatility, confidence, method";

/// SQLite-backed implementation of every storage port
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(unavailable)?;
        info!("[STORE] Opened SQLite store at {}", path.as_ref().display());
        Self::init(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory().map_err(unavailable)?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Schema(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn unavailable(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn ts_to_sql(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn ts_from_sql(raw: &str) -> StoreResult<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {:?}: {}", raw, e)))
}

fn usize_from_sql(value: i64, column: &str) -> StoreResult<usize> {
    usize::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} = {}", column, value)))
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn read_block(row: &Row<'_>) -> StoreResult<StoredBlock> {
    let get_f64 = |idx: usize| row.get::<_, f64>(idx).map_err(unavailable);
    let get_i64 = |idx: usize| row.get::<_, i64>(idx).map_err(unavailable);
    let get_text = |idx: usize| row.get::<_, String>(idx).map_err(unavailable);

    let block_type = get_text(5)?;
    Ok(StoredBlock::new(
        BlockId(get_i64(0)?),
        Block {
            start_time: ts_from_sql(&get_text(1)?)?,
            end_time: ts_from_sql(&get_text(2)?)?,
            start_index: usize_from_sql(get_i64(3)?, "start_index")?,
            end_index: usize_from_sql(get_i64(4)?, "end_index")?,
            block_type: block_type
                .parse()
                .map_err(|e: blocks_core::DomainError| StoreError::Corrupt(e.to_string()))?,
            confidence: get_f64(6)?,
            statistics: ErrorStatistics {
                mean_error: get_f64(7)?,
                std_error: get_f64(8)?,
                max_error: get_f64(9)?,
                min_error: get_f64(10)?,
                error_trend: get_f64(11)?,
                volatility: get_f64(12)?,
                prediction_count: usize_from_sql(get_i64(13)?, "prediction_count")?,
            },
        },
    ))
}

fn real_to_sql(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn real_from_sql(row: &Row<'_>, idx: usize) -> StoreResult<f64> {
    let value: Option<f64> = row.get(idx).map_err(unavailable)?;
    Ok(value.unwrap_or(f64::NAN))
}

fn read_observation(row: &Row<'_>) -> StoreResult<ErrorObservation> {
    Ok(ErrorObservation {
        timestamp: ts_from_sql(&row.get::<_, String>(0).map_err(unavailable)?)?,
        formula_id: row.get(1).map_err(unavailable)?,
        prediction: real_from_sql(row, 2)?,
        actual: real_from_sql(row, 3)?,
        error_absolute: real_from_sql(row, 4)?,
        error_relative: real_from_sql(row, 5)?,
        error_normalized: real_from_sql(row, 6)?,
        volatility: row.get(7).map_err(unavailable)?,
        confidence: row.get(8).map_err(unavailable)?,
        method: row.get(9).map_err(unavailable)?,
    })
}

fn read_parameters(row: &Row<'_>) -> StoreResult<FormulaBlockParameters> {
    let regime: String = row.get(2).map_err(unavailable)?;
    Ok(FormulaBlockParameters {
        formula_id: row.get(0).map_err(unavailable)?,
        block_id: BlockId(row.get(1).map_err(unavailable)?),
        market_regime: regime
            .parse()
            .map_err(|e: blocks_core::DomainError| StoreError::Corrupt(e.to_string()))?,
        parameters: from_json(&row.get::<_, String>(3).map_err(unavailable)?)?,
        performance_score: row.get(4).map_err(unavailable)?,
        created_at: ts_from_sql(&row.get::<_, String>(5).map_err(unavailable)?)?,
    })
}

fn read_optimization(row: &Row<'_>) -> StoreResult<OptimizationRecord> {
    let regime: String = row.get(1).map_err(unavailable)?;
    Ok(OptimizationRecord {
        formula_id: row.get(0).map_err(unavailable)?,
        market_regime: regime
            .parse()
            .map_err(|e: blocks_core::DomainError| StoreError::Corrupt(e.to_string()))?,
        optimization_method: row.get(2).map_err(unavailable)?,
        best_parameters: from_json(&row.get::<_, String>(3).map_err(unavailable)?)?,
        score: row.get(4).map_err(unavailable)?,
        timestamp: ts_from_sql(&row.get::<_, String>(5).map_err(unavailable)?)?,
    })
}

impl ErrorStream for SqliteStore {
    fn read_errors(&self, query: &ErrorQuery) -> StoreResult<Vec<ErrorObservation>> {
        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(start) = &query.start {
            clauses.push("timestamp >= ?");
            args.push(ts_to_sql(start));
        }
        if let Some(end) = &query.end {
            clauses.push("timestamp <= ?");
            args.push(ts_to_sql(end));
        }
        if let Some(formula_id) = &query.formula_id {
            clauses.push("formula_id = ?");
            args.push(formula_id.clone());
        }
        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = match query.limit {
            Some(limit) => format!(
                "SELECT {cols} FROM (SELECT id, {cols} FROM error_history {filter} \
                 ORDER BY timestamp DESC, id DESC LIMIT {limit}) ORDER BY timestamp ASC, id ASC",
                cols = ERROR_COLUMNS,
                filter = filter,
                limit = limit
            ),
            None => format!(
                "SELECT {} FROM error_history {} ORDER BY timestamp ASC, id ASC",
                ERROR_COLUMNS, filter
            ),
        };

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(unavailable)?;
        let mut rows = stmt.query(params_from_iter(args.iter())).map_err(unavailable)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(unavailable)? {
            out.push(read_observation(row)?);
        }
        Ok(out)
    }
}

impl ErrorStreamWriter for SqliteStore {
    fn append_errors(&self, observations: &[ErrorObservation]) -> StoreResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(unavailable)?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO error_history ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    ERROR_COLUMNS
                ))
                .map_err(unavailable)?;
            for o in observations {
                stmt.execute(params![
                    ts_to_sql(&o.timestamp),
                    o.formula_id,
                    real_to_sql(o.prediction),
                    real_to_sql(o.actual),
                    real_to_sql(o.error_absolute),
                    real_to_sql(o.error_relative),
                    real_to_sql(o.error_normalized),
                    o.volatility.and_then(real_to_sql),
                    o.confidence.and_then(real_to_sql),
                    o.method,
                ])
                .map_err(unavailable)?;
            }
        }
        tx.commit().map_err(unavailable)?;
        debug!("[STORE] Appended {} observations", observations.len());
        Ok(observations.len())
    }
}

impl BlockReader for SqliteStore {
    fn get_block(&self, id: BlockId) -> StoreResult<Option<StoredBlock>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM blocks WHERE id = ?1", BLOCK_COLUMNS))
            .map_err(unavailable)?;
        let mut rows = stmt.query(params![id.value()]).map_err(unavailable)?;
        match rows.next().map_err(unavailable)? {
            Some(row) => read_block(row).map(Some),
            None => Ok(None),
        }
    }

    fn list_blocks(&self, query: &BlockQuery) -> StoreResult<Vec<StoredBlock>> {
        let mut clauses = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(start) = &query.start_time {
            clauses.push("start_time >= ?");
            args.push(ts_to_sql(start));
        }
        if let Some(end) = &query.end_time {
            clauses.push("end_time <= ?");
            args.push(ts_to_sql(end));
        }
        if let Some(block_type) = &query.block_type {
            clauses.push("block_type = ?");
            args.push(block_type.as_str().to_string());
        }
        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM blocks {} ORDER BY start_time ASC, id ASC",
                BLOCK_COLUMNS, filter
            ))
            .map_err(unavailable)?;
        let mut rows = stmt.query(params_from_iter(args.iter())).map_err(unavailable)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(unavailable)? {
            out.push(read_block(row)?);
        }
        Ok(out)
    }

    fn latest_block(&self) -> StoreResult<Option<StoredBlock>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM blocks ORDER BY start_time DESC, id DESC LIMIT 1",
                BLOCK_COLUMNS
            ))
            .map_err(unavailable)?;
        let mut rows = stmt.query([]).map_err(unavailable)?;
        match rows.next().map_err(unavailable)? {
            Some(row) => read_block(row).map(Some),
            None => Ok(None),
        }
    }
}

impl BlockWriter for SqliteStore {
    fn save_blocks(&self, blocks: &[Block]) -> StoreResult<Vec<BlockId>> {
        let created_at = ts_to_sql(&Utc::now());
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(unavailable)?;
        let mut ids = Vec::with_capacity(blocks.len());
        for block in blocks {
            let s = &block.statistics;
            tx.execute(
                "INSERT INTO blocks (start_time, end_time, start_index, end_index, block_type, \
                 confidence, mean_error, std_error, max_error, min_error, error_trend, volatility, \
                 prediction_count, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    ts_to_sql(&block.start_time),
                    ts_to_sql(&block.end_time),
                    block.start_index as i64,
                    block.end_index as i64,
                    block.block_type.as_str(),
                    block.confidence,
                    s.mean_error,
                    s.std_error,
                    s.max_error,
                    s.min_error,
                    s.error_trend,
                    s.volatility,
                    s.prediction_count as i64,
                    created_at,
                ],
            )
            .map_err(unavailable)?;
            ids.push(BlockId(tx.last_insert_rowid()));
        }
        tx.commit().map_err(unavailable)?;
        info!("[STORE] Saved {} blocks", ids.len());
        Ok(ids)
    }
}

impl ParameterReader for SqliteStore {
    fn get_parameters(
        &self,
        formula_id: &str,
        block_id: BlockId,
    ) -> StoreResult<Option<FormulaBlockParameters>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT formula_id, block_id, market_regime, parameters, performance_score, created_at \
                 FROM formula_block_parameters WHERE formula_id = ?1 AND block_id = ?2",
            )
            .map_err(unavailable)?;
        let mut rows = stmt
            .query(params![formula_id, block_id.value()])
            .map_err(unavailable)?;
        match rows.next().map_err(unavailable)? {
            Some(row) => read_parameters(row).map(Some),
            None => Ok(None),
        }
    }

    fn list_parameters(&self, formula_id: &str) -> StoreResult<Vec<FormulaBlockParameters>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT formula_id, block_id, market_regime, parameters, performance_score, created_at \
                 FROM formula_block_parameters WHERE formula_id = ?1 ORDER BY block_id ASC",
            )
            .map_err(unavailable)?;
        let mut rows = stmt.query(params![formula_id]).map_err(unavailable)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(unavailable)? {
            out.push(read_parameters(row)?);
        }
        Ok(out)
    }
}

impl ParameterWriter for SqliteStore {
    fn upsert_parameters(&self, row: &FormulaBlockParameters) -> StoreResult<()> {
        let parameters = to_json(&row.parameters)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO formula_block_parameters \
             (formula_id, block_id, market_regime, parameters, performance_score, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.formula_id,
                row.block_id.value(),
                row.market_regime.as_str(),
                parameters,
                row.performance_score,
                ts_to_sql(&row.created_at),
            ],
        )
        .map_err(unavailable)?;
        Ok(())
    }

    fn invalidate_parameters(&self, formula_id: &str, block_id: BlockId) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let removed = conn
            .execute(
                "DELETE FROM formula_block_parameters WHERE formula_id = ?1 AND block_id = ?2",
                params![formula_id, block_id.value()],
            )
            .map_err(unavailable)?;
        Ok(removed > 0)
    }
}

impl OptimizationLog for SqliteStore {
    fn record_optimization(&self, record: &OptimizationRecord) -> StoreResult<()> {
        let best = to_json(&record.best_parameters)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO parameter_optimization \
             (formula_id, market_regime, optimization_method, best_parameters, score, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.formula_id,
                record.market_regime.as_str(),
                record.optimization_method,
                best,
                record.score,
                ts_to_sql(&record.timestamp),
            ],
        )
        .map_err(unavailable)?;
        Ok(())
    }

    fn optimization_history(&self, formula_id: &str) -> StoreResult<Vec<OptimizationRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT formula_id, market_regime, optimization_method, best_parameters, score, timestamp \
                 FROM parameter_optimization WHERE formula_id = ?1 ORDER BY id ASC",
            )
            .map_err(unavailable)?;
        let mut rows = stmt.query(params![formula_id]).map_err(unavailable)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(unavailable)? {
            out.push(read_optimization(row)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_text_orders_chronologically() {
        let a = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::nanoseconds(1);
        let c = a + chrono::Duration::seconds(1);

        assert!(ts_to_sql(&a) < ts_to_sql(&b));
        assert!(ts_to_sql(&b) < ts_to_sql(&c));
        assert_eq!(ts_from_sql(&ts_to_sql(&b)).unwrap(), b);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.conn.lock();
        conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_corrupt_timestamp() {
        assert!(matches!(ts_from_sql("yesterday"), Err(StoreError::Corrupt(_))));
    }
}
