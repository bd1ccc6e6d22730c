use meter_core::{Level, NewUsageRecord, RecordStatus, UsageRecord};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::Db;
use crate::error::Result;
use crate::helpers::{insert_records, row_to_record};

/// Filters for a record listing. `start` is inclusive, `end` exclusive, both
/// compared against the stored bucket timestamps.
#[derive(Debug, Clone, Copy)]
pub struct RecordQuery<'a> {
    pub namespace: Option<&'a str>,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for RecordQuery<'_> {
    fn default() -> Self {
        Self {
            namespace: None,
            start: None,
            end: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl Db {
    /// Insert one batch of records at `level` in a single transaction. Every
    /// row gets a fresh id and status `Success`.
    pub fn insert_usage(&mut self, level: Level, records: &[NewUsageRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let inserted = insert_records(&tx, level, records)?;
        tx.commit()?;
        Ok(inserted)
    }

    pub fn list_records(&self, level: Level, query: &RecordQuery<'_>) -> Result<Vec<UsageRecord>> {
        let mut sql = format!(
            r#"
            SELECT id, namespace, cpu, memory, storage, gpu, public_ip, private_ip,
                   traffic_in, traffic_out, metering_time, status
            FROM {}
            WHERE 1 = 1
            "#,
            level.table()
        );
        let mut values: Vec<Value> = Vec::new();
        if let Some(namespace) = query.namespace {
            sql.push_str(" AND namespace = ?");
            values.push(Value::Text(namespace.to_string()));
        }
        if let Some(start) = query.start {
            sql.push_str(" AND metering_time >= ?");
            values.push(Value::Text(start.to_string()));
        }
        if let Some(end) = query.end {
            sql.push_str(" AND metering_time < ?");
            values.push(Value::Text(end.to_string()));
        }
        sql.push_str(" ORDER BY metering_time DESC, namespace ASC LIMIT ? OFFSET ?");
        values.push(Value::Integer(query.limit as i64));
        values.push(Value::Integer(query.offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), row_to_record)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn count_records(&self, level: Level, status: Option<RecordStatus>) -> Result<u64> {
        let count: i64 = match status {
            Some(status) => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE status = ?1", level.table()),
                [status.as_str()],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", level.table()),
                [],
                |row| row.get(0),
            )?,
        };
        Ok(count.max(0) as u64)
    }
}
