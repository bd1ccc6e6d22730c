use meter_core::{Level, NewUsageRecord, PromotionStats, ResourceUsage, trunc0, trunc2};

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::insert_records;

/// SQL expression computing the boundary-truncated bucket timestamp for a
/// parent level from a child row's `metering_time`.
fn bucket_expr(level: Level) -> Option<&'static str> {
    match level {
        Level::Hour => Some("strftime('%Y-%m-%dT%H:00:00Z', metering_time)"),
        Level::Day => Some("strftime('%Y-%m-%dT00:00:00Z', metering_time)"),
        Level::Month => Some("strftime('%Y-%m-01T00:00:00Z', metering_time)"),
        Level::Year => Some("strftime('%Y-01-01T00:00:00Z', metering_time)"),
        Level::Raw => None,
    }
}

impl Db {
    /// Promote the child level's `Success` rows into `level`.
    ///
    /// One transaction wraps the whole read-aggregate-insert-mark sequence,
    /// so a crash can never leave parent rows without the matching child
    /// status update. Rows marked `Merged` here are excluded from the next
    /// promotion's grouping read, which makes promotion idempotent.
    pub fn promote(&mut self, level: Level) -> Result<PromotionStats> {
        let (child, bucket) = match (level.child(), bucket_expr(level)) {
            (Some(child), Some(bucket)) => (child, bucket),
            _ => return Err(DbError::NotARollupLevel(level)),
        };

        let tx = self.conn.transaction()?;
        let groups = {
            let sql = format!(
                r#"
                SELECT namespace,
                       {bucket} AS bucket_start,
                       SUM(cpu) * 1.0 / COUNT(*),
                       SUM(memory) * 1.0 / COUNT(*),
                       SUM(storage) * 1.0 / COUNT(*),
                       SUM(gpu) * 1.0 / COUNT(*),
                       SUM(public_ip) * 1.0 / COUNT(*),
                       SUM(private_ip) * 1.0 / COUNT(*),
                       SUM(traffic_in) * 1.0 / COUNT(*),
                       SUM(traffic_out) * 1.0 / COUNT(*)
                FROM {child}
                WHERE status = 'Success'
                GROUP BY bucket_start, namespace
                ORDER BY bucket_start, namespace
                "#,
                child = child.table(),
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(NewUsageRecord {
                    namespace: row.get(0)?,
                    metering_time: row.get(1)?,
                    usage: ResourceUsage {
                        cpu: trunc2(row.get(2)?),
                        memory: trunc0(row.get(3)?) as u64,
                        storage: trunc0(row.get(4)?) as u64,
                        gpu: trunc2(row.get(5)?),
                        // Count averages keep integer-division semantics:
                        // floor toward zero, never round up.
                        public_ip: row.get::<_, f64>(6)? as u64,
                        private_ip: row.get::<_, f64>(7)? as u64,
                        traffic_in: trunc0(row.get(8)?) as u64,
                        traffic_out: trunc0(row.get(9)?) as u64,
                    },
                })
            })?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        let rows_inserted = insert_records(&tx, level, &groups)?;
        // Bulk mark with the same predicate the grouping read used, not a
        // narrower per-group filter.
        let rows_merged = tx.execute(
            &format!(
                "UPDATE {} SET status = 'Merged' WHERE status = 'Success'",
                child.table()
            ),
            [],
        )?;
        tx.commit()?;

        Ok(PromotionStats {
            level,
            rows_inserted,
            rows_merged,
        })
    }
}
