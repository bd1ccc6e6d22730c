use chrono::{DateTime, Utc};
use collector::{FetchError, MetricsClient};
use meter_core::{Level, NewUsageRecord, TickReport, TickStatus, due_levels, minute_start};
use meter_db::Db;

use crate::config::MeterConfig;
use crate::ticklog::TickLog;

/// Run one metering tick at `now`.
///
/// Order matters: rollups first, so a boundary tick promotes only buckets
/// that closed before it, then retention, then collection of the current
/// minute. Promotions run finest-to-coarsest and stop at the first failure;
/// a failed level would otherwise starve its parent of input. Every failure
/// is captured in the report rather than returned, the tick always ends.
pub fn run_tick(
    db: &mut Db,
    client: &MetricsClient,
    config: &MeterConfig,
    log: &TickLog,
    now: DateTime<Utc>,
) -> TickReport {
    let mut report = TickReport::new(now);
    let mut log = log.start(now);
    log.header(now);
    let mut fetch_failed = false;

    for level in due_levels(now) {
        log.promotion_start(level);
        match db.promote(level) {
            Ok(stats) => {
                tracing::info!(
                    level = %level,
                    inserted = stats.rows_inserted,
                    merged = stats.rows_merged,
                    "rollup promoted"
                );
                log.promotion_done(&stats);
                report.promotions.push(stats);
            }
            Err(err) => {
                tracing::error!(level = %level, error = %err, "promotion failed");
                let message = format!("promote {level}: {err}");
                log.error(&message);
                report.errors.push(message);
                break;
            }
        }
    }

    for &level in &config.purge_merged {
        match db.purge_merged(level) {
            Ok(purged) if purged > 0 => {
                tracing::debug!(level = %level, purged, "merged rows purged");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(level = %level, error = %err, "retention purge failed");
                let message = format!("purge {level}: {err}");
                log.error(&message);
                report.errors.push(message);
            }
        }
    }

    match client.collect() {
        Ok(merged) => {
            let bucket = minute_start(now);
            let records: Vec<NewUsageRecord> = merged
                .into_iter()
                .map(|(namespace, usage)| NewUsageRecord {
                    namespace,
                    usage,
                    metering_time: bucket.clone(),
                })
                .collect();
            log.collected(&records);
            report.namespaces = records.len();
            match db.insert_usage(Level::Raw, &records) {
                Ok(inserted) => report.records_inserted = inserted,
                Err(err) => {
                    tracing::error!(error = %err, "raw usage insert failed");
                    let message = format!("insert raw: {err}");
                    log.error(&message);
                    report.errors.push(message);
                }
            }
        }
        Err(err @ FetchError::Unreachable { .. }) => {
            tracing::error!(error = %err, "usage collection failed");
            let message = err.to_string();
            log.error(&message);
            report.errors.push(message);
            fetch_failed = true;
        }
    }

    report.status = if fetch_failed {
        TickStatus::Failed
    } else if report.errors.is_empty() {
        TickStatus::Success
    } else {
        TickStatus::Partial
    };
    log.outcome(&report);
    report
}
