use meter_core::{Level, NewUsageRecord, RecordStatus, ResourceUsage, UsageRecord, trunc2};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

/// Insert a batch of records at one level, one fresh id per row, status
/// `Success`. cpu and gpu are truncated to two fractional digits on the way
/// in; every other numeric column is already integral.
pub(crate) fn insert_records(
    conn: &Connection,
    level: Level,
    records: &[NewUsageRecord],
) -> std::result::Result<usize, rusqlite::Error> {
    let sql = format!(
        r#"
        INSERT INTO {} (
          id, namespace, cpu, memory, storage, gpu, public_ip, private_ip,
          traffic_in, traffic_out, metering_time, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        level.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    for record in records {
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            record.namespace,
            trunc2(record.usage.cpu),
            record.usage.memory as i64,
            record.usage.storage as i64,
            trunc2(record.usage.gpu),
            record.usage.public_ip as i64,
            record.usage.private_ip as i64,
            record.usage.traffic_in as i64,
            record.usage.traffic_out as i64,
            record.metering_time,
            RecordStatus::Success.as_str(),
        ])?;
    }
    Ok(records.len())
}

pub(crate) fn row_to_record(row: &Row<'_>) -> std::result::Result<UsageRecord, rusqlite::Error> {
    let status: String = row.get(11)?;
    let status = RecordStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            format!("unknown record status: {status}").into(),
        )
    })?;
    Ok(UsageRecord {
        id: row.get(0)?,
        namespace: row.get(1)?,
        usage: ResourceUsage {
            cpu: row.get(2)?,
            memory: row.get::<_, i64>(3)? as u64,
            storage: row.get::<_, i64>(4)? as u64,
            gpu: row.get(5)?,
            public_ip: row.get::<_, i64>(6)? as u64,
            private_ip: row.get::<_, i64>(7)? as u64,
            traffic_in: row.get::<_, i64>(8)? as u64,
            traffic_out: row.get::<_, i64>(9)? as u64,
        },
        metering_time: row.get(10)?,
        status,
    })
}
