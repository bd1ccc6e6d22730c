use meter_core::{Level, NewUsageRecord, RecordStatus, ResourceUsage};
use meter_db::{Db, DbError, RecordQuery};
use tempfile::tempdir;

fn open_db(dir: &tempfile::TempDir) -> Db {
    let mut db = Db::open(dir.path().join("meter.sqlite")).expect("open db");
    db.migrate().expect("migrate");
    db
}

fn rec(namespace: &str, cpu: f64, time: &str) -> NewUsageRecord {
    NewUsageRecord {
        namespace: namespace.to_string(),
        metering_time: time.to_string(),
        usage: ResourceUsage {
            cpu,
            ..Default::default()
        },
    }
}

#[test]
fn raw_insert_truncates_cpu_to_two_digits() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(Level::Raw, &[rec("foo", 1.23456, "2024-03-15T10:00:00Z")])
        .expect("insert");

    let rows = db
        .list_records(Level::Raw, &RecordQuery::default())
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].usage.cpu, 1.23);
    assert_eq!(rows[0].status, RecordStatus::Success);
    assert!(!rows[0].id.is_empty());
}

#[test]
fn hour_promotion_averages_and_truncates() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(
        Level::Raw,
        &[
            rec("ns1", 1.0, "2024-03-15T10:00:00Z"),
            rec("ns1", 2.0, "2024-03-15T10:01:00Z"),
            rec("ns1", 4.0, "2024-03-15T10:02:00Z"),
        ],
    )
    .expect("insert");

    let stats = db.promote(Level::Hour).expect("promote");
    assert_eq!(stats.rows_inserted, 1);
    assert_eq!(stats.rows_merged, 3);

    let hours = db
        .list_records(Level::Hour, &RecordQuery::default())
        .expect("list");
    assert_eq!(hours.len(), 1);
    assert_eq!(hours[0].namespace, "ns1");
    assert_eq!(hours[0].metering_time, "2024-03-15T10:00:00Z");
    assert_eq!(hours[0].usage.cpu, 2.33);

    assert_eq!(
        db.count_records(Level::Raw, Some(RecordStatus::Merged))
            .expect("count"),
        3
    );
    assert_eq!(
        db.count_records(Level::Raw, Some(RecordStatus::Success))
            .expect("count"),
        0
    );
}

#[test]
fn second_promotion_without_new_rows_inserts_nothing() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(Level::Raw, &[rec("ns1", 1.5, "2024-03-15T10:00:00Z")])
        .expect("insert");
    db.promote(Level::Hour).expect("first promote");

    let stats = db.promote(Level::Hour).expect("second promote");
    assert_eq!(stats.rows_inserted, 0);
    assert_eq!(stats.rows_merged, 0);
    assert_eq!(db.count_records(Level::Hour, None).expect("count"), 1);
}

#[test]
fn day_promotion_groups_prior_day_hours() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    // Two hour-level records from the evening of Dec 31.
    db.insert_usage(
        Level::Hour,
        &[
            rec("ns1", 1.0, "2023-12-31T22:00:00Z"),
            rec("ns1", 3.0, "2023-12-31T23:00:00Z"),
        ],
    )
    .expect("insert");

    let stats = db.promote(Level::Day).expect("promote");
    assert_eq!(stats.rows_inserted, 1);
    assert_eq!(stats.rows_merged, 2);

    let days = db
        .list_records(Level::Day, &RecordQuery::default())
        .expect("list");
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].metering_time, "2023-12-31T00:00:00Z");
    assert_eq!(days[0].usage.cpu, 2.0);
    assert_eq!(
        db.count_records(Level::Hour, Some(RecordStatus::Merged))
            .expect("count"),
        2
    );
}

#[test]
fn merged_rows_are_excluded_from_later_promotions() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(Level::Hour, &[rec("ns1", 4.0, "2024-03-14T10:00:00Z")])
        .expect("insert");
    db.promote(Level::Day).expect("first promote");

    db.insert_usage(Level::Hour, &[rec("ns1", 8.0, "2024-03-15T10:00:00Z")])
        .expect("insert");
    let stats = db.promote(Level::Day).expect("second promote");
    assert_eq!(stats.rows_inserted, 1);

    let days = db
        .list_records(Level::Day, &RecordQuery::default())
        .expect("list");
    assert_eq!(days.len(), 2);
    // Listing is newest-first; the second promotion only saw the new row.
    assert_eq!(days[0].metering_time, "2024-03-15T00:00:00Z");
    assert_eq!(days[0].usage.cpu, 8.0);
}

#[test]
fn promotion_groups_by_bucket_and_namespace() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(
        Level::Raw,
        &[
            rec("ns1", 1.0, "2024-03-15T10:05:00Z"),
            rec("ns1", 1.0, "2024-03-15T11:05:00Z"),
            rec("ns2", 1.0, "2024-03-15T10:05:00Z"),
        ],
    )
    .expect("insert");

    let stats = db.promote(Level::Hour).expect("promote");
    assert_eq!(stats.rows_inserted, 3);
    assert_eq!(stats.rows_merged, 3);
}

#[test]
fn count_averages_floor_like_integer_division() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    let mut a = rec("ns1", 0.0, "2024-03-15T10:00:00Z");
    a.usage.public_ip = 1;
    a.usage.memory = 1000;
    let mut b = rec("ns1", 0.0, "2024-03-15T10:01:00Z");
    b.usage.public_ip = 2;
    b.usage.memory = 1001;
    db.insert_usage(Level::Raw, &[a, b]).expect("insert");

    db.promote(Level::Hour).expect("promote");
    let hours = db
        .list_records(Level::Hour, &RecordQuery::default())
        .expect("list");
    assert_eq!(hours[0].usage.public_ip, 1);
    assert_eq!(hours[0].usage.memory, 1000);
}

#[test]
fn promote_rejects_raw_level() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);
    assert!(matches!(
        db.promote(Level::Raw),
        Err(DbError::NotARollupLevel(Level::Raw))
    ));
}

#[test]
fn purge_merged_keeps_success_rows() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(
        Level::Raw,
        &[
            rec("ns1", 1.0, "2024-03-15T10:00:00Z"),
            rec("ns1", 2.0, "2024-03-15T10:01:00Z"),
        ],
    )
    .expect("insert");
    db.promote(Level::Hour).expect("promote");
    db.insert_usage(Level::Raw, &[rec("ns1", 3.0, "2024-03-15T10:02:00Z")])
        .expect("insert");

    let purged = db.purge_merged(Level::Raw).expect("purge");
    assert_eq!(purged, 2);
    assert_eq!(db.count_records(Level::Raw, None).expect("count"), 1);
    assert_eq!(
        db.count_records(Level::Raw, Some(RecordStatus::Success))
            .expect("count"),
        1
    );
}

#[test]
fn full_chain_promotes_raw_to_year() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(Level::Raw, &[rec("ns1", 2.5, "2023-06-15T10:30:00Z")])
        .expect("insert");
    db.promote(Level::Hour).expect("hour");
    db.promote(Level::Day).expect("day");
    db.promote(Level::Month).expect("month");
    db.promote(Level::Year).expect("year");

    let years = db
        .list_records(Level::Year, &RecordQuery::default())
        .expect("list");
    assert_eq!(years.len(), 1);
    assert_eq!(years[0].metering_time, "2023-01-01T00:00:00Z");
    assert_eq!(years[0].usage.cpu, 2.5);
    assert_eq!(years[0].status, RecordStatus::Success);
}

#[test]
fn list_records_filters_by_namespace_and_range() {
    let dir = tempdir().expect("tempdir");
    let mut db = open_db(&dir);

    db.insert_usage(
        Level::Raw,
        &[
            rec("ns1", 1.0, "2024-03-15T10:00:00Z"),
            rec("ns2", 2.0, "2024-03-15T10:00:00Z"),
            rec("ns1", 3.0, "2024-03-15T11:00:00Z"),
        ],
    )
    .expect("insert");

    let rows = db
        .list_records(
            Level::Raw,
            &RecordQuery {
                namespace: Some("ns1"),
                start: Some("2024-03-15T10:00:00Z"),
                end: Some("2024-03-15T11:00:00Z"),
                ..Default::default()
            },
        )
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].namespace, "ns1");
    assert_eq!(rows[0].usage.cpu, 1.0);
}
