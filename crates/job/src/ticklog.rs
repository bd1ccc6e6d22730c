use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Datelike, Timelike, Utc};
use meter_core::{Level, NewUsageRecord, PromotionStats, TickReport, minute_start};

/// Daily tick log. Each tick opens the current day's file for append, writes
/// human-readable progress lines through a [`TickWriter`], and closes it on
/// drop. Write failures are reported and swallowed so a full disk never
/// stops metering.
#[derive(Clone)]
pub struct TickLog {
    dir: PathBuf,
}

impl TickLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(day: &str) -> String {
        format!("nsmeter-metering-{day}.log")
    }

    /// Open this tick's writer. If the file cannot be opened the writer
    /// silently discards every line.
    pub fn start(&self, t: DateTime<Utc>) -> TickWriter {
        match self.open_day_file(t) {
            Ok(file) => TickWriter { file: Some(file) },
            Err(err) => {
                tracing::warn!(error = %err, "tick log unavailable");
                TickWriter { file: None }
            }
        }
    }

    fn open_day_file(&self, t: DateTime<Utc>) -> io::Result<File> {
        fs::create_dir_all(&self.dir)?;
        let day = t.format("%Y-%m-%d").to_string();
        let path = self.dir.join(Self::file_name(&day));
        OpenOptions::new().create(true).append(true).open(path)
    }
}

/// Line-oriented writer for one tick's progress.
pub struct TickWriter {
    file: Option<File>,
}

impl TickWriter {
    pub fn header(&mut self, t: DateTime<Utc>) {
        self.write_line(format_args!(
            "=== tick {} minute={} hour={} day={} day_of_year={}",
            minute_start(t),
            t.minute(),
            t.hour(),
            t.day(),
            t.ordinal()
        ));
    }

    pub fn promotion_start(&mut self, level: Level) {
        self.write_line(format_args!("promote {level}: start"));
    }

    pub fn promotion_done(&mut self, stats: &PromotionStats) {
        self.write_line(format_args!(
            "promote {}: inserted={} merged={}",
            stats.level, stats.rows_inserted, stats.rows_merged
        ));
    }

    /// Every collected per-namespace record, one line per namespace.
    pub fn collected(&mut self, records: &[NewUsageRecord]) {
        self.write_line(format_args!("collected {} namespaces", records.len()));
        for record in records {
            let usage = &record.usage;
            self.write_line(format_args!(
                "namespace {} cpu={} memory={} storage={} gpu={} public_ip={} private_ip={} traffic_in={} traffic_out={}",
                record.namespace,
                usage.cpu,
                usage.memory,
                usage.storage,
                usage.gpu,
                usage.public_ip,
                usage.private_ip,
                usage.traffic_in,
                usage.traffic_out
            ));
        }
    }

    pub fn error(&mut self, message: &str) {
        self.write_line(format_args!("error: {message}"));
    }

    pub fn outcome(&mut self, report: &TickReport) {
        self.write_line(format_args!(
            "tick {}: namespaces={} inserted={} errors={}",
            report.status.as_str(),
            report.namespaces,
            report.records_inserted,
            report.errors.len()
        ));
    }

    fn write_line(&mut self, args: std::fmt::Arguments<'_>) {
        if let Some(file) = self.file.as_mut() {
            if let Err(err) = writeln!(file, "{args}") {
                tracing::warn!(error = %err, "tick log write failed");
                self.file = None;
            }
        }
    }
}
