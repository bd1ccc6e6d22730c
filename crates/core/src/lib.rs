use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Per-namespace resource usage for one time bucket. All fields default to
/// zero; a namespace reported by only some metric dimensions keeps zeros in
/// the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu: f64,
    pub memory: u64,
    pub storage: u64,
    pub gpu: f64,
    pub public_ip: u64,
    pub private_ip: u64,
    pub traffic_in: u64,
    pub traffic_out: u64,
}

/// A usage record about to be inserted; the store assigns the id and the
/// initial `Success` status.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUsageRecord {
    pub namespace: String,
    pub usage: ResourceUsage,
    pub metering_time: String,
}

/// A stored usage record at any granularity level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub namespace: String,
    pub usage: ResourceUsage,
    pub metering_time: String,
    pub status: RecordStatus,
}

/// Promotion lifecycle of a record. `Success` rows are eligible for the next
/// rollup; `Merged` rows have already been aggregated into their parent level
/// and are retained as an audit trail until retention purges them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Success,
    Merged,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Merged => "Merged",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Success" => Some(Self::Success),
            "Merged" => Some(Self::Merged),
            _ => None,
        }
    }
}

/// Granularity level in the rollup hierarchy. `Raw` holds the per-minute
/// collector output; each coarser level is fed only by the level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Raw,
    Hour,
    Day,
    Month,
    Year,
}

impl Level {
    pub fn table(self) -> &'static str {
        match self {
            Self::Raw => "metering",
            Self::Hour => "metering_hour",
            Self::Day => "metering_day",
            Self::Month => "metering_month",
            Self::Year => "metering_year",
        }
    }

    /// The next-finer level, i.e. the source of this level's promotions.
    pub fn child(self) -> Option<Level> {
        match self {
            Self::Raw => None,
            Self::Hour => Some(Self::Raw),
            Self::Day => Some(Self::Hour),
            Self::Month => Some(Self::Day),
            Self::Year => Some(Self::Month),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "raw" => Some(Self::Raw),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rollup levels whose boundary condition holds at `t`, in ascending
/// granularity order. Each predicate strictly refines the previous one, so at
/// calendar boundaries several levels fire together.
pub fn due_levels(t: DateTime<Utc>) -> Vec<Level> {
    let mut due = Vec::new();
    if t.minute() == 0 {
        due.push(Level::Hour);
    }
    if t.minute() == 0 && t.hour() == 0 {
        due.push(Level::Day);
    }
    if t.minute() == 0 && t.hour() == 0 && t.day() == 1 {
        due.push(Level::Month);
    }
    if t.minute() == 0 && t.hour() == 0 && t.day() == 1 && t.ordinal() == 1 {
        due.push(Level::Year);
    }
    due
}

/// Tick timestamp floored to the minute, the raw-level bucket boundary.
pub fn minute_start(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:00Z").to_string()
}

/// Truncate toward zero to two fractional digits (cpu, gpu).
pub fn trunc2(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

/// Truncate toward zero to an integer (byte and count averages).
pub fn trunc0(value: f64) -> f64 {
    value.trunc()
}

/// Outcome of one promotion, reported per level per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionStats {
    pub level: Level,
    pub rows_inserted: usize,
    pub rows_merged: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickStatus {
    Success,
    Partial,
    Failed,
}

impl TickStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Structured status of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick_time: String,
    pub status: TickStatus,
    pub promotions: Vec<PromotionStats>,
    pub namespaces: usize,
    pub records_inserted: usize,
    pub errors: Vec<String>,
}

impl TickReport {
    pub fn new(t: DateTime<Utc>) -> Self {
        Self {
            tick_time: minute_start(t),
            status: TickStatus::Success,
            promotions: Vec::new(),
            namespaces: 0,
            records_inserted: 0,
            errors: Vec::new(),
        }
    }
}
