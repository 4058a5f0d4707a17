//! Timetable from per-course CSV files
//!
//! Layout of `<dir>/<course>.csv`:
//!
//! ```text
//! day,time,group1,group2,...
//! понедельник,9:00,Матанализ;Лекция;Иванов И.И.;101;Очно,
//! ```
//!
//! The group column is picked by the last digit of the group label, so
//! "б03-0103" reads `group3`.

use super::{ScheduleSlot, ScheduleSource, ServiceError};
use async_trait::async_trait;
use std::path::PathBuf;

const DAY_COLUMN: usize = 0;
const TIME_COLUMN: usize = 1;
const FIRST_GROUP_COLUMN: usize = 2;

#[derive(Debug, Clone)]
pub struct CsvSchedule {
    dir: PathBuf,
}

impl CsvSchedule {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Column of a group inside the course file
fn group_column(group: &str) -> Result<usize, ServiceError> {
    group
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .map(|n| FIRST_GROUP_COLUMN + n - 1)
        .ok_or_else(|| ServiceError::parse(format!("Cannot derive a schedule column from group {group:?}")))
}

fn parse_day(raw: &str, column: usize, day: &str) -> Result<Vec<ScheduleSlot>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut slots = Vec::new();
    for record in reader.records() {
        let record = record?;
        if !record.get(DAY_COLUMN).is_some_and(|d| d.to_lowercase() == day) {
            continue;
        }
        let time = record.get(TIME_COLUMN).unwrap_or_default().to_string();
        let cell = record.get(column).filter(|c| !c.is_empty()).map(str::to_string);
        slots.push(ScheduleSlot { time, cell });
    }

    if slots.is_empty() {
        return Err(ServiceError::empty(format!("No rows for {day}")));
    }
    Ok(slots)
}

#[async_trait]
impl ScheduleSource for CsvSchedule {
    async fn day(&self, course: &str, group: &str, day: &str) -> Result<Vec<ScheduleSlot>, ServiceError> {
        let column = group_column(group)?;
        let path = self.dir.join(format!("{course}.csv"));
        let raw = tokio::fs::read_to_string(&path).await?;
        parse_day(&raw, column, day)
    }
}
