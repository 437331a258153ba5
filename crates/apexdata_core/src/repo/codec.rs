//! Column encoding shared by the SQLite repositories.
//!
//! Ids are UUID text, timestamps RFC 3339 with microseconds, dates
//! `YYYY-MM-DD` and times `HH:MM:SS`.

use super::{RepoError, RepoResult};
use crate::model::lifecycle::{Clock, RecordId};
use chrono::{
    DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, Timelike, Utc,
};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

pub(crate) fn parse_id(value: &str, column: &'static str) -> RepoResult<RecordId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Reads `clock` at the precision timestamps are stored with.
pub(crate) fn stamp(clock: &dyn Clock) -> DateTime<Utc> {
    clock.now().trunc_subsecs(6)
}

/// Next `updated_at` for a record last touched at `previous`. Never earlier
/// than one storable tick after `previous`, whatever the clock reports.
pub(crate) fn restamp(clock: &dyn Clock, previous: DateTime<Utc>) -> DateTime<Utc> {
    stamp(clock).max(previous + Duration::microseconds(1))
}

pub(crate) fn parse_timestamp(value: &str, column: &'static str) -> RepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

pub(crate) fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn format_time(value: &NaiveTime) -> String {
    value.format(TIME_FORMAT).to_string()
}

/// Drops sub-second precision so the returned record matches storage.
pub(crate) fn whole_seconds(value: NaiveTime) -> NaiveTime {
    value.with_nanosecond(0).unwrap_or(value)
}

pub(crate) fn parse_time(value: &str, column: &'static str) -> RepoResult<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid time `{value}` in {column}")))
}

/// Returns whether a row with surrogate `id` exists in `table`.
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: RecordId) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1;"),
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Counts results and qualifying entries pointing at `id` through `column`.
pub(crate) fn count_participations(
    conn: &Connection,
    column: &'static str,
    id: RecordId,
) -> RepoResult<i64> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT
                (SELECT COUNT(*) FROM results WHERE {column} = ?1)
              + (SELECT COUNT(*) FROM qualifying WHERE {column} = ?1);"
        ),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::{
        format_date, format_time, format_timestamp, parse_date, parse_time, parse_timestamp,
        restamp,
    };
    use crate::model::lifecycle::Clock;
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn timestamp_text_keeps_microseconds_and_utc_suffix() {
        let value =
            Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap() + Duration::microseconds(42);
        let text = format_timestamp(&value);
        assert_eq!(text, "2024-03-02T15:00:00.000042Z");
        assert_eq!(parse_timestamp(&text, "created_at").unwrap(), value);
    }

    #[test]
    fn date_and_time_use_iso_shapes() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let time = NaiveTime::from_hms_opt(15, 0, 0).unwrap();
        assert_eq!(format_date(&date), "2024-03-02");
        assert_eq!(format_time(&time), "15:00:00");
        assert!(parse_date("02/03/2024", "date").is_err());
        assert_eq!(parse_time("15:00:00", "time").unwrap(), time);
    }

    #[test]
    fn restamp_moves_forward_even_when_clock_does_not() {
        let previous = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();

        let stalled = restamp(&FixedClock(previous), previous);
        assert_eq!(stalled, previous + Duration::microseconds(1));

        let rewound = restamp(&FixedClock(previous - Duration::hours(1)), previous);
        assert_eq!(rewound, previous + Duration::microseconds(1));

        let later = previous + Duration::seconds(5);
        assert_eq!(restamp(&FixedClock(later), previous), later);
    }
}
