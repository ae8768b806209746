use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveTime, Weekday as ChronoWeekday};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::AppError;
use crate::models::class::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }

    /// The school day for a calendar weekday; weekends have none.
    pub fn from_chrono(day: ChronoWeekday) -> Option<Weekday> {
        match day {
            ChronoWeekday::Mon => Some(Weekday::Monday),
            ChronoWeekday::Tue => Some(Weekday::Tuesday),
            ChronoWeekday::Wed => Some(Weekday::Wednesday),
            ChronoWeekday::Thu => Some(Weekday::Thursday),
            ChronoWeekday::Fri => Some(Weekday::Friday),
            ChronoWeekday::Sat | ChronoWeekday::Sun => None,
        }
    }

    /// Today, or Monday over the weekend.
    pub fn today() -> Weekday {
        Weekday::from_chrono(Local::now().weekday()).unwrap_or(Weekday::Monday)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Weekday {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown day: {s}")))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SlotRow {
    id: i64,
    start_time: String,
    end_time: String,
    subject: Subject,
    class_name: String,
    room: String,
    teacher: String,
}

/// One period in a student's day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: i64,
    pub subject: String,
    pub class_name: String,
    pub time_slot: String,
    pub teacher: String,
    pub room: String,
    pub is_ongoing: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlot {
    pub weekday: Weekday,
    pub start_time: String,
    pub end_time: String,
}

impl NewSlot {
    /// Start and end of the period; the end must come after the start.
    pub fn times(&self) -> Result<(NaiveTime, NaiveTime), AppError> {
        let start = parse_time(&self.start_time)?;
        let end = parse_time(&self.end_time)?;
        if end <= start {
            return Err(AppError::BadRequest(
                "A period must end after it starts".to_string(),
            ));
        }
        Ok((start, end))
    }
}

/// Weekly meeting patterns offered when a class is created from the portal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingDays {
    #[default]
    Daily,
    MonWedFri,
    TueThu,
}

impl MeetingDays {
    pub const ALL: [MeetingDays; 3] = [MeetingDays::Daily, MeetingDays::MonWedFri, MeetingDays::TueThu];

    pub fn key(self) -> &'static str {
        match self {
            MeetingDays::Daily => "daily",
            MeetingDays::MonWedFri => "mon-wed-fri",
            MeetingDays::TueThu => "tue-thu",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MeetingDays::Daily => "Mon-Fri",
            MeetingDays::MonWedFri => "Mon/Wed/Fri",
            MeetingDays::TueThu => "Tue/Thu",
        }
    }

    pub fn weekdays(self) -> &'static [Weekday] {
        match self {
            MeetingDays::Daily => &Weekday::ALL,
            MeetingDays::MonWedFri => &[Weekday::Monday, Weekday::Wednesday, Weekday::Friday],
            MeetingDays::TueThu => &[Weekday::Tuesday, Weekday::Thursday],
        }
    }

    /// One period per meeting day, all at the same time.
    pub fn slots(self, start_time: &str, end_time: &str) -> Vec<NewSlot> {
        self.weekdays()
            .iter()
            .map(|&weekday| NewSlot {
                weekday,
                start_time: start_time.trim().to_string(),
                end_time: end_time.trim().to_string(),
            })
            .collect()
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::BadRequest(format!("Invalid time {value:?}, expected HH:MM")))
}

/// Whether `now` falls inside `[start, end)`. Unparseable times never match.
pub fn is_ongoing(start: &str, end: &str, now: NaiveTime) -> bool {
    match (parse_time(start), parse_time(end)) {
        (Ok(start), Ok(end)) => start <= now && now < end,
        _ => false,
    }
}

/// Display form of a slot, e.g. `08:00 - 08:50`.
pub fn time_slot(start: &str, end: &str) -> String {
    format!("{start} - {end}")
}

pub async fn add_slot<'e, E>(executor: E, class_id: i64, slot: &NewSlot) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let (start, end) = slot.times()?;
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO schedule_slots (class_id, weekday, start_time, end_time) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(class_id)
    .bind(slot.weekday)
    .bind(start.format("%H:%M").to_string())
    .bind(end.format("%H:%M").to_string())
    .fetch_one(executor)
    .await?;
    Ok(id)
}

/// A student's periods on `day`, in time order. `now` marks the ongoing
/// period when it falls on the same weekday.
pub async fn for_student(
    pool: &SqlitePool,
    student_id: i64,
    day: Weekday,
    now: DateTime<Local>,
) -> Result<Vec<Period>, AppError> {
    let rows = sqlx::query_as::<_, SlotRow>(
        "SELECT s.id, s.start_time, s.end_time, c.subject, c.name AS class_name, c.room, \
         (t.first_name || ' ' || t.last_name) AS teacher \
         FROM schedule_slots s \
         JOIN classes c ON c.id = s.class_id \
         JOIN enrollments e ON e.class_id = c.id \
         JOIN users t ON t.id = c.teacher_id \
         WHERE e.student_id = ? AND s.weekday = ? \
         ORDER BY s.start_time",
    )
    .bind(student_id)
    .bind(day)
    .fetch_all(pool)
    .await?;

    let same_day = Weekday::from_chrono(now.weekday()) == Some(day);
    let clock = now.time();
    Ok(rows
        .into_iter()
        .map(|row| Period {
            id: row.id,
            subject: row.subject.label().to_string(),
            class_name: row.class_name,
            time_slot: time_slot(&row.start_time, &row.end_time),
            teacher: row.teacher,
            room: row.room,
            is_ongoing: same_day && is_ongoing(&row.start_time, &row.end_time, clock),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn ongoing_is_half_open() {
        assert!(is_ongoing("08:00", "08:50", at(8, 0)));
        assert!(is_ongoing("08:00", "08:50", at(8, 49)));
        assert!(!is_ongoing("08:00", "08:50", at(8, 50)));
        assert!(!is_ongoing("08:00", "08:50", at(7, 59)));
        assert!(!is_ongoing("8am", "08:50", at(8, 10)));
    }

    #[test]
    fn weekends_have_no_school_day() {
        assert_eq!(Weekday::from_chrono(ChronoWeekday::Sat), None);
        assert_eq!(
            Weekday::from_chrono(ChronoWeekday::Wed),
            Some(Weekday::Wednesday)
        );
        assert_eq!("Friday".parse::<Weekday>().unwrap(), Weekday::Friday);
        assert!("sunday".parse::<Weekday>().is_err());
    }

    #[test]
    fn meeting_patterns_expand_to_slots() {
        let slots = MeetingDays::TueThu.slots(" 13:00", "13:45 ");
        let days: Vec<Weekday> = slots.iter().map(|s| s.weekday).collect();
        assert_eq!(days, [Weekday::Tuesday, Weekday::Thursday]);
        assert_eq!(slots[0].times().unwrap(), (at(13, 0), at(13, 45)));
        assert_eq!(MeetingDays::Daily.slots("08:00", "08:50").len(), 5);
    }

    #[test]
    fn slots_must_end_after_they_start() {
        let slot = |start: &str, end: &str| NewSlot {
            weekday: Weekday::Monday,
            start_time: start.to_string(),
            end_time: end.to_string(),
        };
        assert!(slot("09:00", "09:00").times().is_err());
        assert!(slot("10:00", "09:00").times().is_err());
        assert!(slot("9am", "10:00").times().is_err());
        assert!(slot("09:00", "09:50").times().is_ok());
    }

    #[test]
    fn formats_time_slot() {
        assert_eq!(time_slot("09:00", "09:50"), "09:00 - 09:50");
    }
}
