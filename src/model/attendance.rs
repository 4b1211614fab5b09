use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    /// References `Employee::id`, not the business code.
    pub employee_id: String,
    pub status: AttendanceStatus,
    /// ISO date, possibly with a time part ("2026-10-18" or "2026-10-18T00:00:00").
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
}

impl AttendanceRecord {
    /// The calendar-day part of `date`, ignoring any time of day.
    pub fn day(&self) -> &str {
        day_prefix(&self.date)
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.day(), "%Y-%m-%d").ok()
    }
}

/// Body of `POST /attendance`; the server upserts by (employeeId, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub employee_id: String,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

pub(crate) fn day_prefix(date: &str) -> &str {
    date.get(..10).unwrap_or(date)
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(super::day_prefix(&raw), FORMAT).map_err(D::Error::custom)
    }
}
