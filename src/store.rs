use chrono::{NaiveDate, Utc};
use moka::sync::Cache;

use crate::model::{
    AttendanceRecord, AttendanceStatus, Employee, attendance::day_prefix,
};

const UNKNOWN_EMPLOYEE: &str = "Unknown";

/// Aggregates shown in the stats strip.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyStats {
    pub total_employees: usize,
    pub present: usize,
    pub absent: usize,
    /// Present share of today's records, 0..=100.
    pub rate: f64,
    /// Day of the most recent attendance record.
    pub last_updated: Option<String>,
}

/// In-memory employees and attendance. Employees keep insertion order;
/// attendance is kept sorted by date, most recent first.
pub struct EntityStore {
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRecord>,
    version: u64,
    stats: Cache<(u64, NaiveDate), DailyStats>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self {
            employees: Vec::new(),
            attendance: Vec::new(),
            version: 0,
            stats: Cache::builder().max_capacity(8).build(),
        }
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    /// Bumped on every mutation; derived views are cached against it.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// Swaps in a freshly loaded snapshot.
    pub fn replace_all(&mut self, employees: Vec<Employee>, mut attendance: Vec<AttendanceRecord>) {
        sort_attendance(&mut attendance);
        self.employees = employees;
        self.attendance = attendance;
        self.touch();
    }

    pub fn insert_employee(&mut self, employee: Employee) {
        self.employees.push(employee);
        self.touch();
    }

    /// Removes the employee and every attendance record that references it.
    pub fn remove_employee(&mut self, id: &str) {
        self.employees.retain(|e| e.id != id);
        self.attendance.retain(|a| a.employee_id != id);
        self.touch();
    }

    /// Replaces any record for the same (employee, day) pair, then re-sorts.
    pub fn upsert_attendance(&mut self, record: AttendanceRecord) {
        self.attendance
            .retain(|a| !(a.employee_id == record.employee_id && a.day() == record.day()));
        self.attendance.push(record);
        sort_attendance(&mut self.attendance);
        self.touch();
    }

    pub fn count_by_status(&self, status: AttendanceStatus, today: NaiveDate) -> usize {
        count_by_status(&self.attendance, status, today)
    }

    pub fn attendance_rate(&self, today: NaiveDate) -> f64 {
        attendance_rate(
            self.count_by_status(AttendanceStatus::Present, today),
            self.count_by_status(AttendanceStatus::Absent, today),
        )
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.attendance.first().map(|r| r.day())
    }

    /// Name to show for a record: the employee's, the record's own copy, or "Unknown".
    pub fn display_name<'a>(&'a self, record: &'a AttendanceRecord) -> &'a str {
        self.employee(&record.employee_id)
            .map(|e| e.full_name.as_str())
            .or(record.employee_name.as_deref())
            .unwrap_or(UNKNOWN_EMPLOYEE)
    }

    pub fn daily_stats(&self, today: NaiveDate) -> DailyStats {
        self.stats.get_with((self.version, today), || {
            let present = self.count_by_status(AttendanceStatus::Present, today);
            let absent = self.count_by_status(AttendanceStatus::Absent, today);
            DailyStats {
                total_employees: self.employees.len(),
                present,
                absent,
                rate: attendance_rate(present, absent),
                last_updated: self.last_updated().map(str::to_string),
            }
        })
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

/// Today's calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn count_by_status(
    records: &[AttendanceRecord],
    status: AttendanceStatus,
    today: NaiveDate,
) -> usize {
    let today = today.format("%Y-%m-%d").to_string();
    records
        .iter()
        .filter(|r| r.status == status && day_prefix(&r.date) == today)
        .count()
}

/// Percentage of present over present + absent; 0 when there is nothing to count.
pub fn attendance_rate(present: usize, absent: usize) -> f64 {
    let total = present + absent;
    if total == 0 {
        return 0.0;
    }
    present as f64 / total as f64 * 100.0
}

pub fn sort_attendance(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            id: id.into(),
            employee_id: format!("EMP-{id}"),
            full_name: name.into(),
            email: format!("{id}@company.com"),
            department: "Engineering".into(),
            created_at: None,
        }
    }

    fn record(id: &str, employee_id: &str, date: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: id.into(),
            employee_id: employee_id.into(),
            status,
            date: date.into(),
            employee_name: None,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn assert_sorted(store: &EntityStore) {
        for pair in store.attendance().windows(2) {
            assert!(pair[0].date >= pair[1].date, "{:?} before {:?}", pair[0].date, pair[1].date);
        }
    }

    #[test]
    fn upsert_replaces_same_employee_and_day() {
        let mut store = EntityStore::new();
        store.upsert_attendance(record("a1", "e1", "2026-10-18", AttendanceStatus::Present));
        store.upsert_attendance(record("a2", "e1", "2026-10-18", AttendanceStatus::Absent));

        let matching: Vec<_> = store
            .attendance()
            .iter()
            .filter(|r| r.employee_id == "e1" && r.day() == "2026-10-18")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].status, AttendanceStatus::Absent);
    }

    #[test]
    fn upsert_matches_on_calendar_day_even_with_time_part() {
        let mut store = EntityStore::new();
        store.upsert_attendance(record("a1", "e1", "2026-10-18T00:00:00", AttendanceStatus::Present));
        store.upsert_attendance(record("a1", "e1", "2026-10-18", AttendanceStatus::Absent));
        assert_eq!(store.attendance().len(), 1);
    }

    #[test]
    fn attendance_stays_sorted_after_every_mutation() {
        let mut store = EntityStore::new();
        store.replace_all(
            vec![employee("e1", "Ann"), employee("e2", "Bo")],
            vec![
                record("a1", "e1", "2026-10-01", AttendanceStatus::Present),
                record("a2", "e2", "2026-10-15", AttendanceStatus::Absent),
                record("a3", "e1", "2026-09-30", AttendanceStatus::Present),
            ],
        );
        assert_sorted(&store);

        for (i, date) in ["2026-10-20", "2026-01-01", "2026-10-15", "2026-12-31"].iter().enumerate() {
            store.upsert_attendance(record(&format!("n{i}"), "e1", date, AttendanceStatus::Present));
            assert_sorted(&store);
        }

        store.remove_employee("e2");
        assert_sorted(&store);
        assert_eq!(store.last_updated(), Some("2026-12-31"));
    }

    #[test]
    fn removing_employee_cascades_to_attendance() {
        let mut store = EntityStore::new();
        store.replace_all(
            vec![employee("e1", "Ann"), employee("e2", "Bo")],
            vec![
                record("a1", "e1", "2026-10-01", AttendanceStatus::Present),
                record("a2", "e2", "2026-10-01", AttendanceStatus::Absent),
                record("a3", "e1", "2026-10-02", AttendanceStatus::Absent),
            ],
        );

        store.remove_employee("e1");

        assert_eq!(store.employees().len(), 1);
        assert!(store.attendance().iter().all(|r| r.employee_id != "e1"));
        assert_eq!(store.attendance().len(), 1);
    }

    #[test]
    fn counts_only_todays_records() {
        let mut store = EntityStore::new();
        store.replace_all(
            vec![],
            vec![
                record("a1", "e1", "2026-10-18", AttendanceStatus::Present),
                record("a2", "e2", "2026-10-18T00:00:00", AttendanceStatus::Present),
                record("a3", "e3", "2026-10-18", AttendanceStatus::Absent),
                record("a4", "e1", "2026-10-17", AttendanceStatus::Absent),
            ],
        );

        let today = day("2026-10-18");
        assert_eq!(store.count_by_status(AttendanceStatus::Present, today), 2);
        assert_eq!(store.count_by_status(AttendanceStatus::Absent, today), 1);
        let rate = store.attendance_rate(today);
        assert!((rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn rate_is_zero_without_todays_records() {
        let store = EntityStore::new();
        assert_eq!(store.attendance_rate(day("2026-10-18")), 0.0);
        assert_eq!(attendance_rate(0, 0), 0.0);
        assert_eq!(attendance_rate(3, 0), 100.0);
        assert_eq!(attendance_rate(0, 4), 0.0);
    }

    #[test]
    fn last_updated_is_none_when_empty() {
        assert_eq!(EntityStore::new().last_updated(), None);
    }

    #[test]
    fn daily_stats_follow_store_version() {
        let today = day("2026-10-18");
        let mut store = EntityStore::new();
        store.insert_employee(employee("e1", "Ann"));
        let before = store.daily_stats(today);
        assert_eq!(before.total_employees, 1);
        assert_eq!(before.present, 0);

        store.upsert_attendance(record("a1", "e1", "2026-10-18", AttendanceStatus::Present));
        let after = store.daily_stats(today);
        assert_eq!(after.present, 1);
        assert_eq!(after.rate, 100.0);
        assert_eq!(after.last_updated.as_deref(), Some("2026-10-18"));
        assert_eq!(store.daily_stats(today), after);
    }

    #[test]
    fn display_name_falls_back_to_record_then_unknown() {
        let mut store = EntityStore::new();
        store.insert_employee(employee("e1", "Ann"));

        let known = record("a1", "e1", "2026-10-18", AttendanceStatus::Present);
        let mut orphan = record("a2", "gone", "2026-10-18", AttendanceStatus::Present);
        assert_eq!(store.display_name(&known), "Ann");
        assert_eq!(store.display_name(&orphan), "Unknown");

        orphan.employee_name = Some("Former Staff".into());
        assert_eq!(store.display_name(&orphan), "Former Staff");
    }
}
