pub mod attendance;
pub mod employee;

pub use attendance::{AttendanceRecord, AttendanceStatus, MarkAttendance};
pub use employee::{Employee, NewEmployee};
