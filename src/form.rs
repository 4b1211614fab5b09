//! Client-side checks that run before anything reaches the network.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{
    api::HrGateway,
    coordinator::{ActionError, Coordinator, Slot},
    model::{AttendanceStatus, MarkAttendance, NewEmployee},
    store::today,
};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Select an employee to mark attendance.")]
    NoEmployeeSelected,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Action(#[from] ActionError),
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Trims every field and checks the payload is complete.
pub fn validate_new_employee(draft: &NewEmployee) -> Result<NewEmployee, ValidationError> {
    let trimmed = NewEmployee {
        employee_id: draft.employee_id.trim().to_string(),
        full_name: draft.full_name.trim().to_string(),
        email: draft.email.trim().to_string(),
        department: draft.department.trim().to_string(),
    };

    // An empty email alone is reported as an invalid address.
    if trimmed.employee_id.is_empty()
        || trimmed.full_name.is_empty()
        || trimmed.department.is_empty()
    {
        return Err(ValidationError::MissingFields);
    }
    if !is_valid_email(&trimmed.email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(trimmed)
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeForm {
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
    local_error: Option<ValidationError>,
}

impl EmployeeForm {
    pub fn new(
        employee_id: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            full_name: full_name.into(),
            email: email.into(),
            department: department.into(),
            local_error: None,
        }
    }

    pub fn local_error(&self) -> Option<ValidationError> {
        self.local_error
    }

    /// Local validation message first, then whatever the create slot reported.
    pub fn message<G: HrGateway>(&self, coordinator: &Coordinator<G>) -> Option<String> {
        self.local_error
            .map(|e| e.to_string())
            .or_else(|| coordinator.slot_error(&Slot::CreateEmployee))
    }

    fn draft(&self) -> NewEmployee {
        NewEmployee {
            employee_id: self.employee_id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
        }
    }

    /// Validates, hands the payload to the coordinator, then resets the fields.
    /// A validation failure never reaches the coordinator.
    pub async fn submit<G: HrGateway>(
        &mut self,
        coordinator: &Coordinator<G>,
    ) -> Result<(), SubmitError> {
        self.local_error = None;
        let payload = validate_new_employee(&self.draft()).inspect_err(|e| {
            self.local_error = Some(*e);
        })?;

        let result = coordinator.create_employee(payload).await;
        self.employee_id.clear();
        self.full_name.clear();
        self.email.clear();
        self.department.clear();
        result.map(|_| ()).map_err(SubmitError::from)
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceForm {
    /// `Employee::id` of the selected employee; empty means nothing selected.
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    local_error: Option<ValidationError>,
}

impl Default for AttendanceForm {
    fn default() -> Self {
        Self::for_day(today())
    }
}

impl AttendanceForm {
    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            employee_id: String::new(),
            date,
            status: AttendanceStatus::Present,
            local_error: None,
        }
    }

    pub fn local_error(&self) -> Option<ValidationError> {
        self.local_error
    }

    pub fn message<G: HrGateway>(&self, coordinator: &Coordinator<G>) -> Option<String> {
        self.local_error
            .map(|e| e.to_string())
            .or_else(|| coordinator.slot_error(&Slot::MarkAttendance))
    }

    pub async fn submit<G: HrGateway>(
        &mut self,
        coordinator: &Coordinator<G>,
    ) -> Result<(), SubmitError> {
        self.local_error = None;
        if self.employee_id.is_empty() {
            self.local_error = Some(ValidationError::NoEmployeeSelected);
            return Err(ValidationError::NoEmployeeSelected.into());
        }

        let payload = MarkAttendance {
            employee_id: self.employee_id.clone(),
            date: self.date,
            status: self.status,
        };
        coordinator.mark_attendance(payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str, name: &str, email: &str, dept: &str) -> NewEmployee {
        NewEmployee {
            employee_id: id.into(),
            full_name: name.into(),
            email: email.into(),
            department: dept.into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("jane@company.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("jane@company"));
        assert!(!is_valid_email("jane company@x.io"));
        assert!(!is_valid_email("@company.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn blank_fields_are_rejected_before_email_check() {
        assert_eq!(
            validate_new_employee(&draft("EMP-1", "  ", "not-an-email", "Ops")),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_new_employee(&draft("", "", "", "")),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn empty_email_alone_is_an_invalid_address() {
        assert_eq!(
            validate_new_employee(&draft("EMP-1", "Jane", "", "Ops")),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_new_employee(&draft("EMP-1", "Jane", "   ", "Ops")),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn bad_email_message() {
        let err = validate_new_employee(&draft("EMP-1", "Jane", "jane@", "Ops")).unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address.");
    }

    #[test]
    fn valid_draft_is_trimmed() {
        let ok = validate_new_employee(&draft(" EMP-1 ", " Jane Doe", "jane@company.com ", "Ops "))
            .expect("valid");
        assert_eq!(ok, draft("EMP-1", "Jane Doe", "jane@company.com", "Ops"));
    }

    #[test]
    fn attendance_form_defaults_to_present() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let form = AttendanceForm::for_day(day);
        assert_eq!(form.status, AttendanceStatus::Present);
        assert_eq!(form.date, day);
        assert!(form.employee_id.is_empty());
    }
}
