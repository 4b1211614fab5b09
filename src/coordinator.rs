use std::{
    any::Any,
    cell::{Ref, RefCell},
    collections::HashMap,
    future::Future,
    panic::AssertUnwindSafe,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use derive_more::Display;
use futures::{FutureExt, future::try_join};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    api::{ApiError, HrGateway},
    model::{Employee, MarkAttendance, NewEmployee},
    store::{DailyStats, EntityStore},
};

pub const FALLBACK_ERROR: &str = "Something went wrong. Please try again.";
const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(2800);

/// A logical action bucket with its own busy/error state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Slot {
    #[display(fmt = "create-employee")]
    CreateEmployee,
    #[display(fmt = "delete-{}", _0)]
    DeleteEmployee(String),
    #[display(fmt = "mark-attendance")]
    MarkAttendance,
}

/// Success and Failed are resting states: the slot is idle again, the outcome is kept
/// until the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotState {
    pub status: SlotStatus,
    pub error: Option<String>,
}

impl SlotState {
    pub fn is_busy(&self) -> bool {
        self.status == SlotStatus::Pending
    }
}

/// State of the initial combined load, distinct from per-slot errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    raised_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

/// Runs gateway calls and reconciles the store with their results.
///
/// Meant for a single-threaded executor: different slots may interleave at await points,
/// but no `RefCell` borrow is held across one. Calling the same slot twice concurrently
/// is the caller's mistake; the UI disables the trigger while the slot is busy.
pub struct Coordinator<G> {
    gateway: G,
    store: RefCell<EntityStore>,
    slots: RefCell<HashMap<Slot, SlotState>>,
    page: RefCell<PageState>,
    notice: RefCell<Option<Notice>>,
    notice_ttl: Duration,
}

impl<G: HrGateway> Coordinator<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            store: RefCell::new(EntityStore::new()),
            slots: RefCell::new(HashMap::new()),
            page: RefCell::new(PageState::default()),
            notice: RefCell::new(None),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Do not hold the returned borrow across an await.
    pub fn store(&self) -> Ref<'_, EntityStore> {
        self.store.borrow()
    }

    pub fn daily_stats(&self, today: NaiveDate) -> DailyStats {
        self.store.borrow().daily_stats(today)
    }

    pub fn page(&self) -> PageState {
        self.page.borrow().clone()
    }

    pub fn slot(&self, slot: &Slot) -> SlotState {
        self.slots.borrow().get(slot).cloned().unwrap_or_default()
    }

    pub fn is_busy(&self, slot: &Slot) -> bool {
        self.slot(slot).is_busy()
    }

    pub fn slot_error(&self, slot: &Slot) -> Option<String> {
        self.slot(slot).error
    }

    /// Id of the employee whose delete is in flight, if any.
    pub fn deleting_id(&self) -> Option<String> {
        self.slots.borrow().iter().find_map(|(slot, state)| match slot {
            Slot::DeleteEmployee(id) if state.is_busy() => Some(id.clone()),
            _ => None,
        })
    }

    pub fn active_notice(&self) -> Option<String> {
        self.active_notice_at(Instant::now())
    }

    pub fn active_notice_at(&self, now: Instant) -> Option<String> {
        let notice = self.notice.borrow();
        notice
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.raised_at) < self.notice_ttl)
            .map(|n| n.message.clone())
    }

    pub fn dismiss_notice(&self) {
        self.notice.borrow_mut().take();
    }

    /// Fetches employees and attendance together. Either failing fails the whole load
    /// and leaves the store untouched.
    pub async fn load(&self) -> Result<(), ActionError> {
        *self.page.borrow_mut() = PageState {
            loading: true,
            error: None,
        };
        let _loading = LoadingGuard { page: &self.page };

        let both = try_join(
            self.gateway.list_employees(),
            self.gateway.list_attendance(None),
        );
        match settle(both).await {
            Ok((employees, attendance)) => {
                info!(
                    employees = employees.len(),
                    attendance = attendance.len(),
                    "Workspace loaded"
                );
                self.store.borrow_mut().replace_all(employees, attendance);
                Ok(())
            }
            Err(message) => {
                warn!(error = %message, "Workspace load failed");
                self.page.borrow_mut().error = Some(message.clone());
                Err(ActionError { message })
            }
        }
    }

    pub async fn create_employee(&self, payload: NewEmployee) -> Result<Employee, ActionError> {
        let slot = Slot::CreateEmployee;
        let created = self
            .run(&slot, self.gateway.create_employee(&payload))
            .await?;
        self.store.borrow_mut().insert_employee(created.clone());
        self.raise_notice("Employee added successfully");
        Ok(created)
    }

    pub async fn delete_employee(&self, id: &str) -> Result<(), ActionError> {
        let slot = Slot::DeleteEmployee(id.to_string());
        self.run(&slot, self.gateway.delete_employee(id)).await?;
        self.store.borrow_mut().remove_employee(id);
        // Nothing left to show for a finished delete.
        self.slots.borrow_mut().remove(&slot);
        self.raise_notice("Employee deleted");
        Ok(())
    }

    pub async fn mark_attendance(&self, payload: MarkAttendance) -> Result<(), ActionError> {
        let slot = Slot::MarkAttendance;
        let saved = self
            .run(&slot, self.gateway.mark_attendance(&payload))
            .await?;
        self.store.borrow_mut().upsert_attendance(saved);
        self.raise_notice("Attendance recorded successfully");
        Ok(())
    }

    /// Drives one slot through Pending and records the outcome on it.
    async fn run<T, F>(&self, slot: &Slot, call: F) -> Result<T, ActionError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        self.set_slot(slot, SlotStatus::Pending, None);
        let _pending = PendingGuard {
            slots: &self.slots,
            slot,
        };
        debug!(%slot, "Action started");

        match settle(call).await {
            Ok(value) => {
                self.set_slot(slot, SlotStatus::Success, None);
                info!(%slot, "Action succeeded");
                Ok(value)
            }
            Err(message) => {
                warn!(%slot, error = %message, "Action failed");
                self.set_slot(slot, SlotStatus::Failed, Some(message.clone()));
                Err(ActionError { message })
            }
        }
    }

    fn set_slot(&self, slot: &Slot, status: SlotStatus, error: Option<String>) {
        self.slots
            .borrow_mut()
            .insert(slot.clone(), SlotState { status, error });
    }

    fn raise_notice(&self, message: &str) {
        *self.notice.borrow_mut() = Some(Notice {
            message: message.to_string(),
            raised_at: Instant::now(),
        });
    }
}

/// Awaits a gateway call, turning errors and panics into a displayable message.
async fn settle<T, F>(call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(message_from_error(&e)),
        Err(panic) => Err(message_from_panic(panic.as_ref())),
    }
}

pub fn message_from_error(err: &ApiError) -> String {
    let message = err.to_string();
    if message.is_empty() {
        FALLBACK_ERROR.to_string()
    } else {
        message
    }
}

/// String payloads are shown as-is; anything else gets the generic message.
pub fn message_from_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        FALLBACK_ERROR.to_string()
    }
}

/// Clears a slot still marked Pending when its future is dropped mid-flight.
struct PendingGuard<'a> {
    slots: &'a RefCell<HashMap<Slot, SlotState>>,
    slot: &'a Slot,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut slots) = self.slots.try_borrow_mut() {
            if let Some(state) = slots.get_mut(self.slot) {
                if state.status == SlotStatus::Pending {
                    state.status = SlotStatus::Idle;
                }
            }
        }
    }
}

struct LoadingGuard<'a> {
    page: &'a RefCell<PageState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut page) = self.page.try_borrow_mut() {
            page.loading = false;
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
