pub mod api;
pub mod config;
pub mod coordinator;
pub mod form;
pub mod model;
pub mod store;

pub use api::{ApiClient, ApiError, HrGateway, RequestError};
pub use config::Config;
pub use coordinator::{Coordinator, PageState, Slot, SlotState, SlotStatus};
pub use store::{DailyStats, EntityStore};
