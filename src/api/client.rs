use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    api::error::{ApiError, RequestError},
    model::{AttendanceRecord, Employee, MarkAttendance, NewEmployee},
};

/// The five calls the HR REST API exposes.
#[async_trait]
pub trait HrGateway: Send + Sync {
    async fn list_employees(&self) -> Result<Vec<Employee>, ApiError>;

    async fn create_employee(&self, payload: &NewEmployee) -> Result<Employee, ApiError>;

    async fn delete_employee(&self, id: &str) -> Result<(), ApiError>;

    /// `employee_id` filters by `Employee::id`; `None` or empty lists everything.
    async fn list_attendance(
        &self,
        employee_id: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>, ApiError>;

    async fn mark_attendance(&self, payload: &MarkAttendance)
    -> Result<AttendanceRecord, ApiError>;
}

/// reqwest-backed gateway. No retries and no timeout: failures surface immediately.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and turns any non-success status into a `RequestError`.
    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!(url = %resp.url(), status = status.as_u16(), "API response");

        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.bytes().await.unwrap_or_default();
        let err = RequestError::from_response_body(status, &body);
        warn!(status = err.status, message = %err.message, "API request failed");
        Err(err.into())
    }
}

/// `None` for 204 No Content; the body is never parsed in that case.
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<Option<T>, ApiError> {
    if resp.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let bytes = resp.bytes().await?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn require_body<T>(body: Option<T>) -> Result<T, ApiError> {
    body.ok_or(ApiError::NoContent)
}

#[async_trait]
impl HrGateway for ApiClient {
    async fn list_employees(&self) -> Result<Vec<Employee>, ApiError> {
        let resp = self.send(self.client.get(self.url("/employees"))).await?;
        Ok(read_json(resp).await?.unwrap_or_default())
    }

    async fn create_employee(&self, payload: &NewEmployee) -> Result<Employee, ApiError> {
        let req = self.client.post(self.url("/employees")).json(payload);
        let resp = self.send(req).await?;
        require_body(read_json(resp).await?)
    }

    async fn delete_employee(&self, id: &str) -> Result<(), ApiError> {
        let req = self.client.delete(self.url(&format!("/employees/{id}")));
        self.send(req).await?;
        Ok(())
    }

    async fn list_attendance(
        &self,
        employee_id: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        let mut req = self.client.get(self.url("/attendance"));
        if let Some(id) = employee_id.filter(|id| !id.is_empty()) {
            req = req.query(&[("employee_id", id)]);
        }
        let resp = self.send(req).await?;
        Ok(read_json(resp).await?.unwrap_or_default())
    }

    async fn mark_attendance(
        &self,
        payload: &MarkAttendance,
    ) -> Result<AttendanceRecord, ApiError> {
        let req = self.client.post(self.url("/attendance")).json(payload);
        let resp = self.send(req).await?;
        require_body(read_json(resp).await?)
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
