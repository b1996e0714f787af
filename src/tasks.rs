use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::gateway::Gateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    /// Parse the CLI spelling (`pending`, `completed`), case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(TaskStatus::Pending),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// A task as the server reports it. The id and timestamps are
/// server-assigned; status only ever changes through an update or toggle
/// call, never locally. Timestamps are optional because older server
/// revisions omit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update; absent fields are not serialized and stay untouched
/// server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub ok: bool,
}

/// Typed operations over the task endpoints, one thin call each. Gateway
/// errors propagate unchanged; callers own the user-visible mapping.
pub struct TaskClient {
    gateway: Arc<Gateway>,
}

impl TaskClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn list(&self) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = decode(self.gateway.get("/tasks")?)?;
        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    pub fn get(&self, id: i64) -> Result<Task> {
        decode(self.gateway.get(&format!("/tasks/{id}"))?)
    }

    pub fn create(&self, task: &NewTask) -> Result<Task> {
        let body = serde_json::to_value(task).map_err(|e| Error::Decode(e.to_string()))?;
        decode(self.gateway.post("/tasks", &body)?)
    }

    pub fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        let body = serde_json::to_value(patch).map_err(|e| Error::Decode(e.to_string()))?;
        decode(self.gateway.patch(&format!("/tasks/{id}"), Some(&body))?)
    }

    pub fn delete(&self, id: i64) -> Result<DeleteAck> {
        match self.gateway.delete(&format!("/tasks/{id}"))? {
            Some(value) => decode(Some(value)),
            // A bare 204 is still a successful delete.
            None => Ok(DeleteAck { ok: true }),
        }
    }

    pub fn toggle(&self, id: i64) -> Result<Task> {
        decode(self.gateway.patch(&format!("/tasks/{id}/toggle"), None)?)
    }
}

fn decode<T: DeserializeOwned>(value: Option<serde_json::Value>) -> Result<T> {
    let value = value.ok_or_else(|| Error::Decode("empty response body".to_string()))?;
    serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
}
