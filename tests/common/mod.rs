#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use serde_json::{Value, json};

use taskdeck::error::{Error, Result};
use taskdeck::gateway::{Gateway, HttpResponse, HttpTransport, Method};
use taskdeck::session::{Session, SessionProvider};
use taskdeck::tasks::TaskClient;

/// In-memory stand-in for the task service: routes the same endpoints,
/// assigns ids and timestamps, and answers with the same JSON shapes.
pub struct FakeApi {
    tasks: RefCell<Vec<Value>>,
    next_id: Cell<i64>,
    clock: Cell<u64>,
    /// When set, every request fails at the transport level.
    pub offline: Cell<bool>,
    /// When set, the next `GET /tasks` fails, then clears itself.
    pub fail_next_list: Cell<bool>,
    /// Authorization header of the most recent request, if any.
    pub last_auth: RefCell<Option<String>>,
    pub list_calls: Cell<usize>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tasks: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            clock: Cell::new(0),
            offline: Cell::new(false),
            fail_next_list: Cell::new(false),
            last_auth: RefCell::new(None),
            list_calls: Cell::new(0),
        })
    }

    fn stamp(&self) -> String {
        self.clock.set(self.clock.get() + 1);
        format!("2026-01-01T00:00:{:02}Z", self.clock.get())
    }

    fn ok(body: Value) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn not_found() -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 404,
            body: json!({"detail": "Task not found"}).to_string(),
        })
    }

    fn handle(&self, method: Method, path: &str, body: Option<&Value>) -> Result<HttpResponse> {
        match (method, path) {
            (Method::Get, "/tasks") => {
                self.list_calls.set(self.list_calls.get() + 1);
                if self.fail_next_list.take() {
                    return Err(Error::Transport("connection reset".to_string()));
                }
                Self::ok(Value::Array(self.tasks.borrow().clone()))
            }
            (Method::Post, "/tasks") => {
                let body = body.expect("create requires a body");
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                let stamp = self.stamp();
                let task = json!({
                    "id": id,
                    "title": body["title"],
                    "description": body.get("description").cloned().unwrap_or(Value::Null),
                    "status": "PENDING",
                    "created_at": stamp,
                    "updated_at": stamp,
                });
                self.tasks.borrow_mut().push(task.clone());
                Self::ok(task)
            }
            (method, path) => self.handle_task_path(method, path, body),
        }
    }

    fn handle_task_path(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse> {
        if let Some(user_path) = path.strip_prefix("/users/") {
            if method == Method::Post && user_path.ends_with("/chat") {
                return Self::ok(json!({
                    "conversation_id": 1,
                    "content": "Done. Anything else?",
                    "tools_used": ["list_tasks"],
                }));
            }
            return Self::not_found();
        }

        let Some(rest) = path.strip_prefix("/tasks/") else {
            return Self::not_found();
        };

        let (id_part, is_toggle) = match rest.strip_suffix("/toggle") {
            Some(id) => (id, true),
            None => (rest, false),
        };
        let Ok(id) = id_part.parse::<i64>() else {
            return Self::not_found();
        };

        let mut tasks = self.tasks.borrow_mut();
        let Some(index) = tasks.iter().position(|t| t["id"] == json!(id)) else {
            return Self::not_found();
        };

        match (method, is_toggle) {
            (Method::Get, false) => Self::ok(tasks[index].clone()),
            (Method::Patch, true) => {
                let flipped = if tasks[index]["status"] == "PENDING" {
                    "COMPLETED"
                } else {
                    "PENDING"
                };
                tasks[index]["status"] = json!(flipped);
                tasks[index]["updated_at"] = json!(self.stamp());
                Self::ok(tasks[index].clone())
            }
            (Method::Patch, false) => {
                let body = body.expect("update requires a body");
                for field in ["title", "description", "status"] {
                    if let Some(value) = body.get(field) {
                        tasks[index][field] = value.clone();
                    }
                }
                tasks[index]["updated_at"] = json!(self.stamp());
                Self::ok(tasks[index].clone())
            }
            (Method::Delete, false) => {
                tasks.remove(index);
                Self::ok(json!({"ok": true}))
            }
            _ => Self::not_found(),
        }
    }
}

/// Forwarding transport so tests keep a handle on the fake for inspection.
pub struct SharedApi(pub Arc<FakeApi>);

impl HttpTransport for SharedApi {
    fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse> {
        if self.0.offline.get() {
            return Err(Error::Transport("connection refused".to_string()));
        }
        *self.0.last_auth.borrow_mut() = headers
            .iter()
            .find(|(name, _)| name == "Authorization")
            .map(|(_, value)| value.clone());
        let path = url.strip_prefix("http://fake").unwrap_or(url);
        self.0.handle(method, path, body)
    }
}

pub struct TestProvider {
    pub token: Option<String>,
    pub user_id: Option<String>,
}

impl TestProvider {
    pub fn signed_in() -> Self {
        Self {
            token: Some("test-token".to_string()),
            user_id: Some("u-1".to_string()),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            token: None,
            user_id: None,
        }
    }
}

impl SessionProvider for TestProvider {
    fn current_session(&self) -> Option<Session> {
        match (&self.token, &self.user_id) {
            (Some(_), Some(user_id)) => Some(Session {
                user_id: user_id.clone(),
            }),
            _ => None,
        }
    }

    fn get_token(&self) -> Result<String> {
        self.token
            .clone()
            .ok_or_else(|| Error::Session("no token".to_string()))
    }
}

pub fn gateway(api: Arc<FakeApi>, provider: TestProvider) -> Arc<Gateway> {
    Arc::new(Gateway::with_transport(
        "http://fake",
        Box::new(SharedApi(api)),
        Arc::new(provider),
    ))
}

pub fn task_client(api: Arc<FakeApi>) -> TaskClient {
    TaskClient::new(gateway(api, TestProvider::signed_in()))
}
