//! Scripted backend shared by the store integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

use studioboard_client::{ApiError, ApiRequest, Method, StudioApi, Transport};
use studioboard_store::{BroadcastNotifier, Notification, Notifier};

struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    response: Result<Option<Value>, ApiError>,
}

/// Transport answering from per-route queues
///
/// Gated responses are held back until the returned sender fires, which lets
/// a test observe optimistic state while a request is in flight.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, response: Result<Option<Value>, ApiError>) {
        self.push(method, path, None, response);
    }

    pub fn respond_json(&self, method: Method, path: &str, body: Value) {
        self.respond(method, path, Ok(Some(body)));
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) {
        self.respond(method, path, Err(status_error(status, message)));
    }

    /// Queue a response released only once the returned sender fires
    pub fn respond_gated(
        &self,
        method: Method,
        path: &str,
        response: Result<Option<Value>, ApiError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Some(rx), response);
        tx
    }

    fn push(
        &self,
        method: Method,
        path: &str,
        gate: Option<oneshot::Receiver<()>>,
        response: Result<Option<Value>, ApiError>,
    ) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Scripted { gate, response });
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Wait until `count` requests have reached the transport
    pub async fn wait_for_requests(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.sent_count() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("requests never arrived");
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let key = (request.method.clone(), request.path.clone());
        self.sent.lock().unwrap().push(request);

        let scripted = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let Some(scripted) = scripted else {
            return Err(status_error(404, &format!("No route for {} {}", key.0, key.1)));
        };

        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.response
    }
}

pub fn status_error(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: message.to_string(),
    }
}

/// API client, notifier and notification feed over a scripted transport
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub api: StudioApi,
    pub notifier: Arc<dyn Notifier>,
    pub feed: broadcast::Receiver<Notification>,
}

impl Harness {
    pub fn new() -> Self {
        let transport = ScriptedTransport::new();
        let api = StudioApi::new(transport.clone());
        let broadcast = BroadcastNotifier::new(64);
        let feed = broadcast.subscribe();

        Self {
            transport,
            api,
            notifier: Arc::new(broadcast),
            feed,
        }
    }

    /// Notifications emitted since the last drain
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut received = Vec::new();
        while let Ok(notification) = self.feed.try_recv() {
            received.push(notification);
        }
        received
    }

    pub fn drain_messages(&mut self) -> Vec<String> {
        self.drain().into_iter().map(|n| n.message).collect()
    }
}

pub fn project_json(id: &str, name: &str, progress: u8) -> Value {
    json!({
        "_id": id,
        "name": name,
        "status": "In Progress",
        "progress": progress,
        "studio": "Core",
        "color": "#2563eb",
        "taskSummary": { "total": 0, "completed": 0 },
        "createdAt": "2024-05-01T08:00:00Z"
    })
}

pub fn task_json(id: &str, title: &str, status: &str, project: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "status": status,
        "project": project,
        "createdAt": "2024-05-02T08:00:00Z"
    })
}

pub fn member_json(id: &str, name: &str, tasks: usize) -> Value {
    let tasks: Vec<String> = (0..tasks).map(|i| format!("{}-t{}", id, i)).collect();
    json!({
        "_id": id,
        "name": name,
        "role": "Designer",
        "email": format!("{}@studio.test", id),
        "tasks": tasks,
        "capacity": 5,
        "createdAt": "2024-01-01T00:00:00Z"
    })
}

pub fn item_json(id: &str, name: &str, category: &str, price: f64, quantity: u32) -> Value {
    json!({
        "_id": id,
        "name": name,
        "category": category,
        "status": "Active",
        "price": price,
        "quantity": quantity,
        "createdAt": "2024-03-01T00:00:00Z"
    })
}
