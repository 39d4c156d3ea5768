//! In-process HTTP cut service speaking the same JSON as the real one.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

#[derive(Default)]
struct ServiceState {
    next_job: u64,
    jobs: HashMap<String, String>,
    submissions: Vec<Value>,
    polls: HashMap<String, usize>,
    /// Status codes returned by the next submits, in order.
    submit_failures: Vec<u16>,
}

type Shared = Arc<Mutex<ServiceState>>;

pub struct FakeCutService {
    pub base_url: String,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeCutService {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServiceState::default()));
        let router = Router::new()
            .route("/api/v1/cutmedia", post(submit))
            .route("/api/v1/status/:job_id", get(status))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake cut service");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake cut service");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            server,
        }
    }

    /// Makes the next submits fail with the given statuses, in order.
    pub fn fail_next_submits(&self, statuses: &[u16]) {
        self.state.lock().unwrap().submit_failures = statuses.to_vec();
    }

    /// Sets the state reported for a job.
    pub fn set_state(&self, job_id: &str, state: &str) {
        self.state
            .lock()
            .unwrap()
            .jobs
            .insert(job_id.to_string(), state.to_string());
    }

    /// Sets the state reported for every known job.
    pub fn set_all(&self, state: &str) {
        let mut guard = self.state.lock().unwrap();
        for value in guard.jobs.values_mut() {
            *value = state.to_string();
        }
    }

    /// Bodies of every accepted or rejected submit, in arrival order.
    pub fn submissions(&self) -> Vec<Value> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn polls(&self, job_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .polls
            .get(job_id)
            .copied()
            .unwrap_or(0)
    }
}

impl Drop for FakeCutService {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn submit(State(state): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let mut guard = state.lock().unwrap();
    guard.submissions.push(body);

    if !guard.submit_failures.is_empty() {
        let code = guard.submit_failures.remove(0);
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "error": "injected failure" })));
    }

    guard.next_job += 1;
    let job_id = format!("job-{}", guard.next_job);
    guard.jobs.insert(job_id.clone(), "PENDING".to_string());
    (
        StatusCode::OK,
        Json(json!({ "state": "PENDING", "job_id": job_id })),
    )
}

async fn status(State(state): State<Shared>, Path(job_id): Path<String>) -> impl IntoResponse {
    let mut guard = state.lock().unwrap();
    *guard.polls.entry(job_id.clone()).or_insert(0) += 1;

    match guard.jobs.get(&job_id) {
        Some(job_state) => (StatusCode::OK, Json(json!({ "state": job_state }))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown job" })),
        ),
    }
}
