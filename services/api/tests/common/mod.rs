//! Shared fixtures for the API integration tests: in-memory ports and a router builder.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{self, state::AppState};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request as HttpRequest, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use protolab_core::catalog::LoadedCatalog;
use protolab_core::domain::{
    AuthContext, Catalog, CatalogItem, ItemClass, NewRequest, Profile, ReplySubmission, Request,
    RequestDetails, RequestStatus, RequestType, User, UserCredentials,
};
use protolab_core::ports::{AccountService, PortError, PortResult, RequestStore};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "admin-session";
pub const USER_TOKEN: &str = "user-session";
pub const USER_PASSWORD: &str = "correct horse";

//=========================================================================================
// In-memory RequestStore
//=========================================================================================

#[derive(Default)]
pub struct InMemoryRequests {
    pub rows: Mutex<Vec<Request>>,
    pub replies: Mutex<Vec<ReplySubmission>>,
    pub fetches: Mutex<usize>,
    pub fail_submit: AtomicBool,
}

impl InMemoryRequests {
    pub fn fail_next_submits(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RequestStore for InMemoryRequests {
    async fn get_all_requests(&self) -> PortResult<Vec<Request>> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_request_details(
        &self,
        request_type: RequestType,
        request_id: Uuid,
    ) -> PortResult<RequestDetails> {
        let request = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == request_id && r.request_type == request_type)
            .cloned()
            .ok_or_else(|| PortError::NotFound(request_id.to_string()))?;
        let mut fields = BTreeMap::new();
        fields.insert("budget".to_string(), "5000".to_string());
        Ok(RequestDetails {
            request,
            fields,
            replies: Vec::new(),
        })
    }

    async fn submit_admin_reply(&self, reply: ReplySubmission) -> PortResult<()> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("network unreachable".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == reply.request_id)
            .ok_or_else(|| PortError::NotFound(reply.request_id.to_string()))?;
        row.status = reply.new_status;
        row.admin_notes = Some(reply.reply_message.clone());
        row.updated_at = Utc::now();
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }

    async fn create_request(&self, request: NewRequest) -> PortResult<Request> {
        let now = Utc::now();
        let created = Request {
            id: Uuid::new_v4(),
            request_type: request.request_type,
            user_id: request.user_id,
            user_email: "maker@example.in".into(),
            user_name: "Maker".into(),
            created_at: now,
            updated_at: now,
            status: RequestStatus::Pending,
            summary: request.summary,
            admin_notes: None,
        };
        self.rows.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

//=========================================================================================
// In-memory AccountService
//=========================================================================================

pub struct InMemoryAccounts {
    pub credentials: UserCredentials,
    pub sessions: Mutex<HashMap<String, AuthContext>>,
}

pub fn user_context(is_admin: bool) -> AuthContext {
    AuthContext {
        user: User {
            user_id: Uuid::new_v4(),
            email: if is_admin { "admin@example.in" } else { "maker@example.in" }.into(),
        },
        profile: Some(Profile {
            full_name: if is_admin { "Admin" } else { "Maker" }.into(),
            is_admin,
        }),
    }
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        let admin = user_context(true);
        let user = user_context(false);
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = Argon2::default()
            .hash_password(USER_PASSWORD.as_bytes(), &salt)
            .unwrap()
            .to_string();

        let mut sessions = HashMap::new();
        sessions.insert(ADMIN_TOKEN.to_string(), admin);
        sessions.insert(USER_TOKEN.to_string(), user.clone());
        Self {
            credentials: UserCredentials {
                user_id: user.user.user_id,
                email: user.user.email.clone(),
                hashed_password,
            },
            sessions: Mutex::new(sessions),
        }
    }
}

#[async_trait]
impl AccountService for InMemoryAccounts {
    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        if email == self.credentials.email {
            Ok(self.credentials.clone())
        } else {
            Err(PortError::NotFound(email.to_string()))
        }
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let context = sessions
            .values()
            .find(|c| c.user.user_id == user_id)
            .cloned()
            .ok_or(PortError::Unauthorized)?;
        sessions.insert(session_id.to_string(), context);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<AuthContext> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }
}

//=========================================================================================
// App Builder & Request Helpers
//=========================================================================================

fn item(id: &str, name: &str, price: u64, category: &str) -> CatalogItem {
    CatalogItem {
        id: id.into(),
        name: name.into(),
        price,
        category: category.into(),
    }
}

pub fn catalog() -> Catalog {
    Catalog::new([
        (
            ItemClass::Microcontroller,
            vec![
                item("arduino-uno", "Arduino Uno", 450, "Arduino"),
                item("esp32", "ESP32 DevKit", 400, "Espressif"),
            ],
        ),
        (
            ItemClass::Sensor,
            vec![
                item("dht22", "DHT22", 100, "Environmental"),
                item("pir", "PIR Motion", 70, "Motion"),
                item("bmp280", "BMP280", 120, "Environmental"),
            ],
        ),
        (ItemClass::Component, vec![item("lm7805", "LM7805", 45, "Power")]),
        (ItemClass::Actuator, vec![item("sg90", "SG90 Servo", 90, "Motors")]),
        (
            ItemClass::Display,
            vec![
                item("none", "None", 0, "None"),
                item("lcd-16x2", "16x2 LCD", 180, "LCD"),
            ],
        ),
    ])
}

pub fn config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".into(),
        log_level: tracing::Level::INFO,
        catalog_path: "unused.json".into(),
        cors_origin: "http://localhost:3000".into(),
        session_ttl_days: 30,
        estimate_idle_minutes: 120,
        max_estimates: 100,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub requests: Arc<InMemoryRequests>,
    pub accounts: Arc<InMemoryAccounts>,
}

pub async fn app_with(rows: Vec<Request>, loaded: LoadedCatalog) -> TestApp {
    let requests = Arc::new(InMemoryRequests {
        rows: Mutex::new(rows),
        ..InMemoryRequests::default()
    });
    let accounts = Arc::new(InMemoryAccounts::new());
    let state = Arc::new(AppState::new(
        Arc::new(config()),
        requests.clone(),
        accounts.clone(),
        loaded,
    ));
    state.triage.refresh().await.unwrap();
    TestApp {
        router: web::router(state.clone()),
        state,
        requests,
        accounts,
    }
}

pub async fn app(rows: Vec<Request>) -> TestApp {
    app_with(
        rows,
        LoadedCatalog {
            catalog: catalog(),
            banner: None,
        },
    )
    .await
}

pub fn request(request_type: RequestType, status: RequestStatus) -> Request {
    Request {
        id: Uuid::new_v4(),
        request_type,
        user_id: Uuid::new_v4(),
        user_email: "maker@example.in".into(),
        user_name: "Maker".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        status,
        summary: "Greenhouse monitor".into(),
        admin_notes: None,
    }
}

pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = HttpRequest::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Response {
        status,
        headers,
        body,
    }
}
