#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use devcamper::modules::users::model::{User, UserRole};
use devcamper::modules::users::service::UserService;
use devcamper::router::init_router;
use devcamper::state::AppState;
use devcamper::utils::geocoder::{GeoLocation, GeocodeError, Geocoder};
use devcamper::utils::mailer::{MailError, Mailer, OutgoingEmail};
use devcamper_config::{JwtConfig, QueryConfig};
use devcamper_db::MemoryStore;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "123456";

/// Keeps every message it is asked to send; optionally refuses them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// The raw reset token from the last reset link sent.
    pub fn last_reset_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let text = &sent.last()?.text;
        text.rsplit('/').next().map(|t| t.trim().to_string())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Resolves a fixed set of addresses and zipcodes.
#[derive(Default)]
pub struct FixedGeocoder {
    places: HashMap<String, GeoLocation>,
}

impl FixedGeocoder {
    pub fn with(mut self, query: &str, longitude: f64, latitude: f64) -> Self {
        let mut location = GeoLocation::point(longitude, latitude);
        location.formatted_address = query.to_string();
        self.places.insert(query.to_string(), location);
        self
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoLocation>, GeocodeError> {
        Ok(self.places.get(address).cloned())
    }
}

pub const BOSTON_ADDRESS: &str = "233 Bay State Rd Boston MA 02215";
pub const LOWELL_ADDRESS: &str = "220 Pawtucket St, Lowell, MA 01854";
pub const BURLINGTON_ADDRESS: &str = "85 South Prospect Street Burlington VT 05405";

/// Boston-area places used across the bootcamp tests.
pub fn new_england_geocoder() -> FixedGeocoder {
    FixedGeocoder::default()
        .with(BOSTON_ADDRESS, -71.104028, 42.350846)
        .with(LOWELL_ADDRESS, -71.324295, 42.466805)
        .with(BURLINGTON_ADDRESS, -73.071617, 44.476606)
        .with("02118", -71.070061, 42.336015)
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        expire_secs: 3600,
        cookie_expire_days: 1,
        secure_cookies: false,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_app() -> TestApp {
    build_app(RecordingMailer::default(), QueryConfig::default())
}

pub fn test_app_with_failing_mailer() -> TestApp {
    build_app(RecordingMailer::failing(), QueryConfig::default())
}

pub fn test_app_with_query_config(query_config: QueryConfig) -> TestApp {
    build_app(RecordingMailer::default(), query_config)
}

fn build_app(mailer: RecordingMailer, query_config: QueryConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(mailer);
    let state = AppState::new(
        store.clone(),
        mailer.clone(),
        Arc::new(new_england_geocoder()),
        test_jwt_config(),
    )
    .with_query_config(query_config);

    TestApp {
        router: init_router(state),
        store,
        mailer,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", uri, token, None).await
    }

    /// Inserts a user directly and logs them in.
    pub async fn user_with_token(&self, name: &str, email: &str, role: UserRole) -> (User, String) {
        let user = UserService::insert_user(self.store.as_ref(), name, email, PASSWORD, role)
            .await
            .unwrap();
        let token = self.login(email, PASSWORD).await;
        (user, token)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_bootcamp(&self, token: &str, name: &str, address: &str) -> Value {
        let response = self
            .request(
                "POST",
                "/api/v1/bootcamps",
                Some(token),
                Some(bootcamp_body(name, address)),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "bootcamp creation failed: {}",
            response.body
        );
        response.body["data"].clone()
    }
}

pub fn bootcamp_body(name: &str, address: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} teaches full stack web development"),
        "website": "https://devworks.com",
        "phone": "(111) 111-1111",
        "email": "enroll@devworks.com",
        "address": address,
        "careers": ["Web Development", "UI/UX"],
        "housing": true,
        "jobAssistance": true
    })
}

pub fn course_body(title: &str, tuition: u32) -> Value {
    json!({
        "title": title,
        "description": "Learn HTML, CSS and JavaScript",
        "weeks": "8",
        "tuition": tuition,
        "minimumSkill": "beginner",
        "scholarshipAvailable": true
    })
}
