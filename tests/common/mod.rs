use async_trait::async_trait;
use axum_test::TestServer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use lab_appointment::modules::auth::interface::{DataAccessError, UserRepository};
use lab_appointment::modules::auth::model::{User, UserStatus};
use lab_appointment::modules::auth::UserService;
use lab_appointment::services::email::{EmailError, EmailSender};
use lab_appointment::services::{
    hashing::Argon2PasswordEncoder, jwt::JwtService, metrics::MetricsRegistry, otp::OtpGenerator,
};
use lab_appointment::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only";

// =============================================================================
// IN-MEMORY USER DIRECTORY
// =============================================================================

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
    fail_saves: AtomicBool,
}

#[allow(dead_code)]
impl MemoryUserRepository {
    pub fn get(&self, id: &str) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email_and_status(
        &self,
        email: &str,
        status: UserStatus,
    ) -> Result<Option<User>, DataAccessError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|u| u.email == email && u.status == status)
            .min_by_key(|u| u.created_at)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DataAccessError> {
        Ok(self.get(id))
    }

    async fn save(&self, user: User) -> Result<User, DataAccessError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DataAccessError::Database(sqlx::Error::PoolTimedOut));
        }
        self.users.lock().unwrap().insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

// =============================================================================
// RECORDING EMAIL SENDER
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub address: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<SentEmail> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Code from the most recent OTP email.
    pub fn last_otp(&self) -> String {
        let email = self.last().expect("no email was sent");
        otp_from_body(&email.body)
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError::Rejected {
                status: 503,
                body: "provider down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentEmail {
            address: address.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub fn otp_from_body(body: &str) -> String {
    body.lines()
        .find_map(|line| line.strip_prefix("Code: "))
        .expect("email body has no code line")
        .to_string()
}

// =============================================================================
// CONTEXTS
// =============================================================================

pub struct Collaborators {
    pub users: Arc<MemoryUserRepository>,
    pub mailer: Arc<RecordingEmailSender>,
    pub metrics: Arc<MetricsRegistry>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::default()),
            mailer: Arc::new(RecordingEmailSender::default()),
            metrics: MetricsRegistry::new().expect("metrics registry"),
        }
    }

    pub fn service(&self, otp: OtpGenerator) -> UserService {
        UserService::new(
            self.users.clone(),
            Arc::new(Argon2PasswordEncoder),
            self.mailer.clone(),
            otp,
            JwtService::new(TEST_JWT_SECRET.to_string()),
            self.metrics.clone(),
        )
    }
}

#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub users: Arc<MemoryUserRepository>,
    pub mailer: Arc<RecordingEmailSender>,
    pub metrics: Arc<MetricsRegistry>,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        Self::with_rate_limit(1_000).await
    }

    pub async fn with_rate_limit(burst: u32) -> Self {
        let collaborators = Collaborators::new();
        let state = AppState {
            user_service: collaborators.service(OtpGenerator::seeded(2024)),
            metrics: collaborators.metrics.clone(),
        };

        let app = lab_appointment::create_app(state, burst).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            users: collaborators.users,
            mailer: collaborators.mailer,
            metrics: collaborators.metrics,
        }
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}

#[allow(dead_code)]
pub fn register_body(email: &str, password: &str) -> serde_json::Value {
    serde_json::json!({
        "idValue": "901234567V",
        "idType": "NIC",
        "name": "Nimal Perera",
        "mobile": "0771234567",
        "email": email,
        "password": password
    })
}
