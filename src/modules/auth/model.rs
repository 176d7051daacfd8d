use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const EMAIL_SOURCE: &str = "Email";

/// Registered account. Owns its email verification record by value, so the
/// two are always loaded and saved together.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub identity_no: String,
    pub id_type: IdType,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub status: UserStatus,
    pub user_type: UserType,
    pub last_logged_on: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email_verification: EmailVerification,
}

/// One OTP challenge. `verification_code` never changes after issue.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct EmailVerification {
    pub verification_code: String,
    pub status: VerificationStatus,
    pub source: String,
    pub tries: u8,
    pub code_sent_on: DateTime<Utc>,
    pub tried_on: Option<DateTime<Utc>>,
    pub verified_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn issue(code: String, now: DateTime<Utc>) -> Self {
        Self {
            verification_code: code,
            status: VerificationStatus::VerificationPending,
            source: EMAIL_SOURCE.to_string(),
            tries: 0,
            code_sent_on: now,
            tried_on: None,
            verified_on: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn matches(&self, otp: &str) -> bool {
        self.verification_code == otp
    }
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Records a successful OTP confirmation on both the user and its
    /// verification record.
    pub fn confirm_email(&mut self, now: DateTime<Utc>) {
        self.status = UserStatus::Active;
        self.updated_at = now;

        let verification = &mut self.email_verification;
        verification.status = VerificationStatus::VerificationSuccess;
        verification.verified_on = Some(now);
        verification.tried_on = Some(now);
        verification.updated_at = now;
    }

    /// Records a failed OTP attempt. Status is left as it was.
    pub fn record_failed_attempt(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.email_verification.tried_on = Some(now);
        self.email_verification.updated_at = now;
    }
}

// =============================================================================
// ENUMS
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    VerificationPending,
    Active,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    VerificationPending,
    VerificationSuccess,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdType {
    Nic,
    Passport,
    DrivingLicense,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Patient,
    Admin,
}
