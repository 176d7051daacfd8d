use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::interface::{LoginResult, PasswordEncoder, Result, ServiceError, TokenPair, UserRepository};
use super::model::{EmailVerification, User, UserStatus, UserType};
use super::schema::{LoginRequest, RegisterRequest, RegistrationVerifyRequest};
use crate::services::email::EmailSender;
use crate::services::jwt::JwtService;
use crate::services::metrics::MetricsRegistry;
use crate::services::otp::OtpGenerator;

pub const VERIFICATION_SUBJECT: &str = "LAS Verification";

/// Registration workflow: account creation, OTP issue and OTP verification,
/// plus login for verified accounts.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordEncoder>,
    mailer: Arc<dyn EmailSender>,
    otp: OtpGenerator,
    jwt: JwtService,
    metrics: Arc<MetricsRegistry>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordEncoder>,
        mailer: Arc<dyn EmailSender>,
        otp: OtpGenerator,
        jwt: JwtService,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            users,
            passwords,
            mailer,
            otp,
            jwt,
            metrics,
        }
    }

    /// Active account for `email`, if any.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_by_email_and_status(email, UserStatus::Active).await?)
    }

    /// Creates a pending patient account and emails it a one-time code.
    ///
    /// The account is persisted before the email is handed off; a failed
    /// hand-off is logged and does not undo the registration.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let otp = self.otp.generate();
        let password = self.passwords.encode(&request.password)?;
        let now = Utc::now();

        let user = User {
            id: Uuid::new_v4().to_string(),
            identity_no: request.id_value,
            id_type: request.id_type,
            name: request.name,
            mobile: request.mobile,
            username: request.email.clone(),
            email: request.email,
            password,
            status: UserStatus::VerificationPending,
            user_type: UserType::Patient,
            last_logged_on: now,
            created_at: now,
            updated_at: now,
            email_verification: EmailVerification::issue(otp.clone(), now),
        };

        let saved = match self.users.save(user).await {
            Ok(saved) => saved,
            Err(e) => {
                self.metrics.registrations_total.with_label_values(&["failed"]).inc();
                return Err(e.into());
            }
        };
        self.metrics.registrations_total.with_label_values(&["created"]).inc();
        tracing::debug!(user_id = %saved.id, email = %saved.email, "Registered user, sending OTP");

        let outcome = match self
            .mailer
            .send_email(saved.email.trim(), VERIFICATION_SUBJECT, &otp_template_message(&otp))
            .await
        {
            Ok(()) => "accepted",
            Err(e) => {
                tracing::warn!(user_id = %saved.id, "Verification email not sent: {}", e);
                "failed"
            }
        };
        self.metrics.emails_total.with_label_values(&[outcome]).inc();

        Ok(saved)
    }

    /// Checks a submitted code against the user's issued code.
    ///
    /// Every attempt against a known user is stamped and persisted, including
    /// failed ones. Attempts are not counted and never lock the account.
    pub async fn register_verify(&self, request: RegistrationVerifyRequest) -> Result<User> {
        let Some(mut user) = self.users.find_by_id(&request.user_id).await? else {
            self.metrics.email_verifications_total.with_label_values(&["unknown_user"]).inc();
            return Err(ServiceError::validation("Invalid User"));
        };

        let now = Utc::now();
        if user.email_verification.matches(&request.otp) {
            user.confirm_email(now);
            let user = self.users.save(user).await?;
            self.metrics.email_verifications_total.with_label_values(&["success"]).inc();
            tracing::info!(user_id = %user.id, "Email verified");
            Ok(user)
        } else {
            user.record_failed_attempt(now);
            let user = self.users.save(user).await?;
            self.metrics.email_verifications_total.with_label_values(&["mismatch"]).inc();
            tracing::info!(user_id = %user.id, "Email verification code mismatch");
            Err(ServiceError::validation(format!(
                "Email Verification Failed.. {}",
                user.email
            )))
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResult> {
        let outcome = self.authenticate(request).await;
        let label = match &outcome {
            Ok(_) => "success",
            Err(ServiceError::AuthenticationFailed) => "rejected",
            Err(_) => "failed",
        };
        self.metrics.logins_total.with_label_values(&[label]).inc();
        outcome
    }

    async fn authenticate(&self, request: LoginRequest) -> Result<LoginResult> {
        let mut user = self
            .find_user_by_email(&request.email)
            .await?
            .ok_or(ServiceError::AuthenticationFailed)?;

        if !self.passwords.matches(&request.password, &user.password)? {
            return Err(ServiceError::AuthenticationFailed);
        }

        let tokens = self.issue_tokens(&user)?;

        let now = Utc::now();
        user.last_logged_on = now;
        user.updated_at = now;
        let user = self.users.save(user).await?;

        Ok(LoginResult { user, tokens })
    }

    fn issue_tokens(&self, user: &User) -> Result<TokenPair> {
        let access_token = self
            .jwt
            .create_access_token(user)
            .map_err(|e| ServiceError::failure("Access token signing failed", e))?;
        let refresh_token = self
            .jwt
            .create_refresh_token(&user.id)
            .map_err(|e| ServiceError::failure("Refresh token signing failed", e))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_duration_secs(),
        })
    }
}

pub fn otp_template_message(otp: &str) -> String {
    format!(
        "Dear Patient,\n\
         Please enter the code in your registration form.\n\n\
         Code: {otp}\n\
         Thank you for registering with us.\n\n\
         LAS Team.\n\
         www.las.lk"
    )
}
