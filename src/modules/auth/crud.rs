use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, Pool};

use super::interface::{DataAccessError, UserRepository};
use super::model::{EmailVerification, IdType, User, UserStatus, UserType};

const USER_COLUMNS: &str = "id, identity_no, id_type, name, mobile, email, username, password, \
     status, user_type, last_logged_on, created_at, updated_at";

const VERIFICATION_COLUMNS: &str = "verification_code, status, source, tries, code_sent_on, \
     tried_on, verified_on, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    identity_no: String,
    id_type: IdType,
    name: String,
    mobile: String,
    email: String,
    username: String,
    password: String,
    status: UserStatus,
    user_type: UserType,
    last_logged_on: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, email_verification: EmailVerification) -> User {
        User {
            id: self.id,
            identity_no: self.identity_no,
            id_type: self.id_type,
            name: self.name,
            mobile: self.mobile,
            email: self.email,
            username: self.username,
            password: self.password,
            status: self.status,
            user_type: self.user_type,
            last_logged_on: self.last_logged_on,
            created_at: self.created_at,
            updated_at: self.updated_at,
            email_verification,
        }
    }
}

/// MySQL-backed user directory
pub struct UserCrud {
    pool: Pool<MySql>,
}

impl UserCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn attach_verification(&self, row: UserRow) -> Result<User, DataAccessError> {
        let verification = sqlx::query_as::<_, EmailVerification>(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM email_verifications WHERE user_id = ?"
        ))
        .bind(&row.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DataAccessError::Corrupt(format!("user {} has no email verification", row.id)))?;

        Ok(row.into_user(verification))
    }
}

#[async_trait]
impl UserRepository for UserCrud {
    async fn find_by_email_and_status(
        &self,
        email: &str,
        status: UserStatus,
    ) -> Result<Option<User>, DataAccessError> {
        // Emails are not unique; the oldest matching account wins.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND status = ? ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(email)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_verification(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DataAccessError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.attach_verification(row).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user: User) -> Result<User, DataAccessError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, identity_no, id_type, name, mobile, email, username, password,
                status, user_type, last_logged_on, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                identity_no = VALUES(identity_no),
                id_type = VALUES(id_type),
                name = VALUES(name),
                mobile = VALUES(mobile),
                email = VALUES(email),
                username = VALUES(username),
                password = VALUES(password),
                status = VALUES(status),
                user_type = VALUES(user_type),
                last_logged_on = VALUES(last_logged_on),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(&user.id)
        .bind(&user.identity_no)
        .bind(user.id_type)
        .bind(&user.name)
        .bind(&user.mobile)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.status)
        .bind(user.user_type)
        .bind(user.last_logged_on)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        // verification_code is write-once
        let verification = &user.email_verification;
        sqlx::query(
            r#"
            INSERT INTO email_verifications (
                user_id, verification_code, status, source, tries,
                code_sent_on, tried_on, verified_on, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                tries = VALUES(tries),
                tried_on = VALUES(tried_on),
                verified_on = VALUES(verified_on),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(&user.id)
        .bind(&verification.verification_code)
        .bind(verification.status)
        .bind(&verification.source)
        .bind(verification.tries)
        .bind(verification.code_sent_on)
        .bind(verification.tried_on)
        .bind(verification.verified_on)
        .bind(verification.created_at)
        .bind(verification.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }
}
