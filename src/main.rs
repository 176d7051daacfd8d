use std::sync::Arc;

use lab_appointment::config::{init_db, run_migrations, Config};
use lab_appointment::modules::auth::{crud::UserCrud, UserService};
use lab_appointment::services::email::{
    EmailRetryPolicy, EmailSender, HttpEmailSender, LogEmailSender, QueuedEmailSender,
};
use lab_appointment::services::{
    hashing::Argon2PasswordEncoder, jwt::JwtService, metrics::MetricsRegistry, otp::OtpGenerator,
};
use lab_appointment::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lab_appointment=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url)
        .await
        .expect("Failed to connect to MySQL");
    run_migrations(&db).await.expect("Failed to run migrations");
    tracing::info!("Connected to MySQL");

    let transport: Arc<dyn EmailSender> = match config.email.clone() {
        Some(email) => {
            tracing::info!(api = %email.api_url, "Sending email through HTTP provider");
            Arc::new(HttpEmailSender::new(email).expect("Failed to build email HTTP client"))
        }
        None => {
            tracing::warn!("EMAIL_API_URL not set, verification emails will only be logged");
            Arc::new(LogEmailSender)
        }
    };
    let mailer = QueuedEmailSender::spawn(transport, EmailRetryPolicy::default());

    let metrics = MetricsRegistry::new().expect("Failed to initialize metrics registry");

    let user_service = UserService::new(
        Arc::new(UserCrud::new(db)),
        Arc::new(Argon2PasswordEncoder),
        Arc::new(mailer),
        OtpGenerator::from_os_rng(),
        JwtService::new(config.jwt_secret.clone()),
        metrics.clone(),
    );

    let app = lab_appointment::create_app(
        AppState {
            user_service,
            metrics,
        },
        config.rate_limit_burst,
    )
    .await;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
