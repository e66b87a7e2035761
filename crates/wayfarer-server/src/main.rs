use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use wayfarer_core::generate::{MockGenerator, OpenAiGenerator, PlanGenerator};
use wayfarer_core::speech::{BaiduTranscriber, SpeechTranscriber, UnconfiguredTranscriber};
use wayfarer_db::config::DbConfig;
use wayfarer_db::pool;

use wayfarer_server::app::{AppState, run_serve};
use wayfarer_server::auth::{AuthProvider, HttpAuthProvider, MemoryAuthProvider};
use wayfarer_server::config::{COLLABORATOR_TIMEOUT, ServerConfig};
use wayfarer_server::session::SessionStore;

#[derive(Parser)]
#[command(name = "wayfarer", about = "AI-assisted travel itinerary planner")]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Database URL (overrides WAYFARER_DATABASE_URL env var)
    #[arg(long)]
    database_url: Option<String>,
}

fn build_generator(config: &ServerConfig) -> anyhow::Result<Arc<dyn PlanGenerator>> {
    match &config.openai_api_key {
        Some(key) => {
            let generator = OpenAiGenerator::new(
                &config.openai_base_url,
                key,
                &config.openai_model,
                COLLABORATOR_TIMEOUT,
            )
            .context("failed to construct plan generator")?;
            Ok(Arc::new(generator))
        }
        None => {
            warn!("OPENAI_API_KEY not set; serving hardcoded mock itineraries");
            Ok(Arc::new(MockGenerator::new()))
        }
    }
}

fn build_transcriber(config: &ServerConfig) -> anyhow::Result<Arc<dyn SpeechTranscriber>> {
    match (&config.baidu_api_key, &config.baidu_secret_key) {
        (Some(api_key), Some(secret_key)) => {
            let transcriber = BaiduTranscriber::new(api_key, secret_key, COLLABORATOR_TIMEOUT)
                .context("failed to construct speech backend")?;
            Ok(Arc::new(transcriber))
        }
        _ => {
            warn!("BAIDU_API_KEY/BAIDU_SECRET_KEY not set; voice input disabled");
            Ok(Arc::new(UnconfiguredTranscriber))
        }
    }
}

fn build_auth(config: &ServerConfig) -> anyhow::Result<Arc<dyn AuthProvider>> {
    match (&config.auth_url, &config.auth_anon_key) {
        (Some(url), Some(anon_key)) => {
            let provider = HttpAuthProvider::new(url, anon_key, COLLABORATOR_TIMEOUT)
                .context("failed to construct identity provider client")?;
            Ok(Arc::new(provider))
        }
        _ => {
            warn!("WAYFARER_AUTH_URL not set; accounts held in process memory");
            Ok(Arc::new(MemoryAuthProvider::new()))
        }
    }
}

fn build_sessions(config: &ServerConfig) -> anyhow::Result<Arc<SessionStore>> {
    match &config.session_secret {
        Some(secret) => {
            let secret = hex::decode(secret)
                .context("WAYFARER_SESSION_SECRET must be a hex-encoded byte string")?;
            Ok(Arc::new(SessionStore::new(secret)))
        }
        None => {
            warn!("WAYFARER_SESSION_SECRET not set; sessions will not survive restarts");
            Ok(Arc::new(SessionStore::with_random_secret()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let server_config = ServerConfig::from_env();

    let mut db_config = DbConfig::from_env();
    if let Some(url) = cli.database_url {
        db_config.database_url = url;
    }

    pool::ensure_database_exists(&db_config).await?;
    let db_pool = pool::create_pool(&db_config).await?;
    pool::run_migrations(&db_pool).await?;
    info!("database ready");

    let state = AppState {
        pool: db_pool.clone(),
        drafts: Arc::new(wayfarer_core::draft::DraftStore::new()),
        sessions: build_sessions(&server_config)?,
        generator: build_generator(&server_config)?,
        transcriber: build_transcriber(&server_config)?,
        auth: build_auth(&server_config)?,
    };

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .context("invalid bind address")?;

    let result = run_serve(addr, state).await;
    db_pool.close().await;
    result
}
