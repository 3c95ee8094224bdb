use std::sync::Arc;
use tracing::info;
use voice_banking_assistant::{
    accounts::{AccountStore, InMemoryAccountStore},
    api::start_server,
    asr::{HttpTranscriber, Transcriber},
    config::AppConfig,
    llm::{GeminiGenerator, TextGenerator},
    pipeline::Pipeline,
    session::SessionStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env();

    info!("🚀 Voice Banking Assistant - API Server");
    info!("📍 Port: {}", config.port);

    let generator: Option<Arc<dyn TextGenerator>> = match config.gemini_api_key.clone() {
        Some(key) => Some(Arc::new(GeminiGenerator::new(key, &config.gemini_model))),
        None => {
            eprintln!("⚠️  GEMINI_API_KEY not set in .env");
            eprintln!("📌 Replies fall back to built-in templates");
            None
        }
    };

    let transcriber: Option<Arc<dyn Transcriber>> = config
        .asr_url
        .clone()
        .map(|url| Arc::new(HttpTranscriber::new(url)) as Arc<dyn Transcriber>);

    let accounts = Arc::new(InMemoryAccountStore::new()) as Arc<dyn AccountStore>;
    let sessions = SessionStore::from_database_url(config.database_url.as_deref());

    // Assemble the pipeline
    let pipeline = Arc::new(Pipeline::new(transcriber, generator, accounts, sessions));

    info!("✅ Pipeline initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(pipeline, config.port).await?;

    Ok(())
}
