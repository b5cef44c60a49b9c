use std::path::PathBuf;

use anyhow::Context;
use chat_memory::{FileSessionStore, InMemorySessionStore, SessionStore};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use chat_relay::{
    document::DocumentSummarizer,
    gemini::GeminiClient,
    server::{build_router, cors_layer, serve, AppState},
    tracing::init_tracing_subscriber,
    yt::scraper::YtCaptionScraper,
    ChatServiceBuilder, GenerationConfig, TextGenerator,
};

#[derive(Parser)]
#[command(name = "chat-relay", about = "Video-aware chat relay for a hosted LLM")]
struct Cli {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = GeminiClient::DEFAULT_MODEL)]
    model: String,

    /// Override the Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL")]
    gemini_base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "PORT", default_value = "5000")]
        port: u16,

        /// Directory holding the session identifier and conversation history
        #[arg(long, env = "CHAT_DATA_DIR", default_value = ".")]
        data_dir: PathBuf,

        /// Allowed CORS origin, repeatable; any origin when omitted
        #[arg(long = "allowed-origin", env = "ALLOWED_ORIGIN", value_delimiter = ',')]
        allowed_origins: Vec<String>,

        /// Keep the session in memory instead of on disk
        #[arg(long)]
        ephemeral: bool,

        /// Preferred caption language for /transcribe
        #[arg(long, env = "CAPTION_LANGUAGE", default_value = "en")]
        caption_language: String,
    },
    /// Summarize a .pdf or .docx document
    Summarize {
        path: PathBuf,

        /// Characters per chunk sent for summarization
        #[arg(long, default_value_t = DocumentSummarizer::<GeminiClient>::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Send a probe prompt to verify the API key and model
    Check,
}

struct ServeConfig {
    host: String,
    port: u16,
    allowed_origins: Vec<String>,
    caption_language: String,
}

async fn run_server<S>(
    store: S,
    gemini: GeminiClient,
    config: ServeConfig,
) -> anyhow::Result<()>
where
    S: SessionStore + Send + Sync + 'static,
{
    let chat = ChatServiceBuilder::new()
        .store(store)
        .generator(gemini)
        .build();
    let captions = YtCaptionScraper::default().with_language(config.caption_language);
    let state = AppState::new(chat, captions);
    let router = build_router(state, cors_layer(&config.allowed_origins)?);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
            shutdown.cancel();
        }
    });

    serve(listener, router, shutdown).await
}

async fn check(gemini: &GeminiClient) -> anyhow::Result<()> {
    let reply = gemini
        .generate(
            "Say 'Hello, I am functioning correctly' if you can read this.",
            &GenerationConfig::default(),
        )
        .await
        .context("Failed to reach the Gemini API, check the API key and network")?;

    println!("{}", reply.trim());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let mut gemini = GeminiClient::new(cli.gemini_api_key).with_model(cli.model);
    if let Some(base_url) = cli.gemini_base_url {
        gemini = gemini.with_base_url(base_url);
    }
    tracing::info!(model = gemini.model(), api_key = %gemini.masked_key(), "Configured Gemini client");

    match cli.command {
        Command::Serve {
            host,
            port,
            data_dir,
            allowed_origins,
            ephemeral,
            caption_language,
        } => {
            let config = ServeConfig {
                host,
                port,
                allowed_origins,
                caption_language,
            };

            if ephemeral {
                tracing::info!("Using in-memory session store");
                run_server(InMemorySessionStore::new(), gemini, config).await?;
            } else {
                let store = FileSessionStore::init(&data_dir)
                    .await
                    .with_context(|| format!("Failed to open data dir {}", data_dir.display()))?;
                tracing::info!(data_dir = %data_dir.display(), "Using file session store");
                run_server(store, gemini, config).await?;
            }
        }
        Command::Summarize { path, chunk_size } => {
            let summary = DocumentSummarizer::new(gemini)
                .with_chunk_size(chunk_size)
                .summarize_file(&path)
                .await?;

            tracing::info!(outcome = ?summary.outcome, "Document processed");
            println!("Final Summary:\n");
            println!("{}", summary.text);
        }
        Command::Check => check(&gemini).await?,
    }

    Ok(())
}
