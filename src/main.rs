use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_call::config::TransportKind;
use voice_call::{
    create_router, infer_turn_state, AppState, Config, ConfiguredTransportFactory,
    CredentialStore, FaultLog, SessionManager, TranscriptEntry, MESSAGE_EVENT,
};

#[derive(Parser)]
#[command(name = "voice-call", about = "Voice assistant call session manager")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/voice-call")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,
    /// Start a call in the terminal; stdin lines are sent as user text
    Call {
        /// Assistant to call (defaults to assistant.id from config)
        #[arg(long)]
        assistant: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Voice Call v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Transport: {:?}", cfg.transport.kind);

    let api_key = resolve_api_key(&cfg)?;
    let faults = Arc::new(FaultLog::default());
    let factory = Arc::new(ConfiguredTransportFactory::new(
        cfg.transport.clone(),
        api_key,
        faults.clone(),
    ));
    let manager = Arc::new(
        SessionManager::new(factory, faults.clone()).with_retention(cfg.session.retention()),
    );

    match cli.command {
        Command::Serve => serve(&cfg, manager, faults).await,
        Command::Call { assistant } => {
            let assistant = assistant.unwrap_or_else(|| cfg.assistant.id.clone());
            call(manager, &assistant).await
        }
    }
}

/// API key from config, then the credential store, then an interactive prompt
fn resolve_api_key(cfg: &Config) -> Result<Option<String>> {
    if let Some(key) = cfg.assistant.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
        return Ok(Some(key.clone()));
    }

    let store = CredentialStore::from_config_path(&cfg.assistant.credentials_path)?;
    if let Some(key) = store.load()? {
        info!("Using API key from {}", store.path().display());
        return Ok(Some(key));
    }

    // The mock transport doesn't need one
    if cfg.transport.kind == TransportKind::Mock {
        return Ok(None);
    }

    print!("Enter API key: ");
    std::io::stdout().flush().ok();

    let mut key = String::new();
    std::io::stdin()
        .read_line(&mut key)
        .context("Failed to read API key")?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Ok(None);
    }

    store.save(&key)?;
    Ok(Some(key))
}

async fn serve(cfg: &Config, manager: Arc<SessionManager>, faults: Arc<FaultLog>) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(Arc::clone(&manager), faults, cfg.assistant.id.clone());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("HTTP server failed")?;

    manager.shutdown().await;
    Ok(())
}

async fn call(manager: Arc<SessionManager>, assistant: &str) -> Result<()> {
    manager.subscribe(MESSAGE_EVENT, |entry: &TranscriptEntry| {
        println!("{}", format_entry(entry));
        Ok(())
    })?;

    manager.start(assistant).await?;
    println!("Connected. Type to talk, Ctrl-D or Ctrl-C to hang up.");

    let input = BufReader::new(tokio::io::stdin());
    let hangup = async {
        tokio::signal::ctrl_c().await.ok();
    };
    converse(&manager, input, hangup).await?;

    let transcript = manager.transcript();
    println!("Call ended ({} transcript entries)", transcript.len());
    Ok(())
}

/// One transcript line. The turn follows from the entry itself, since the
/// greeting arrives before the session reports `Active`.
fn format_entry(entry: &TranscriptEntry) -> String {
    let turn = infer_turn_state(true, std::slice::from_ref(entry));
    format!("{:>9}: {}    [{:?}]", entry.speaker_role, entry.text, turn)
}

/// Send each input line as user text until EOF, `hangup` or a read error.
/// The manager is shut down on every exit path.
async fn converse<R, H>(manager: &SessionManager, input: R, hangup: H) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    H: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(hangup);

    let result = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    if let Err(e) = manager.send_text(text.trim()).await {
                        warn!("Message not sent: {}", e);
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            },
            _ = &mut hangup => break Ok(()),
        }
    };

    manager.shutdown().await;
    result.context("Failed to read from stdin")
}
