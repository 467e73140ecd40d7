use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use transcribe_backend::auth::{GoogleIdentityProvider, IdentityProvider, LoginStates};
use transcribe_backend::config::ServerConfig;
use transcribe_backend::credentials::{get_client_secret, load_credentials};
use transcribe_backend::db::Database;
use transcribe_backend::repository::RecordingRepository;
use transcribe_backend::serve::{serve, AppState};
use transcribe_backend::users::UserRepository;

#[derive(Parser, Debug)]
#[command(author, version, about = "Backend for recording and transcribing audio sessions")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the recordings API over HTTP
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Port to listen on (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create the database schema and exit
    InitDb {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => run_server(config, port),
        Command::InitDb { config } => init_db(config),
    }
}

fn run_server(config_path: PathBuf, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load(&config_path)?;
    let port = port_override.unwrap_or(config.api_port);

    let identity = match &config.google {
        Some(google) => {
            let credentials = load_credentials().map_err(|e| e.to_string())?;
            let client_secret = get_client_secret(&credentials, &google.credential_profile)?;
            let provider: Arc<dyn IdentityProvider> = Arc::new(GoogleIdentityProvider::new(
                google.client_id.clone(),
                client_secret,
                google.redirect_uri.clone(),
            ));
            info!("Google login: ENABLED");
            Some(provider)
        }
        None => None,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let db = Database::open(&config.database_path).await?;
        let state = AppState {
            recordings: RecordingRepository::new(db.clone())
                .with_llm_provider(config.llm_provider.clone()),
            users: UserRepository::new(db),
            identity,
            login_states: LoginStates::new(),
        };
        serve(state, port).await
    })
}

fn init_db(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load(&config_path)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let db = Database::open(&config.database_path).await?;
        db.close().await;
        info!("Initialized database at {}", config.database_path.display());
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}
