//! drive-demo - command line harness for the Google Drive client.
//!
//! Signs in with the system browser, then lists, creates, reads, updates and
//! deletes files (by default in the hidden app-data folder).

use anyhow::{bail, Context, Result};
use bridge_traits::LogLevel;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use core_service::{
    init_logging, ClientConfig, CoreEvent, CreateFileParams, EventSeverity, File,
    GoogleDriveClient, ListFilesParams, LogFormat, LoggingConfig, Space, UpdateFileParams,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "drive-demo")]
#[command(about = "Google Drive API client demo")]
#[command(version)]
struct Cli {
    /// OAuth client ID.
    #[arg(long, env = "GOOGLE_DRIVE_CLIENT_ID")]
    client_id: String,

    /// OAuth client secret, for client types that have one.
    #[arg(long, env = "GOOGLE_DRIVE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// OAuth scope to request.
    #[arg(
        long,
        env = "GOOGLE_DRIVE_AUTH_SCOPE",
        default_value = "https://www.googleapis.com/auth/drive.appdata"
    )]
    auth_scope: String,

    /// Custom-scheme redirect URI registered for the client.
    #[arg(long, env = "GOOGLE_DRIVE_REDIRECT_URI")]
    redirect_uri: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in through the browser and paste the redirect URL back.
    SignIn,

    /// Revoke and forget the stored credentials.
    SignOut,

    /// Show whether credentials are stored.
    Status,

    /// List files.
    List {
        /// Drive search query.
        #[arg(short, long, default_value = "trashed=false")]
        query: String,

        /// Space to search.
        #[arg(short, long, value_enum, default_value = "app-data-folder")]
        space: SpaceArg,

        /// Maximum number of files.
        #[arg(long)]
        page_size: Option<u32>,

        /// Token from a previous page.
        #[arg(long)]
        page_token: Option<String>,
    },

    /// Upload a new file.
    Create {
        /// File name.
        #[arg(short, long)]
        name: String,

        /// Content type.
        #[arg(short, long, default_value = "text/plain")]
        mime_type: String,

        /// Parent folder ID (repeatable).
        #[arg(short, long)]
        parent: Vec<String>,

        /// Space to create the file in.
        #[arg(short, long, value_enum, default_value = "app-data-folder")]
        space: SpaceArg,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Show file metadata.
    Get { file_id: String },

    /// Print file content.
    GetData {
        file_id: String,

        /// Write the content here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace or extend file content.
    Update {
        file_id: String,

        #[command(flatten)]
        content: ContentArgs,

        /// Append to the current content instead of replacing it.
        #[arg(short, long)]
        append: bool,

        /// Content type of the new content.
        #[arg(short, long)]
        mime_type: Option<String>,
    },

    /// Permanently delete a file.
    Delete { file_id: String },
}

#[derive(clap::Args)]
#[group(multiple = false)]
struct ContentArgs {
    /// Literal content.
    #[arg(short, long)]
    text: Option<String>,

    /// Read content from a local file.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl ContentArgs {
    /// Content to send; a timestamp line when neither flag is given.
    async fn read(&self) -> Result<Vec<u8>> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone().into_bytes()),
            (None, Some(path)) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            (None, None) => Ok(format!("Updated at {}", Utc::now().to_rfc3339()).into_bytes()),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SpaceArg {
    Drive,
    AppDataFolder,
}

impl From<SpaceArg> for Space {
    fn from(arg: SpaceArg) -> Self {
        match arg {
            SpaceArg::Drive => Space::Drive,
            SpaceArg::AppDataFolder => Space::AppDataFolder,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    init_logging(
        LoggingConfig::default()
            .with_format(cli.log_format.into())
            .with_level(level)
            .with_target(false),
    )
    .context("Failed to initialise logging")?;

    let client = build_client(&cli)?;
    let mut events = client.subscribe();

    let result = run(&client, cli.command).await;
    while let Some(Ok(event)) = events.try_recv() {
        log_event(&event);
    }
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

fn log_event(event: &CoreEvent) {
    match event.severity() {
        EventSeverity::Error => error!(?event, "{}", event.description()),
        EventSeverity::Info => info!(?event, "{}", event.description()),
        EventSeverity::Debug => debug!(?event, "{}", event.description()),
    }
}

fn build_client(cli: &Cli) -> Result<GoogleDriveClient> {
    let mut builder = ClientConfig::builder()
        .client_id(&cli.client_id)
        .auth_scope(&cli.auth_scope)
        .redirect_uri(&cli.redirect_uri);
    if let Some(secret) = &cli.client_secret {
        builder = builder.client_secret(secret);
    }

    let config = builder.build().context("Invalid client configuration")?;
    Ok(GoogleDriveClient::new(config))
}

async fn run(client: &GoogleDriveClient, command: Commands) -> Result<()> {
    match command {
        Commands::SignIn => cmd_sign_in(client).await,
        Commands::SignOut => {
            client.auth().sign_out().await;
            println!("Signed out");
            Ok(())
        }
        Commands::Status => {
            let state = client.auth().state().await;
            println!("{}", state);
            Ok(())
        }
        Commands::List {
            query,
            space,
            page_size,
            page_token,
        } => {
            let mut params = ListFilesParams::new().query(query).space(space.into());
            if let Some(size) = page_size {
                params = params.page_size(size);
            }
            if let Some(token) = page_token {
                params = params.page_token(token);
            }
            cmd_list(client, params).await
        }
        Commands::Create {
            name,
            mime_type,
            parent,
            space,
            content,
        } => {
            let mut params =
                CreateFileParams::new(name, mime_type, content.read().await?).space(space.into());
            for id in parent {
                params = params.parent(id);
            }
            let file = client.drive().create_file(params).await?;
            print_file(&file);
            Ok(())
        }
        Commands::Get { file_id } => {
            let file = client.drive().get_file(&file_id).await?;
            print_file(&file);
            Ok(())
        }
        Commands::GetData { file_id, output } => {
            let data = client.drive().get_file_data(&file_id).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &data)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(bytes = data.len(), path = %path.display(), "Saved file content");
                }
                None => println!("{}", String::from_utf8_lossy(&data)),
            }
            Ok(())
        }
        Commands::Update {
            file_id,
            content,
            append,
            mime_type,
        } => {
            let mut data = content.read().await?;
            if append {
                let mut existing = client.drive().get_file_data(&file_id).await?.to_vec();
                existing.push(b'\n');
                existing.append(&mut data);
                data = existing;
            }

            let mut params = UpdateFileParams::new(file_id, data);
            if let Some(mime_type) = mime_type {
                params = params.mime_type(mime_type);
            }
            let file = client.drive().update_file(params).await?;
            print_file(&file);
            Ok(())
        }
        Commands::Delete { file_id } => {
            client.drive().delete_file(&file_id).await?;
            println!("Deleted {}", file_id);
            Ok(())
        }
    }
}

async fn cmd_sign_in(client: &GoogleDriveClient) -> Result<()> {
    let url = client.auth().sign_in().await?;

    println!("If the browser did not open, visit:\n\n  {}\n", url);
    println!("After granting access, paste the redirect URL here:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read redirect URL")?;
    let redirect_url = line.trim();
    if redirect_url.is_empty() {
        bail!("No redirect URL given");
    }

    client.auth().handle_redirect(redirect_url).await?;
    println!("Signed in");
    Ok(())
}

async fn cmd_list(client: &GoogleDriveClient, params: ListFilesParams) -> Result<()> {
    let list = client.drive().list_files(params).await?;

    if list.files.is_empty() {
        println!("No files");
    }
    for file in &list.files {
        print_file(file);
    }
    if let Some(token) = list.next_page_token {
        println!("More results: --page-token {}", token);
    }
    Ok(())
}

fn print_file(file: &File) {
    let modified = file
        .modified_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {}  {}  {}",
        file.id,
        file.name,
        file.mime_type.as_deref().unwrap_or("-"),
        modified
    );
}
