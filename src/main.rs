use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

use civic_desk::commands;
use civic_desk::config::DeskConfig;
use civic_desk::credential::FileCredentialStore;
use civic_desk::dashboard::Dashboard;
use civic_desk::geo::{Coordinates, Locator};
use civic_desk::logging::{self, LogFormat};
use civic_desk::models::{IssueStatus, StatusFilter};
use civic_desk::{ApiClient, HttpTransport};

use civic_desk::commands::submit::SubmitArgs;

#[derive(Parser)]
#[command(name = "civic-desk")]
#[command(about = "Report city issues and work them from the admin desk")]
#[command(version)]
struct Cli {
    /// Desk server URL (overrides the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Debug logging (CIVIC_DESK_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// File a new issue report
    Submit {
        /// Issue description
        description: String,
        /// Your name (defaults to "Citizen")
        #[arg(short, long, default_value = "")]
        name: String,
        /// How to reach you
        #[arg(short, long, default_value = "")]
        contact: String,
        /// District
        #[arg(short, long, default_value = "")]
        district: String,
        /// Category (roads, lighting, ...)
        #[arg(short = 'k', long, default_value = "")]
        category: String,
        /// Address or landmark
        #[arg(short, long, default_value = "")]
        location: String,
        /// Coordinates as "lat, lon"
        #[arg(long, conflicts_with = "locate")]
        coords: Option<Coordinates>,
        /// Ask the configured location command for a fix
        #[arg(long)]
        locate: bool,
        /// Attach a photo, video or other file (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
    },

    /// List the districts and categories the desk knows
    Catalog,

    /// Check that the desk server is reachable
    Health,

    /// Admin dashboard commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Check and remember the admin secret
    Login {
        /// Admin secret (prompted for when omitted)
        #[arg(env = "CIVIC_DESK_ADMIN_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Forget the stored admin secret
    Logout,

    /// List issues
    List {
        /// Filter by status (all, new, in-progress, done, rejected)
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
    },

    /// Show issue details and attachments
    Show {
        /// Issue ID
        id: i64,
    },

    /// Change an issue's status
    Status {
        /// Issue ID
        id: i64,
        /// New status (new, in-progress, done, rejected)
        status: IssueStatus,
        /// Comment sent along with the change
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Add a comment to an issue
    Comment {
        /// Issue ID
        id: i64,
        /// Comment text
        text: String,
    },

    /// Download issues for a period as a spreadsheet
    Export {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: String,
        /// Print the URL instead of opening a browser
        #[arg(long)]
        print: bool,
    },

    /// Interactive dashboard session
    Shell,
}

fn load_config(base_url: Option<&str>) -> Result<DeskConfig> {
    let config = DeskConfig::load_with_dotenv().context("Failed to load configuration")?;
    match base_url {
        Some(url) => config.with_base_url(url).context("Invalid --base-url"),
        None => Ok(config),
    }
}

fn client_for(config: &DeskConfig) -> Result<ApiClient<HttpTransport>> {
    let transport = HttpTransport::new(&config.base_url).context("Failed to create HTTP client")?;
    Ok(ApiClient::new(transport).with_labels(config.status_labels))
}

fn open_dashboard(config: &DeskConfig) -> Result<Dashboard<FileCredentialStore>> {
    let store = config
        .credential_store()
        .context("Cannot locate the admin secret file; set credential_path")?;
    Ok(Dashboard::restore(store))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.verbose)?;

    let config = load_config(cli.base_url.as_deref())?;
    let client = client_for(&config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Submit {
            description,
            name,
            contact,
            district,
            category,
            location,
            coords,
            locate,
            files,
        } => {
            let locator = config.geo.locator();
            if locate && locator.is_none() {
                tracing::warn!("--locate given but no geo.command is configured");
            }
            let args = SubmitArgs {
                name,
                contact,
                district,
                category,
                description,
                location,
                coordinates: coords,
                use_my_location: locate,
                files,
            };
            commands::submit::run(
                &client,
                args,
                locator.as_ref().map(|l| l as &dyn Locator),
                &config.geo.options(),
                &mut out,
            )
        }

        Commands::Catalog => commands::catalog::run(&client, &mut out),

        Commands::Health => commands::health::run(&client, &mut out),

        Commands::Admin { command } => {
            let mut dash = open_dashboard(&config)?;
            match command {
                AdminCommands::Login { secret } => {
                    let stdin = io::stdin();
                    commands::login::run(&mut dash, &client, secret.as_deref(), &mut stdin.lock(), &mut out)
                }
                AdminCommands::Logout => commands::logout::run(&mut dash, &mut out),
                AdminCommands::List { status } => commands::list::run(&mut dash, &client, status, &mut out),
                AdminCommands::Show { id } => commands::show::run(&mut dash, &client, id, &mut out),
                AdminCommands::Status { id, status, comment } => {
                    commands::status::run(&mut dash, &client, id, status, comment.as_deref(), &mut out)
                }
                AdminCommands::Comment { id, text } => {
                    commands::comment::run(&mut dash, &client, id, &text, &mut out)
                }
                AdminCommands::Export { from, to, print } => {
                    commands::export::run(&mut dash, &client, &from, &to, print, &mut out)
                }
                AdminCommands::Shell => {
                    let stdin = io::stdin();
                    commands::shell::run(&mut dash, &client, &mut stdin.lock(), &mut out)
                }
            }
        }
    }
}
