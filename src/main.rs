use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use unitrack::application::bootstrap;
use unitrack::config::{LogFormat, Settings};
use unitrack::infrastructure::log_messages;
use unitrack::Application;

#[derive(Parser)]
#[command(name = "unitrack")]
#[command(about = "University attendance journal service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Apply migrations and seed the defaults, then exit
    Migrate,

    /// Create the rector account with a forced password change
    CreateRector {
        #[arg(long, default_value = "rector")]
        username: String,

        #[arg(long, default_value = "123456", env = "RECTOR_PASSWORD")]
        password: String,
    },

    /// Recompute every student's accumulated absence hours from the journal
    RecalculateAbsences,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::new().context("failed to load settings")?;
    init_tracing(&settings);
    info!("{}", log_messages::configuration::CONFIG_LOADED);
    if settings.auth.jwt_secret == Settings::DEVELOPMENT_SECRET {
        warn!("{}", log_messages::configuration::DEFAULT_SECRET_IN_USE);
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!("{}", log_messages::application::STARTING);
            let app = Application::new(settings).await?;
            app.run().await?;
        }
        Commands::Migrate => {
            settings.database.run_migrations = true;
            Application::new(settings).await?;
        }
        Commands::CreateRector { username, password } => {
            let app = Application::new(settings).await?;
            if let Some(rector) = bootstrap::create_rector(app.state(), &username, &password).await? {
                println!("rector '{}' created; a password change is required at first login", rector.username);
            }
        }
        Commands::RecalculateAbsences => {
            let app = Application::new(settings).await?;
            let updated = bootstrap::recalculate_absences(app.state()).await?;
            println!("recalculated absence hours for {updated} students");
        }
    }

    Ok(())
}
