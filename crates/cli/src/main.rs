//! `servicehub`: terminal front end for the marketplace client core.

mod app;
mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use servicehub_config::Settings;
use servicehub_models::{BookingStatus, UserType};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "servicehub", about = "ServiceHub marketplace client")]
struct Cli {
    /// Override `api.base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print raw JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and keep the token for later commands.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SERVICEHUB_PASSWORD")]
        password: String,
    },

    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SERVICEHUB_PASSWORD")]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, value_enum, default_value = "customer")]
        role: RoleArg,
        /// UK postcode, e.g. "SW13 9WT".
        #[arg(long, default_value = "")]
        postcode: String,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Sign out and forget the token.
    Logout,

    /// Show the signed-in profile.
    Whoami,

    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },

    /// Stats for the signed-in user's role.
    Dashboard,

    Bookings {
        #[command(subcommand)]
        action: BookingAction,
    },

    /// Admin: worker listing and verification.
    Workers {
        #[command(subcommand)]
        action: WorkerAction,
    },

    Pay {
        #[command(subcommand)]
        action: PayAction,
    },
}

#[derive(Subcommand, Debug)]
enum NotificationAction {
    List {
        #[arg(long)]
        unread: bool,
    },
    Read {
        id: Uuid,
    },
    ReadAll,
    /// Keep polling and print the unread count as it changes.
    Watch {
        /// Stop after this many seconds.
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum BookingAction {
    List {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    Status {
        id: Uuid,
        #[arg(value_enum)]
        status: StatusArg,
    },
}

#[derive(Subcommand, Debug)]
enum WorkerAction {
    List {
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    Verify {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum PayAction {
    /// Start a hosted checkout for an offer and print its URL.
    Checkout { offer_id: Uuid },
    /// Report the URL the checkout redirected back to.
    Complete { return_url: String },
    Status { session_id: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RoleArg {
    Customer,
    Worker,
}

impl From<RoleArg> for UserType {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Customer => UserType::Customer,
            RoleArg::Worker => UserType::Worker,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusArg {
    Accepted,
    Declined,
    InProgress,
    Completed,
    Cancelled,
}

impl From<StatusArg> for BookingStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Accepted => BookingStatus::Accepted,
            StatusArg::Declined => BookingStatus::Declined,
            StatusArg::InProgress => BookingStatus::InProgress,
            StatusArg::Completed => BookingStatus::Completed,
            StatusArg::Cancelled => BookingStatus::Cancelled,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "servicehub_cli=info,servicehub_services=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(base_url) = cli.base_url {
        settings.api.base_url = base_url;
    }

    let app = app::App::new(settings, cli.json)?;
    commands::run(&app, cli.command).await
}
