//! Portfolio CLI - account, public form and admin moderation commands.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password may also come from PORTFOLIO_PASSWORD)
//! portfolio login --email admin@example.com --password admin123
//!
//! # Review pending testimonials and approve one
//! portfolio admin testimonials --filter pending
//! portfolio admin approve 5
//!
//! # Send a contact message
//! portfolio contact --name Ada --email ada@example.com --message "Hello"
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami` - Session management
//! - `contact`, `testimonials`, `testimonial submit` - Public site forms
//! - `admin ...` - Moderation (admin session required)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use portfolio_client::{ClientConfig, PortfolioClient};
use portfolio_core::{ContactMessageId, TestimonialFilter, TestimonialId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "portfolio")]
#[command(author, version, about = "Portfolio site client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with an email address or username
    Login {
        /// Email address or username
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "PORTFOLIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log into it
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// At least 6 characters
        #[arg(short, long, env = "PORTFOLIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Send a message through the contact form
    Contact {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Defaults to "General Inquiry"
        #[arg(short, long, default_value = "")]
        subject: String,

        #[arg(short, long)]
        message: String,
    },
    /// List approved testimonials
    Testimonials,
    /// Testimonial submission
    Testimonial {
        #[command(subcommand)]
        action: TestimonialAction,
    },
    /// Moderate testimonials and messages (admin only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum TestimonialAction {
    /// Submit a testimonial for review
    Submit {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, default_value = "")]
        company: String,

        #[arg(short, long, default_value = "")]
        position: String,

        #[arg(short, long)]
        message: String,

        /// Star rating from 1 to 5
        #[arg(short, long, default_value_t = 5)]
        rating: i64,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show dashboard statistics
    Dashboard,
    /// List testimonials
    Testimonials {
        /// `all`, `approved` or `pending`
        #[arg(short, long, default_value = "all")]
        filter: TestimonialFilter,
    },
    /// Approve a testimonial
    Approve { id: TestimonialId },
    /// Send a testimonial back to pending
    Hide { id: TestimonialId },
    /// Delete a testimonial
    Delete { id: TestimonialId },
    /// List contact messages
    Messages,
    /// Mark a contact message as in progress
    InProgress { id: ContactMessageId },
    /// Mark a contact message as replied
    Replied { id: ContactMessageId },
    /// List shop inquiries
    Inquiries,
    /// List registered users
    Users,
}

/// Initialize Sentry error tracking if a DSN is configured.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portfolio_client=info,portfolio=info".into());

    // JSON for log shipping, plain text at a terminal
    let json = std::env::var("PORTFOLIO_LOG_JSON").is_ok_and(|v| !v.is_empty() && v != "0");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration comes first so Sentry is live before tracing starts
    let config = ClientConfig::from_env();
    let sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = PortfolioClient::new(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&client, &email, &password).await?;
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::account::register(&client, &username, &email, &password).await?,
        Commands::Logout => commands::account::logout(&client)?,
        Commands::Whoami => commands::account::whoami(&client),
        Commands::Contact {
            name,
            email,
            subject,
            message,
        } => {
            commands::public::contact(&client, name, email, subject, message).await?;
        }
        Commands::Testimonials => commands::public::list_testimonials(&client).await?,
        Commands::Testimonial { action } => match action {
            TestimonialAction::Submit {
                name,
                email,
                company,
                position,
                message,
                rating,
            } => {
                let submission = commands::public::TestimonialDraft {
                    name,
                    email,
                    company,
                    position,
                    message,
                    rating,
                };
                commands::public::submit_testimonial(&client, submission).await?;
            }
        },
        Commands::Admin { action } => {
            let panel = commands::admin::open_panel(&client).await?;
            match action {
                AdminAction::Dashboard => commands::admin::dashboard(&panel)?,
                AdminAction::Testimonials { filter } => {
                    commands::admin::testimonials(&panel, filter)?;
                }
                AdminAction::Approve { id } => {
                    commands::admin::set_approval(&panel, id, true).await?;
                }
                AdminAction::Hide { id } => commands::admin::set_approval(&panel, id, false).await?,
                AdminAction::Delete { id } => commands::admin::delete(&panel, id).await?,
                AdminAction::Messages => commands::admin::messages(&panel)?,
                AdminAction::InProgress { id } => {
                    commands::admin::mark_in_progress(&panel, id).await?;
                }
                AdminAction::Replied { id } => commands::admin::mark_replied(&panel, id).await?,
                AdminAction::Inquiries => commands::admin::inquiries(&panel)?,
                AdminAction::Users => commands::admin::users(&panel)?,
            }
        }
    }
    Ok(())
}
