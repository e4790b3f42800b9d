//! Admin CLI for client, user, and session management.
//!
//! Client accounts and portal users are provisioned here rather than over
//! HTTP; the server only handles login and read traffic.

use clap::{Parser, Subcommand};

use bizpulse_core::password;

#[derive(Debug, Parser)]
#[command(name = "bizpulse-cli")]
#[command(about = "BizPulse portal admin interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations.
    Migrate,
    /// Manage client accounts.
    #[command(subcommand)]
    Client(ClientCommands),
    /// Manage portal users.
    #[command(subcommand)]
    User(UserCommands),
    /// Manage active sessions.
    #[command(subcommand)]
    Sessions(SessionCommands),
}

#[derive(Debug, Subcommand)]
enum ClientCommands {
    /// Create a client account.
    Create {
        #[arg(long)]
        name: String,
    },
    /// Grant a client access to a business.
    LinkBusiness {
        #[arg(long)]
        client_id: i64,
        #[arg(long)]
        business_id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommands {
    /// Create a portal user under a client account.
    Create {
        #[arg(long)]
        client_id: i64,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Replace a user's password.
    SetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Debug, Subcommand)]
enum SessionCommands {
    /// Delete a user's active session, forcing a fresh login.
    Revoke {
        #[arg(long)]
        user_id: i64,
    },
    /// Delete sessions belonging to deactivated users.
    Purge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let pool = bizpulse_db::connect_pool_from_env().await?;

    match cli.command {
        Commands::Migrate => {
            bizpulse_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        Commands::Client(cmd) => run_client_command(&pool, cmd).await?,
        Commands::User(cmd) => run_user_command(&pool, cmd).await?,
        Commands::Sessions(cmd) => run_session_command(&pool, cmd).await?,
    }

    Ok(())
}

async fn run_client_command(pool: &sqlx::PgPool, cmd: ClientCommands) -> anyhow::Result<()> {
    match cmd {
        ClientCommands::Create { name } => {
            let client = bizpulse_db::create_client(pool, &name).await?;
            println!("created client {} (id {})", client.name, client.id);
        }
        ClientCommands::LinkBusiness {
            client_id,
            business_id,
        } => {
            let business = bizpulse_db::get_business(pool, business_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("business {business_id} not found"))?;
            let changed = bizpulse_db::add_business_to_client(pool, client_id, business_id).await?;
            if changed {
                println!("linked {} to client {client_id}", business.name);
            } else {
                println!("client {client_id} already has access to {}", business.name);
            }
        }
    }
    Ok(())
}

async fn run_user_command(pool: &sqlx::PgPool, cmd: UserCommands) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create {
            client_id,
            email,
            password,
        } => {
            let salt = password::generate_salt();
            let hash = password::hash_password(&password, &salt);
            let user = bizpulse_db::create_client_user(pool, client_id, &email, &hash, &salt)
                .await?;
            println!("created user {} (id {})", user.email, user.id);
        }
        UserCommands::SetPassword { email, password } => {
            let salt = password::generate_salt();
            let hash = password::hash_password(&password, &salt);
            let updated = bizpulse_db::set_user_password(pool, &email, &hash, &salt).await?;
            if updated {
                println!("password updated for {email}");
            } else {
                anyhow::bail!("no active user with email {email}");
            }
        }
    }
    Ok(())
}

async fn run_session_command(pool: &sqlx::PgPool, cmd: SessionCommands) -> anyhow::Result<()> {
    match cmd {
        SessionCommands::Revoke { user_id } => {
            let deleted = bizpulse_db::delete_session(pool, user_id).await?;
            if deleted {
                println!("revoked session for user {user_id}");
            } else {
                println!("user {user_id} has no active session");
            }
        }
        SessionCommands::Purge => {
            let pruned = bizpulse_db::prune_inactive_user_sessions(pool).await?;
            println!("pruned {pruned} stale sessions");
        }
    }
    Ok(())
}
