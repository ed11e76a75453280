use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use warden_jwt::Permission;

mod commands;

use commands::token::{IssueOptions, ManagerOptions};

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Issue and verify tenant-scoped JWTs")]
struct Cli {
    #[command(flatten)]
    manager: ManagerOptions,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a signed token for a subject.
    Issue(IssueOptions),

    /// Verify a token's signature and expiry, then print its claims.
    Verify {
        /// The token, or a path to a file containing it
        token: String,
    },

    /// Print a token's claims without verifying it (no secret needed).
    Inspect {
        /// The token, or a path to a file containing it
        token: String,
    },

    /// Verify a token and check a tenant role and/or permission.
    Check {
        /// The token, or a path to a file containing it
        token: String,

        /// Tenant id to check against
        #[arg(long)]
        tenant: String,

        /// Required role in the tenant
        #[arg(long)]
        role: Option<String>,

        /// Required permission as "action:resource"
        #[arg(long)]
        permission: Option<Permission>,
    },

    /// Signing secret management
    Secret {
        #[command(subcommand)]
        cmd: SecretCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SecretCommand {
    /// Generate a random HMAC signing secret
    Generate {
        /// Secret size in bytes
        #[arg(long, default_value_t = 32)]
        bytes: usize,

        /// Write the secret to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Issue(opts) => {
            let manager = commands::token::build_manager(&cli.manager)?;
            commands::token::issue(&manager, opts)?
        }
        Command::Verify { token } => {
            let manager = commands::token::build_manager(&cli.manager)?;
            commands::token::verify(&manager, &token)?
        }
        Command::Inspect { token } => commands::token::inspect(&token)?,
        Command::Check {
            token,
            tenant,
            role,
            permission,
        } => {
            let manager = commands::token::build_manager(&cli.manager)?;
            commands::token::check(
                &manager,
                &token,
                &tenant,
                role.as_deref(),
                permission.as_ref(),
            )?
        }
        Command::Secret { cmd } => match cmd {
            SecretCommand::Generate { bytes, output } => {
                commands::secret::generate(bytes, output)?
            }
        },
    }

    Ok(())
}
