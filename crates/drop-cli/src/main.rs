use std::path::PathBuf;

use clap::{Parser, Subcommand};
use drop_cli::{TokenRequest, genkey, gentoken};
use drop_config::AuthConfig;

#[derive(Parser)]
#[command(name = "drop-admin")]
#[command(about = "Drop admin - key and token tools for the Drop API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new Ed25519 signing key as <kid>.pem
    Genkey {
        /// Folder the key is written to (defaults to DROP_AUTH_KEYS_FOLDER)
        #[arg(long)]
        keys_folder: Option<PathBuf>,

        /// Key id; a random UUID when omitted
        #[arg(long)]
        kid: Option<String>,
    },
    /// Sign a token for a subject with an existing key
    Gentoken {
        /// Key id to sign with
        #[arg(long)]
        kid: String,

        /// Subject (user id) the token is issued for
        #[arg(short = 's', long)]
        subject: String,

        /// Comma separated roles, e.g. ADMIN,USER
        #[arg(short = 'r', long, value_delimiter = ',', default_value = "USER")]
        roles: Vec<String>,

        /// Folder holding the keys (defaults to DROP_AUTH_KEYS_FOLDER)
        #[arg(long)]
        keys_folder: Option<PathBuf>,

        /// Token lifetime in seconds (defaults to DROP_AUTH_TOKEN_TTL_SECS)
        #[arg(long)]
        ttl_secs: Option<i64>,
    },
}

fn main() {
    drop_config::load_dotenv();
    let cli = Cli::parse();
    let config = AuthConfig::from_env();

    match cli.command {
        Commands::Genkey { keys_folder, kid } => {
            let folder = keys_folder.unwrap_or_else(|| config.keys_folder.clone());
            match genkey(&folder, kid.as_deref()) {
                Ok(path) => println!("wrote {}", path.display()),
                Err(e) => {
                    eprintln!("error generating key: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Gentoken {
            kid,
            subject,
            roles,
            keys_folder,
            ttl_secs,
        } => {
            let folder = keys_folder.unwrap_or_else(|| config.keys_folder.clone());
            let request = TokenRequest {
                kid,
                subject,
                roles,
                issuer: config.issuer.clone(),
                algorithm: config.algorithm.clone(),
                ttl_secs: ttl_secs.unwrap_or(config.token_ttl_secs),
            };
            match gentoken(&folder, &request) {
                Ok(token) => println!("{token}"),
                Err(e) => {
                    eprintln!("error generating token: {e:#}");
                    std::process::exit(1);
                }
            }
        }
    }
}
