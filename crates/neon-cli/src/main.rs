//! Command-line access to a Neon wallet data directory
//!
//! - Read and write records through the storage gateway
//! - List wallets and accounts
//! - Run the legacy wallet upgrade

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use neon_core::AccountStore;
use neon_storage::{
    AccountRepository, MasterKeySealer, MigrationCoordinator, MigrationOutcome,
    SecureStorageGateway,
};
use neon_wallet_service::{init_logging, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const PASSPHRASE_ENV: &str = "NEON_PASSPHRASE";

#[derive(Parser)]
#[command(name = "neon-cli")]
#[command(about = "Neon wallet storage tool", long_about = None)]
struct Cli {
    /// Data directory (overrides config and NEON_DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long, global = true, default_value = "neon.json")]
    config: PathBuf,

    /// Storage passphrase; read from NEON_PASSPHRASE when omitted
    #[arg(short, long, global = true)]
    passphrase: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a record as JSON
    Get {
        /// Record key
        key: String,
    },

    /// Store a JSON value under a key
    Set {
        /// Record key
        key: String,

        /// JSON value
        value: String,

        /// Seal the record even if the key is not sensitive
        #[arg(short, long)]
        sensitive: bool,
    },

    /// Remove a record
    Remove {
        /// Record key
        key: String,
    },

    /// List wallets and their accounts
    Accounts,

    /// Upgrade the legacy wallet record
    Migrate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    config.apply_env()?;
    if let Some(dir) = cli.data_dir {
        let dir = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir()?.join(dir)
        };
        config.data_dir = Some(dir);
    }
    init_logging(&config)?;

    let passphrase = match cli.passphrase {
        Some(p) => p,
        None => std::env::var(PASSPHRASE_ENV)
            .with_context(|| format!("Pass --passphrase or set {}", PASSPHRASE_ENV))?,
    };
    let gateway = open_gateway(&config, &passphrase)?;

    match cli.command {
        Commands::Get { key } => match gateway.read(&key)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => bail!("No record under {}", key),
        },
        Commands::Set {
            key,
            value,
            sensitive,
        } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("Value must be valid JSON")?;
            gateway.write(&key, &value, sensitive)?;
            info!(%key, "Record written");
        }
        Commands::Remove { key } => {
            if !gateway.remove(&key)? {
                bail!("No record under {}", key);
            }
        }
        Commands::Accounts => print_accounts(&gateway)?,
        Commands::Migrate => run_migration(gateway)?,
    }

    Ok(())
}

fn open_gateway(config: &ServiceConfig, passphrase: &str) -> anyhow::Result<Arc<SecureStorageGateway>> {
    let resolver = config.root_resolver();
    let root = resolver.resolve()?;
    let sealer = MasterKeySealer::open_with_passphrase(&root, passphrase)
        .context("Failed to derive storage key")?;
    let gateway = Arc::new(SecureStorageGateway::new(resolver, Arc::new(sealer)));
    info!(root = %gateway.root()?.display(), "Opened data directory");
    Ok(gateway)
}

fn print_accounts(gateway: &Arc<SecureStorageGateway>) -> anyhow::Result<()> {
    let state = AccountRepository::new(gateway.clone()).load()?;
    if state.wallets.is_empty() {
        println!("No wallets");
        return Ok(());
    }
    for wallet in &state.wallets {
        println!("{} ({:?}) {}", wallet.name, wallet.wallet_type, wallet.id);
        for account in state.accounts_for_wallet(&wallet.id) {
            println!(
                "  {:>3}  {:<10} {:<42} {} {}",
                account.order,
                account.chain.name(),
                account.address,
                account.color.hex_color(),
                account.name
            );
        }
    }
    Ok(())
}

fn run_migration(gateway: Arc<SecureStorageGateway>) -> anyhow::Result<()> {
    let repository = AccountRepository::new(gateway.clone());
    let store = Arc::new(AccountStore::with_state(repository.load()?));
    match MigrationCoordinator::new(gateway, store).run()? {
        MigrationOutcome::AlreadyCurrent => println!("Already upgraded"),
        MigrationOutcome::NoLegacyRecord => println!("No legacy wallet found"),
        MigrationOutcome::Upgraded {
            wallet_id,
            imported,
            skipped,
        } => {
            println!("Imported {} account(s), skipped {}", imported, skipped);
            if let Some(id) = wallet_id {
                println!("Legacy wallet id: {}", id);
            }
        }
    }
    Ok(())
}
