//! # pact-cli
//!
//! Command-line interface for Pact on Chainweb.
//!
//! ## Usage
//!
//! ```bash
//! # Network
//! pact chains
//! pact cut
//! pact header --chain 0 <block-hash>
//!
//! # Execution
//! pact local --chain 0 '(coin.details "alice")'
//! pact send --chain 0 --sender alice '(free.hello.greet)'
//! pact poll --chain 0 <request-key>...
//! pact spv --chain 0 --target 1 <request-key>
//!
//! # Queries
//! pact module --chain 0 coin free.my-token
//! pact balance --module coin alice
//! pact tx --chain 0 <request-key>
//! pact mempool pending --chain 0
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use config::Config;
pub use error::CliError;
pub use output::Output;

use pact_sdk::Network;

/// Pact on Chainweb CLI
#[derive(Parser, Debug)]
#[command(name = "pact")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Network: mainnet, testnet, local or custom
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Service endpoint (selects the custom network)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// List the chains of the network
    Chains,
    /// Show the height of every chain
    Cut,
    /// Execute code without committing it
    Local {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Pact code
        code: String,
        /// JSON data readable via read-msg
        #[arg(long)]
        data: Option<String>,
    },
    /// Submit unsigned code
    Send {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Pact code
        code: String,
        /// JSON data readable via read-msg
        #[arg(long)]
        data: Option<String>,
        /// Gas payer
        #[arg(long)]
        sender: Option<String>,
    },
    /// Poll request keys
    Poll {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Request keys
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Describe modules
    Module {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Module names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Show a fungible account balance
    Balance {
        /// Token module
        #[arg(long, default_value = "coin")]
        module: String,
        /// Account name
        account: String,
        /// Chain id; every chain when omitted
        #[arg(long)]
        chain: Option<String>,
    },
    /// Show the command behind a request key
    Tx {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Request key
        request_key: String,
    },
    /// Show a block header
    Header {
        /// Chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Block hash
        hash: String,
    },
    /// Inspect the mempool
    #[command(subcommand)]
    Mempool(commands::mempool::MempoolCommand),
    /// Fetch an SPV proof
    Spv {
        /// Source chain id
        #[arg(long, default_value = "0")]
        chain: String,
        /// Target chain id
        #[arg(long)]
        target: String,
        /// Request key of the source step
        request_key: String,
    },
    /// Show or edit configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set network
        #[arg(long)]
        set_network: Option<Network>,
        /// Set custom service endpoint
        #[arg(long)]
        set_endpoint: Option<String>,
        /// Set custom network id
        #[arg(long)]
        set_network_id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config
    let mut config = Config::load();

    // Override network if provided
    if let Some(endpoint) = cli.endpoint {
        config.network = Network::Custom;
        config.endpoint = Some(endpoint);
    }
    if let Some(network) = cli.network {
        config.network = network;
    }

    let json = cli.json;
    let result = match cli.command {
        Commands::Chains => commands::query::chains(&config, json).await,
        Commands::Cut => commands::query::cut(&config, json).await,
        Commands::Local { chain, code, data } => {
            commands::exec::local(&config, &chain, &code, data.as_deref(), json).await
        }
        Commands::Send {
            chain,
            code,
            data,
            sender,
        } => {
            commands::exec::send(
                &config,
                &chain,
                &code,
                data.as_deref(),
                sender.as_deref(),
                json,
            )
            .await
        }
        Commands::Poll { chain, keys } => commands::exec::poll(&config, &chain, &keys, json).await,
        Commands::Module { chain, names } => {
            commands::query::module(&config, &chain, &names, json).await
        }
        Commands::Balance {
            module,
            account,
            chain,
        } => commands::query::balance(&config, &module, &account, chain.as_deref(), json).await,
        Commands::Tx { chain, request_key } => {
            commands::query::tx(&config, &chain, &request_key, json).await
        }
        Commands::Header { chain, hash } => {
            commands::query::header(&config, &chain, &hash, json).await
        }
        Commands::Mempool(cmd) => cmd.execute(&config, json).await,
        Commands::Spv {
            chain,
            target,
            request_key,
        } => commands::exec::spv(&config, &chain, &target, &request_key, json).await,
        Commands::Config {
            show,
            set_network,
            set_endpoint,
            set_network_id,
        } => handle_config(
            &mut config,
            show,
            set_network,
            set_endpoint,
            set_network_id,
            json,
        ),
    };

    if let Err(e) = result {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "error": e.to_string(),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn handle_config(
    config: &mut Config,
    show: bool,
    set_network: Option<Network>,
    set_endpoint: Option<String>,
    set_network_id: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let mut modified = false;

    if let Some(network) = set_network {
        config.network = network;
        modified = true;
    }

    if let Some(endpoint) = set_endpoint {
        config.endpoint = Some(endpoint);
        modified = true;
    }

    if let Some(network_id) = set_network_id {
        config.network_id = Some(network_id);
        modified = true;
    }

    if modified {
        // Reject settings the client could not use
        config.to_settings().resolve()?;
        let path = config.save()?;
        Output::new(json)
            .field("status", "saved")
            .field("path", &path.display().to_string())
            .message("Configuration saved")
            .print();
    } else if show {
        Output::new(json)
            .field("network", &config.network.to_string())
            .field("endpoint", config.endpoint.as_deref().unwrap_or_default())
            .field("network_id", config.network_id.as_deref().unwrap_or_default())
            .field_u64("gas_limit", config.gas_limit)
            .field("gas_price", &config.gas_price.to_string())
            .field_u64("ttl", config.ttl)
            .message(&format!(
                "Network: {}\nEndpoint: {}\nNetwork ID: {}\nGas Limit: {}\nGas Price: {}\nTTL: {}",
                config.network,
                config.endpoint.as_deref().unwrap_or("-"),
                config.network_id.as_deref().unwrap_or("-"),
                config.gas_limit,
                config.gas_price,
                config.ttl
            ))
            .print();
    } else {
        Output::new(json)
            .message(
                "Use --show to display config, or --set-network/--set-endpoint/--set-network-id to modify",
            )
            .print();
    }

    Ok(())
}
