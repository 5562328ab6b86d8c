use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "simx")]
#[command(about = "Simulated trading venue CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON and accounts
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the trading-time boundaries of an instrument on a trading day
    Sessions {
        /// Exchange catalog JSON (defaults to the shipped catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Instrument id, e.g. shfe.ru1901
        #[arg(long)]
        instrument: String,

        /// Trading day, YYYY-MM-DD
        #[arg(long)]
        day: String,
    },

    /// Replay ticks (and optional orders) through the configured accounts
    Replay {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Exchange catalog JSON; overrides the config's exchange_catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Tick CSV: update_time,trading_day,instrument,last_price,upper_limit,lower_limit
        #[arg(long)]
        ticks: PathBuf,

        /// Order CSV: time,account,action,order_ref,instrument,side,offset,price,volume
        #[arg(long)]
        orders: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience); silent when absent.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let (loaded, cfg) = simx_config::load_sim_trade_config(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            for acct in &cfg.accounts {
                println!(
                    "account id={} provider={} init_money={} views={}",
                    acct.id,
                    acct.provider,
                    acct.init_money()?,
                    acct.views.len()
                );
            }
        }

        Commands::Sessions {
            catalog,
            instrument,
            day,
        } => {
            let catalog = commands::load_catalog(catalog.as_deref())?;
            let out = commands::sessions::render(&catalog, &instrument, &day)?;
            print!("{out}");
        }

        Commands::Replay {
            config_paths,
            catalog,
            ticks,
            orders,
        } => {
            let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
            let (loaded, cfg) = simx_config::load_sim_trade_config(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);

            let catalog_path = catalog.or_else(|| cfg.exchange_catalog.clone());
            let catalog = commands::load_catalog(catalog_path.as_deref())?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let summary = commands::replay::run(
                &cfg,
                catalog,
                &ticks,
                orders.as_deref(),
                &mut out,
            )?;
            eprintln!(
                "replay_ok=true ticks={} orders={} session_faults={}",
                summary.ticks, summary.orders, summary.session_faults
            );
        }
    }

    Ok(())
}
