use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mealboard::api;
use mealboard::config::{BackendKind, Config};

#[derive(Parser)]
#[command(name = "mealboard")]
#[command(about = "Recipes, a meal calendar and scaled shopping lists")]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides for the storage settings read from the environment.
#[derive(Args)]
struct StorageArgs {
    /// Directory holding the recipe and meal-plan documents
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the shopping list for a date range
    ShoppingList {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last day (YYYY-MM-DD), inclusive
        #[arg(long)]
        end: Option<String>,
    },
    /// List favorite recipes
    Favorites,
}

/// Initialize tracing with output to stderr (for one-shot commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(
        |_| "mealboard=debug,mealboard_core=debug,tower_http=debug".into(),
    ));

    if use_stderr {
        // Keep stdout clean for the printed list
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let planner = config.open_planner()?;

    let app = match &config.cors_origins {
        Some(origins) => api::create_router_with_origins(planner, origins)?,
        None => api::create_router(planner),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        "mealboard listening on http://{} ({:?} storage in {})",
        config.bind_addr(),
        config.backend,
        config.data_dir.display()
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let mut config = Config::from_env()?;
    if let Some(data_dir) = cli.storage.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(backend) = cli.storage.backend {
        config.backend = backend;
    }

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await?;
        }
        Some(Commands::ShoppingList { start, end }) => {
            let planner = config.open_planner()?;
            let list = planner
                .shopping()
                .for_range(start.as_deref(), end.as_deref())?;

            if !list.is_filtered() {
                eprintln!("(no date filter applied: {:?})", list.window);
            }
            for line in &list.lines {
                println!("{:>10.2} {:<8} {}", line.quantity, line.unit, line.item);
            }
        }
        Some(Commands::Favorites) => {
            let planner = config.open_planner()?;
            for favorite in planner.favorites().list()? {
                println!("{}  {}", favorite.id, favorite.title);
            }
        }
        None => serve(config).await?,
    }

    Ok(())
}
