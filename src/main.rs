use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use relaybot::application::messaging::Dispatcher;
use relaybot::domain::entities::InboundEvent;
use relaybot::domain::traits::Bot;
use relaybot::infrastructure::adapters::ConsoleAdapter;
use relaybot::infrastructure::config::Config;
use relaybot::infrastructure::diagnostics::HttpDiagnostics;
use relaybot::infrastructure::plugins::{ManifestLoader, PluginLoader, PluginRegistry};
use relaybot::infrastructure::storage::MemoryStore;
use relaybot::plugins::builtin_catalog;

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(about = "Plugin dispatch pipeline for chat bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Record store snapshot (JSON)
    #[arg(short, long, default_value = "relaybot-db.json")]
    store: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console transport
    Run {
        /// Sender id for console input
        #[arg(long, default_value = "15550000001")]
        sender: String,

        /// Chat id for console input
        #[arg(long, default_value = "console")]
        chat: String,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List plugins and their manifests
    Plugins,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { sender, chat } => {
            let config = load_config(&cli.config);
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to start runtime: {}", e);
                    std::process::exit(1);
                }
            };
            rt.block_on(run_console(config, cli.store, sender, chat));
        }
        Commands::Version => {
            println!("relaybot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig { output } => {
            init_config(output.as_deref());
        }
        Commands::Plugins => {
            list_plugins(&load_config(&cli.config));
        }
    }
}

fn load_config(path: &str) -> Config {
    if Path::new(path).exists() {
        match Config::load(path) {
            Ok(mut config) => {
                config.apply_env();
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Config::load_env()
            }
        }
    } else {
        Config::load_env()
    }
}

fn build_registry(config: &Config) -> (Arc<PluginRegistry>, Arc<ManifestLoader>) {
    let plugin_dir = config.plugins.directory.clone();
    let dir = plugin_dir.exists().then_some(plugin_dir);
    let loader = Arc::new(ManifestLoader::new(dir, builtin_catalog()));
    let registry = Arc::new(PluginRegistry::with_loader(loader.clone()));
    (registry, loader)
}

fn list_plugins(config: &Config) {
    let (_, loader) = build_registry(config);
    for name in loader.available() {
        match loader.load(&name) {
            Ok(plugin) => {
                let kind = if plugin.kind.is_command() { "command" } else { "listener" };
                let state = if plugin.disabled { " (disabled)" } else { "" };
                println!("{:<16} {:<9} {}{}", plugin.name, kind, plugin.help.join(", "), state);
            }
            Err(e) => println!("{:<16} error     {}", name, e),
        }
    }
}

async fn run_console(config: Config, store_path: PathBuf, sender: String, chat: String) {
    let store = match MemoryStore::open(&store_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open store {}: {}", store_path.display(), e);
            return;
        }
    };

    let (registry, _) = build_registry(&config);
    if config.plugins.auto_load {
        for (name, e) in registry.load_all() {
            tracing::warn!("Plugin {} not loaded: {}", name, e);
        }
    }

    let mut console = ConsoleAdapter::new();
    if !config.bot.id.is_empty() {
        console = console.with_id(config.bot.id.clone());
    }
    let bot = Arc::new(console);
    let diagnostics = HttpDiagnostics::from_config(&config.diagnostics);
    let mut dispatcher = Dispatcher::new(config, registry.clone(), store.clone(), bot.clone());
    if let Some(sink) = diagnostics {
        dispatcher = dispatcher.with_diagnostics(Arc::new(sink));
    }

    let info = bot.bot_info();
    tracing::info!("Bot started: {} ({} plugins)", info.name, registry.len());
    println!("Type a message, or :reload <plugin>, :unload <plugin>, :plugins, :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Console control commands
        if let Some(control) = input.strip_prefix(':') {
            let mut parts = control.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("quit"), _) => break,
                (Some("plugins"), _) => println!("{}", registry.names().join(", ")),
                (Some("reload"), Some(name)) => match registry.reload(name) {
                    Ok(()) => println!("Reloaded {}", name),
                    Err(e) => println!("Reload failed: {}", e),
                },
                (Some("unload"), Some(name)) => {
                    if let Err(e) = registry.unload(name) {
                        println!("{}", e);
                    }
                }
                _ => println!("Unknown control command: {}", input),
            }
            continue;
        }

        let report = dispatcher.dispatch(InboundEvent::new(&chat, &sender, input)).await;
        tracing::debug!("{:?}", report);

        if let Err(e) = store.flush() {
            tracing::warn!("Failed to flush store: {}", e);
        }
    }

    if let Err(e) = store.flush() {
        tracing::error!("Failed to flush store: {}", e);
    }
    tracing::info!("Bot stopped");
}

fn init_config(output: Option<&Path>) {
    let yaml = match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => yaml,
        Err(e) => {
            tracing::error!("Failed to render config: {}", e);
            return;
        }
    };
    match output {
        Some(path) => match std::fs::write(path, &yaml) {
            Ok(()) => println!("Wrote {}", path.display()),
            Err(e) => tracing::error!("Failed to write {}: {}", path.display(), e),
        },
        None => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
    }
}
