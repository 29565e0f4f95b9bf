//! `opm`: OpenProject MCP server.
//!
//! - `opm serve`: JSON-RPC over stdio against OpenProject (or `--demo` data)
//! - `opm config show|check`: inspect and validate the resolved configuration
//! - `opm templates list|init`: manage report templates

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use opm_config::{load_config, validate_config, ConfigOverrides, LoadOptions, LoadedConfig};
use opm_core::backend::{InMemoryBackend, OpenProjectClient, WorkItemBackend};
use opm_core::exit_codes::ExitCode;
use opm_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use opm_core::mcp::{McpServer, ServerContext};
use opm_report::{EngineConfig, FileTemplateStore, ReportEngine};

/// OpenProject MCP server: projects, work packages and reports for AI agents
#[derive(Parser)]
#[command(name = "opm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to the TOML config file
    #[arg(long, global = true, env = "OPM_CONFIG")]
    config: Option<PathBuf>,

    /// Report template directory
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Include internal error details in protocol responses
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve(ServeArgs),

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage report templates
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Serve a built-in sample project instead of a live OpenProject
    #[arg(long)]
    demo: bool,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration as JSON (API key masked)
    Show,
    /// Validate the configuration; exits 2 when it is not usable
    Check,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List stored report templates
    List,
    /// Write the default templates into an empty template directory
    Init,
}

fn main() {
    let cli = Cli::parse();

    let loaded = match load(&cli.global) {
        Ok(loaded) => loaded,
        Err(message) => {
            eprintln!("opm: {message}");
            std::process::exit(ExitCode::ConfigError.as_i32());
        }
    };

    let file_level = loaded
        .config
        .log_level
        .as_deref()
        .and_then(|l| l.parse::<LogLevel>().ok());
    let log_config = LogConfig::from_env(cli.global.log_level.or(file_level), cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Serve(args) => run_serve(&loaded, args),
        Commands::Config { command } => match command {
            ConfigCommands::Show => run_config_show(&loaded),
            ConfigCommands::Check => run_config_check(&loaded),
        },
        Commands::Templates { command } => run_templates(&loaded, command),
    };

    std::process::exit(exit_code.as_i32());
}

fn load(global: &GlobalOpts) -> Result<LoadedConfig, String> {
    let options = LoadOptions {
        config_path: global.config.clone(),
        load_dotenv: true,
        overrides: ConfigOverrides {
            templates_dir: global.templates_dir.clone(),
            debug: global.debug,
            request_timeout: None,
        },
    };
    load_config(&options).map_err(|e| e.to_string())
}

fn run_serve(loaded: &LoadedConfig, args: &ServeArgs) -> ExitCode {
    let config = loaded.config.clone();

    let backend: Arc<dyn WorkItemBackend> = if args.demo {
        info!("serving demo data from the in-memory backend");
        Arc::new(InMemoryBackend::demo(Utc::now()))
    } else {
        let problems = validate_config(&config);
        if !problems.is_empty() {
            for problem in &problems {
                error!(code = problem.code(), "{problem}");
            }
            eprintln!("opm: invalid configuration, run `opm config check` for details");
            return ExitCode::ConfigError;
        }
        match OpenProjectClient::from_config(&config) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                eprintln!("opm: {e}");
                return ExitCode::ConfigError;
            }
        }
    };

    let templates = FileTemplateStore::new(config.templates_dir());
    if let Err(e) = templates.ensure_defaults() {
        error!(error = %e, dir = %templates.dir().display(), "could not create default report templates");
    }

    let ctx = ServerContext::new(
        backend,
        ReportEngine::new(EngineConfig::default()),
        templates,
        config,
    );
    let mut server = match McpServer::new(ctx) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("opm: {e}");
            return ExitCode::RuntimeError;
        }
    };

    match server.run_stdio() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            error!(error = %e, "stdio transport failed");
            ExitCode::RuntimeError
        }
    }
}

fn run_config_show(loaded: &LoadedConfig) -> ExitCode {
    let doc = serde_json::json!({
        "source": loaded.source.to_string(),
        "path": loaded.path.as_ref().map(|p| p.display().to_string()),
        "templates_dir": loaded.config.templates_dir().display().to_string(),
        "config": loaded.config.redacted(),
    });
    match serde_json::to_string_pretty(&doc) {
        Ok(text) => {
            println!("{text}");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("opm: {e}");
            ExitCode::RuntimeError
        }
    }
}

fn run_config_check(loaded: &LoadedConfig) -> ExitCode {
    let problems = validate_config(&loaded.config);
    if problems.is_empty() {
        println!("configuration OK ({})", loaded.source);
        return ExitCode::Success;
    }
    for problem in &problems {
        eprintln!("[{}] {problem}", problem.code());
    }
    ExitCode::ConfigError
}

fn run_templates(loaded: &LoadedConfig, command: &TemplateCommands) -> ExitCode {
    let store = FileTemplateStore::new(loaded.config.templates_dir());
    match command {
        TemplateCommands::List => match store.list() {
            Ok(summaries) if summaries.is_empty() => {
                println!("no templates in {}", store.dir().display());
                ExitCode::Success
            }
            Ok(summaries) => {
                for s in summaries {
                    println!("{}\t{}\t{}\t{}", s.id, s.kind, s.version, s.name);
                }
                ExitCode::Success
            }
            Err(e) => {
                eprintln!("opm: {e}");
                ExitCode::RuntimeError
            }
        },
        TemplateCommands::Init => match store.ensure_defaults() {
            Ok(n) => {
                println!("wrote {n} default template(s) to {}", store.dir().display());
                ExitCode::Success
            }
            Err(e) => {
                eprintln!("opm: {e}");
                ExitCode::RuntimeError
            }
        },
    }
}
