use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rule_engine_rs::config::Config;
use rule_engine_rs::error::{EngineError, RuleError};
use rule_engine_rs::loader::RuleSetLoader;
use rule_engine_rs::rules::{self, Node, Record};
use rule_engine_rs::server;
use rule_engine_rs::service::RuleService;

use serde_json::{json, Value};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the tree for a single rule
    Parse {
        /// The rule string, e.g. "age > 30 AND department = 'Sales'"
        #[arg(short, long)]
        rule: String,
    },
    /// Combine several rules under AND
    Combine {
        /// Rule strings, combined in the given order
        #[arg(short, long = "rule")]
        rules: Vec<String>,

        /// YAML rule set file
        #[arg(short, long, conflicts_with = "rules")]
        file: Option<PathBuf>,
    },
    /// Evaluate a rule against a JSON record
    Evaluate {
        /// Rule string to build and evaluate
        #[arg(short, long, conflicts_with = "ast")]
        rule: Option<String>,

        /// JSON file holding a tree mapping
        #[arg(short, long)]
        ast: Option<PathBuf>,

        /// Record as a JSON object, e.g. '{"age": 35}'
        #[arg(short, long)]
        data: String,
    },
    /// Run the HTTP server
    Serve {
        /// Bind address (overrides RULE_ENGINE_HOST)
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port (overrides RULE_ENGINE_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON rule store file (overrides RULE_ENGINE_STORE)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Parse { rule } => {
            let ast = rules::build(&rule);
            println!("{}", serde_json::to_string_pretty(&ast)?);
        }
        Commands::Combine { rules: rule_strings, file } => {
            let rule_strings = match file {
                Some(path) => {
                    let set = RuleSetLoader::load(&path)?;
                    log::info!("Loaded rule set '{}' from {}", set.name, path.display());
                    set.rules
                }
                None => rule_strings,
            };

            let combined = rules::combine(&rule_strings).ok_or(RuleError::EmptyRuleSet)?;
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
        Commands::Evaluate { rule, ast, data } => {
            let node = match (rule, ast) {
                (Some(rule), _) => rules::build(&rule),
                (None, Some(path)) => {
                    let content = std::fs::read_to_string(&path)?;
                    Node::from_json_str(&content)?
                }
                (None, None) => return Err("either --rule or --ast is required".into()),
            };

            let record: Record = match serde_json::from_str(&data)? {
                Value::Object(map) => map,
                _ => return Err(EngineError::other("--data must be a JSON object").into()),
            };

            let eligible = rules::evaluate(&node, &record)?;
            println!("{}", json!({ "is_eligible": eligible }));
        }
        Commands::Serve { host, port, store } => {
            let config = Config::from_env()?.with_overrides(host, port, store);
            let service = RuleService::new(config.open_store().await?);
            server::serve(config.addr(), service).await?;
        }
    }

    Ok(())
}
