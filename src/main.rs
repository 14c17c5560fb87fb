use anyhow::Context;
use atrium::chat::{ChatOrchestrator, HealthState};
use atrium::config::AtriumConfig;
use atrium::store::InMemoryPortalStore;
use atrium::tier::{apply_policy_str, resolve_tier};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "atrium", about = "Atrium AI orchestration core", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "ATRIUM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the configured model backend and report health
    Health,
    /// Resolve a purpose and tenant policy to an effective tier
    Tiers {
        /// Purpose string to resolve (e.g. staff_qa)
        #[arg(long, default_value = "staff_qa")]
        purpose: String,
        /// Tenant tier policy (all, standard_max, basic_only)
        #[arg(long, default_value = "all")]
        policy: String,
    },
    /// Write an example configuration file
    ConfigInit {
        /// Output path
        #[arg(long, default_value = "atrium.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AtriumConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_env_overrides();
    atrium::logging::init(&config.logging);

    match cli.command {
        Commands::Health => {
            // Health probing needs no real stores; the probe only touches
            // the backend factory and the network.
            let orchestrator =
                ChatOrchestrator::with_shared_store(config, Arc::new(InMemoryPortalStore::new()));
            let report = orchestrator.health_check().await;

            println!("status:   {:?}", report.status);
            println!("provider: {}", report.provider);
            println!("model:    {}", report.model);
            if let Some(latency) = report.latency_ms {
                println!("latency:  {latency}ms");
            }
            println!("message:  {}", report.message);

            match report.status {
                HealthState::Healthy => Ok(()),
                HealthState::Degraded => std::process::exit(1),
                HealthState::Unhealthy => std::process::exit(2),
            }
        }
        Commands::Tiers { purpose, policy } => {
            let resolved = resolve_tier(&purpose);
            let effective = apply_policy_str(resolved, &policy);
            println!("purpose:        {purpose}");
            println!("resolved tier:  {resolved}");
            println!("policy:         {policy}");
            println!("effective tier: {effective}");
            Ok(())
        }
        Commands::ConfigInit { output } => {
            if output.exists() {
                anyhow::bail!("refusing to overwrite existing file: {}", output.display());
            }
            std::fs::write(&output, EXAMPLE_CONFIG)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("wrote {}", output.display());
            Ok(())
        }
    }
}

const EXAMPLE_CONFIG: &str = r#"# Atrium AI orchestration configuration

[provider]
# anthropic | openai | gateway
provider = "anthropic"

[provider.anthropic]
# api_key = "..."           # or set ATRIUM_ANTHROPIC_API_KEY

[provider.gateway]
# base_url = "http://ai-gateway.internal:8080"

[tiers.basic]
model = ""                  # e.g. "claude-3-5-haiku-latest"
max_tokens = 500
temperature = 0.3

[tiers.standard]
model = ""
max_tokens = 1000
temperature = 0.5

[tiers.premium]
model = ""
max_tokens = 4000
temperature = 0.7

[limits]
request_timeout_seconds = 30
max_tokens_ceiling = 8000

[logging]
level = "info"
format = "pretty"           # pretty | json
"#;
