use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use serde_json::json;
use soma_core::{SomaConfig, StateStore, SystemClock};
use soma_expression::{compose, SensoryInputs};
use soma_limbic::{BodySnapshot, BodySystem, Relief};
use soma_memory::JsonFileStore;
use soma_reasoning::{aggregate, GateDecision, ReflexGate, UrgencyInputs};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

/// Exit code for a blocked action.
const EXIT_BLOCKED: i32 = 3;
/// Exit code for a relief action that is unknown or unavailable.
const EXIT_UNAVAILABLE: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Needs & urgency simulation for a persona", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the TOML config (defaults to the user config dir, then ./soma.toml)
    #[arg(short, long, env = "SOMA_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Advance lifecycle, cycle and needs to now
    Tick,
    /// Print every stored record without advancing anything
    Status,
    /// Rank what matters most right now
    Urgency,
    /// Ask the reflex lock whether an action may run (exit 3 when blocked)
    Gate {
        /// Action name, e.g. `shop_buy` or `toilet_flush`
        action: String,
    },
    /// Compose the sensory context block
    Context(ContextArgs),
    /// Apply a relief action such as `eat`, `sleep` or `toilet_flush`
    Satisfy { action: String },
    /// Drive the what-if cycle simulator
    #[command(group(
        ArgGroup::new("sim")
            .required(true)
            .multiple(true)
            .args(["day", "intensity", "stop"])
    ))]
    Simulate {
        /// Pin the simulated cycle day (1-28) and switch the simulator on
        #[arg(long)]
        day: Option<u32>,
        /// Scale phase modifiers while simulating (0-5)
        #[arg(long)]
        intensity: Option<f64>,
        /// Switch the simulator off
        #[arg(long)]
        stop: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct ContextArgs {
    #[arg(long)]
    identity: Option<String>,
    #[arg(long)]
    mood: Option<String>,
    #[arg(long)]
    desire: Option<String>,
    #[arg(long)]
    social_event: Option<String>,
    #[arg(long)]
    hobby: Option<String>,
    #[arg(long)]
    dreaming: bool,
    #[arg(long)]
    idle: bool,
    /// Growth entries, oldest first (repeatable)
    #[arg(long)]
    growth: Vec<String>,
}

fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    dirs::config_dir()
        .map(|dir| dir.join("soma").join("config.toml"))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from("soma.toml"))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render output")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json);

    let config_path = resolve_config_path(cli.config);
    let config = SomaConfig::load_or_default(&config_path);
    tracing::info!(
        "Persona '{}' with data in {}",
        config.storage.persona,
        config.storage.data_dir.display()
    );

    let store: Arc<dyn StateStore> = match JsonFileStore::open(&config.storage.data_dir).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            if let Commands::Gate { action } = &cli.command {
                tracing::warn!(
                    "Reflex gate failing open for '{}', state store unavailable: {:#}",
                    action,
                    e
                );
                print_json(&json!(GateDecision::Allowed))?;
                std::process::exit(0);
            }
            return Err(e.context("Failed to open state store"));
        }
    };
    let body = BodySystem::new(config, store, Arc::new(SystemClock));

    let code = match cli.command {
        Commands::Tick => run_tick(&body).await?,
        Commands::Status => run_status(&body).await?,
        Commands::Urgency => run_urgency(&body).await?,
        Commands::Gate { action } => run_gate(&body, &action).await?,
        Commands::Context(args) => run_context(&body, args).await?,
        Commands::Satisfy { action } => run_satisfy(&body, &action).await?,
        Commands::Simulate {
            day,
            intensity,
            stop,
        } => run_simulate(&body, day, intensity, stop).await?,
    };
    std::process::exit(code);
}

// ============================================================================
// Commands
// ============================================================================

async fn run_tick(body: &BodySystem) -> Result<i32> {
    let report = body.tick().await.context("Tick failed")?;
    print_json(&json!({
        "aged": report.aged,
        "cycle_advanced": report.cycle_advanced,
        "decayed": report.decayed,
        "initialized": report.initialized,
        "needs": report.needs,
    }))?;
    Ok(0)
}

async fn run_status(body: &BodySystem) -> Result<i32> {
    let snapshot = body.snapshot().await;
    print_json(&status_json(body, &snapshot))?;
    Ok(0)
}

fn status_json(body: &BodySystem, snapshot: &BodySnapshot) -> serde_json::Value {
    let modules = &body.config().modules;
    let needs = &snapshot.needs.value().needs;
    let levels: serde_json::Map<String, serde_json::Value> = needs
        .active(modules)
        .into_iter()
        .map(|(need, _)| (need.as_str().to_string(), json!(needs.level(need))))
        .collect();
    let lifecycle = snapshot.lifecycle.value();
    json!({
        "persona": body.persona(),
        "needs": levels,
        "needs_stored": snapshot.needs.is_stored(),
        "last_tick": snapshot.needs.value().last_tick,
        "lifecycle": {
            "age_days": lifecycle.biological_age_days,
            "age_years": lifecycle.age_years(),
            "stage": lifecycle.life_stage,
        },
        "cycle": snapshot.cycle.as_ref().map(|c| c.value()),
        "finance": snapshot.finance,
        "social": snapshot.social,
    })
}

/// Advance first; a failing store only costs freshness.
async fn tick_best_effort(body: &BodySystem) {
    if let Err(e) = body.tick().await {
        tracing::warn!("Tick failed, continuing with stored state: {}", e);
    }
}

async fn run_urgency(body: &BodySystem) -> Result<i32> {
    tick_best_effort(body).await;
    let snapshot = body.snapshot().await;
    let inputs = UrgencyInputs {
        needs: &snapshot.needs.value().needs,
        finance: snapshot.finance.as_ref(),
        social: snapshot.social.as_ref(),
        lifecycle: Some(snapshot.lifecycle.value()),
        now: body.now(),
    };
    print_json(&json!(aggregate(&inputs)))?;
    Ok(0)
}

async fn run_gate(body: &BodySystem, action: &str) -> Result<i32> {
    tick_best_effort(body).await;
    let gate = ReflexGate::from_config(body.config());
    let decision = gate
        .evaluate_with_store(body.store().as_ref(), &body.keys().needs, action)
        .await;
    print_json(&json!(decision))?;
    Ok(match decision {
        GateDecision::Allowed => 0,
        GateDecision::Blocked { .. } => EXIT_BLOCKED,
    })
}

async fn run_context(body: &BodySystem, args: ContextArgs) -> Result<i32> {
    tick_best_effort(body).await;
    let snapshot = body.snapshot().await;
    let config = body.config();
    let needs = &snapshot.needs.value().needs;
    let priority = aggregate(&UrgencyInputs {
        needs,
        finance: snapshot.finance.as_ref(),
        social: snapshot.social.as_ref(),
        lifecycle: Some(snapshot.lifecycle.value()),
        now: body.now(),
    })
    .into_iter()
    .next();

    let inputs = SensoryInputs {
        cycle: snapshot.cycle.as_ref().map(|c| c.value()),
        cycle_profile: config.cycle.profile.as_ref(),
        lifecycle: Some(snapshot.lifecycle.value()),
        priority: priority.as_ref(),
        social_event: args.social_event.as_deref(),
        identity: args.identity.as_deref(),
        mood: args.mood.as_deref(),
        desire: args.desire.as_deref(),
        dreaming: args.dreaming,
        idle: args.idle,
        hobby: args.hobby.as_deref(),
        growth: &args.growth,
        growth_limit: config.context.growth_limit,
        ..SensoryInputs::new(config.modules, needs)
    };
    println!("{}", compose(&inputs).render());
    Ok(0)
}

async fn run_satisfy(body: &BodySystem, action: &str) -> Result<i32> {
    match body.satisfy(action).await.context("Satisfy failed")? {
        Relief::Applied { action: relief, needs } => {
            print_json(&json!({ "relief": relief.prefix(), "needs": needs }))?;
            Ok(0)
        }
        Relief::Unavailable => {
            eprintln!("'{}' is not an available relief action", action);
            Ok(EXIT_UNAVAILABLE)
        }
    }
}

async fn run_simulate(
    body: &BodySystem,
    day: Option<u32>,
    intensity: Option<f64>,
    stop: bool,
) -> Result<i32> {
    let mut state = None;
    if stop {
        state = Some(body.stop_cycle_simulation().await?);
    } else {
        if let Some(day) = day {
            state = Some(body.simulate_cycle_day(day).await?);
        }
        if let Some(intensity) = intensity {
            state = Some(body.set_simulation_intensity(intensity).await?);
        }
    }
    print_json(&json!(state))?;
    Ok(0)
}
