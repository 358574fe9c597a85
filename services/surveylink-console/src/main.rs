use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use surveylink_core::{logging, SyncConfig};
use surveylink_mission::{ControlCommand, MissionId, MissionStatus, Projection};
use surveylink_sync::{
    loader, runtime, ControlDispatcher, CredentialProvider, HttpMissionApi, MissionApi, Notice,
    StaticCredentials, ViewContext,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token from the identity provider
    #[arg(long, env = "SURVEYLINK_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow a mission live until it ends or Ctrl-C
    Watch { mission: String },
    /// Issue one control command
    Command {
        mission: String,
        #[arg(value_parser = parse_command)]
        action: ControlCommand,
    },
    /// List missions
    List,
    /// Print the report summary
    Report,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("config", &self.config)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("json_logs", &self.json_logs)
            .field("command", &self.command)
            .finish()
    }
}

fn parse_command(raw: &str) -> Result<ControlCommand, String> {
    raw.parse().map_err(|e| format!("{}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config = SyncConfig::load(args.config.as_deref()).context("loading configuration")?;
    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(StaticCredentials::new(args.token.unwrap_or_default()));

    match args.command {
        Commands::Watch { mission } => watch(&config, credentials, MissionId::new(mission)).await,
        Commands::Command { mission, action } => {
            command(&config, credentials.as_ref(), MissionId::new(mission), action).await
        }
        Commands::List => list(&config, credentials.as_ref()).await,
        Commands::Report => report(&config, credentials.as_ref()).await,
    }
}

fn http_api(config: &SyncConfig) -> anyhow::Result<Arc<HttpMissionApi>> {
    Ok(Arc::new(HttpMissionApi::new(
        &config.api.base_url,
        config.timeouts.request(),
    )?))
}

fn render(projection: &Projection) -> String {
    let marker = projection
        .marker
        .map(|c| format!("({:.5}, {:.5})", c.lat, c.lng))
        .unwrap_or_else(|| "-".to_string());
    let commands: Vec<&str> = projection
        .enabled_commands
        .iter()
        .map(|c| c.as_str())
        .collect();
    format!(
        "{:<12} {:>5.1}%  marker {}  channel {:?}  commands [{}]",
        projection.status_label,
        projection.progress_percent(),
        marker,
        projection.connection,
        commands.join(", ")
    )
}

/// Notices after which the view has nothing more to show
fn ends_watch(notice: &Notice) -> bool {
    matches!(notice, Notice::NotFound { .. } | Notice::Unauthorized { .. })
}

async fn watch(
    config: &SyncConfig,
    credentials: Arc<dyn CredentialProvider>,
    mission_id: MissionId,
) -> anyhow::Result<()> {
    let ctx = ViewContext::from_config(config, credentials)?;
    let (handle, mut events) = runtime::spawn(ctx);
    info!(mission_id = %mission_id, "watching mission");
    handle.navigate(mission_id)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = events.frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = events.frames.borrow_and_update().clone();
                if let Some(projection) = frame {
                    println!("{}", render(&projection));
                    if projection.status.is_terminal() {
                        break;
                    }
                }
            }
            Some(notice) = events.notices.recv() => {
                println!("{}", serde_json::to_string(&notice)?);
                if ends_watch(&notice) {
                    warn!(?notice, "stopping watch");
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn command(
    config: &SyncConfig,
    credentials: &dyn CredentialProvider,
    mission_id: MissionId,
    action: ControlCommand,
) -> anyhow::Result<()> {
    let api = http_api(config)?;
    let token = credentials.bearer_token().await?;

    let current = match loader::hydrate(api.as_ref(), &mission_id, &token).await {
        Ok(snapshot) => snapshot.status,
        Err(e) if e.is_auth_failure() => bail!("not authorized: {}", e),
        Err(e) => {
            warn!(mission_id = %mission_id, error = %e, "state unavailable, assuming pending");
            MissionStatus::default()
        }
    };

    let dispatcher = ControlDispatcher::new(api);
    let status = dispatcher
        .send(&mission_id, action, current, &token)
        .await?;
    println!("{}: {}", mission_id, status.label());
    Ok(())
}

async fn list(config: &SyncConfig, credentials: &dyn CredentialProvider) -> anyhow::Result<()> {
    let api = http_api(config)?;
    let token = credentials.bearer_token().await?;
    let missions = api.list_missions(&token).await?;
    if missions.is_empty() {
        println!("No missions yet.");
    }
    for mission in missions {
        println!("{}", mission);
    }
    Ok(())
}

async fn report(config: &SyncConfig, credentials: &dyn CredentialProvider) -> anyhow::Result<()> {
    let api = http_api(config)?;
    let token = credentials.bearer_token().await?;
    let projection = api.report_summary(&token).await?.project();

    for card in &projection.cards {
        println!("{:<16} {}", card.title, card.value);
    }
    for series in [
        &projection.durations,
        &projection.altitudes,
        &projection.completion,
        &projection.duration_trend,
    ] {
        println!();
        println!("{}", series.label);
        for (label, value) in series.labels.iter().zip(&series.values) {
            println!("  {:<12} {}", label, value);
        }
    }
    Ok(())
}
