use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::MemoryStore;
use storage::models::{GroupId, GroupSnapshot, RecordId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker::canonical::CanonicalEvent;
use tracker::derive::progress::missing_required;
use tracker::derive::{Urgency, badge_of, visible_entries};
use tracker::export::event_to_ics;
use tracker::{Action, SessionPhase, SyncSession, TrackerConfig, TrackerState};

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Family dance competition tracker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON group snapshot: `{ group, events, history }`.
    #[arg(long, env = "TRACKER_SNAPSHOT")]
    snapshot: PathBuf,

    #[arg(long, env = "TRACKER_GROUP_ID", default_value = "fam-local")]
    group_id: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upcoming events, past events, yearly statistics and medals.
    Summary {
        #[arg(long)]
        participant: Option<String>,
    },
    /// Write one event as an iCalendar file.
    ExportIcs {
        #[arg(long)]
        event: String,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print events and history in canonical form, warning about entries the
    /// catalog does not offer.
    Normalize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tracker={},storage={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let group_id = GroupId::new(cli.group_id);
    let session = load_session(&cli.snapshot, group_id).await?;

    match cli.command {
        Commands::Summary { participant } => print_summary(session, participant),
        Commands::ExportIcs { event, output } => export_ics(session.state(), &event, output).await?,
        Commands::Normalize => print_normalized(session.state())?,
    }

    Ok(())
}

async fn load_session(path: &Path, group_id: GroupId) -> Result<SyncSession<MemoryStore>> {
    tracing::info!("Loading group snapshot from: {}", path.display());

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot = GroupSnapshot::from_json(&json).context("Failed to parse group snapshot")?;
    let store = MemoryStore::seeded(&group_id, snapshot).context("Failed to seed store")?;

    let mut session = SyncSession::new(Arc::new(store), TrackerConfig::default());
    session
        .connect(group_id)
        .await
        .context("Failed to subscribe to group")?;
    session.drain()?;

    if session.phase() != SessionPhase::Live {
        bail!("group document never arrived");
    }
    Ok(session)
}

fn print_summary(mut session: SyncSession<MemoryStore>, participant: Option<String>) {
    if let Some(name) = &participant {
        session.dispatch(Action::SelectParticipant(Some(name.clone())));
        if session.state().selected_participant.is_none() {
            tracing::warn!("{} is not on the roster, showing everyone", name);
        }
    }

    let state = session.state();
    let catalog = &session.config().checklist;
    let now = Local::now().naive_local();

    println!("Roster:");
    for name in &state.roster {
        let emoji = badge_of(&state.roster, name).map_or("", |badge| badge.emoji);
        println!("  {} {}", emoji, name);
    }

    println!();
    println!("Upcoming:");
    for event in state.upcoming_events(now) {
        let when = match state.countdown(event, now) {
            Some(countdown) => describe_countdown(countdown.urgency, countdown.days),
            None => "date unknown".to_string(),
        };
        let progress = event
            .id
            .as_ref()
            .map(|id| state.progress(id, catalog))
            .unwrap_or_default();
        println!(
            "  {} {} ({}) packed {}/{} ({}%)",
            event.details.date,
            event.details.name,
            when,
            progress.completed,
            progress.total,
            progress.percent()
        );
        print_entries(state, event);
        if let Some(id) = &event.id {
            let missing = missing_required(id, &state.checklist, catalog);
            if !missing.is_empty() {
                let items: Vec<&str> = missing.iter().map(|(_, item)| *item).collect();
                println!("    still to pack: {}", items.join(", "));
            }
        }
    }

    println!();
    println!("Past, not yet recorded:");
    for event in state.past_events(now) {
        println!("  {} {}", event.details.date, event.details.name);
    }

    println!();
    println!("History:");
    for record in state.visible_history() {
        println!("  {} {}", record.details.date, record.details.name);
        for entry in visible_entries(&record.details, &state.roster) {
            if state
                .selected_participant
                .as_ref()
                .is_some_and(|selected| *selected != entry.participant)
            {
                continue;
            }
            for competed in &entry.entries {
                let result = entry.result_for(competed).unwrap_or("-");
                println!(
                    "    {} {}{}: {}",
                    entry.participant, competed.entry_class, competed.category, result
                );
            }
        }
    }

    println!();
    println!("By year:");
    for year in state.yearly_statistics() {
        println!(
            "  {}: {} events, best rank {}, {} medals",
            year.year, year.count, year.best_score, year.medal_count
        );
    }

    let tally = state.medal_tally();
    println!();
    println!(
        "Medals: 🥇 {}  🥈 {}  🥉 {}  (total {})",
        tally.gold,
        tally.silver,
        tally.bronze,
        tally.total()
    );
}

fn print_entries(state: &TrackerState, event: &CanonicalEvent) {
    for entry in visible_entries(&event.details, &state.roster) {
        println!("    {}: {}", entry.participant, entry.categories().join(", "));
    }
}

fn describe_countdown(urgency: Urgency, days: i64) -> String {
    match urgency {
        Urgency::Today => "today".to_string(),
        Urgency::Elapsed => "ended".to_string(),
        Urgency::Imminent | Urgency::Soon => format!("in {} days!", days),
        Urgency::Later => format!("in {} days", days),
    }
}

async fn export_ics(state: &TrackerState, event_id: &str, output: Option<PathBuf>) -> Result<()> {
    let id = RecordId::new(event_id);
    let event = state
        .event(&id)
        .ok_or_else(|| anyhow!("no event with id {}", event_id))?;
    let ics = event_to_ics(event, Utc::now())?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, ics)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Calendar file written to {}", path.display());
        }
        None => print!("{}", ics),
    }
    Ok(())
}

fn print_normalized(state: &TrackerState) -> Result<()> {
    let details = state
        .events
        .iter()
        .map(|e| &e.details)
        .chain(state.history.iter().map(|h| &h.details));
    for record in details {
        for mismatch in record.catalog_mismatches() {
            tracing::warn!("{} ({}): {}", record.name, record.date, mismatch);
        }
    }

    let output = serde_json::json!({
        "events": state.events,
        "history": state.history,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
