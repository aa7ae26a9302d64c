use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;
use uuid::Uuid;

use flowcast::config::{Backend, Config};
use flowcast::models::{
    CyclePrediction, FlowIntensity, Insight, InsightCategory, InsightKind, Mood, NewInsight,
    PreferencesUpdate, Priority, Symptom,
};
use flowcast::phase::{current_phase, CurrentPhase};
use flowcast::storage::{EntryStore, InsightStore, PredictionStore, ProfileStore};
use flowcast::{logging, vault, CheckIn, MemoryStore, Tracker, VaultStore};

/// Flowcast - private cycle tracking and period prediction
#[derive(Parser)]
#[command(name = "flowcast")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/flowcast/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Storage backend, overrides the config file
    #[arg(long, value_parser = parse_backend)]
    backend: Option<Backend>,

    /// Seed the memory backend with sample cycles
    #[arg(long)]
    demo: bool,

    /// Vault passphrase
    #[arg(long, env = "FLOWCAST_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log how today (or another day) went
    CheckIn {
        /// Day to log (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// none, light, medium or heavy
        #[arg(short, long, default_value = "none")]
        flow: FlowIntensity,

        /// happy, neutral, sad, anxious, energetic or tired
        #[arg(short, long, default_value = "neutral")]
        mood: Mood,

        /// Repeat for each symptom
        #[arg(short, long = "symptom")]
        symptoms: Vec<Symptom>,

        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Show what was logged on a day, with today's insight
    Day {
        /// YYYY-MM-DD, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Recalculate and show the next predicted period
    Predict,

    /// Show cycle statistics and tracking summary
    Stats,

    /// Show one month with logged and predicted days
    Calendar { year: i32, month: u32 },

    /// Symptom counts over a recent window
    Symptoms {
        #[arg(short, long, default_value = "30")]
        days: i64,
    },

    /// Delete an entry by id
    Remove { id: Uuid },

    /// Change preference flags
    Preferences {
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        reminders: Option<bool>,
        #[arg(long)]
        insights: Option<bool>,
        #[arg(long)]
        privacy_mode: Option<bool>,
    },

    /// Browse and manage the insights feed
    #[command(subcommand)]
    Insights(InsightCommand),

    /// Print everything stored as JSON
    Export,
}

#[derive(Subcommand)]
enum InsightCommand {
    /// List insights, newest first
    List {
        /// Only insights tagged for this phase
        #[arg(long)]
        phase: Option<CurrentPhase>,

        /// Hide insights already read
        #[arg(long)]
        unviewed: bool,
    },

    /// Mark an insight as read
    Read { id: Uuid },

    /// Add an insight to the feed
    Add {
        message: String,

        /// tip, alert or pattern
        #[arg(long, default_value = "tip")]
        kind: InsightKind,

        /// nutrition, exercise, mood, symptom or general
        #[arg(long, default_value = "general")]
        category: InsightCategory,

        /// fertile_window, luteal, menstrual or follicular
        #[arg(long)]
        phase: Option<CurrentPhase>,

        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
}

fn parse_backend(s: &str) -> std::result::Result<Backend, String> {
    match s {
        "memory" => Ok(Backend::Memory),
        "vault" => Ok(Backend::Vault),
        other => Err(format!("unknown backend '{other}', expected memory or vault")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(level) = logging::level_for_verbosity(cli.verbose) {
        config.log.level = level.to_string();
    }
    logging::init(&config.log);
    debug!(?config, "configuration loaded");

    let today = chrono::Local::now().date_naive();

    match config.backend {
        Backend::Memory => {
            let store = if cli.demo || config.demo_data {
                MemoryStore::with_demo_data(today)
            } else {
                MemoryStore::new()
            };
            let tracker = Tracker::new(store);
            tracker.refresh()?;
            run(&tracker, cli.command, today)
        }
        Backend::Vault => {
            let passphrase = cli.passphrase.context(
                "a passphrase is required for the vault (--passphrase or FLOWCAST_PASSPHRASE)",
            )?;
            let path = match &config.data_dir {
                Some(dir) => vault::path_in(dir),
                None => vault::default_path()?,
            };
            let store = VaultStore::open(&path, &passphrase)
                .with_context(|| format!("opening vault {}", path.display()))?;
            debug!(path = %store.path().display(), "vault open");
            run(&Tracker::new(store), cli.command, today)
        }
    }
}

fn run<S>(tracker: &Tracker<S>, command: Command, today: NaiveDate) -> Result<()>
where
    S: EntryStore + ProfileStore + PredictionStore + InsightStore,
{
    match command {
        Command::CheckIn {
            date,
            flow,
            mood,
            symptoms,
            notes,
        } => {
            let outcome = tracker.check_in(CheckIn {
                date: date.unwrap_or(today),
                flow_intensity: flow,
                mood,
                symptoms,
                notes,
            })?;
            let verb = if outcome.created { "Saved" } else { "Updated" };
            println!("{verb} check-in for {} ({})", outcome.entry.date, outcome.entry.id);
            print_prediction(outcome.prediction.as_ref(), today);
        }
        Command::Day { date } => {
            let date = date.unwrap_or(today);
            match tracker.entry_on(date)? {
                Some(entry) => {
                    println!("{date}: flow {}, mood {}", entry.flow_intensity, entry.mood);
                    let labels: Vec<&str> = entry.symptoms.iter().map(|s| s.label()).collect();
                    if !labels.is_empty() {
                        println!("Symptoms: {}", labels.join(", "));
                    }
                    if !entry.notes.is_empty() {
                        println!("Notes: {}", entry.notes);
                    }
                }
                None => println!("Nothing logged for {date}"),
            }
            if let Some(insight) = tracker.todays_insight(date)? {
                print_insight(&insight);
            }
        }
        Command::Predict => {
            let refreshed = tracker.refresh()?;
            print_prediction(refreshed.prediction.as_ref(), today);
        }
        Command::Stats => {
            let overview = tracker.overview(today)?;
            let profile = overview.profile;
            println!("Avg cycle length:   {} days", profile.average_cycle_length);
            println!("Avg period length:  {} days", profile.average_period_length);
            println!("Last period start:  {}", profile.last_period_start);
            println!("Tracking for:       {} days", overview.tracking_days);
            println!("Entries:            {}", overview.total_entries);
            if let Some(stats) = tracker.cycle_stats()? {
                println!("Cycles observed:    {}", stats.total_cycles);
                if let (Some(short), Some(long)) = (stats.shortest_cycle, stats.longest_cycle) {
                    println!("Cycle range:        {short}-{long} days");
                }
            }
            let symptom = overview.most_common_symptom.map_or("none", |s| s.label());
            let mood = overview.most_common_mood.map_or("neutral", |m| m.as_str());
            println!("Common symptom:     {symptom}");
            println!("Common mood:        {mood}");
        }
        Command::Calendar { year, month } => {
            let view = tracker.month(year, month)?;
            for day in view.days {
                let logged = day
                    .entry
                    .as_ref()
                    .map_or(String::from("-"), |e| e.flow_intensity.to_string());
                let phase = day.phase.map_or(String::new(), |p| format!("{p:?}"));
                println!("{}  {:<7} {}", day.date, logged, phase);
            }
        }
        Command::Symptoms { days } => {
            let counts = tracker.recent_symptoms(today, days)?;
            if counts.is_empty() {
                println!("No symptoms logged in the last {days} days");
            }
            for (symptom, count) in counts {
                println!("{:<16} {count}", symptom.label());
            }
        }
        Command::Remove { id } => {
            let refreshed = tracker.remove_entry(id)?;
            println!("Removed {id}");
            print_prediction(refreshed.prediction.as_ref(), today);
        }
        Command::Preferences {
            notifications,
            reminders,
            insights,
            privacy_mode,
        } => {
            let update = PreferencesUpdate {
                notifications,
                reminders,
                insights,
                privacy_mode,
            };
            let profile = if update.is_empty() {
                tracker.profile()?
            } else {
                tracker.update_preferences(update)?
            };
            println!("{:#?}", profile.preferences);
        }
        Command::Insights(command) => run_insights(tracker, command)?,
        Command::Export => println!("{}", tracker.export()?),
    }
    Ok(())
}

fn run_insights<S>(tracker: &Tracker<S>, command: InsightCommand) -> Result<()>
where
    S: EntryStore + ProfileStore + PredictionStore + InsightStore,
{
    match command {
        InsightCommand::List { phase, unviewed } => {
            let mut insights = match phase {
                Some(phase) => tracker.phase_insights(phase)?,
                None => tracker.insight_feed()?,
            };
            if unviewed {
                insights.retain(|i| !i.viewed);
            }
            if insights.is_empty() {
                println!("No insights to show");
            }
            for insight in &insights {
                print_insight(insight);
            }
        }
        InsightCommand::Read { id } => {
            let insight = tracker.mark_insight_viewed(id)?;
            println!("Marked {} as read", insight.id);
        }
        InsightCommand::Add {
            message,
            kind,
            category,
            phase,
            priority,
        } => {
            let insight = tracker.add_insight(NewInsight {
                kind,
                category,
                message,
                phase,
                priority,
            })?;
            println!("Added insight {}", insight.id);
        }
    }
    Ok(())
}

fn print_insight(insight: &Insight) {
    let marker = if insight.viewed { " " } else { "*" };
    println!(
        "{marker} [{} / {} / {}] {}",
        insight.kind, insight.category, insight.priority, insight.message
    );
    println!("  {}", insight.id);
}

fn print_prediction(prediction: Option<&CyclePrediction>, today: NaiveDate) {
    let Some(p) = prediction else {
        println!("Not enough period days logged to predict yet");
        return;
    };
    let info = current_phase(p, today);
    println!(
        "Next period:    {} - {} ({} days)",
        p.predicted_period_start, p.predicted_period_end, info.days_until_period
    );
    println!("Ovulation:      {}", p.ovulation_day);
    println!(
        "Fertile window: {} - {}",
        p.fertile_window_start, p.fertile_window_end
    );
    println!(
        "Confidence:     {}% (from {} cycles)",
        p.confidence, p.based_on_cycles
    );
    println!("Phase:          {} - {}", info.phase, info.phase.description());
}
