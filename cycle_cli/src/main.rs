use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use cycle_core::classifier::CalendarEntry;
use cycle_core::engine::Advice;
use cycle_core::history::months_ago;
use cycle_core::statistics::average_levels;
use cycle_core::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cyclewise")]
#[command(about = "Menstrual cycle prediction and phase guidance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to the per-user config path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Whose events to read and write
    #[arg(long, global = true, default_value = "default", value_parser = parse_user)]
    user: UserId,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log more detail to stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Log an observation for one day
    Log {
        /// Day of the observation (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// menstruation, follicular, ovulation or luteal
        #[arg(long)]
        phase: TraditionalPhase,

        /// Pain level 0-5
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
        pain: Option<u8>,

        /// Energy level 0-5
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
        energy: Option<u8>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Import events from a CSV file (date,phase,pain_level,energy_level,notes)
    Import { file: PathBuf },

    /// Export all events to a CSV file
    Export { file: PathBuf },

    /// Predict the next period (default)
    Predict,

    /// Show the phase of a day and what to eat and do
    Phase {
        /// Day to classify (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List upcoming phase changes
    Calendar {
        /// First day (defaults to today)
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long, default_value_t = 28)]
        days: u32,
    },

    /// Period and per-phase statistics
    Stats,

    /// Recent periods, newest first
    History {
        /// Show at most this many periods
        #[arg(long)]
        periods: Option<usize>,

        /// Only periods that started within this many months
        #[arg(long)]
        months: Option<u32>,
    },

    /// Print the effective configuration
    Config,
}

fn parse_user(s: &str) -> std::result::Result<UserId, String> {
    UserId::new(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cycle_core::logging::init_for_cli(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let mut store = JsonlEventStore::new(&data_dir);
    let today = Local::now().date_naive();
    let out = Output { json: cli.json };

    match cli.command.unwrap_or(Commands::Predict) {
        Commands::Log {
            date,
            phase,
            pain,
            energy,
            note,
        } => {
            let event = build_event(&cli.user, date.unwrap_or(today), phase, pain, energy, note)?;
            cmd_log(&mut store, &event, &out)
        }
        Commands::Import { file } => cmd_import(&mut store, &cli.user, &file, &out),
        Commands::Export { file } => cmd_export(&store, &cli.user, &file, &out),
        Commands::Predict => {
            let engine = CycleEngine::from_config(&config)?;
            cmd_predict(&engine, &store.events_for(&cli.user)?, &out)
        }
        Commands::Phase { date } => {
            let engine = CycleEngine::from_config(&config)?;
            let advice = engine.advise(&store.events_for(&cli.user)?, date.unwrap_or(today))?;
            out.emit(&advice, print_advice)
        }
        Commands::Calendar { from, days } => {
            let engine = CycleEngine::from_config(&config)?;
            let entries =
                engine.calendar(&store.events_for(&cli.user)?, from.unwrap_or(today), days)?;
            out.emit(&entries, |entries| print_calendar(entries))
        }
        Commands::Stats => cmd_stats(&store.events_for(&cli.user)?, &out),
        Commands::History { periods, months } => {
            let since = months.map(|m| months_ago(today, m));
            let ranges = period_history(&store.events_for(&cli.user)?, periods, since);
            out.emit(&ranges, |ranges| print_history(ranges))
        }
        Commands::Config => {
            if out.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", config.to_toml_string()?);
            }
            Ok(())
        }
    }
}

/// Text or JSON rendering of a command result
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

fn build_event(
    user: &UserId,
    date: NaiveDate,
    phase: TraditionalPhase,
    pain: Option<u8>,
    energy: Option<u8>,
    note: Option<String>,
) -> Result<CycleEvent> {
    let mut event = CycleEvent::new(user.clone(), date, phase);
    if let Some(pain) = pain {
        event = event.with_pain(pain)?;
    }
    if let Some(energy) = energy {
        event = event.with_energy(energy)?;
    }
    if let Some(note) = note {
        event = event.with_note(note);
    }
    Ok(event)
}

fn cmd_log(store: &mut impl EventStore, event: &CycleEvent, out: &Output) -> Result<()> {
    store.append(event)?;
    out.emit(event, |event| {
        println!("✓ Logged {} for {}", event.phase, event.date);
    })
}

#[derive(Serialize)]
struct ImportSummary {
    imported: usize,
    skipped: usize,
}

fn cmd_import(
    store: &mut impl EventStore,
    user: &UserId,
    file: &Path,
    out: &Output,
) -> Result<()> {
    let report = import_csv(file, user)?;
    store.append_all(&report.events)?;

    let summary = ImportSummary {
        imported: report.events.len(),
        skipped: report.skipped,
    };
    out.emit(&summary, |s| {
        println!("✓ Imported {} events", s.imported);
        if s.skipped > 0 {
            println!("  Skipped {} invalid rows", s.skipped);
        }
    })
}

fn cmd_export(store: &impl EventStore, user: &UserId, file: &Path, out: &Output) -> Result<()> {
    let events = store.events_for(user)?;
    let count = export_csv(&events, file)?;
    out.emit(&count, |count| {
        println!("✓ Exported {} events to {}", count, file.display());
    })
}

fn cmd_predict(engine: &CycleEngine, events: &[CycleEvent], out: &Output) -> Result<()> {
    let prediction = engine.predict(events)?;
    out.emit(&prediction, |p| {
        println!("Next period expected: {}", p.next_start);
        println!("  Last period started: {}", p.last_start);
        if p.gaps_used > 0 {
            println!(
                "  Average cycle: {} days (from {} cycles)",
                p.average_duration, p.gaps_used
            );
        } else {
            println!("  Average cycle: {} days (default)", p.average_duration);
        }
        if let Some(warning) = p.warning() {
            println!("  ⚠ {}", warning);
        }
    })
}

#[derive(Serialize)]
struct StatsReport {
    cycles: CycleStatistics,
    phases: Vec<PhaseStatistics>,
    average_pain: Option<f64>,
    average_energy: Option<f64>,
}

fn cmd_stats(events: &[CycleEvent], out: &Output) -> Result<()> {
    let levels = average_levels(events);
    let report = StatsReport {
        cycles: cycle_statistics(events),
        phases: phase_statistics(events),
        average_pain: levels.pain,
        average_energy: levels.energy,
    };

    out.emit(&report, |r| {
        println!("Periods logged: {}", r.cycles.total_periods);
        println!(
            "  Average period length: {}",
            format_days(r.cycles.average_period_length)
        );
        println!(
            "  Average days between periods: {}",
            format_days(r.cycles.average_days_between)
        );
        for period in &r.cycles.last_two_periods {
            println!("  {} to {}", period.start_date, period.end_date);
        }
        println!();
        for phase in &r.phases {
            println!(
                "  {:<13} {:>3} entries  pain {}  energy {}",
                phase.phase.as_str(),
                phase.occurrence_count,
                format_level(phase.average_pain),
                format_level(phase.average_energy)
            );
        }
    })
}

fn format_days(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1} days", v))
}

fn format_level(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}

fn print_advice(advice: &Advice) {
    let phase = &advice.phase;
    let functional = &phase.functional_window;
    let bundle = &advice.recommendations;

    println!("{}: day {} of your cycle", advice.date, phase.day_in_cycle + 1);
    println!(
        "  Traditional phase: {} ({} to {})",
        phase.traditional, phase.start_date, phase.end_date
    );
    println!(
        "  Functional phase:  {} ({} to {})",
        phase.functional, functional.start_date, functional.end_date
    );
    println!(
        "  Next phase:        {} from {}",
        advice.next_phase.traditional, advice.next_phase.start_date
    );
    println!("  Next period:       {}", advice.prediction.next_start);
    if let Some(warning) = advice.prediction.warning() {
        println!("  ⚠ {}", warning);
    }
    println!();
    println!("  Diet:    {}", bundle.diet_style);
    if advice.fasting_recommended {
        println!("  Fasting: {}", bundle.fasting_protocol);
    } else {
        println!(
            "  Fasting: not recommended this phase ({})",
            bundle.fasting_protocol
        );
    }
    if !bundle.foods.is_empty() {
        println!("  Foods:");
        for (category, items) in &bundle.foods {
            println!("    {}: {}", category, items.join(", "));
        }
    }
    if !bundle.activities.is_empty() {
        println!("  Activities:  {}", bundle.activities.join(", "));
    }
    if !bundle.supplements.is_empty() {
        println!("  Supplements: {}", bundle.supplements.join(", "));
    }
}

fn print_calendar(entries: &[CalendarEntry]) {
    for entry in entries {
        println!(
            "{} to {}  {:<13} {}",
            entry.start_date,
            entry.end_date,
            entry.traditional.as_str(),
            entry.functional
        );
    }
}

fn print_history(ranges: &[PeriodRange]) {
    if ranges.is_empty() {
        println!("No periods logged yet.");
        return;
    }
    for range in ranges {
        println!(
            "{} to {}  ({} days)",
            range.start_date,
            range.end_date,
            range.length_days()
        );
    }
}
