mod aggregate;
mod commands;
mod google_fit;
mod http;
mod notify;
mod oauth;
mod snapshot;
mod storage;
mod structs;
mod tasks;

use std::{process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use storage::AppState;
use tracing::{error, info};
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

#[derive(Parser)]
#[command(name = "aquatrack", version, about = "Track your daily water intake")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reminder scheduler and keep the widget snapshot fresh
    Run,

    /// Log a drink, in milliliters
    Add { amount_ml: f64 },

    /// Walk today's total back down, in milliliters
    Decrease { amount_ml: f64 },

    /// Show today's total against the daily goal
    Status,

    /// Show per-day totals for the trailing week
    History,

    /// Change the daily goal, in milliliters
    Goal { goal_ml: f64 },

    /// Configure the recurring reminder
    Reminders {
        /// Turn reminders on or off
        #[arg(long)]
        enabled: Option<bool>,

        /// Minutes between reminders: 30, 60, 120 or 240
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Render the published widget snapshot, the way the widget process does
    Widget,

    /// Link a Google account so drinks sync to Google Fit
    LinkGoogle,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    let command = cli.command.unwrap_or(Command::Run);

    // The widget side only ever reads the published snapshot; it never
    // opens the ledger.
    if let Command::Widget = command {
        return render_widget();
    }

    let state = match AppState::load() {
        Ok(state) => Arc::new(state),
        Err(err) => {
            error!("unable to open the app data store: {err}");
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Run => run(state).await,
        Command::Add { amount_ml } => add(state, amount_ml).await,
        Command::Decrease { amount_ml } => decrease(&state, amount_ml),
        Command::Status => status(&state),
        Command::History => history(&state),
        Command::Goal { goal_ml } => goal(&state, goal_ml),
        Command::Reminders { enabled, interval } => reminders(&state, enabled, interval),
        Command::LinkGoogle => link_google(&state).await,
        Command::Widget => unreachable!(),
    }
}

async fn run(state: Arc<AppState>) -> ExitCode {
    // Foreground transition: bring the widget up to date right away.
    commands::publish_snapshot(&state);

    tokio::spawn(tasks::notification::reminder_task(state.clone()));
    tokio::spawn(tasks::refresh::refresh_task(state.clone()));

    info!("aquatrack is running, Ctrl-C to stop");
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("unable to wait for Ctrl-C: {err}");
        return ExitCode::FAILURE;
    }

    // Background transition: flush and leave a fresh pair for the widget.
    state.save();
    commands::publish_snapshot(&state);
    ExitCode::SUCCESS
}

async fn add(state: Arc<AppState>, amount_ml: f64) -> ExitCode {
    let point = match commands::add_drink(&state, amount_ml) {
        Ok(point) => point,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    // Fire-and-forget, but a one-shot process still waits for it to land.
    let sync = tokio::spawn(google_fit::sync_intake(
        state.clone(),
        point.amount,
        point.timestamp,
    ));

    println!(
        "Added {:.0}ml, {:.0}ml today",
        point.amount,
        commands::today_total(&state)
    );

    sync.await.ok();
    ExitCode::SUCCESS
}

fn decrease(state: &AppState, amount_ml: f64) -> ExitCode {
    match commands::decrease_drink(state, amount_ml) {
        Ok(_) => {
            println!(
                "Removed {:.0}ml, {:.0}ml today",
                amount_ml,
                commands::today_total(state)
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn status(state: &AppState) -> ExitCode {
    let settings = state.get_or_create_settings();
    let total = commands::today_total(state);
    let fraction = aggregate::progress_fraction(total, settings.daily_goal_ml);

    println!(
        "{:.0}ml of {:.0}ml ({:.0}%)",
        total,
        settings.daily_goal_ml,
        fraction * 100.0
    );
    if let Some(last) = commands::latest_drink(state) {
        println!("Last drink: {:.0}ml", last.amount);
    }
    ExitCode::SUCCESS
}

fn history(state: &AppState) -> ExitCode {
    println!("Last 7 days:");
    for (day, total) in commands::weekly_totals(state) {
        println!("  {day}  {total:>6.0}ml");
    }

    let all_days = commands::drink_history_by_day(state);
    if !all_days.is_empty() {
        println!("Daily history:");
        for (day, total) in all_days {
            println!("  {day}  {total:>6.0}ml");
        }
    }
    ExitCode::SUCCESS
}

fn goal(state: &AppState, goal_ml: f64) -> ExitCode {
    match commands::set_daily_goal(state, goal_ml) {
        Ok(settings) => {
            println!("Daily goal set to {:.0}ml", settings.daily_goal_ml);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn reminders(state: &AppState, enabled: Option<bool>, interval: Option<u32>) -> ExitCode {
    if let Some(interval) = interval {
        if let Err(err) = commands::set_reminder_interval(state, interval) {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }

    if let Some(enabled) = enabled {
        let settings = commands::set_reminder_enabled(state, enabled);
        if enabled && !settings.reminder_enabled {
            eprintln!("notifications are not authorized, reminders stay off");
            return ExitCode::FAILURE;
        }
    }

    let settings = state.get_or_create_settings();
    println!(
        "Reminders {} every {} minutes",
        if settings.reminder_enabled { "on" } else { "off" },
        settings.reminder_interval_minutes
    );
    ExitCode::SUCCESS
}

fn render_widget() -> ExitCode {
    let path = match storage::default_snapshot_path() {
        Ok(path) => path,
        Err(err) => {
            error!("unable to locate the widget snapshot: {err}");
            return ExitCode::FAILURE;
        }
    };

    let snap = snapshot::read_snapshot(&path);
    let fraction = aggregate::progress_fraction(snap.today_intake_ml, snap.daily_goal_ml);

    println!(
        "{:.0}ml of {:.0}ml ({:.0}%)",
        snap.today_intake_ml,
        snap.daily_goal_ml,
        fraction * 100.0
    );
    ExitCode::SUCCESS
}

async fn link_google(state: &AppState) -> ExitCode {
    println!("Follow the browser prompt to link your Google account");
    match oauth::link_google_account(state).await {
        Ok(()) => {
            println!("Linked. New drinks will sync to Google Fit.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match storage::log_dir() {
        Ok(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "aquatrack.log"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer.and(std::io::stdout))
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
