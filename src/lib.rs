pub mod cli;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod debounce;
pub mod errors;
pub mod export;
pub mod models;
pub mod store;
pub mod validation;
pub mod view;

use crate::cli::{Cli, Command, ViewArgs};
use crate::config::AppConfig;
use crate::dashboard::DashboardCore;
use crate::errors::AppError;
use crate::models::{CoiStatus, Notice, ReminderKind};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde_json::json;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

struct AppState {
    dashboard: DashboardCore,
}

fn list_cois(state: &mut AppState, view: ViewArgs) -> Result<serde_json::Value, String> {
    let today = reference_date(&view);
    apply_view_args(state, &view);
    let page = state.dashboard.page(today);
    serde_json::to_value(page).map_err(to_client_error)
}

fn add_coi(state: &mut AppState, form: crate::models::NewCoi) -> Result<serde_json::Value, String> {
    let (record, notice) = state.dashboard.add_coi(form).map_err(to_client_error)?;
    Ok(json!({ "record": record, "notice": notice }))
}

fn update_coi(state: &mut AppState, id: &str, patch: crate::models::CoiPatch) -> Result<serde_json::Value, String> {
    require_record(state, id)?;
    let notice = state.dashboard.save_edit(id, patch).map_err(to_client_error)?;
    Ok(with_record(state, id, notice))
}

fn set_coi_status(state: &mut AppState, id: &str, status: CoiStatus) -> Result<serde_json::Value, String> {
    require_record(state, id)?;
    let notice = state.dashboard.set_status(id, status).map_err(to_client_error)?;
    Ok(with_record(state, id, notice))
}

fn send_reminder(state: &mut AppState, id: &str) -> Result<serde_json::Value, String> {
    require_record(state, id)?;
    let notice = state.dashboard.send_reminder(id).map_err(to_client_error)?;
    Ok(with_record(state, id, notice))
}

fn bulk_remind(state: &mut AppState, kind: ReminderKind, ids: &[String]) -> Result<serde_json::Value, String> {
    select_only(state, ids);
    let notice = state.dashboard.bulk_remind(kind).map_err(to_client_error)?;
    Ok(json!({ "notice": notice }))
}

fn delete_coi(state: &mut AppState, id: &str) -> Result<serde_json::Value, String> {
    let notice = state.dashboard.delete_coi(id).map_err(to_client_error)?;
    Ok(json!({ "notice": notice }))
}

fn bulk_delete(state: &mut AppState, ids: &[String]) -> Result<serde_json::Value, String> {
    select_only(state, ids);
    let notice = state.dashboard.bulk_delete_selected().map_err(to_client_error)?;
    Ok(json!({ "notice": notice }))
}

fn get_stats(state: &AppState) -> Result<serde_json::Value, String> {
    serde_json::to_value(state.dashboard.stats(Utc::now())).map_err(to_client_error)
}

fn export_csv(state: &mut AppState, view: ViewArgs, stdout: bool) -> Result<Option<serde_json::Value>, String> {
    let today = reference_date(&view);
    apply_view_args(state, &view);
    if stdout {
        println!("{}", state.dashboard.export_csv(today));
        return Ok(None);
    }
    let (path, notice) = state.dashboard.export_csv_file(today).map_err(to_client_error)?;
    Ok(Some(json!({ "path": path.to_string_lossy(), "notice": notice })))
}

fn settings(state: &mut AppState, update: Option<String>) -> Result<serde_json::Value, String> {
    let settings = match update {
        Some(raw) => {
            let update = serde_json::from_str::<serde_json::Value>(&raw).map_err(to_client_error)?;
            state.dashboard.update_settings(update).map_err(to_client_error)?
        }
        None => state.dashboard.settings().map_err(to_client_error)?,
    };
    serde_json::to_value(settings).map_err(to_client_error)
}

fn apply_view_args(state: &mut AppState, view: &ViewArgs) {
    let criteria = view.criteria(state.dashboard.criteria());
    state.dashboard.set_criteria(criteria);
}

fn select_only(state: &mut AppState, ids: &[String]) {
    state.dashboard.clear_selection();
    for id in ids {
        if !state.dashboard.selection().contains(id) {
            state.dashboard.toggle_row(id);
        }
    }
}

fn require_record(state: &AppState, id: &str) -> Result<(), String> {
    match state.dashboard.store().get(id) {
        Some(_) => Ok(()),
        None => Err(to_client_error(AppError::NotFound(format!("No COI with id {}", id)))),
    }
}

fn with_record(state: &AppState, id: &str, notice: Notice) -> serde_json::Value {
    json!({ "record": state.dashboard.store().get(id), "notice": notice })
}

fn reference_date(view: &ViewArgs) -> NaiveDate {
    view.today.unwrap_or_else(|| Utc::now().date_naive())
}

fn dispatch(state: &mut AppState, command: Command) -> Result<Option<serde_json::Value>, String> {
    let output = match command {
        Command::List(view) => list_cois(state, view)?,
        Command::Add(args) => add_coi(state, args.into())?,
        Command::Update(args) => {
            let patch = args.patch();
            update_coi(state, &args.id, patch)?
        }
        Command::SetStatus { id, status } => set_coi_status(state, &id, status)?,
        Command::Remind { id } => send_reminder(state, &id)?,
        Command::BulkRemind { kind, ids } => bulk_remind(state, kind.into(), &ids)?,
        Command::Delete { id } => delete_coi(state, &id)?,
        Command::BulkDelete { ids } => bulk_delete(state, &ids)?,
        Command::Stats => get_stats(state)?,
        Command::Properties => json!(state.dashboard.property_options()),
        Command::Export { stdout, view } => return export_csv(state, view, stdout),
        Command::Settings { set } => settings(state, set)?,
    };
    Ok(Some(output))
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data dir {}", config.data_dir.display()))?;
    init_tracing(&config).map_err(anyhow::Error::msg)?;

    let dashboard = DashboardCore::open(&config).context("failed to open dashboard state")?;
    let mut state = AppState { dashboard };

    if let Some(output) = dispatch(&mut state, cli.command).map_err(anyhow::Error::msg)? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<(), String> {
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "dashboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking);

    if config.logging.json {
        builder.json().try_init().map_err(|error| error.to_string())
    } else {
        builder.with_ansi(false).try_init().map_err(|error| error.to_string())
    }
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::{dispatch, AppState};
    use crate::cli::Cli;
    use crate::dashboard::DashboardCore;
    use crate::db::MemoryStorage;
    use crate::models::ReminderStatus;
    use crate::store::{seed_records, IdStrategy, RecordStore, DEFAULT_STORAGE_KEY};
    use clap::Parser;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn state() -> AppState {
        let storage = Arc::new(MemoryStorage::new());
        let store = RecordStore::with_records(storage.clone(), DEFAULT_STORAGE_KEY, IdStrategy::Short, seed_records());
        AppState {
            dashboard: DashboardCore::with_store(store, storage, PathBuf::from("exports")),
        }
    }

    fn run(state: &mut AppState, args: &[&str]) -> Result<Option<serde_json::Value>, String> {
        let argv = std::iter::once("coi-dashboard").chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).expect("parse");
        dispatch(state, cli.command)
    }

    #[test]
    fn list_returns_the_filtered_page() {
        let mut state = state();
        let page = run(&mut state, &["list", "--status", "Expiring Soon", "--today", "2025-11-01"])
            .expect("list")
            .expect("output");
        assert_eq!(page["totalItems"], 2);
        assert_eq!(page["items"][0]["id"], "4");
        assert_eq!(page["items"][1]["id"], "5");

        assert_eq!(run(&mut state, &["export", "--stdout"]).expect("export"), None);
    }

    #[test]
    fn record_commands_echo_the_updated_record() {
        let mut state = state();
        let updated = run(&mut state, &["update", "5", "--unit", "Kiosk 9"])
            .expect("update")
            .expect("output");
        assert_eq!(updated["record"]["unit"], "Kiosk 9");
        assert_eq!(updated["notice"]["message"], "COI updated successfully");

        let reminded = run(&mut state, &["remind", "2"]).expect("remind").expect("output");
        assert_eq!(reminded["record"]["reminderStatus"], "Sent (30d)");

        let error = run(&mut state, &["set-status", "missing", "Active"]).expect_err("unknown id");
        assert!(error.starts_with("NOT_FOUND:"), "{}", error);
    }

    #[test]
    fn bulk_commands_select_each_id_once() {
        let mut state = state();
        let output = run(&mut state, &["bulk-remind", "--kind", "secondary", "1", "3", "1"])
            .expect("bulk remind")
            .expect("output");
        assert_eq!(output["notice"]["message"], "Secondary reminders sent for 2 items");
        assert!(state.dashboard.selection().is_empty());
        assert_eq!(
            state.dashboard.store().get("1").expect("record").reminder_status,
            ReminderStatus::SentThirtyDays
        );

        let output = run(&mut state, &["bulk-delete", "2", "4"]).expect("bulk delete").expect("output");
        assert_eq!(output["notice"]["message"], "2 items deleted");
        let stats = run(&mut state, &["stats"]).expect("stats").expect("output");
        assert_eq!(stats["total"], 3);
    }
}
