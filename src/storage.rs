use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::warn;

use crate::structs::{drink_point::DrinkPoint, settings::GoalSettings};

static PROJECT_DIR: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "cmobautomation", "aquatrack"));

const DATA_FILE: &str = "aquatrack.bin";
const SNAPSHOT_FILE: &str = "widget_snapshot.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no home directory available for app data")]
    NoProjectDir,

    #[error("unable to access the data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to decode the data file: {0}")]
    Corrupt(#[from] bincode::Error),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InnerAppState {
    /// Id handed to the next drink record.
    pub next_drink_id: u64,

    pub drink_history: Vec<DrinkPoint>,

    /// Created with defaults on first settings access, `None` until then.
    pub settings: Option<GoalSettings>,

    pub google_oauth_access_token: Option<String>,
    pub google_oauth_refresh_token: Option<String>,
    pub google_oauth_access_token_expiry_timestamp: i64,
    pub google_fit_data_source_id: Option<String>,
}

impl Default for InnerAppState {
    fn default() -> Self {
        Self {
            next_drink_id: 1,
            drink_history: vec![],
            settings: None,
            google_oauth_access_token: None,
            google_oauth_refresh_token: None,
            google_oauth_access_token_expiry_timestamp: 0,
            google_fit_data_source_id: None,
        }
    }
}

/// The process-wide app state. All mutations go through the write lock,
/// including the settings create-if-absent path, so racing first-accesses
/// cannot create two settings records.
pub struct AppState {
    pub inner: RwLock<InnerAppState>,

    /// Signalled whenever a reminder setting changes; the reminder task
    /// re-arms its timer on it.
    pub reminder_settings_changed: Notify,

    data_path: PathBuf,
    snapshot_path: PathBuf,
}

impl AppState {
    pub fn load() -> Result<Self, StorageError> {
        Self::load_from(default_data_path()?, default_snapshot_path()?)
    }

    pub fn load_from(data_path: PathBuf, snapshot_path: PathBuf) -> Result<Self, StorageError> {
        let inner = get_saved_data(&data_path)?;

        Ok(Self {
            inner: RwLock::new(inner),
            reminder_settings_changed: Notify::new(),
            data_path,
            snapshot_path,
        })
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Appends a record timestamped now. The store accepts any amount,
    /// negative included; the caller-side guard lives in `commands`.
    pub fn add_record(&self, amount: f64) -> DrinkPoint {
        self.add_record_at(amount, chrono::Utc::now().timestamp())
    }

    pub fn add_record_at(&self, amount: f64, timestamp: i64) -> DrinkPoint {
        let mut state = self.inner.write().unwrap();

        let point = DrinkPoint::new(state.next_drink_id, amount, timestamp);
        state.next_drink_id += 1;
        state.drink_history.push(point);

        self.persist(&state);
        point
    }

    /// Every stored record, in no particular order.
    pub fn all_records(&self) -> Vec<DrinkPoint> {
        self.inner.read().unwrap().drink_history.clone()
    }

    pub fn latest_record(&self) -> Option<DrinkPoint> {
        self.inner.read().unwrap().drink_history.last().copied()
    }

    /// Returns the settings singleton, creating it with defaults on first
    /// access. The check and the insert run under one write lock.
    pub fn get_or_create_settings(&self) -> GoalSettings {
        let mut state = self.inner.write().unwrap();

        if let Some(settings) = &state.settings {
            return settings.clone();
        }

        let settings = GoalSettings::default();
        state.settings = Some(settings.clone());
        self.persist(&state);
        settings
    }

    /// Applies `mutate` to the settings singleton and persists before
    /// returning. Signals the reminder task when a reminder field changed.
    pub fn update_settings(&self, mutate: impl FnOnce(&mut GoalSettings)) -> GoalSettings {
        let mut state = self.inner.write().unwrap();

        let settings = state.settings.get_or_insert_with(GoalSettings::default);
        let before = settings.clone();
        mutate(settings);
        let updated = settings.clone();

        self.persist(&state);

        if updated.reminder_enabled != before.reminder_enabled
            || updated.reminder_interval_minutes != before.reminder_interval_minutes
        {
            self.reminder_settings_changed.notify_one();
        }

        updated
    }

    pub fn store_fit_credentials(
        &self,
        access_token: String,
        refresh_token: String,
        expires_at_timestamp: i64,
        data_source_id: String,
    ) {
        let mut state = self.inner.write().unwrap();
        state.google_oauth_access_token = Some(access_token);
        state.google_oauth_refresh_token = Some(refresh_token);
        state.google_oauth_access_token_expiry_timestamp = expires_at_timestamp;
        state.google_fit_data_source_id = Some(data_source_id);
        self.persist(&state);
    }

    pub fn refresh_fit_access_token(&self, access_token: String, expires_at_timestamp: i64) {
        let mut state = self.inner.write().unwrap();
        state.google_oauth_access_token = Some(access_token);
        state.google_oauth_access_token_expiry_timestamp = expires_at_timestamp;
        self.persist(&state);
    }

    /// Flushes the current state to disk.
    pub fn save(&self) {
        let state = self.inner.read().unwrap();
        self.persist(&state);
    }

    /// A failed save is logged and dropped; the in-memory state keeps the
    /// mutation and the caller proceeds as if the write succeeded.
    fn persist(&self, state: &InnerAppState) {
        if let Err(err) = save_app_state(&self.data_path, state) {
            warn!("unable to save app data: {err}");
        }
    }
}

pub fn get_saved_data(data_path: &Path) -> Result<InnerAppState, StorageError> {
    if let Some(parent) = data_path.parent() {
        fs::create_dir_all(parent)?;
    }

    if data_path.exists() {
        let binary_data = fs::read(data_path)?;
        return Ok(bincode::deserialize(&binary_data)?);
    }

    // If the data file doesn't exist, create it and write the initial data to it
    let initial = InnerAppState::default();
    fs::write(data_path, bincode::serialize(&initial)?)?;
    Ok(initial)
}

pub fn save_app_state(data_path: &Path, state: &InnerAppState) -> Result<(), StorageError> {
    let binary_data = bincode::serialize(state)?;
    fs::write(data_path, binary_data)?;
    Ok(())
}

pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dirs = PROJECT_DIR.as_ref().ok_or(StorageError::NoProjectDir)?;
    fs::create_dir_all(dirs.data_dir())?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn log_dir() -> Result<PathBuf, StorageError> {
    let dir = data_dir()?.join("logs");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn default_data_path() -> Result<PathBuf, StorageError> {
    Ok(data_dir()?.join(DATA_FILE))
}

/// The snapshot file lives next to the data file but is the only piece of
/// state the widget process ever touches.
pub fn default_snapshot_path() -> Result<PathBuf, StorageError> {
    Ok(data_dir()?.join(SNAPSHOT_FILE))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::structs::settings::{DEFAULT_DAILY_GOAL_ML, DEFAULT_REMINDER_INTERVAL_MINUTES};

    fn temp_state() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let state = AppState::load_from(
            dir.path().join("aquatrack.bin"),
            dir.path().join("widget_snapshot.json"),
        )
        .unwrap();
        (dir, state)
    }

    #[test]
    fn records_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("aquatrack.bin");
        let snapshot_path = dir.path().join("widget_snapshot.json");

        {
            let state = AppState::load_from(data_path.clone(), snapshot_path.clone()).unwrap();
            state.add_record(250.0);
            state.add_record(-100.0);
        }

        let reloaded = AppState::load_from(data_path, snapshot_path).unwrap();
        let records = reloaded.all_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, 250.0);
        assert_eq!(records[1].amount, -100.0);
    }

    #[test]
    fn record_ids_are_assigned_in_order() {
        let (_dir, state) = temp_state();

        let first = state.add_record(250.0);
        let second = state.add_record(500.0);

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn settings_are_created_once_with_defaults() {
        let (_dir, state) = temp_state();

        let first = state.get_or_create_settings();
        let second = state.get_or_create_settings();

        assert_eq!(first.daily_goal_ml, DEFAULT_DAILY_GOAL_ML);
        assert_eq!(first.reminder_enabled, false);
        assert_eq!(
            first.reminder_interval_minutes,
            DEFAULT_REMINDER_INTERVAL_MINUTES
        );
        assert_eq!(first, second);
    }

    #[test]
    fn settings_changes_persist_across_reloads() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("aquatrack.bin");
        let snapshot_path = dir.path().join("widget_snapshot.json");

        {
            let state = AppState::load_from(data_path.clone(), snapshot_path.clone()).unwrap();
            state.update_settings(|settings| settings.daily_goal_ml = 2500.0);
        }

        let reloaded = AppState::load_from(data_path, snapshot_path).unwrap();
        assert_eq!(reloaded.get_or_create_settings().daily_goal_ml, 2500.0);
    }

    #[test]
    fn the_store_accepts_a_correction_past_zero() {
        // The decrease guard lives in the command layer only. Calling the
        // store directly drives the total negative, as documented.
        let (_dir, state) = temp_state();

        state.add_record(300.0);
        state.add_record(-500.0);

        let total: f64 = state.all_records().iter().map(|p| p.amount).sum();
        assert_eq!(total, -200.0);
    }

    #[test]
    fn a_failed_save_keeps_the_in_memory_mutation() {
        let dir = TempDir::new().unwrap();
        let state = AppState::load_from(
            dir.path().join("aquatrack.bin"),
            dir.path().join("widget_snapshot.json"),
        )
        .unwrap();

        // Pull the directory out from under the store so every save fails.
        drop(dir);

        let point = state.add_record(250.0);
        assert_eq!(point.amount, 250.0);
        assert_eq!(state.all_records().len(), 1);
    }

    #[test]
    fn load_fails_without_a_usable_directory() {
        let dir = TempDir::new().unwrap();
        let file_in_the_way = dir.path().join("not-a-directory");
        std::fs::write(&file_in_the_way, b"x").unwrap();

        let result = AppState::load_from(
            file_in_the_way.join("aquatrack.bin"),
            file_in_the_way.join("widget_snapshot.json"),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reminder_changes_signal_the_scheduler() {
        let (_dir, state) = temp_state();

        state.update_settings(|settings| settings.reminder_enabled = true);

        tokio::time::timeout(
            Duration::from_secs(1),
            state.reminder_settings_changed.notified(),
        )
        .await
        .expect("a reminder change should wake the scheduler");
    }

    #[tokio::test]
    async fn goal_changes_do_not_rearm_the_reminder_timer() {
        let (_dir, state) = temp_state();

        state.update_settings(|settings| settings.daily_goal_ml = 3000.0);

        let woke = tokio::time::timeout(
            Duration::from_millis(50),
            state.reminder_settings_changed.notified(),
        )
        .await;
        assert!(woke.is_err());
    }
}
