//! The two-field summary shared with the widget process. The widget polls
//! the file on its own cadence and never writes back; a publish here is
//! last-write-wins with no acknowledgment.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::structs::settings::DEFAULT_DAILY_GOAL_ML;

/// Today's total and the goal, serialized as one document so the reader
/// can never observe one field updated without the other.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DailySnapshot {
    pub today_intake_ml: f64,
    pub daily_goal_ml: f64,
}

impl Default for DailySnapshot {
    fn default() -> Self {
        Self {
            today_intake_ml: 0.0,
            daily_goal_ml: DEFAULT_DAILY_GOAL_ML,
        }
    }
}

/// Publishes the pair for the widget. A failed write is logged and
/// dropped; the widget keeps rendering the last published values.
pub fn publish(path: &Path, today_intake_ml: f64, daily_goal_ml: f64) {
    let snapshot = DailySnapshot {
        today_intake_ml,
        daily_goal_ml,
    };

    if let Err(err) = write_snapshot(path, &snapshot) {
        warn!("unable to publish the widget snapshot: {err}");
    }
}

/// Writes to a sibling temp file and renames it into place, so a reader
/// sees either the old pair or the new pair, never a truncated file.
pub fn write_snapshot(path: &Path, snapshot: &DailySnapshot) -> io::Result<()> {
    let json = serde_json::to_vec(snapshot)?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)
}

/// The last published pair. An absent or unreadable snapshot reads as
/// nothing drunk today against the default goal.
pub fn read_snapshot(path: &Path) -> DailySnapshot {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => DailySnapshot::default(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn publish_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widget_snapshot.json");

        publish(&path, 1234.5, 2000.0);

        let snapshot = read_snapshot(&path);
        assert_eq!(snapshot.today_intake_ml, 1234.5);
        assert_eq!(snapshot.daily_goal_ml, 2000.0);
    }

    #[test]
    fn an_absent_snapshot_reads_as_the_documented_defaults() {
        let dir = TempDir::new().unwrap();

        let snapshot = read_snapshot(&dir.path().join("widget_snapshot.json"));
        assert_eq!(snapshot.today_intake_ml, 0.0);
        assert_eq!(snapshot.daily_goal_ml, 2000.0);
    }

    #[test]
    fn a_corrupt_snapshot_reads_as_the_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widget_snapshot.json");
        fs::write(&path, b"not json").unwrap();

        assert_eq!(read_snapshot(&path), DailySnapshot::default());
    }

    #[test]
    fn republishing_replaces_the_pair() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widget_snapshot.json");

        publish(&path, 250.0, 2000.0);
        publish(&path, 750.0, 2500.0);

        let snapshot = read_snapshot(&path);
        assert_eq!(snapshot.today_intake_ml, 750.0);
        assert_eq!(snapshot.daily_goal_ml, 2500.0);
    }

    #[test]
    fn a_failed_publish_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("widget_snapshot.json");

        publish(&path, 100.0, 2000.0);

        assert_eq!(read_snapshot(&path), DailySnapshot::default());
    }
}
