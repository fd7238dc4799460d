//! Local copy of the last fetched toggles, read on start-up.

use std::path::{Path, PathBuf};

use switchyard_core::collection::FeatureCollection;
use switchyard_util::fs::{read_optional, write_atomic};

use crate::events::{Event, EventDispatcher};

pub trait BackupHandler: Send + Sync {
    fn read(&self) -> Option<FeatureCollection>;
    fn write(&self, collection: &FeatureCollection);
}

/// Stores the backup as a JSON file.
pub struct FileBackupHandler {
    path: PathBuf,
    dispatcher: EventDispatcher,
}

impl FileBackupHandler {
    pub fn new(path: impl Into<PathBuf>, dispatcher: EventDispatcher) -> Self {
        Self {
            path: path.into(),
            dispatcher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackupHandler for FileBackupHandler {
    fn read(&self) -> Option<FeatureCollection> {
        tracing::info!("Reading feature toggles from backup {}", self.path.display());
        let content = match read_optional(&self.path) {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::info!("Backup file {} does not exist yet", self.path.display());
                return None;
            }
            Err(e) => {
                self.dispatcher.dispatch(Event::error(format!(
                    "Failed to read backup file {}: {e}",
                    self.path.display()
                )));
                return None;
            }
        };
        match FeatureCollection::from_json(&content) {
            Ok(collection) => {
                self.dispatcher.dispatch(Event::FeaturesBackupRestored {
                    toggle_count: collection.features.len(),
                });
                Some(collection)
            }
            Err(e) => {
                self.dispatcher.dispatch(Event::error(format!(
                    "Backup file {} is corrupt: {e}",
                    self.path.display()
                )));
                None
            }
        }
    }

    fn write(&self, collection: &FeatureCollection) {
        let result = collection
            .to_json()
            .and_then(|json| write_atomic(&self.path, json.as_bytes()).map_err(Into::into));
        match result {
            Ok(()) => self.dispatcher.dispatch(Event::FeaturesBackedUp {
                toggle_count: collection.features.len(),
            }),
            Err(e) => self.dispatcher.dispatch(Event::error(format!(
                "Unable to back up feature toggles to {}: {e}",
                self.path.display()
            ))),
        }
    }
}
