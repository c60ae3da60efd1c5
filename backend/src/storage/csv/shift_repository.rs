//! Current-shift snapshot persistence.
//!
//! The live shift is a single document, so it is stored as
//! `current_shift.yaml` rather than an append-oriented CSV. A file that
//! cannot be parsed is reported as absent: a shift whose timestamps cannot
//! be reconstructed is not resumable, and rehydration must fall back to an
//! idle state rather than crash.

use anyhow::Result;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

use crate::domain::models::shift::ShiftState;
use crate::storage::traits::ShiftStorage;

use super::connection::CsvConnection;

const SHIFT_FILE: &str = "current_shift.yaml";

/// YAML-file implementation of [`ShiftStorage`]
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    connection: CsvConnection,
}

impl ShiftRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn shift_file_path(&self, driver_id: &str) -> PathBuf {
        self.connection.get_driver_directory(driver_id).join(SHIFT_FILE)
    }
}

impl ShiftStorage for ShiftRepository {
    fn store_shift(&self, driver_id: &str, shift: &ShiftState) -> Result<()> {
        self.connection.ensure_driver_directory(driver_id)?;
        let path = self.shift_file_path(driver_id);

        // Write via a temp file so a crash mid-write cannot corrupt the
        // only copy of the live shift.
        let tmp_path = path.with_extension("yaml.tmp");
        let yaml = serde_yaml::to_string(shift)?;
        fs::write(&tmp_path, yaml)?;
        fs::rename(&tmp_path, &path)?;

        debug!("Stored shift snapshot for driver {}", driver_id);
        Ok(())
    }

    fn load_shift(&self, driver_id: &str) -> Result<Option<ShiftState>> {
        let path = self.shift_file_path(driver_id);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        match serde_yaml::from_str::<ShiftState>(&contents) {
            Ok(shift) => Ok(Some(shift)),
            Err(e) => {
                warn!(
                    "Malformed shift snapshot for driver {}: {}. Treating as absent.",
                    driver_id, e
                );
                Ok(None)
            }
        }
    }

    fn clear_shift(&self, driver_id: &str) -> Result<()> {
        let path = self.shift_file_path(driver_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
