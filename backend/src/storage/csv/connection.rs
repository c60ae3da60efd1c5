//! Shared file-system connection for the CSV/YAML repositories.

use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Manages the base data directory and per-driver subdirectories
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Create a connection rooted at the given base directory, creating it
    /// if necessary
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a connection in the default data directory.
    ///
    /// Uses `FINANDRIVE_DATA_DIR` when set, otherwise `~/FinanDrive`.
    pub fn new_default() -> Result<Self> {
        if let Ok(dir) = std::env::var("FINANDRIVE_DATA_DIR") {
            info!("Using data directory from FINANDRIVE_DATA_DIR: {}", dir);
            return Self::new(dir);
        }

        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;

        let default_data_dir = PathBuf::from(home_dir).join("FinanDrive");
        info!("Using default data directory: {}", default_data_dir.display());
        Self::new(default_data_dir)
    }

    /// Directory holding one driver's data files
    pub fn get_driver_directory(&self, driver_id: &str) -> PathBuf {
        self.base_directory.join(driver_id)
    }

    /// Ensure the driver's directory exists and return it
    pub fn ensure_driver_directory(&self, driver_id: &str) -> Result<PathBuf> {
        let driver_dir = self.get_driver_directory(driver_id);
        if !driver_dir.exists() {
            fs::create_dir_all(&driver_dir)?;
        }
        Ok(driver_dir)
    }

    /// Ensure a CSV file exists with the given header line
    pub fn ensure_csv_file_exists(
        &self,
        driver_id: &str,
        file_name: &str,
        header: &str,
    ) -> Result<PathBuf> {
        let driver_dir = self.ensure_driver_directory(driver_id)?;
        let file_path = driver_dir.join(file_name);

        if !file_path.exists() {
            fs::write(&file_path, format!("{}\n", header))?;
        }

        Ok(file_path)
    }
}
