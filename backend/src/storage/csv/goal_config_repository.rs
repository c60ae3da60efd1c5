//! Monthly goal configuration persistence (`goal_config.yaml` per driver).

use anyhow::Result;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

use shared::GoalConfig;

use crate::storage::traits::GoalConfigStorage;

use super::connection::CsvConnection;

const GOAL_CONFIG_FILE: &str = "goal_config.yaml";

/// YAML-file implementation of [`GoalConfigStorage`]
#[derive(Debug, Clone)]
pub struct GoalConfigRepository {
    connection: CsvConnection,
}

impl GoalConfigRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn config_file_path(&self, driver_id: &str) -> PathBuf {
        self.connection
            .get_driver_directory(driver_id)
            .join(GOAL_CONFIG_FILE)
    }
}

impl GoalConfigStorage for GoalConfigRepository {
    fn get_goal_config(&self, driver_id: &str) -> Result<Option<GoalConfig>> {
        let path = self.config_file_path(driver_id);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        match serde_yaml::from_str::<GoalConfig>(&contents) {
            Ok(config) => Ok(Some(config)),
            Err(e) => {
                warn!(
                    "Malformed goal config for driver {}: {}. Treating as unset.",
                    driver_id, e
                );
                Ok(None)
            }
        }
    }

    fn set_goal_config(&self, driver_id: &str, config: &GoalConfig) -> Result<()> {
        self.connection.ensure_driver_directory(driver_id)?;
        let path = self.config_file_path(driver_id);

        let tmp_path = path.with_extension("yaml.tmp");
        fs::write(&tmp_path, serde_yaml::to_string(config)?)?;
        fs::rename(&tmp_path, &path)?;

        debug!("Stored goal config for driver {}", driver_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_repository() -> (tempfile::TempDir, GoalConfigRepository) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to init connection");
        (temp_dir, GoalConfigRepository::new(connection))
    }

    #[test]
    fn test_unset_config_is_none() {
        let (_guard, repo) = create_test_repository();
        assert_eq!(repo.get_goal_config("driver_1").unwrap(), None);
    }

    #[test]
    fn test_set_and_get_config() {
        let (_guard, repo) = create_test_repository();

        let config = GoalConfig {
            monthly_salary_goal: 5200.0,
            monthly_working_days: 24,
        };
        repo.set_goal_config("driver_1", &config).unwrap();

        assert_eq!(repo.get_goal_config("driver_1").unwrap(), Some(config));
    }

    #[test]
    fn test_set_replaces_previous() {
        let (_guard, repo) = create_test_repository();

        repo.set_goal_config(
            "driver_1",
            &GoalConfig {
                monthly_salary_goal: 3000.0,
                monthly_working_days: 26,
            },
        )
        .unwrap();
        repo.set_goal_config(
            "driver_1",
            &GoalConfig {
                monthly_salary_goal: 4500.0,
                monthly_working_days: 22,
            },
        )
        .unwrap();

        let loaded = repo.get_goal_config("driver_1").unwrap().unwrap();
        assert_eq!(loaded.monthly_salary_goal, 4500.0);
        assert_eq!(loaded.monthly_working_days, 22);
    }
}
