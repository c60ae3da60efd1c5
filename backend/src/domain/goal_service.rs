//! Goal engine: daily revenue targets and live performance classification.
//!
//! Translates the monthly salary goal and the bills due in the current
//! calendar month into a per-working-day target, then classifies a shift's
//! net earnings against it. Bills are a floor, never optional: the daily
//! total goal is the larger of the bill-coverage floor and the user's
//! stated gross goal, even when the stated goal is lower.

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

use shared::{Bill, DailyGoals, GoalConfig, PerformanceBand};

use crate::domain::commands::bills::CreateBillCommand;
use crate::domain::commands::goals::{DailyGoalsResult, UpdateGoalConfigCommand};
use crate::storage::{BillStorage, GoalConfigStorage};

/// Fallback when the configured working-days count is missing or zero;
/// also prevents division by zero
const DEFAULT_WORKING_DAYS: u32 = 26;

const MAX_DESCRIPTION_LENGTH: usize = 256;

/// Derive the daily targets from the month's bill total and configuration
pub fn compute_daily_goals(
    total_monthly_bills: f64,
    monthly_salary_goal: f64,
    monthly_working_days: u32,
) -> DailyGoals {
    let working_days = if monthly_working_days > 0 {
        monthly_working_days
    } else {
        DEFAULT_WORKING_DAYS
    } as f64;

    let daily_bills_goal = total_monthly_bills / working_days;
    let daily_gross_goal_input = monthly_salary_goal / working_days;
    let daily_total_goal = daily_gross_goal_input.max(daily_bills_goal);
    let daily_projected_profit = (daily_total_goal - daily_bills_goal).max(0.0);

    DailyGoals {
        daily_bills_goal,
        daily_gross_goal_input,
        daily_total_goal,
        daily_projected_profit,
    }
}

/// Classify net earnings against the daily targets
pub fn classify_performance(current_net_earnings: f64, goals: &DailyGoals) -> PerformanceBand {
    if goals.daily_total_goal == 0.0 {
        PerformanceBand::Neutral
    } else if current_net_earnings < goals.daily_bills_goal {
        PerformanceBand::BelowBills
    } else if current_net_earnings < goals.daily_total_goal {
        PerformanceBand::Between
    } else {
        PerformanceBand::AboveSalary
    }
}

/// Revenue per hour, 0 when no time has elapsed (never NaN/Infinity)
pub fn rate_per_hour(amount: f64, elapsed_minutes: i64) -> f64 {
    if elapsed_minutes <= 0 {
        return 0.0;
    }
    amount / (elapsed_minutes as f64 / 60.0)
}

/// Revenue per kilometer, 0 when no distance is recorded
pub fn rate_per_km(amount: f64, km: f64) -> f64 {
    if km <= 0.0 {
        return 0.0;
    }
    amount / km
}

/// Service managing bills, the monthly goal configuration, and the
/// derived daily goals
#[derive(Clone)]
pub struct GoalService {
    driver_id: String,
    bill_storage: Arc<dyn BillStorage>,
    config_storage: Arc<dyn GoalConfigStorage>,
}

impl GoalService {
    pub fn new(
        driver_id: impl Into<String>,
        bill_storage: Arc<dyn BillStorage>,
        config_storage: Arc<dyn GoalConfigStorage>,
    ) -> Self {
        Self {
            driver_id: driver_id.into(),
            bill_storage,
            config_storage,
        }
    }

    /// Create a new bill
    pub fn create_bill(&self, command: CreateBillCommand) -> Result<Bill> {
        if command.description.trim().is_empty() {
            return Err(anyhow::anyhow!("Bill description cannot be empty"));
        }
        if command.description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(anyhow::anyhow!(
                "Bill description cannot exceed {} characters",
                MAX_DESCRIPTION_LENGTH
            ));
        }
        if command.amount <= 0.0 {
            return Err(anyhow::anyhow!("Bill amount must be positive"));
        }
        if NaiveDate::parse_from_str(&command.due_date, "%Y-%m-%d").is_err() {
            return Err(anyhow::anyhow!(
                "Bill due date must be in YYYY-MM-DD format"
            ));
        }

        let now = Utc::now();
        let bill = Bill {
            id: Bill::generate_id(now.timestamp_millis().max(0) as u64),
            description: command.description.trim().to_string(),
            amount: command.amount,
            due_date: command.due_date,
            created_at: now.to_rfc3339(),
        };

        self.bill_storage.store_bill(&self.driver_id, &bill)?;
        info!("Created bill {} for driver {}", bill.id, self.driver_id);
        Ok(bill)
    }

    /// All bills ordered by due date
    pub fn list_bills(&self) -> Result<Vec<Bill>> {
        self.bill_storage.list_bills(&self.driver_id)
    }

    /// Delete a bill, returns true if it existed
    pub fn delete_bill(&self, bill_id: &str) -> Result<bool> {
        let deleted = self.bill_storage.delete_bill(&self.driver_id, bill_id)?;
        if deleted {
            info!("Deleted bill {} for driver {}", bill_id, self.driver_id);
        }
        Ok(deleted)
    }

    /// The goal configuration, defaulting when never set
    pub fn goal_config(&self) -> Result<GoalConfig> {
        Ok(self
            .config_storage
            .get_goal_config(&self.driver_id)?
            .unwrap_or_default())
    }

    /// Replace the goal configuration
    pub fn update_goal_config(&self, command: UpdateGoalConfigCommand) -> Result<GoalConfig> {
        if command.monthly_salary_goal < 0.0 {
            return Err(anyhow::anyhow!("Monthly salary goal cannot be negative"));
        }
        if command.monthly_working_days > 31 {
            return Err(anyhow::anyhow!("Working days cannot exceed 31"));
        }

        let config = GoalConfig {
            monthly_salary_goal: command.monthly_salary_goal,
            monthly_working_days: command.monthly_working_days,
        };
        self.config_storage.set_goal_config(&self.driver_id, &config)?;
        info!(
            "Updated goal config for driver {}: salary {:.2}, {} working days",
            self.driver_id, config.monthly_salary_goal, config.monthly_working_days
        );
        Ok(config)
    }

    /// Daily goals for the month containing `today`
    pub fn daily_goals(&self, today: NaiveDate) -> Result<DailyGoalsResult> {
        let total_monthly_bills = self.monthly_bills_total(today)?;
        let config = self.goal_config()?;

        let working_days = if config.monthly_working_days > 0 {
            config.monthly_working_days
        } else {
            DEFAULT_WORKING_DAYS
        };

        Ok(DailyGoalsResult {
            goals: compute_daily_goals(
                total_monthly_bills,
                config.monthly_salary_goal,
                config.monthly_working_days,
            ),
            total_monthly_bills,
            working_days,
        })
    }

    /// Sum of bills whose due date falls in `today`'s year-month
    fn monthly_bills_total(&self, today: NaiveDate) -> Result<f64> {
        let bills = self.bill_storage.list_bills(&self.driver_id)?;

        let total = bills
            .iter()
            .filter_map(|bill| {
                match NaiveDate::parse_from_str(&bill.due_date, "%Y-%m-%d") {
                    Ok(due) if due.year() == today.year() && due.month() == today.month() => {
                        Some(bill.amount)
                    }
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Bill {} has unparseable due date: {}. Skipping.", bill.id, e);
                        None
                    }
                }
            })
            .sum();

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::{BillRepository, CsvConnection, GoalConfigRepository};

    fn create_test_service() -> (tempfile::TempDir, GoalService) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to init connection");
        let service = GoalService::new(
            "driver_1",
            Arc::new(BillRepository::new(connection.clone())),
            Arc::new(GoalConfigRepository::new(connection)),
        );
        (temp_dir, service)
    }

    #[test]
    fn test_bills_only_goal() {
        // Bills sum 2600 over 26 working days, no salary goal
        let goals = compute_daily_goals(2600.0, 0.0, 26);
        assert_eq!(goals.daily_bills_goal, 100.0);
        assert_eq!(goals.daily_total_goal, 100.0);
        assert_eq!(goals.daily_projected_profit, 0.0);
    }

    #[test]
    fn test_salary_goal_above_bills_floor() {
        let goals = compute_daily_goals(1300.0, 5200.0, 26);
        assert_eq!(goals.daily_bills_goal, 50.0);
        assert_eq!(goals.daily_gross_goal_input, 200.0);
        assert_eq!(goals.daily_total_goal, 200.0);
        assert_eq!(goals.daily_projected_profit, 150.0);
    }

    #[test]
    fn test_bills_floor_beats_lower_salary_goal() {
        // Stated goal below obligations: bills win
        let goals = compute_daily_goals(2600.0, 1300.0, 26);
        assert_eq!(goals.daily_bills_goal, 100.0);
        assert_eq!(goals.daily_gross_goal_input, 50.0);
        assert_eq!(goals.daily_total_goal, 100.0);
        assert_eq!(goals.daily_projected_profit, 0.0);
    }

    #[test]
    fn test_zero_working_days_falls_back() {
        let goals = compute_daily_goals(2600.0, 0.0, 0);
        assert_eq!(goals.daily_bills_goal, 100.0);
    }

    #[test]
    fn test_classification_bands() {
        let goals = compute_daily_goals(1300.0, 5200.0, 26); // bills 50, total 200

        assert_eq!(classify_performance(20.0, &goals), PerformanceBand::BelowBills);
        assert_eq!(classify_performance(120.0, &goals), PerformanceBand::Between);
        assert_eq!(classify_performance(50.0, &goals), PerformanceBand::Between);
        assert_eq!(classify_performance(200.0, &goals), PerformanceBand::AboveSalary);
        assert_eq!(classify_performance(350.0, &goals), PerformanceBand::AboveSalary);
    }

    #[test]
    fn test_classification_neutral_without_goal() {
        let goals = compute_daily_goals(0.0, 0.0, 26);
        assert_eq!(classify_performance(120.0, &goals), PerformanceBand::Neutral);
    }

    #[test]
    fn test_rate_guards() {
        assert_eq!(rate_per_hour(100.0, 0), 0.0);
        assert_eq!(rate_per_hour(100.0, 120), 50.0);
        assert_eq!(rate_per_km(100.0, 0.0), 0.0);
        assert_eq!(rate_per_km(100.0, 50.0), 2.0);
    }

    #[test]
    fn test_daily_goals_filter_bills_by_month() {
        let (_guard, service) = create_test_service();

        service
            .create_bill(CreateBillCommand {
                description: "Rent".to_string(),
                amount: 1200.0,
                due_date: "2025-08-05".to_string(),
            })
            .unwrap();
        service
            .create_bill(CreateBillCommand {
                description: "Insurance".to_string(),
                amount: 100.0,
                due_date: "2025-08-20".to_string(),
            })
            .unwrap();
        // Different month, must not count
        service
            .create_bill(CreateBillCommand {
                description: "Yearly fee".to_string(),
                amount: 999.0,
                due_date: "2025-09-01".to_string(),
            })
            .unwrap();

        service
            .update_goal_config(UpdateGoalConfigCommand {
                monthly_salary_goal: 0.0,
                monthly_working_days: 26,
            })
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 8, 29).unwrap();
        let result = service.daily_goals(today).unwrap();
        assert_eq!(result.total_monthly_bills, 1300.0);
        assert_eq!(result.goals.daily_bills_goal, 50.0);
        assert_eq!(result.working_days, 26);
    }

    #[test]
    fn test_unconfigured_driver_is_neutral() {
        let (_guard, service) = create_test_service();

        let today = NaiveDate::from_ymd_opt(2025, 8, 29).unwrap();
        let result = service.daily_goals(today).unwrap();
        assert_eq!(result.goals.daily_total_goal, 0.0);
        assert_eq!(
            classify_performance(75.0, &result.goals),
            PerformanceBand::Neutral
        );
    }

    #[test]
    fn test_bill_validation() {
        let (_guard, service) = create_test_service();

        assert!(service
            .create_bill(CreateBillCommand {
                description: "   ".to_string(),
                amount: 100.0,
                due_date: "2025-08-05".to_string(),
            })
            .is_err());
        assert!(service
            .create_bill(CreateBillCommand {
                description: "Rent".to_string(),
                amount: 0.0,
                due_date: "2025-08-05".to_string(),
            })
            .is_err());
        assert!(service
            .create_bill(CreateBillCommand {
                description: "Rent".to_string(),
                amount: 100.0,
                due_date: "05/08/2025".to_string(),
            })
            .is_err());
    }

    #[test]
    fn test_config_validation() {
        let (_guard, service) = create_test_service();

        assert!(service
            .update_goal_config(UpdateGoalConfigCommand {
                monthly_salary_goal: -1.0,
                monthly_working_days: 26,
            })
            .is_err());
        assert!(service
            .update_goal_config(UpdateGoalConfigCommand {
                monthly_salary_goal: 0.0,
                monthly_working_days: 32,
            })
            .is_err());
    }
}
