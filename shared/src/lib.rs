use serde::{Deserialize, Serialize};
use std::fmt;

/// Ride platform a driver reports earnings for.
///
/// Each platform is tracked as an independent running total self-reported
/// by the driver, so a later report for the same platform replaces the
/// previous value instead of adding to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "uber")]
    Uber,
    #[serde(rename = "99")]
    NinetyNine,
    #[serde(rename = "indrive")]
    InDrive,
    #[serde(rename = "private")]
    Private,
}

impl Platform {
    /// All platforms in display order
    pub const ALL: [Platform; 4] = [
        Platform::Uber,
        Platform::NinetyNine,
        Platform::InDrive,
        Platform::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Uber => "uber",
            Platform::NinetyNine => "99",
            Platform::InDrive => "indrive",
            Platform::Private => "private",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uber" => Ok(Platform::Uber),
            "99" => Ok(Platform::NinetyNine),
            "indrive" => Ok(Platform::InDrive),
            "private" => Ok(Platform::Private),
            other => Err(PlatformParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformParseError(pub String);

impl fmt::Display for PlatformParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown platform: {}", self.0)
    }
}

impl std::error::Error for PlatformParseError {}

/// Per-platform earnings reported for the current shift.
///
/// Values are replace-on-entry totals, not cumulative sums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Earnings {
    pub uber: f64,
    #[serde(rename = "99")]
    pub ninety_nine: f64,
    pub indrive: f64,
    pub private: f64,
}

impl Earnings {
    pub fn get(&self, platform: Platform) -> f64 {
        match platform {
            Platform::Uber => self.uber,
            Platform::NinetyNine => self.ninety_nine,
            Platform::InDrive => self.indrive,
            Platform::Private => self.private,
        }
    }

    pub fn set(&mut self, platform: Platform, amount: f64) {
        match platform {
            Platform::Uber => self.uber = amount,
            Platform::NinetyNine => self.ninety_nine = amount,
            Platform::InDrive => self.indrive = amount,
            Platform::Private => self.private = amount,
        }
    }

    /// Gross earnings across all platforms
    pub fn gross(&self) -> f64 {
        self.uber + self.ninety_nine + self.indrive + self.private
    }
}

/// A single expense recorded during a shift (append-only audit trail)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub amount: f64,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Epoch milliseconds when the expense was recorded
    pub timestamp_ms: i64,
}

/// Wire snapshot of the current shift state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ShiftSnapshot {
    pub is_active: bool,
    pub is_paused: bool,
    /// Wall-clock instant the shift began (epoch millis)
    pub start_time_ms: Option<i64>,
    /// Wall-clock instant of the most recent pause transition
    pub paused_at_ms: Option<i64>,
    /// Cumulative paused duration, excluding any open pause segment
    pub total_paused_ms: i64,
    /// Last persisted elapsed duration snapshot (whole-minute seconds)
    pub elapsed_seconds: i64,
    pub earnings: Earnings,
    /// Running sum of all expense entries this shift
    pub expenses: f64,
    pub expense_list: Vec<ExpenseEntry>,
    /// Running sum of distance entries this shift
    pub km: f64,
}

/// Request to report a platform earnings total for the current shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEarningRequest {
    pub platform: Platform,
    pub amount: f64,
}

/// Request to record an expense during the current shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExpenseRequest {
    pub amount: f64,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Request to add distance driven during the current shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDistanceRequest {
    pub km: f64,
}

/// Request to correct the shift start instant ("I actually started at 08:15")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditStartTimeRequest {
    pub start_time_ms: i64,
}

/// Response for shift transitions (start/pause/resume/stop/reset/entries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftActionResponse {
    pub shift: ShiftSnapshot,
    pub success_message: String,
}

/// Full live-shift status for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftStatusResponse {
    pub shift: ShiftSnapshot,
    /// Elapsed active minutes, derived from timestamps at request time
    pub elapsed_minutes: i64,
    pub gross_earnings: f64,
    pub net_earnings: f64,
    pub rate_per_hour: f64,
    pub rate_per_km: f64,
    pub goals: DailyGoals,
    pub performance: PerformanceBand,
}

/// Snapshot handed to the history sink when a shift is finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftOutcome {
    pub gross_amount: f64,
    pub km: f64,
    pub duration_hours: f64,
    pub expense_list: Vec<ExpenseEntry>,
}

/// Response after finalizing a shift into history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeShiftResponse {
    pub outcome: ShiftOutcome,
    pub success_message: String,
}

/// A finalized shift as stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftHistoryEntry {
    pub id: String,
    /// RFC 3339 timestamp of when the shift was finalized
    pub ended_at: String,
    pub gross_amount: f64,
    pub km: f64,
    pub duration_hours: f64,
    pub expenses_total: f64,
}

/// Response containing finalized shift history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftHistoryResponse {
    pub shifts: Vec<ShiftHistoryEntry>,
}

/// A recurring bill obligation.
///
/// Bill ID in format: "bill::epoch_millis"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub description: String,
    pub amount: f64,
    /// Due date in ISO 8601 date format (YYYY-MM-DD)
    pub due_date: String,
    /// RFC 3339 timestamp
    pub created_at: String,
}

/// Request for creating a new bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBillRequest {
    pub description: String,
    pub amount: f64,
    /// Due date in ISO 8601 date format (YYYY-MM-DD)
    pub due_date: String,
}

/// Response after creating a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillResponse {
    pub bill: Bill,
    pub success_message: String,
}

/// Response containing all bills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillListResponse {
    pub bills: Vec<Bill>,
}

/// User-editable monthly goal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    /// Desired gross revenue for the month
    pub monthly_salary_goal: f64,
    /// Days the driver plans to work this month
    pub monthly_working_days: u32,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            monthly_salary_goal: 0.0,
            monthly_working_days: 26,
        }
    }
}

/// Request for updating the monthly goal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalConfigRequest {
    pub monthly_salary_goal: f64,
    pub monthly_working_days: u32,
}

/// Response after reading or updating the goal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalConfigResponse {
    pub config: GoalConfig,
    pub success_message: String,
}

/// Daily revenue targets derived from monthly bills and the salary goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DailyGoals {
    /// Minimum daily revenue required to cover bill obligations
    pub daily_bills_goal: f64,
    /// The user's desired daily gross revenue
    pub daily_gross_goal_input: f64,
    /// The larger of the bills floor and the gross goal
    pub daily_total_goal: f64,
    /// Whatever remains above the bills floor, never negative
    pub daily_projected_profit: f64,
}

/// Response containing today's derived goals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGoalsResponse {
    pub goals: DailyGoals,
    pub total_monthly_bills: f64,
    pub working_days: u32,
}

/// Classification of live shift performance against the daily goals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBand {
    /// No goal configured
    Neutral,
    /// Net earnings below the bill-coverage floor
    BelowBills,
    /// Bills covered but below the salary goal
    Between,
    /// Salary goal met or exceeded
    AboveSalary,
}

impl Bill {
    /// Generate a bill ID from a timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("bill::{}", epoch_millis)
    }

    /// Parse a bill ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, BillIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 2 || parts[0] != "bill" {
            return Err(BillIdError::InvalidFormat);
        }

        parts[1].parse::<u64>().map_err(|_| BillIdError::InvalidTimestamp)
    }

    /// Extract timestamp from bill ID for sorting
    pub fn extract_timestamp(&self) -> Result<u64, BillIdError> {
        Self::parse_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BillIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for BillIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillIdError::InvalidFormat => write!(f, "Invalid bill ID format"),
            BillIdError::InvalidTimestamp => write!(f, "Invalid timestamp in bill ID"),
        }
    }
}

impl std::error::Error for BillIdError {}

impl ShiftHistoryEntry {
    /// Generate a shift history ID from the finalize timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("shift::{}", epoch_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_wire_names() {
        assert_eq!(serde_json::to_string(&Platform::Uber).unwrap(), "\"uber\"");
        assert_eq!(serde_json::to_string(&Platform::NinetyNine).unwrap(), "\"99\"");
        assert_eq!(serde_json::to_string(&Platform::InDrive).unwrap(), "\"indrive\"");
        assert_eq!(serde_json::to_string(&Platform::Private).unwrap(), "\"private\"");

        let parsed: Platform = serde_json::from_str("\"99\"").unwrap();
        assert_eq!(parsed, Platform::NinetyNine);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("uber".parse::<Platform>().unwrap(), Platform::Uber);
        assert_eq!("99".parse::<Platform>().unwrap(), Platform::NinetyNine);
        assert_eq!("indrive".parse::<Platform>().unwrap(), Platform::InDrive);
        assert_eq!("private".parse::<Platform>().unwrap(), Platform::Private);
        assert!("lyft".parse::<Platform>().is_err());
    }

    #[test]
    fn test_earnings_get_set_gross() {
        let mut earnings = Earnings::default();
        assert_eq!(earnings.gross(), 0.0);

        earnings.set(Platform::Uber, 80.0);
        earnings.set(Platform::NinetyNine, 45.5);
        assert_eq!(earnings.get(Platform::Uber), 80.0);
        assert_eq!(earnings.get(Platform::NinetyNine), 45.5);
        assert_eq!(earnings.gross(), 125.5);

        // A later report for the same platform replaces, not adds
        earnings.set(Platform::Uber, 95.0);
        assert_eq!(earnings.get(Platform::Uber), 95.0);
        assert_eq!(earnings.gross(), 140.5);
    }

    #[test]
    fn test_generate_bill_id() {
        let id = Bill::generate_id(1702516122000);
        assert_eq!(id, "bill::1702516122000");
    }

    #[test]
    fn test_parse_bill_id() {
        // Test valid bill ID
        let timestamp = Bill::parse_id("bill::1702516122000").unwrap();
        assert_eq!(timestamp, 1702516122000);

        // Test invalid format
        assert!(Bill::parse_id("invalid::format").is_err());
        assert!(Bill::parse_id("bill").is_err());
        assert!(Bill::parse_id("not_bill::123").is_err());

        // Test invalid timestamp
        assert!(Bill::parse_id("bill::not_a_number").is_err());
    }

    #[test]
    fn test_bill_extract_timestamp() {
        let bill = Bill {
            id: "bill::1702516122000".to_string(),
            description: "Rent".to_string(),
            amount: 1200.0,
            due_date: "2023-12-05".to_string(),
            created_at: "2023-12-14T01:02:02.000Z".to_string(),
        };

        assert_eq!(bill.extract_timestamp().unwrap(), 1702516122000);
    }

    #[test]
    fn test_generate_shift_history_id() {
        let id = ShiftHistoryEntry::generate_id(1702516122000);
        assert_eq!(id, "shift::1702516122000");
    }

    #[test]
    fn test_goal_config_default_working_days() {
        let config = GoalConfig::default();
        assert_eq!(config.monthly_working_days, 26);
        assert_eq!(config.monthly_salary_goal, 0.0);
    }
}
