//! # CSV History Repository
//!
//! Append-only storage for finalized shifts. Each driver gets two files:
//! `shift_history.csv` with one row per finalized shift, and
//! `shift_expenses.csv` preserving the per-shift expense audit trail.
//!
//! ## CSV Format
//!
//! ```csv
//! id,ended_at,gross_amount,km,duration_hours,expenses_total
//! shift::1702516122000,2023-12-14T01:02:02Z,250.0,180.5,8.5,45.0
//! ```

use anyhow::Result;
use csv::{Reader, WriterBuilder};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use shared::{ExpenseEntry, ShiftHistoryEntry};

use crate::storage::traits::HistoryStorage;

use super::connection::CsvConnection;

const HISTORY_FILE: &str = "shift_history.csv";
const HISTORY_HEADER: &str = "id,ended_at,gross_amount,km,duration_hours,expenses_total";
const EXPENSES_FILE: &str = "shift_expenses.csv";
const EXPENSES_HEADER: &str = "shift_id,amount,description,category,timestamp_ms";

/// CSV record structure for finalized shifts
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryRecord {
    id: String,
    ended_at: String,
    gross_amount: f64,
    km: f64,
    duration_hours: f64,
    expenses_total: f64,
}

impl From<ShiftHistoryEntry> for HistoryRecord {
    fn from(entry: ShiftHistoryEntry) -> Self {
        HistoryRecord {
            id: entry.id,
            ended_at: entry.ended_at,
            gross_amount: entry.gross_amount,
            km: entry.km,
            duration_hours: entry.duration_hours,
            expenses_total: entry.expenses_total,
        }
    }
}

impl From<HistoryRecord> for ShiftHistoryEntry {
    fn from(record: HistoryRecord) -> Self {
        ShiftHistoryEntry {
            id: record.id,
            ended_at: record.ended_at,
            gross_amount: record.gross_amount,
            km: record.km,
            duration_hours: record.duration_hours,
            expenses_total: record.expenses_total,
        }
    }
}

/// CSV record structure for archived expense entries
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExpenseRecord {
    shift_id: String,
    amount: f64,
    description: String,
    category: String,
    timestamp_ms: i64,
}

/// CSV-based history sink using per-driver files
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    connection: CsvConnection,
}

impl HistoryRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn append_records<T: Serialize>(
        &self,
        driver_id: &str,
        file_name: &str,
        header: &str,
        records: &[T],
    ) -> Result<()> {
        let path = self
            .connection
            .ensure_csv_file_exists(driver_id, file_name, header)?;

        let file = OpenOptions::new().append(true).open(&path)?;
        let mut csv_writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        for record in records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl HistoryStorage for HistoryRepository {
    fn append_shift(
        &self,
        driver_id: &str,
        entry: &ShiftHistoryEntry,
        expenses: &[ExpenseEntry],
    ) -> Result<()> {
        self.append_records(
            driver_id,
            HISTORY_FILE,
            HISTORY_HEADER,
            &[HistoryRecord::from(entry.clone())],
        )?;

        let expense_records: Vec<ExpenseRecord> = expenses
            .iter()
            .map(|e| ExpenseRecord {
                shift_id: entry.id.clone(),
                amount: e.amount,
                description: e.description.clone().unwrap_or_default(),
                category: e.category.clone().unwrap_or_default(),
                timestamp_ms: e.timestamp_ms,
            })
            .collect();
        if !expense_records.is_empty() {
            self.append_records(driver_id, EXPENSES_FILE, EXPENSES_HEADER, &expense_records)?;
        }

        debug!(
            "Archived shift {} with {} expenses for driver {}",
            entry.id,
            expenses.len(),
            driver_id
        );
        Ok(())
    }

    fn list_shifts(&self, driver_id: &str) -> Result<Vec<ShiftHistoryEntry>> {
        let path = self
            .connection
            .ensure_csv_file_exists(driver_id, HISTORY_FILE, HISTORY_HEADER)?;

        let file = File::open(&path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut shifts = Vec::new();
        for result in csv_reader.deserialize::<HistoryRecord>() {
            match result {
                Ok(record) => shifts.push(ShiftHistoryEntry::from(record)),
                Err(e) => {
                    warn!("Failed to parse history record: {}. Skipping.", e);
                    continue;
                }
            }
        }

        // Most recent first; ids embed the finalize timestamp
        shifts.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(shifts)
    }

    fn list_shift_expenses(&self, driver_id: &str, shift_id: &str) -> Result<Vec<ExpenseEntry>> {
        let path = self
            .connection
            .ensure_csv_file_exists(driver_id, EXPENSES_FILE, EXPENSES_HEADER)?;

        let file = File::open(&path)?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut expenses = Vec::new();
        for result in csv_reader.deserialize::<ExpenseRecord>() {
            match result {
                Ok(record) if record.shift_id == shift_id => {
                    expenses.push(ExpenseEntry {
                        amount: record.amount,
                        description: (!record.description.is_empty())
                            .then(|| record.description.clone()),
                        category: (!record.category.is_empty()).then(|| record.category.clone()),
                        timestamp_ms: record.timestamp_ms,
                    });
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!("Failed to parse expense record: {}. Skipping.", e);
                    continue;
                }
            }
        }

        Ok(expenses)
    }
}
