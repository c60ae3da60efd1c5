//! # CSV Bill Repository
//!
//! File-based storage for recurring bill obligations, one `bills.csv` per
//! driver.
//!
//! ## CSV Format
//!
//! ```csv
//! id,description,amount,due_date,created_at
//! bill::1702516122000,Rent,1200.0,2023-12-05,2023-12-14T01:02:02Z
//! ```

use anyhow::Result;
use csv::{Reader, Writer};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use shared::Bill;

use crate::storage::traits::BillStorage;

use super::connection::CsvConnection;

const BILLS_FILE: &str = "bills.csv";
const BILLS_HEADER: &str = "id,description,amount,due_date,created_at";

/// CSV record structure for bills
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BillRecord {
    id: String,
    description: String,
    amount: f64,
    due_date: String,
    created_at: String,
}

impl From<Bill> for BillRecord {
    fn from(bill: Bill) -> Self {
        BillRecord {
            id: bill.id,
            description: bill.description,
            amount: bill.amount,
            due_date: bill.due_date,
            created_at: bill.created_at,
        }
    }
}

impl From<BillRecord> for Bill {
    fn from(record: BillRecord) -> Self {
        Bill {
            id: record.id,
            description: record.description,
            amount: record.amount,
            due_date: record.due_date,
            created_at: record.created_at,
        }
    }
}

/// CSV-based bill repository using per-driver files
#[derive(Debug, Clone)]
pub struct BillRepository {
    connection: CsvConnection,
}

impl BillRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn bills_file_path(&self, driver_id: &str) -> PathBuf {
        self.connection.get_driver_directory(driver_id).join(BILLS_FILE)
    }

    /// Read all bills for a driver from their CSV file
    fn read_bills(&self, driver_id: &str) -> Result<Vec<Bill>> {
        self.connection
            .ensure_csv_file_exists(driver_id, BILLS_FILE, BILLS_HEADER)?;

        let file = File::open(self.bills_file_path(driver_id))?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        let mut bills = Vec::new();
        for result in csv_reader.deserialize::<BillRecord>() {
            match result {
                Ok(record) => bills.push(Bill::from(record)),
                Err(e) => {
                    warn!("Failed to parse bill record: {}. Skipping.", e);
                    continue;
                }
            }
        }

        Ok(bills)
    }

    /// Rewrite the whole bills file via a temp file (atomic replace)
    fn write_bills(&self, driver_id: &str, bills: &[Bill]) -> Result<()> {
        self.connection.ensure_driver_directory(driver_id)?;
        let file_path = self.bills_file_path(driver_id);
        let temp_path = file_path.with_extension("csv.tmp");

        {
            let file = File::create(&temp_path)?;
            let mut csv_writer = Writer::from_writer(BufWriter::new(file));
            for bill in bills {
                csv_writer.serialize(BillRecord::from(bill.clone()))?;
            }
            csv_writer.flush()?;
        }

        std::fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} bills for driver {}", bills.len(), driver_id);
        Ok(())
    }
}

impl BillStorage for BillRepository {
    fn store_bill(&self, driver_id: &str, bill: &Bill) -> Result<()> {
        let mut bills = self.read_bills(driver_id)?;
        bills.push(bill.clone());
        self.write_bills(driver_id, &bills)
    }

    fn list_bills(&self, driver_id: &str) -> Result<Vec<Bill>> {
        let mut bills = self.read_bills(driver_id)?;
        bills.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(bills)
    }

    fn delete_bill(&self, driver_id: &str, bill_id: &str) -> Result<bool> {
        let bills = self.read_bills(driver_id)?;
        let original_len = bills.len();
        let remaining: Vec<Bill> = bills.into_iter().filter(|b| b.id != bill_id).collect();

        if remaining.len() == original_len {
            return Ok(false);
        }

        self.write_bills(driver_id, &remaining)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_repository() -> (tempfile::TempDir, BillRepository) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to init connection");
        (temp_dir, BillRepository::new(connection))
    }

    fn make_bill(id: u64, amount: f64, due_date: &str) -> Bill {
        Bill {
            id: Bill::generate_id(id),
            description: format!("Bill {}", id),
            amount,
            due_date: due_date.to_string(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_store_and_list_bills() {
        let (_guard, repo) = create_test_repository();

        repo.store_bill("driver_1", &make_bill(2, 300.0, "2025-08-20")).unwrap();
        repo.store_bill("driver_1", &make_bill(1, 1200.0, "2025-08-05")).unwrap();

        let bills = repo.list_bills("driver_1").unwrap();
        assert_eq!(bills.len(), 2);
        // Ordered by due date
        assert_eq!(bills[0].due_date, "2025-08-05");
        assert_eq!(bills[1].due_date, "2025-08-20");
    }

    #[test]
    fn test_empty_list_for_new_driver() {
        let (_guard, repo) = create_test_repository();
        assert!(repo.list_bills("driver_1").unwrap().is_empty());
    }

    #[test]
    fn test_delete_bill() {
        let (_guard, repo) = create_test_repository();

        let bill = make_bill(1, 500.0, "2025-08-10");
        repo.store_bill("driver_1", &bill).unwrap();

        assert!(repo.delete_bill("driver_1", &bill.id).unwrap());
        assert!(repo.list_bills("driver_1").unwrap().is_empty());

        // Deleting again reports not-found
        assert!(!repo.delete_bill("driver_1", &bill.id).unwrap());
    }

    #[test]
    fn test_drivers_are_isolated() {
        let (_guard, repo) = create_test_repository();

        repo.store_bill("driver_1", &make_bill(1, 100.0, "2025-08-01")).unwrap();

        assert_eq!(repo.list_bills("driver_1").unwrap().len(), 1);
        assert!(repo.list_bills("driver_2").unwrap().is_empty());
    }
}
