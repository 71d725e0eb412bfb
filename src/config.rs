//! Where the stores live and which time zone borrow times are recorded in

use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::io::{CsvBorrowLedger, FileAccountRegistry, FileInventoryStore};

/// File name of the account registry inside the data directory
pub const ACCOUNTS_FILE: &str = "accounts.txt";
/// File name of the stock levels inside the data directory
pub const INVENTORY_FILE: &str = "database.txt";
/// File name of the borrow ledger inside the data directory
pub const LEDGER_FILE: &str = "log.csv";

/// Zone used for ledger timestamps unless overridden
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Manila;

/// Locations of the three backing files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Account registry
    pub accounts: PathBuf,
    /// Stock levels
    pub inventory: PathBuf,
    /// Borrow ledger
    pub ledger: PathBuf,
}

impl StorePaths {
    /// The default file names, resolved inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            accounts: dir.join(ACCOUNTS_FILE),
            inventory: dir.join(INVENTORY_FILE),
            ledger: dir.join(LEDGER_FILE),
        }
    }

    /// Opens the file-backed stores at these paths
    #[must_use]
    pub fn open(&self) -> (FileAccountRegistry, FileInventoryStore, CsvBorrowLedger) {
        (
            FileAccountRegistry::new(&self.accounts),
            FileInventoryStore::new(&self.inventory),
            CsvBorrowLedger::new(&self.ledger),
        )
    }
}

impl Default for StorePaths {
    fn default() -> Self {
        StorePaths::in_dir(".")
    }
}

/// Runtime settings for a borrowing station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Backing files
    pub paths: StorePaths,
    /// Zone for ledger timestamps
    pub timezone: Tz,
}

impl Settings {
    /// Settings for a data directory, keeping the default time zone
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            paths: StorePaths::in_dir(dir),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::in_dir(".")
    }
}
