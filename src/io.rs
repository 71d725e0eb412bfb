//! Flat-file and CSV persistence for accounts, stock levels and the borrow ledger

use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use csv::Trim;
use log::debug;

use crate::{
    errors::Error,
    types::{
        Account, AccountRegistry, BorrowLedger, Inventory, InventoryItem, InventoryStore,
        LedgerRecord,
    },
};

/// Loads accounts from a headerless, comma-delimited stream.
///
/// Expects one account per line, name first:
/// ```csv
/// Ana,1001
/// Ben,1002
/// ```
pub fn read_accounts<R: Read>(reader: &mut R) -> Result<Vec<Account>, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(reader);
    let mut accounts = Vec::new();
    for record in csv_reader.deserialize() {
        let account: Account = record?;
        accounts.push(account);
    }
    Ok(accounts)
}

/// Writes a single account line in the format read by [`read_accounts`].
pub fn write_account<W: Write>(writer: &mut W, account: &Account) -> Result<(), Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.serialize(account)?;
    csv_writer.flush()?;
    Ok(())
}

/// Loads stock levels from a headerless, comma-delimited stream.
///
/// Expects one material per line:
/// ```csv
/// Beaker,5
/// Bunsen burner,2
/// ```
/// If a name appears twice, the later quantity wins.
pub fn read_inventory<R: Read>(reader: &mut R) -> Result<Inventory, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(reader);
    csv_reader
        .deserialize::<InventoryItem>()
        .map(|record| record.map_err(Error::from))
        .collect()
}

/// Writes every material, in stored order, in the format read by [`read_inventory`].
pub fn write_inventory<W: Write>(writer: &mut W, inventory: &Inventory) -> Result<(), Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for item in inventory {
        csv_writer.serialize(item)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Loads borrow records from a ledger stream.
///
/// Expects data in this format (including header):
/// ```csv
/// Borrower,Student Number,Date,Materials
/// Ana,1001,2024-03-02 07:30,Beaker:3; Flask:1
/// ```
pub fn read_ledger<R: Read>(reader: &mut R) -> Result<Vec<LedgerRecord>, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for record in csv_reader.deserialize() {
        let record: LedgerRecord = record?;
        records.push(record);
    }
    Ok(records)
}

/// Writes one ledger row, preceded by the header row when `with_header` is set.
pub fn write_ledger_record<W: Write>(
    writer: &mut W,
    record: &LedgerRecord,
    with_header: bool,
) -> Result<(), Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(writer);
    csv_writer.serialize(record)?;
    csv_writer.flush()?;
    Ok(())
}

/// Opens `path` for reading, or returns `None` if it does not exist yet.
fn open_if_found(path: &Path) -> Result<Option<BufReader<File>>, Error> {
    match File::open(path) {
        Ok(file) => Ok(Some(BufReader::new(file))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn create_parent_dir(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn open_for_append(path: &Path) -> Result<File, Error> {
    create_parent_dir(path)?;
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Account registry kept in a plain text file of `name,studentId` lines.
///
/// # Limitations
/// Appends are not locked; a single process is assumed to own the file.
#[derive(Debug, Clone)]
pub struct FileAccountRegistry {
    path: PathBuf,
}

impl FileAccountRegistry {
    /// Uses the file at `path`, which need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AccountRegistry for FileAccountRegistry {
    fn accounts(&self) -> Result<Vec<Account>, Error> {
        match open_if_found(&self.path)? {
            Some(mut reader) => read_accounts(&mut reader),
            None => Ok(Vec::new()),
        }
    }

    fn append(&mut self, account: Account) -> Result<(), Error> {
        debug!("Appending account to {}", self.path.display());
        let mut file = open_for_append(&self.path)?;
        write_account(&mut file, &account)
    }
}

/// Stock levels kept in a plain text file of `name,quantity` lines.
///
/// Every save rewrites the whole file.
#[derive(Debug, Clone)]
pub struct FileInventoryStore {
    path: PathBuf,
}

impl FileInventoryStore {
    /// Uses the file at `path`, which need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InventoryStore for FileInventoryStore {
    fn load(&self) -> Result<Inventory, Error> {
        debug!("Loading inventory from {}", self.path.display());
        match open_if_found(&self.path)? {
            Some(mut reader) => read_inventory(&mut reader),
            None => Ok(Inventory::new()),
        }
    }

    fn save(&mut self, inventory: &Inventory) -> Result<(), Error> {
        debug!(
            "Saving {} material(s) to {}",
            inventory.len(),
            self.path.display()
        );
        create_parent_dir(&self.path)?;
        let mut file = File::create(&self.path)?;
        write_inventory(&mut file, inventory)
    }
}

/// Borrow ledger kept as a CSV file with a header row.
///
/// Rows are only ever appended.
#[derive(Debug, Clone)]
pub struct CsvBorrowLedger {
    path: PathBuf,
}

impl CsvBorrowLedger {
    /// Uses the file at `path`, which need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BorrowLedger for CsvBorrowLedger {
    fn append(&mut self, record: &LedgerRecord) -> Result<(), Error> {
        let mut file = open_for_append(&self.path)?;
        let is_new = file.metadata()?.len() == 0;
        debug!(
            "Appending ledger row to {}{}",
            self.path.display(),
            if is_new { " (new file)" } else { "" }
        );
        write_ledger_record(&mut file, record, is_new)
    }

    fn records(&self) -> Result<Vec<LedgerRecord>, Error> {
        match open_if_found(&self.path)? {
            Some(mut reader) => read_ledger(&mut reader),
            None => Ok(Vec::new()),
        }
    }
}
