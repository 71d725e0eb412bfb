//! Common datatypes supporting functions throughout the borrowing core

use std::fmt::Display;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{errors::Error, ops};

/// The maximum number of picks a single [`BorrowSession`] may hold
pub const MAX_PICKS: usize = 12;

/// `strftime` pattern for the borrow timestamp recorded in the ledger
pub const BORROW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Separator between `name:quantity` entries in the ledger's `Materials` column
pub const MATERIALS_SEPARATOR: &str = "; ";

/// Characters a material name may not contain, since the ledger's `Materials` column uses
/// them to delimit entries
pub const RESERVED_NAME_CHARS: [char; 2] = [';', ':'];

/// Renders an instant as `YYYY-MM-DD HH:MM` in the given time zone.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format(BORROW_TIME_FORMAT)
        .to_string()
}

/// A registered borrower.
///
/// Accounts are never updated or deleted once written.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Account {
    /// Display name; unique across all accounts
    pub(crate) name: String,
    /// Student number; unique across all accounts
    pub(crate) student_id: String,
}

impl Account {
    /// Creates an account from a name and a student number
    #[must_use]
    pub fn new(name: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            student_id: student_id.into(),
        }
    }

    /// Returns the account's name
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the account's student number
    #[must_use]
    #[inline]
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Whether this account blocks registering `other`: either field colliding is enough.
    pub(crate) fn collides_with(&self, other: &Account) -> bool {
        self.name == other.name || self.student_id == other.student_id
    }
}

/// One stocked material and how many are on hand
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    /// Unique key within an [`Inventory`]
    pub(crate) name: String,
    /// Units on hand; unsigned, so it can never go below zero
    pub(crate) quantity: u32,
}

impl InventoryItem {
    /// Returns the material name
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the quantity on hand
    #[must_use]
    #[inline]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

impl Display for InventoryItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.quantity)
    }
}

/// Mapping of material name to quantity.
///
/// Iteration follows insertion order: replacing the quantity of an existing name keeps its
/// position, and new names go at the end. Lookups are linear scans, which is plenty for a
/// stock room.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub(crate) items: Vec<InventoryItem>,
}

impl Inventory {
    /// Creates a new, empty [`Inventory`]
    #[must_use]
    pub fn new() -> Self {
        Inventory::default()
    }

    /// Returns the quantity stocked for `name`, if it is stocked at all
    #[must_use]
    pub fn quantity(&self, name: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.quantity)
    }

    /// Returns whether `name` is a key of this inventory
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.quantity(name).is_some()
    }

    /// Sets (or replaces) the quantity for `name`
    pub fn set(&mut self, name: &str, quantity: u32) {
        match self.items.iter_mut().find(|item| item.name == name) {
            Some(item) => item.quantity = quantity,
            None => self.items.push(InventoryItem {
                name: name.to_owned(),
                quantity,
            }),
        }
    }

    /// Removes `name`, returning its quantity if it was present
    pub fn remove(&mut self, name: &str) -> Option<u32> {
        let index = self.items.iter().position(|item| item.name == name)?;
        Some(self.items.remove(index).quantity)
    }

    /// Subtracts `quantity` from `name`, stopping at zero.
    ///
    /// Returns `true` if the subtraction had to be clamped. Unknown names are left alone.
    pub(crate) fn decrement(&mut self, name: &str, quantity: u32) -> bool {
        match self.items.iter_mut().find(|item| item.name == name) {
            Some(item) => {
                let clamped = item.quantity < quantity;
                item.quantity = item.quantity.saturating_sub(quantity);
                clamped
            }
            None => false,
        }
    }

    /// Number of distinct materials
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stocked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over stocked items in stored order
    pub fn iter(&self) -> std::slice::Iter<'_, InventoryItem> {
        self.items.iter()
    }

    /// One `name: quantity` line per material, for display
    #[must_use]
    pub fn listing(&self) -> Vec<String> {
        self.items.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a InventoryItem;
    type IntoIter = std::slice::Iter<'a, InventoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<InventoryItem> for Inventory {
    /// Later duplicates of a name replace the earlier quantity in place.
    fn from_iter<T: IntoIterator<Item = InventoryItem>>(iter: T) -> Self {
        let mut inventory = Inventory::new();
        for item in iter {
            inventory.set(&item.name, item.quantity);
        }
        inventory
    }
}

/// One line item chosen during a borrowing session, not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub(crate) material: String,
    /// Always at least one
    pub(crate) quantity: u32,
}

impl Pick {
    /// Returns the picked material's name
    #[must_use]
    #[inline]
    pub fn material(&self) -> &str {
        &self.material
    }

    /// Returns how many units were picked
    #[must_use]
    #[inline]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `name:quantity`, the form stored in the ledger
    pub(crate) fn ledger_entry(&self) -> String {
        format!("{}:{}", self.material, self.quantity)
    }
}

impl Display for Pick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.material, self.quantity)
    }
}

/// The in-progress selection of one borrowing interaction.
///
/// Holds the picks made so far plus a working copy of the inventory snapshot taken when the
/// session began. Each accepted pick is subtracted from the working copy, so a second pick of
/// the same material sees reduced availability.
#[derive(Debug, Clone, Default)]
pub struct BorrowSession {
    pub(crate) picks: Vec<Pick>,
    pub(crate) available: Inventory,
}

impl BorrowSession {
    /// Starts an empty session against a snapshot of the inventory
    #[must_use]
    pub fn new(snapshot: Inventory) -> Self {
        Self {
            picks: Vec::new(),
            available: snapshot,
        }
    }

    /// Picks made so far, in the order they were added
    #[must_use]
    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    /// Quantity of `name` still available in the working copy
    #[must_use]
    pub fn available(&self, name: &str) -> Option<u32> {
        self.available.quantity(name)
    }

    /// The working copy, for listing materials to choose from
    #[must_use]
    pub fn working_inventory(&self) -> &Inventory {
        &self.available
    }

    /// Number of picks held
    #[must_use]
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    /// Whether no picks have been made
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

/// One committed borrowing, as written to the ledger
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    #[serde(rename = "Borrower")]
    pub(crate) borrower: String,
    #[serde(rename = "Student Number")]
    pub(crate) student_id: String,
    #[serde(rename = "Date")]
    pub(crate) timestamp: String,
    /// `name:quantity` entries in session order
    #[serde(
        rename = "Materials",
        serialize_with = "serialize_materials",
        deserialize_with = "deserialize_materials"
    )]
    pub(crate) materials: Vec<String>,
}

impl LedgerRecord {
    /// Builds the record for `borrower` taking `picks` at `timestamp`
    #[must_use]
    pub fn new(borrower: &Account, timestamp: &str, picks: &[Pick]) -> Self {
        Self {
            borrower: borrower.name.clone(),
            student_id: borrower.student_id.clone(),
            timestamp: timestamp.to_owned(),
            materials: picks.iter().map(Pick::ledger_entry).collect(),
        }
    }

    /// Returns the borrower's name
    #[must_use]
    pub fn borrower(&self) -> &str {
        &self.borrower
    }

    /// Returns the borrower's student number
    #[must_use]
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Returns the formatted borrow time
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns the `name:quantity` entries
    #[must_use]
    pub fn materials(&self) -> &[String] {
        &self.materials
    }
}

/// Joins the materials into the single `Materials` column
fn serialize_materials<S>(materials: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&materials.join(MATERIALS_SEPARATOR))
}

/// Splits the `Materials` column back into entries
fn deserialize_materials<'de, D>(value: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let joined = String::deserialize(value)?;
    Ok(joined
        .split(MATERIALS_SEPARATOR)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect())
}

/// An interface to the registry of borrower accounts
pub trait AccountRegistry {
    /// Every registered account, in registration order. An absent backing store is empty.
    fn accounts(&self) -> Result<Vec<Account>, Error>;

    /// Durably appends an account without any uniqueness check
    fn append(&mut self, account: Account) -> Result<(), Error>;

    /// Registers `account` unless its name or its student number is already taken.
    ///
    /// Returns `false` on a collision, in which case nothing is written.
    fn register(&mut self, account: Account) -> Result<bool, Error> {
        ops::register_account(self, account)
    }

    /// Whether an account matches both `name` and `student_id` exactly
    fn authenticate(&self, name: &str, student_id: &str) -> Result<bool, Error> {
        ops::authenticate(self, name, student_id)
    }
}

/// An interface to the persisted stock levels
pub trait InventoryStore {
    /// Reads the whole mapping. An absent backing store is empty.
    fn load(&self) -> Result<Inventory, Error>;

    /// Replaces everything persisted with `inventory`
    fn save(&mut self, inventory: &Inventory) -> Result<(), Error>;

    /// Sets the quantity for `name` and persists the full mapping
    fn upsert(&mut self, name: &str, quantity: u32) -> Result<(), Error> {
        ops::upsert_material(self, name, quantity)
    }

    /// Removes `name` and persists; does nothing if `name` is not stocked
    fn delete(&mut self, name: &str) -> Result<(), Error> {
        ops::delete_material(self, name)
    }
}

/// An interface to the append-only audit log of committed borrowings
pub trait BorrowLedger {
    /// Appends one record after any existing ones
    fn append(&mut self, record: &LedgerRecord) -> Result<(), Error>;

    /// Reads back every record, oldest first
    fn records(&self) -> Result<Vec<LedgerRecord>, Error>;
}

/// Holds accounts in an in-memory structure.
///
/// # Limitations
/// No persistence.
#[derive(Default, Debug)]
pub struct MemoryAccountRegistry {
    pub(crate) accounts: Vec<Account>,
}

impl MemoryAccountRegistry {
    /// Creates a new, empty [`MemoryAccountRegistry`]
    #[must_use]
    pub fn new() -> Self {
        MemoryAccountRegistry::default()
    }
}

/// Holds the inventory in an in-memory structure.
///
/// # Limitations
/// No persistence. Counts calls to [`InventoryStore::save`] so callers can observe batching.
#[derive(Default, Debug)]
pub struct MemoryInventoryStore {
    pub(crate) inventory: Inventory,
    pub(crate) saves: usize,
}

impl MemoryInventoryStore {
    /// Creates a new, empty [`MemoryInventoryStore`]
    #[must_use]
    pub fn new() -> Self {
        MemoryInventoryStore::default()
    }

    /// Creates a store that already holds `inventory`
    #[must_use]
    pub fn with_inventory(inventory: Inventory) -> Self {
        Self {
            inventory,
            saves: 0,
        }
    }

    /// How many times the full mapping has been saved
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

/// Holds ledger records in an in-memory structure.
///
/// # Limitations
/// No persistence.
#[derive(Default, Debug)]
pub struct MemoryBorrowLedger {
    pub(crate) records: Vec<LedgerRecord>,
}

impl MemoryBorrowLedger {
    /// Creates a new, empty [`MemoryBorrowLedger`]
    #[must_use]
    pub fn new() -> Self {
        MemoryBorrowLedger::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn item(name: &str, quantity: u32) -> InventoryItem {
        InventoryItem {
            name: name.to_owned(),
            quantity,
        }
    }

    #[test]
    fn test_set_keeps_position_of_existing_name() {
        let mut inventory: Inventory = [item("Beaker", 5), item("Flask", 2)].into_iter().collect();
        inventory.set("Beaker", 9);
        inventory.set("Pipette", 1);
        assert_eq!(
            inventory.listing(),
            vec!["Beaker: 9", "Flask: 2", "Pipette: 1"]
        );
    }

    #[test]
    fn test_duplicate_names_collapse_on_collect() {
        let inventory: Inventory = [item("Beaker", 5), item("Flask", 2), item("Beaker", 1)]
            .into_iter()
            .collect();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.quantity("Beaker"), Some(1));
    }

    #[test]
    fn test_decrement_clamps_at_zero() {
        let mut inventory: Inventory = [item("Beaker", 2)].into_iter().collect();
        assert!(!inventory.decrement("Beaker", 1));
        assert_eq!(inventory.quantity("Beaker"), Some(1));
        assert!(inventory.decrement("Beaker", 4));
        assert_eq!(inventory.quantity("Beaker"), Some(0));
        assert!(!inventory.decrement("Flask", 4));
        assert!(!inventory.contains("Flask"));
    }

    #[test]
    fn test_remove() {
        let mut inventory: Inventory = [item("Beaker", 2)].into_iter().collect();
        assert_eq!(inventory.remove("Flask"), None);
        assert_eq!(inventory.remove("Beaker"), Some(2));
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_account_collision_is_either_field() {
        let ana = Account::new("Ana", "1001");
        assert!(ana.collides_with(&Account::new("Ana", "2002")));
        assert!(ana.collides_with(&Account::new("Ben", "1001")));
        assert!(!ana.collides_with(&Account::new("Ben", "2002")));
    }

    #[test]
    fn test_format_timestamp_uses_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 59).unwrap();
        assert_eq!(
            format_timestamp(instant, chrono_tz::Asia::Manila),
            "2024-03-02 07:30"
        );
        assert_eq!(format_timestamp(instant, chrono_tz::UTC), "2024-03-01 23:30");
    }

    #[test]
    fn test_ledger_record_entries_follow_pick_order() {
        let picks = vec![
            Pick {
                material: "Flask".to_owned(),
                quantity: 1,
            },
            Pick {
                material: "Beaker".to_owned(),
                quantity: 3,
            },
        ];
        let record = LedgerRecord::new(&Account::new("Ana", "1001"), "2024-03-02 07:30", &picks);
        assert_eq!(record.materials(), ["Flask:1", "Beaker:3"]);
        assert_eq!(record.borrower(), "Ana");
        assert_eq!(record.student_id(), "1001");
    }
}
