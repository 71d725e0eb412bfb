use log::{debug, info, warn};

use crate::{
    errors::Error,
    types::{
        Account, AccountRegistry, BorrowLedger, BorrowSession, Inventory, InventoryStore,
        LedgerRecord, MemoryAccountRegistry, MemoryBorrowLedger, MemoryInventoryStore, Pick,
        MAX_PICKS,
    },
};

impl BorrowSession {
    /// Adds a pick of `quantity` units of `name`.
    ///
    /// The working copy is reduced by `quantity` so later picks of the same material are
    /// checked against what is left.
    /// # Errors
    /// - [`Error::CapacityExceeded`] if the session already holds [`MAX_PICKS`] picks
    /// - [`Error::NotFound`] if `name` is blank or not in the snapshot
    /// - [`Error::InputInvalid`] if `quantity` is zero
    /// - [`Error::InsufficientStock`] if `quantity` exceeds what the working copy has left
    pub fn add_pick(&mut self, name: &str, quantity: u32) -> Result<(), Error> {
        if self.picks.len() >= MAX_PICKS {
            return Err(Error::CapacityExceeded(MAX_PICKS));
        }
        let name = name.trim();
        let available = match self.available.quantity(name) {
            Some(available) if !name.is_empty() => available,
            _ => return Err(Error::NotFound(name.to_owned())),
        };
        if quantity == 0 {
            return Err(Error::InputInvalid(
                "Quantity must be at least 1.".to_owned(),
            ));
        }
        if quantity > available {
            return Err(Error::InsufficientStock {
                material: name.to_owned(),
                available,
            });
        }
        self.picks.push(Pick {
            material: name.to_owned(),
            quantity,
        });
        self.available.decrement(name, quantity);
        debug!("Picked {quantity} of {name}, {} left", available - quantity);
        Ok(())
    }

    /// Removes the first pick of the selected material.
    ///
    /// The working copy is not credited back.
    /// # Errors
    /// - [`Error::SelectionRequired`] if `selection` is `None` or blank
    /// - [`Error::NotFound`] if no pick has that material
    pub fn remove_pick(&mut self, selection: Option<&str>) -> Result<Pick, Error> {
        let name = selection
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(Error::SelectionRequired)?;
        let index = self
            .picks
            .iter()
            .position(|pick| pick.material == name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;
        Ok(self.picks.remove(index))
    }

    /// Finalizes the session: decrements persisted stock, appends one ledger record and
    /// empties the session.
    ///
    /// Quantities are subtracted from a fresh load of `store`, not from the working copy, and
    /// clamp at zero if the store holds less than was picked. The store is saved once, after
    /// the ledger append. On success the working copy becomes the saved inventory and the
    /// committed picks are returned in session order.
    /// # Errors
    /// [`Error::EmptySession`] if there is nothing to commit, or any error from the stores.
    /// If loading or the ledger append fails the session is untouched. If the final save
    /// fails the picks are already in the ledger, so the session is emptied and cannot
    /// commit them again.
    pub fn commit<I, L>(
        &mut self,
        store: &mut I,
        ledger: &mut L,
        borrower: &Account,
        timestamp: &str,
    ) -> Result<Vec<Pick>, Error>
    where
        I: InventoryStore + ?Sized,
        L: BorrowLedger + ?Sized,
    {
        if self.picks.is_empty() {
            return Err(Error::EmptySession);
        }
        let mut inventory = store.load()?;
        for pick in &self.picks {
            if inventory.decrement(&pick.material, pick.quantity) {
                warn!(
                    "Stock of {} fell short of {} during commit; clamped to 0",
                    pick.material, pick.quantity
                );
            }
        }
        ledger.append(&LedgerRecord::new(borrower, timestamp, &self.picks))?;
        // The ledger row has landed; these picks must never be recorded a second time.
        let picks = std::mem::take(&mut self.picks);
        if let Err(err) = store.save(&inventory) {
            warn!(
                "Ledger records {} ({}) borrowing but stock was not saved: {err}",
                borrower.name, borrower.student_id
            );
            return Err(err);
        }
        info!(
            "{} ({}) borrowed {} material(s) at {timestamp}",
            borrower.name,
            borrower.student_id,
            picks.len()
        );
        self.available = inventory;
        Ok(picks)
    }
}

/// Appends `account` to the registry unless either of its fields is already taken.
pub(crate) fn register_account<A>(registry: &mut A, account: Account) -> Result<bool, Error>
where
    A: AccountRegistry + ?Sized,
{
    if registry
        .accounts()?
        .iter()
        .any(|existing| existing.collides_with(&account))
    {
        debug!("Registration of {} collided with an existing account", account.name);
        return Ok(false);
    }
    info!("Registered {} ({})", account.name, account.student_id);
    registry.append(account)?;
    Ok(true)
}

/// Scans the registry for an account matching both fields.
pub(crate) fn authenticate<A>(registry: &A, name: &str, student_id: &str) -> Result<bool, Error>
where
    A: AccountRegistry + ?Sized,
{
    Ok(registry
        .accounts()?
        .iter()
        .any(|account| account.name == name && account.student_id == student_id))
}

pub(crate) fn upsert_material<I>(store: &mut I, name: &str, quantity: u32) -> Result<(), Error>
where
    I: InventoryStore + ?Sized,
{
    let mut inventory = store.load()?;
    inventory.set(name, quantity);
    store.save(&inventory)?;
    info!("Set stock of {name} to {quantity}");
    Ok(())
}

pub(crate) fn delete_material<I>(store: &mut I, name: &str) -> Result<(), Error>
where
    I: InventoryStore + ?Sized,
{
    let mut inventory = store.load()?;
    if inventory.remove(name).is_some() {
        store.save(&inventory)?;
        info!("Removed {name} from stock");
    }
    Ok(())
}

impl AccountRegistry for MemoryAccountRegistry {
    fn accounts(&self) -> Result<Vec<Account>, Error> {
        Ok(self.accounts.clone())
    }

    fn append(&mut self, account: Account) -> Result<(), Error> {
        self.accounts.push(account);
        Ok(())
    }
}

impl InventoryStore for MemoryInventoryStore {
    fn load(&self) -> Result<Inventory, Error> {
        Ok(self.inventory.clone())
    }

    fn save(&mut self, inventory: &Inventory) -> Result<(), Error> {
        self.inventory = inventory.clone();
        self.saves += 1;
        Ok(())
    }
}

impl BorrowLedger for MemoryBorrowLedger {
    fn append(&mut self, record: &LedgerRecord) -> Result<(), Error> {
        self.records.push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<LedgerRecord>, Error> {
        Ok(self.records.clone())
    }
}
