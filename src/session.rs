//! Login, registration and the two flows a logged-in user can be in
//!
//! [`SessionController`] owns the three stores and moves between
//! [`SessionState::LoggedOut`], [`SessionState::Borrowing`] and [`SessionState::Admin`].
//! Each operation checks that it is offered in the current state before touching anything.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{info, warn};

use crate::{
    errors::Error,
    types::{
        format_timestamp, Account, AccountRegistry, BorrowLedger, BorrowSession, InventoryStore,
        Pick, RESERVED_NAME_CHARS,
    },
};

/// Name half of the fixed superuser credential
pub const ADMIN_NAME: &str = "Admin";
/// Student-number half of the fixed superuser credential
pub const ADMIN_ID: &str = "admin";

/// Where the controller currently is
#[derive(Debug, Default)]
pub enum SessionState {
    /// Waiting for a login or registration
    #[default]
    LoggedOut,
    /// A registered borrower is picking materials
    Borrowing {
        /// Who logged in
        borrower: Account,
        /// Picks so far, against a snapshot taken at login
        session: BorrowSession,
    },
    /// The superuser is editing stock
    Admin,
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            SessionState::LoggedOut => "logged out",
            SessionState::Borrowing { .. } => "borrowing",
            SessionState::Admin => "managing stock",
        }
    }
}

/// Which flow a successful login opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// [`SessionState::Borrowing`]
    Borrowing,
    /// [`SessionState::Admin`]
    Admin,
}

/// Summary of a committed borrowing, for display to the borrower
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    borrower: Account,
    timestamp: String,
    picks: Vec<Pick>,
}

impl Receipt {
    /// Who borrowed
    #[must_use]
    pub fn borrower(&self) -> &Account {
        &self.borrower
    }

    /// When, formatted as in the ledger
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// What, in pick order
    #[must_use]
    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }
}

impl Display for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Borrowing Information:")?;
        writeln!(f, "Date and Time: {}", self.timestamp)?;
        writeln!(
            f,
            "Borrower: {} ({})",
            self.borrower.name(),
            self.borrower.student_id()
        )?;
        writeln!(f, "Materials Borrowed:")?;
        for pick in &self.picks {
            writeln!(f, "- {pick}")?;
        }
        Ok(())
    }
}

/// Reports which of the two credential fields are blank, if any.
fn require_both(name: &str, student_id: &str) -> Result<(), Error> {
    match (name.is_empty(), student_id.is_empty()) {
        (true, true) => Err(Error::NoInput),
        (true, false) | (false, true) => Err(Error::MissingInput),
        (false, false) => Ok(()),
    }
}

/// Drives one borrowing station over a set of stores
#[derive(Debug)]
pub struct SessionController<A, I, L> {
    accounts: A,
    inventory: I,
    ledger: L,
    timezone: Tz,
    state: SessionState,
}

impl<A, I, L> SessionController<A, I, L>
where
    A: AccountRegistry,
    I: InventoryStore,
    L: BorrowLedger,
{
    /// Starts logged out
    pub fn new(accounts: A, inventory: I, ledger: L, timezone: Tz) -> Self {
        Self {
            accounts,
            inventory,
            ledger,
            timezone,
            state: SessionState::LoggedOut,
        }
    }

    /// The current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The inventory store, for read access outside any flow
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// The ledger, for reviewing past borrowings
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn require_logged_out(&self, action: &'static str) -> Result<(), Error> {
        match self.state {
            SessionState::LoggedOut => Ok(()),
            ref state => Err(Error::InvalidState {
                action,
                state: state.label(),
            }),
        }
    }

    fn borrowing(&self, action: &'static str) -> Result<&BorrowSession, Error> {
        match &self.state {
            SessionState::Borrowing { session, .. } => Ok(session),
            state => Err(Error::InvalidState {
                action,
                state: state.label(),
            }),
        }
    }

    fn borrowing_session(&mut self, action: &'static str) -> Result<&mut BorrowSession, Error> {
        match &mut self.state {
            SessionState::Borrowing { session, .. } => Ok(session),
            state => Err(Error::InvalidState {
                action,
                state: state.label(),
            }),
        }
    }

    fn require_admin(&self, action: &'static str) -> Result<(), Error> {
        match self.state {
            SessionState::Admin => Ok(()),
            ref state => Err(Error::InvalidState {
                action,
                state: state.label(),
            }),
        }
    }

    /// Logs in, opening the admin flow for the superuser credential and the borrowing flow
    /// for a registered account.
    ///
    /// The superuser check comes first, so it succeeds whatever the registry holds.
    /// # Errors
    /// [`Error::NoInput`], [`Error::MissingInput`] or [`Error::CredentialsIncorrect`]; the
    /// state stays [`SessionState::LoggedOut`] on any error.
    pub fn login(&mut self, name: &str, student_id: &str) -> Result<Flow, Error> {
        self.require_logged_out("log in")?;
        let (name, student_id) = (name.trim(), student_id.trim());
        if name == ADMIN_NAME && student_id == ADMIN_ID {
            info!("Superuser logged in");
            self.state = SessionState::Admin;
            return Ok(Flow::Admin);
        }
        require_both(name, student_id)?;
        if !self.accounts.authenticate(name, student_id)? {
            warn!("Failed login for {name}");
            return Err(Error::CredentialsIncorrect);
        }
        let snapshot = self.inventory.load()?;
        info!("{name} ({student_id}) logged in");
        self.state = SessionState::Borrowing {
            borrower: Account::new(name, student_id),
            session: BorrowSession::new(snapshot),
        };
        Ok(Flow::Borrowing)
    }

    /// Registers a new borrower. Does not log in.
    /// # Errors
    /// - [`Error::NoInput`] or [`Error::MissingInput`] for blank fields
    /// - [`Error::InputInvalid`] if the student number is not all decimal digits
    /// - [`Error::AlreadyExists`] if the name or the student number is taken
    pub fn register(&mut self, name: &str, student_id: &str) -> Result<(), Error> {
        self.require_logged_out("register")?;
        let (name, student_id) = (name.trim(), student_id.trim());
        require_both(name, student_id)?;
        if !student_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InputInvalid(
                "Student number must consist of integers only.".to_owned(),
            ));
        }
        if self.accounts.register(Account::new(name, student_id))? {
            Ok(())
        } else {
            Err(Error::AlreadyExists)
        }
    }

    /// Leaves the current flow, discarding any uncommitted picks.
    /// # Errors
    /// [`Error::InvalidState`] if already logged out
    pub fn go_back(&mut self) -> Result<(), Error> {
        if let SessionState::LoggedOut = self.state {
            return Err(Error::InvalidState {
                action: "go back",
                state: self.state.label(),
            });
        }
        self.state = SessionState::LoggedOut;
        Ok(())
    }

    /// See [`BorrowSession::add_pick`]
    pub fn add_pick(&mut self, name: &str, quantity: u32) -> Result<(), Error> {
        self.borrowing_session("add a material")?
            .add_pick(name, quantity)
    }

    /// See [`BorrowSession::remove_pick`]
    pub fn remove_pick(&mut self, selection: Option<&str>) -> Result<Pick, Error> {
        self.borrowing_session("remove a material")?
            .remove_pick(selection)
    }

    /// Quantity of `name` still available to pick in this session
    pub fn available(&self, name: &str) -> Result<Option<u32>, Error> {
        Ok(self
            .borrowing("check availability")?
            .available(name.trim()))
    }

    /// `name: quantity` lines for the materials that can still be picked
    pub fn material_listing(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .borrowing("list materials")?
            .working_inventory()
            .listing())
    }

    /// `name: quantity` lines for the picks made so far
    pub fn pick_listing(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .borrowing("list picks")?
            .picks()
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Commits the current picks as borrowed at `now`.
    ///
    /// Stays in the borrowing flow afterwards with an empty session, ready for another round.
    /// # Errors
    /// [`Error::EmptySession`] if nothing was picked, or any store error
    pub fn finish_borrowing(&mut self, now: DateTime<Utc>) -> Result<Receipt, Error> {
        let timestamp = format_timestamp(now, self.timezone);
        match &mut self.state {
            SessionState::Borrowing { borrower, session } => {
                let picks =
                    session.commit(&mut self.inventory, &mut self.ledger, borrower, &timestamp)?;
                Ok(Receipt {
                    borrower: borrower.clone(),
                    timestamp,
                    picks,
                })
            }
            state => Err(Error::InvalidState {
                action: "finish borrowing",
                state: state.label(),
            }),
        }
    }

    /// Sets the stocked quantity of a material, adding it if new.
    /// # Errors
    /// [`Error::InputInvalid`] for a blank name or one containing `;` or `:`, or any store
    /// error
    pub fn admin_upsert(&mut self, name: &str, quantity: u32) -> Result<(), Error> {
        self.require_admin("update stock")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InputInvalid(
                "Material name cannot be blank.".to_owned(),
            ));
        }
        if name.contains(RESERVED_NAME_CHARS) {
            return Err(Error::InputInvalid(
                "Material name cannot contain ';' or ':'.".to_owned(),
            ));
        }
        self.inventory.upsert(name, quantity)
    }

    /// Removes a material from stock; unknown names are ignored.
    pub fn admin_remove(&mut self, name: &str) -> Result<(), Error> {
        self.require_admin("remove stock")?;
        self.inventory.delete(name.trim())
    }

    /// `name: quantity` lines for the persisted stock, in any state
    pub fn stock_listing(&self) -> Result<Vec<String>, Error> {
        Ok(self.inventory.load()?.listing())
    }
}
