/// Error type that can be returned by fallible operations in this crate
///
/// Every variant except [`Error::Io`] and [`Error::Csv`] is a condition the user can
/// correct and resubmit; none of them leave a store or session partially modified.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error reading or writing a flat-file or CSV store; could wrap IO or parsing errors
    #[error("Error processing records: {0}")]
    Csv(#[from] csv::Error),
    /// Error opening or creating a backing file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Both the name and the student number were left blank
    #[error("No Input. Please try again.")]
    NoInput,
    /// Exactly one of the name and the student number was left blank
    #[error("Missing Input. Please try again.")]
    MissingInput,
    /// A field was filled in but is malformed
    #[error("Invalid input: {0}")]
    InputInvalid(String),
    /// Registration collided with an existing name or student number
    #[error("Name or student number already exists.")]
    AlreadyExists,
    /// The named material is not in the inventory, or not in the session
    #[error("Material '{0}' not found")]
    NotFound(String),
    /// Removal was requested without identifying a pick
    #[error("Please select a material to remove.")]
    SelectionRequired,
    /// The session already holds the maximum number of picks
    #[error("You can only borrow up to {0} different types of materials.")]
    CapacityExceeded(usize),
    /// More was requested than the working copy has available
    #[error("Only {available} available for {material}.")]
    InsufficientStock {
        /// The material that was requested
        material: String,
        /// How many remain in the session's working copy
        available: u32,
    },
    /// The calculator was asked to divide by zero
    #[error("Division by zero is not allowed.")]
    DivisionByZero,
    /// Commit was attempted with no picks
    #[error("Please add at least one material.")]
    EmptySession,
    /// Login did not match any registered account
    #[error("Incorrect credentials. Please try again.")]
    CredentialsIncorrect,
    /// A controller operation was invoked from a state that does not offer it
    #[error("Cannot {action} while {state}")]
    InvalidState {
        /// The operation that was attempted
        action: &'static str,
        /// The controller state at the time
        state: &'static str,
    },
}
