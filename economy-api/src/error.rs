use thiserror::Error;

/// Failure reported by a store collaborator.
///
/// Stores only ever fail on infrastructure problems. Business rules (funds,
/// holdings, authorization) are checked by the engine before any write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage could not be reached or refused the statement.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A writer panicked while holding the table lock.
    #[error("store table '{0}' is poisoned")]
    Poisoned(&'static str),

    /// The write would break a column constraint (negative balance, overflow).
    #[error("constraint violated on {table}: {detail}")]
    Constraint { table: &'static str, detail: String },

    /// The referenced instrument row does not exist.
    #[error("no instrument row named '{0}'")]
    MissingInstrument(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn constraint(table: &'static str, detail: impl Into<String>) -> Self {
        Self::Constraint {
            table,
            detail: detail.into(),
        }
    }
}
