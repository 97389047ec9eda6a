use crate::model::IndexPath;
use rowbatch_core_types::TransactionId;
use thiserror::Error;

use crate::change_set::EditKind;

/// Result type alias using BatchError
pub type Result<T> = std::result::Result<T, BatchError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// testing, and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Transaction protocol
    UnbalancedTransaction,
    TransactionOpen,
    ReentrantDestruction,

    // Change set recording
    ConflictingEdit,

    // Commit validation
    IndexOutOfRange,
    InconsistentUpdate,

    // Integration/IO
    InvalidInput,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::UnbalancedTransaction => "ERR_UNBALANCED_TRANSACTION",
            ExErrorKind::TransactionOpen => "ERR_TRANSACTION_OPEN",
            ExErrorKind::ReentrantDestruction => "ERR_REENTRANT_DESTRUCTION",
            ExErrorKind::ConflictingEdit => "ERR_CONFLICTING_EDIT",
            ExErrorKind::IndexOutOfRange => "ERR_INDEX_OUT_OF_RANGE",
            ExErrorKind::InconsistentUpdate => "ERR_INCONSISTENT_UPDATE",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus positional context
/// (section, item, depth) for debugging a rejected batch.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    section: Option<usize>,
    item: Option<usize>,
    depth: Option<usize>,
    txn_id: Option<TransactionId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            section: None,
            item: None,
            depth: None,
            txn_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add section context
    pub fn with_section(mut self, section: usize) -> Self {
        self.section = Some(section);
        self
    }

    /// Add item context (the section is recorded too)
    pub fn with_index_path(mut self, path: IndexPath) -> Self {
        self.section = Some(path.section);
        self.item = Some(path.item);
        self
    }

    /// Add transaction depth context
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Add transaction ID context
    pub fn with_txn_id(mut self, txn_id: TransactionId) -> Self {
        self.txn_id = Some(txn_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn section(&self) -> Option<usize> {
        self.section
    }

    pub fn item(&self) -> Option<usize> {
        self.item
    }

    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    pub fn txn_id(&self) -> Option<&TransactionId> {
        self.txn_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        match (self.section, self.item) {
            (Some(section), Some(item)) => write!(f, " (at: {}.{})", section, item)?,
            (Some(section), None) => write!(f, " (section: {})", section)?,
            _ => {}
        }
        if let Some(depth) = self.depth {
            write!(f, " (depth: {})", depth)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Which side of a transaction an index is interpreted against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinate {
    /// Counts captured when the outermost transaction opened
    Old,
    /// Counts reported by the data source at commit
    New,
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coordinate::Old => write!(f, "old"),
            Coordinate::New => write!(f, "new"),
        }
    }
}

/// Error taxonomy for batch update operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    // ===== Transaction Errors =====
    /// `end_updates` without a matching `begin_updates`
    #[error("end_updates called with no open transaction")]
    UnbalancedTransaction,

    /// Operation requires that no transaction is open
    #[error("Cannot {op} while a batch update is open (depth {depth})")]
    TransactionOpen { op: String, depth: usize },

    /// Coordinator dropped while a transaction is still open
    #[error("Coordinator destroyed with {depth} open transaction(s)")]
    ReentrantDestruction { depth: usize },

    // ===== Recording Errors =====
    /// Same section scheduled under two exclusive edit kinds
    #[error("Cannot {kind} section {section}: already scheduled for {existing}")]
    ConflictingSectionEdit {
        section: usize,
        kind: EditKind,
        existing: EditKind,
    },

    /// Same item scheduled under two exclusive edit kinds
    #[error("Cannot {kind} item {path}: already scheduled for {existing}")]
    ConflictingItemEdit {
        path: IndexPath,
        kind: EditKind,
        existing: EditKind,
    },

    // ===== Validation Errors =====
    /// Section index beyond the section count it is interpreted against
    #[error("Section {section} out of range for {coordinate} section count {count}")]
    SectionOutOfRange {
        coordinate: Coordinate,
        section: usize,
        count: usize,
    },

    /// Item index beyond the item count of its section
    #[error("Item {path} out of range for {coordinate} item count {count}")]
    ItemOutOfRange {
        coordinate: Coordinate,
        path: IndexPath,
        count: usize,
    },

    /// Recorded edits do not explain the change in counts
    #[error("Inconsistent update: {reason}")]
    InconsistentUpdate { reason: String },

    // ===== Generic Errors =====
    /// Malformed input (CLI scripts, snapshots)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Reading an input file failed
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization error (JSON / TOML)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from BatchError to ExError
impl From<BatchError> for ExError {
    fn from(err: BatchError) -> Self {
        let message = err.to_string();
        match err {
            BatchError::UnbalancedTransaction => ExError::new(ExErrorKind::UnbalancedTransaction)
                .with_op("end_updates")
                .with_depth(0)
                .with_message(message),

            BatchError::TransactionOpen { op, depth } => {
                ExError::new(ExErrorKind::TransactionOpen)
                    .with_op(op)
                    .with_depth(depth)
                    .with_message(message)
            }

            BatchError::ReentrantDestruction { depth } => {
                ExError::new(ExErrorKind::ReentrantDestruction)
                    .with_op("drop")
                    .with_depth(depth)
                    .with_message(message)
            }

            BatchError::ConflictingSectionEdit { section, .. } => {
                ExError::new(ExErrorKind::ConflictingEdit)
                    .with_section(section)
                    .with_message(message)
            }

            BatchError::ConflictingItemEdit { path, .. } => {
                ExError::new(ExErrorKind::ConflictingEdit)
                    .with_index_path(path)
                    .with_message(message)
            }

            BatchError::SectionOutOfRange { section, .. } => {
                ExError::new(ExErrorKind::IndexOutOfRange)
                    .with_section(section)
                    .with_message(message)
            }

            BatchError::ItemOutOfRange { path, .. } => ExError::new(ExErrorKind::IndexOutOfRange)
                .with_index_path(path)
                .with_message(message),

            BatchError::InconsistentUpdate { .. } => {
                ExError::new(ExErrorKind::InconsistentUpdate).with_message(message)
            }

            BatchError::InvalidInput { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            BatchError::Io { .. } => ExError::new(ExErrorKind::Io).with_message(message),

            BatchError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            BatchError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<std::io::Error> for BatchError {
    fn from(err: std::io::Error) -> Self {
        BatchError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BatchError {
    fn from(err: serde_json::Error) -> Self {
        BatchError::Serialization {
            message: err.to_string(),
        }
    }
}
