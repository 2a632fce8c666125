use core::fmt;

/// Result alias for `tagmix`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while validating inputs or building a chain.
///
/// Sampling itself never fails once a [`Chain`](crate::sampler::Chain) exists;
/// every variant here is raised before the first sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Row width mismatch inside a feature channel.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch between inputs (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of word types.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Two feature channels share a name.
    DuplicateChannel(String),

    /// Malformed corpus line.
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// Reading the corpus failed.
    Io(String),

    /// Sufficient statistics disagree with the assignment.
    Inconsistent(String),

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} word types")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::DuplicateChannel(name) => write!(f, "duplicate feature channel '{name}'"),
            Error::Parse { line, message } => write!(f, "line {line}: {message}"),
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Inconsistent(msg) => write!(f, "inconsistent sufficient statistics: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
