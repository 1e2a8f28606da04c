use crate::model::ItemId;
use std::fmt;

mod k_means;
mod seeding;

pub use k_means::run;
pub use k_means::KMeans;
pub use seeding::FixedSeeding;
pub use seeding::KMeansPlusPlus;
pub use seeding::RandomSeeding;
pub use seeding::Seeding;

/// Common errors thrown by algorithms.
///
/// They are all raised before the first iteration is computed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The run settings or the input items cannot be used.
    InvalidConfiguration(ConfigError),

    /// The input has fewer distinct locations than the requested number of
    /// clusters, so no set of distinct seeds exists.
    DegenerateInput {
        distinct: usize,
        cluster_count: usize,
    },
}

/// Details of an [`Error::InvalidConfiguration`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// No item was given.
    EmptyInput,

    /// The cluster count is zero or larger than the number of items.
    ClusterCount { requested: usize, item_count: usize },

    /// The convergence tolerance is negative or NaN.
    Tolerance(f64),

    /// The iteration cap is zero.
    IterationCap,

    /// Two input items share this id.
    DuplicateItem(ItemId),

    /// This item has an infinite or NaN coordinate.
    NonFiniteItem(ItemId),

    /// The seeding strategy did not return one seed per cluster.
    SeedCount { expected: usize, actual: usize },

    /// The seed at this index has an infinite or NaN coordinate.
    NonFiniteSeed(usize),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::InvalidConfiguration(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration(err) => write!(f, "invalid configuration: {err}"),
            Error::DegenerateInput {
                distinct,
                cluster_count,
            } => write!(
                f,
                "cannot seed {cluster_count} clusters from {distinct} distinct locations",
            ),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyInput => write!(f, "no input item"),
            ConfigError::ClusterCount {
                requested,
                item_count,
            } => write!(
                f,
                "expected between 1 and {item_count} clusters, got {requested}",
            ),
            ConfigError::Tolerance(tolerance) => {
                write!(f, "tolerance must be a non-negative number, got {tolerance}")
            }
            ConfigError::IterationCap => write!(f, "the iteration cap must not be zero"),
            ConfigError::DuplicateItem(id) => write!(f, "{id} appears more than once"),
            ConfigError::NonFiniteItem(id) => write!(f, "{id} has a non-finite coordinate"),
            ConfigError::SeedCount { expected, actual } => {
                write!(f, "expected {expected} seeds, got {actual}")
            }
            ConfigError::NonFiniteSeed(idx) => write!(f, "seed #{idx} has a non-finite coordinate"),
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for ConfigError {}
