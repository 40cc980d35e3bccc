use core::fmt;

/// Result alias for `coarsen`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by partitioners, the aggregator and the consistency test.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Length mismatch between a partition and the network it describes.
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
    /// Graph is disconnected where connected was required.
    DisconnectedGraph,
    /// Node with zero total edge weight where a random walk needs to leave it.
    IsolatedNode {
        /// Position of the node in the network.
        position: usize,
    },
    /// A network node has no entry in the mapping.
    UnmappedNode {
        /// Debug rendering of the node key.
        node: String,
    },
    /// The mapping names a node that is not in the network.
    UnknownNode {
        /// Debug rendering of the node key.
        node: String,
    },
    /// The linear-algebra backend produced unusable output.
    Numerical(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::DisconnectedGraph => write!(f, "graph is disconnected"),
            Error::IsolatedNode { position } => {
                write!(f, "node at position {position} has no incident weight")
            }
            Error::UnmappedNode { node } => write!(f, "node {node} is missing from the mapping"),
            Error::UnknownNode { node } => write!(f, "mapping refers to unknown node {node}"),
            Error::Numerical(msg) => write!(f, "numerical failure: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
