//! Position and duration queries on the output side.

use thiserror::Error;
use varispeed_pcm::ConvertError;

/// Query kinds the filter answers; anything else is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    /// Current stream position.
    Position,
    /// Total stream duration.
    Duration,
}

/// Why a query could not be answered.
///
/// A failed query leaves the filter fully usable for subsequent buffers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("no upstream peer to query")]
    NoPeer,

    #[error("upstream peer could not answer the query")]
    PeerFailed,

    #[error(transparent)]
    Convert(#[from] ConvertError),
}
