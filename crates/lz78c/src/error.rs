use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComplexityError {
    /// The dictionary buffer cannot hold the worst-case dictionary of the
    /// input, and the parse was not allowed to truncate.
    #[error("dictionary buffer too small: {required} bytes required, {available} available")]
    InsufficientCapacity { required: usize, available: usize },

    /// The running-complexity output must have exactly one slot per input
    /// symbol.
    #[error("running complexity output has length {actual}, expected {expected}")]
    CountsLengthMismatch { expected: usize, actual: usize },

    /// The input contains a byte that the serialized dictionary reserves as a
    /// separator or terminator.
    #[error("input contains reserved dictionary symbol {symbol:#04x} at position {position}")]
    ReservedSymbol { symbol: u8, position: usize },

    /// The phrase set could not grow. The parse is abandoned rather than
    /// returning an undercount.
    #[error("failed to allocate memory for the phrase set")]
    AllocationFailed,
}

pub type ComplexityResult<T> = std::result::Result<T, ComplexityError>;

impl From<hashbrown::TryReserveError> for ComplexityError {
    fn from(_: hashbrown::TryReserveError) -> Self {
        Self::AllocationFailed
    }
}

impl From<std::collections::TryReserveError> for ComplexityError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::AllocationFailed
    }
}
