use anyhow::{bail, ensure, Result};
use bytes::{Buf, BufMut, Bytes};

use crate::{
    dictionary::{find_reserved_symbol, DICT_SEPARATOR},
    error::{ComplexityError, ComplexityResult},
    storage::ToFromBytes,
};

/// What the bounded parse does when the dictionary buffer is smaller than
/// [`crate::capacity`] of the input length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Stop consuming input once the buffer is one slot from full. The
    /// result reports how much input was consumed.
    #[default]
    Truncate,
    /// Refuse to parse and return
    /// [`ComplexityError::InsufficientCapacity`].
    Fail,
}

/// How the buffer entry points treat input bytes equal to the dictionary's
/// separator or terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservedSymbolPolicy {
    #[default]
    Reject,
    /// The input ends at its first separator byte, like a NUL-terminated
    /// string. Terminator bytes are parsed as ordinary symbols.
    StopAtSeparator,
}

impl ReservedSymbolPolicy {
    /// The part of `input` that is actually parsed under this policy
    pub fn effective_input<'a>(&self, input: &'a [u8]) -> ComplexityResult<&'a [u8]> {
        match self {
            ReservedSymbolPolicy::Reject => match find_reserved_symbol(input) {
                Some((position, symbol)) => {
                    Err(ComplexityError::ReservedSymbol { symbol, position })
                }
                None => Ok(input),
            },
            ReservedSymbolPolicy::StopAtSeparator => {
                let end = input
                    .iter()
                    .position(|&sym| sym == DICT_SEPARATOR)
                    .unwrap_or(input.len());
                Ok(&input[..end])
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplexityConfig {
    pub overflow: OverflowPolicy,
    pub reserved: ReservedSymbolPolicy,
}

impl ComplexityConfig {
    pub fn new(overflow: OverflowPolicy, reserved: ReservedSymbolPolicy) -> Self {
        Self { overflow, reserved }
    }

    /// Errors instead of truncating or skipping any input
    pub fn strict() -> Self {
        Self::new(OverflowPolicy::Fail, ReservedSymbolPolicy::Reject)
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_reserved(mut self, reserved: ReservedSymbolPolicy) -> Self {
        self.reserved = reserved;
        self
    }
}

impl ToFromBytes for ComplexityConfig {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        bytes.put_u8(match self.overflow {
            OverflowPolicy::Truncate => 0,
            OverflowPolicy::Fail => 1,
        });
        bytes.put_u8(match self.reserved {
            ReservedSymbolPolicy::Reject => 0,
            ReservedSymbolPolicy::StopAtSeparator => 1,
        });
        Ok(bytes)
    }

    fn from_bytes(bytes: &mut Bytes) -> Result<Self>
    where
        Self: Sized,
    {
        ensure!(bytes.remaining() >= 2, "Could not decode ComplexityConfig from bytes");
        let overflow = match bytes.get_u8() {
            0 => OverflowPolicy::Truncate,
            1 => OverflowPolicy::Fail,
            _ => bail!("Invalid OverflowPolicy type"),
        };
        let reserved = match bytes.get_u8() {
            0 => ReservedSymbolPolicy::Reject,
            1 => ReservedSymbolPolicy::StopAtSeparator,
            _ => bail!("Invalid ReservedSymbolPolicy type"),
        };
        Ok(Self { overflow, reserved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reports_first_reserved_byte() {
        let policy = ReservedSymbolPolicy::Reject;
        assert_eq!(policy.effective_input(b"0110"), Ok(&b"0110"[..]));
        assert_eq!(
            policy.effective_input(b"01\x031\x00"),
            Err(ComplexityError::ReservedSymbol {
                symbol: 0x03,
                position: 2
            })
        );
    }

    #[test]
    fn test_stop_at_separator() {
        let policy = ReservedSymbolPolicy::StopAtSeparator;
        assert_eq!(policy.effective_input(b"ab\0cd"), Ok(&b"ab"[..]));
        assert_eq!(policy.effective_input(b"\0ab"), Ok(&b""[..]));
        assert_eq!(policy.effective_input(b"a\x03b"), Ok(&b"a\x03b"[..]));
    }

    #[test]
    fn test_config_to_from_bytes() {
        let config = ComplexityConfig::default().with_reserved(ReservedSymbolPolicy::StopAtSeparator);
        let mut bytes: Bytes = config.to_bytes().unwrap().into();
        assert_eq!(ComplexityConfig::from_bytes(&mut bytes).unwrap(), config);

        let mut bad: Bytes = vec![2u8, 0].into();
        assert!(ComplexityConfig::from_bytes(&mut bad).is_err());
    }
}
