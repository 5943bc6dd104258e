use anyhow::{ensure, Result};
use bytes::{Buf, BufMut, Bytes};

use crate::{
    error::{ComplexityError, ComplexityResult},
    storage::{get_len_prefix, ToFromBytes},
};

/// Written after every completed phrase in a serialized dictionary
pub const DICT_SEPARATOR: u8 = 0x00;
/// Closes a serialized dictionary (ASCII ETX)
pub const DICT_TERMINATOR: u8 = 0x03;
/// Stand-in for [`DICT_SEPARATOR`] in the printable form
pub const PRINTABLE_SEPARATOR: u8 = b'.';

/// Size of dictionary buffer to allocate for an input of `n` symbols.
///
/// In the worst case every symbol is its own phrase, taking one slot for the
/// symbol and one for the separator. The terminator replaces the final
/// separator, so `2n` is the tight bound; two slots of slack are kept so that
/// buffers are interchangeable with those of existing callers.
pub fn capacity(n: usize) -> usize {
    2 * n + 2
}

/// Returns the position and value of the first byte of `input` that is
/// reserved by the serialized dictionary format.
pub fn find_reserved_symbol(input: &[u8]) -> Option<(usize, u8)> {
    input
        .iter()
        .position(|&sym| sym == DICT_SEPARATOR || sym == DICT_TERMINATOR)
        .map(|position| (position, input[position]))
}

/// Renders a raw serialized dictionary in place: every separator before
/// `terminator_pos` becomes [`PRINTABLE_SEPARATOR`] and the terminator
/// itself is cleared, so the buffer reads as a NUL-terminated string.
pub fn render_printable(dict: &mut [u8], terminator_pos: usize) {
    let end = terminator_pos.min(dict.len());
    for sym in dict[..end].iter_mut() {
        if *sym == DICT_SEPARATOR {
            *sym = PRINTABLE_SEPARATOR;
        }
    }
    if let Some(terminator) = dict.get_mut(end) {
        *terminator = 0;
    }
}

/// Phrases of an LZ78 parse in discovery order, with explicit phrase
/// boundaries so that any byte value can appear in a phrase.
///
/// Symbols after the last completed phrase form the trailing phrase: a
/// prefix of the input that was already in the dictionary when the input
/// ran out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    /// Concatenation of all phrases, followed by the trailing phrase
    symbols: Vec<u8>,
    /// End offset into `symbols` of each completed phrase
    ends: Vec<usize>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves room for the phrases of an `n`-symbol input
    pub fn try_reserve(&mut self, n: usize) -> ComplexityResult<()> {
        self.symbols.try_reserve(n)?;
        self.ends.try_reserve(n)?;
        Ok(())
    }

    /// Number of completed phrases
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Total number of input symbols recorded, including the trailing phrase
    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    fn last_end(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn get(&self, idx: usize) -> Option<&[u8]> {
        let end = *self.ends.get(idx)?;
        let start = if idx == 0 { 0 } else { self.ends[idx - 1] };
        Some(&self.symbols[start..end])
    }

    pub fn phrases(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len()).filter_map(|idx| self.get(idx))
    }

    /// Symbols consumed since the last completed phrase
    pub fn trailing(&self) -> &[u8] {
        &self.symbols[self.last_end()..]
    }

    pub(crate) fn push_symbol(&mut self, sym: u8) {
        self.symbols.push(sym);
    }

    /// Marks the trailing symbols as a completed phrase
    pub(crate) fn complete_phrase(&mut self) {
        self.ends.push(self.symbols.len());
    }

    /// Number of bytes the raw serialized form occupies, terminator included
    pub fn serialized_len(&self) -> usize {
        let trailing = self.symbols.len() - self.last_end();
        // the terminator takes the place of the last byte written
        self.last_end() + self.len() + trailing
    }

    /// Writes the raw serialized form into `buf`: each phrase followed by
    /// [`DICT_SEPARATOR`], then the trailing phrase, with the last byte
    /// written replaced by [`DICT_TERMINATOR`]. The rest of `buf` is zeroed.
    ///
    /// Returns the position of the terminator. An empty dictionary leaves
    /// the buffer all zero.
    pub fn serialize_into(&self, buf: &mut [u8]) -> ComplexityResult<usize> {
        let required = self.serialized_len();
        if buf.len() < required {
            return Err(ComplexityError::InsufficientCapacity {
                required,
                available: buf.len(),
            });
        }
        buf.fill(0);
        if required == 0 {
            return Ok(0);
        }

        let mut cursor = 0;
        for phrase in self.phrases() {
            buf[cursor..cursor + phrase.len()].copy_from_slice(phrase);
            cursor += phrase.len();
            buf[cursor] = DICT_SEPARATOR;
            cursor += 1;
        }
        let trailing = self.trailing();
        buf[cursor..cursor + trailing.len()].copy_from_slice(trailing);
        cursor += trailing.len();

        buf[cursor - 1] = DICT_TERMINATOR;
        Ok(cursor - 1)
    }

    /// Dot-separated rendering of the serialized form, as produced by the
    /// bounded [`crate::complexity`] entry point.
    pub fn to_printable(&self) -> String {
        let mut buf = vec![0; self.serialized_len()];
        match self.serialize_into(&mut buf) {
            Ok(terminator_pos) => {
                render_printable(&mut buf, terminator_pos);
                String::from_utf8_lossy(&buf[..terminator_pos]).into_owned()
            }
            Err(_) => String::new(),
        }
    }
}

impl ToFromBytes for Dictionary {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(16 + self.symbols.len() + 8 * self.ends.len());
        bytes.put_u64_le(self.symbols.len() as u64);
        bytes.put_slice(&self.symbols);
        bytes.put_u64_le(self.ends.len() as u64);
        for &end in self.ends.iter() {
            bytes.put_u64_le(end as u64);
        }

        Ok(bytes)
    }

    fn from_bytes(bytes: &mut Bytes) -> Result<Self>
    where
        Self: Sized,
    {
        let n_symbols = get_len_prefix(bytes, 1)?;
        let symbols = bytes.split_to(n_symbols).to_vec();

        let n_phrases = get_len_prefix(bytes, 8)?;
        let mut ends: Vec<usize> = Vec::with_capacity(n_phrases);
        for _ in 0..n_phrases {
            let end = bytes.get_u64_le() as usize;
            ensure!(
                end > ends.last().copied().unwrap_or(0) && end <= n_symbols,
                "Invalid phrase boundary {end} in dictionary of {n_symbols} symbols"
            );
            ends.push(end);
        }

        Ok(Self { symbols, ends })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary_from(phrases: &[&str], trailing: &str) -> Dictionary {
        let mut dict = Dictionary::new();
        for phrase in phrases {
            for &sym in phrase.as_bytes() {
                dict.push_symbol(sym);
            }
            dict.complete_phrase();
        }
        for &sym in trailing.as_bytes() {
            dict.push_symbol(sym);
        }
        dict
    }

    #[test]
    fn test_capacity_covers_worst_case() {
        // "abc" parses into three one-symbol phrases
        let dict = dictionary_from(&["a", "b", "c"], "");
        assert!(dict.serialized_len() < capacity(3));
        assert_eq!(capacity(0), 2);
    }

    #[test]
    fn test_serialize_complete_phrases() {
        let dict = dictionary_from(&["a", "b", "ab"], "");
        let mut buf = vec![0xff; capacity(4)];
        let terminator_pos = dict.serialize_into(&mut buf).unwrap();
        assert_eq!(terminator_pos, 6);
        assert_eq!(&buf[..7], b"a\0b\0ab\x03");
        assert!(buf[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_serialize_sacrifices_last_trailing_symbol() {
        let dict = dictionary_from(&["a", "aa"], "a");
        let mut buf = vec![0; capacity(4)];
        let terminator_pos = dict.serialize_into(&mut buf).unwrap();
        assert_eq!(&buf[..=terminator_pos], b"a\0aa\0\x03");
        assert_eq!(dict.to_printable(), "a.aa.");
    }

    #[test]
    fn test_serialize_rejects_small_buffer() {
        let dict = dictionary_from(&["a", "b"], "");
        let mut buf = vec![0; 2];
        assert_eq!(
            dict.serialize_into(&mut buf),
            Err(ComplexityError::InsufficientCapacity {
                required: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_empty_dictionary() {
        let dict = Dictionary::new();
        let mut buf = vec![7; 2];
        assert_eq!(dict.serialize_into(&mut buf), Ok(0));
        assert_eq!(buf, vec![0, 0]);
        assert_eq!(dict.to_printable(), "");
        assert_eq!(dict.phrases().count(), 0);
    }

    #[test]
    fn test_render_printable_stops_at_terminator() {
        let mut buf = b"a\0b\0ab\x03\0\0".to_vec();
        render_printable(&mut buf, 6);
        assert_eq!(&buf, b"a.b.ab\0\0\0");
    }

    #[test]
    fn test_find_reserved_symbol() {
        assert_eq!(find_reserved_symbol(b"0101"), None);
        assert_eq!(find_reserved_symbol(b"01\x0301"), Some((2, DICT_TERMINATOR)));
        assert_eq!(find_reserved_symbol(b"\0"), Some((0, DICT_SEPARATOR)));
    }

    #[test]
    fn test_dictionary_to_from_bytes() {
        let dict = dictionary_from(&["\0", "\0\0", "\x03"], "\0\x03");
        let mut bytes: Bytes = dict.to_bytes().unwrap().into();
        let decoded = Dictionary::from_bytes(&mut bytes).unwrap();
        assert_eq!(decoded, dict);
        assert_eq!(decoded.trailing(), b"\0\x03");
        assert_eq!(decoded.get(1), Some(&b"\0\0"[..]));
    }

    #[test]
    fn test_from_bytes_rejects_bad_boundaries() {
        let mut raw = Vec::new();
        raw.put_u64_le(2);
        raw.put_slice(b"ab");
        raw.put_u64_le(1);
        raw.put_u64_le(5);
        let mut bytes: Bytes = raw.into();
        assert!(Dictionary::from_bytes(&mut bytes).is_err());
    }
}
