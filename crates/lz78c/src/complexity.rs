use log::{debug, warn};

use crate::{
    config::{ComplexityConfig, OverflowPolicy},
    dictionary::{capacity, render_printable, Dictionary, DICT_SEPARATOR, DICT_TERMINATOR},
    error::{ComplexityError, ComplexityResult},
    phrase_set::{HashPhraseSet, PhraseSet},
};

/// Where the parser stands after consuming a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseState {
    /// The candidate phrase is already in the phrase set and keeps growing
    Accumulating,
    /// The candidate phrase was new; it was recorded and the next candidate
    /// starts empty
    Emitted,
}

/// Storage for the phrase currently being built and the phrases emitted so
/// far.
trait PhraseStore {
    /// Whether another symbol can be appended
    fn has_room(&self) -> bool;

    fn append(&mut self, sym: u8);

    /// Symbols appended since the last emitted phrase
    fn candidate(&self) -> &[u8];

    /// Closes the candidate as a phrase
    fn emit(&mut self);
}

/// Index-based cursor over a caller-owned dictionary buffer. Phrases are
/// written in place, each followed by a separator.
struct BufferCursor<'a> {
    dict: &'a mut [u8],
    /// Start of the candidate phrase
    word: usize,
    /// Next position to write
    cursor: usize,
}

impl<'a> BufferCursor<'a> {
    fn new(dict: &'a mut [u8]) -> Self {
        Self {
            dict,
            word: 0,
            cursor: 0,
        }
    }

    /// Overwrites the last written position with the terminator and returns
    /// that position. Whatever was there, possibly the final symbol of an
    /// incomplete trailing phrase, is lost.
    fn terminate(&mut self) -> usize {
        let end = self.cursor.saturating_sub(1);
        if let Some(last) = self.dict.get_mut(end) {
            *last = DICT_TERMINATOR;
        }
        end
    }
}

impl PhraseStore for BufferCursor<'_> {
    fn has_room(&self) -> bool {
        self.cursor + 1 < self.dict.len()
    }

    fn append(&mut self, sym: u8) {
        self.dict[self.cursor] = sym;
        self.cursor += 1;
    }

    fn candidate(&self) -> &[u8] {
        &self.dict[self.word..self.cursor]
    }

    fn emit(&mut self) {
        // in bounds: bounded parses check `has_room` before appending, and
        // running parses require the full capacity up front
        self.dict[self.cursor] = DICT_SEPARATOR;
        self.cursor += 1;
        self.word = self.cursor;
    }
}

impl PhraseStore for Dictionary {
    fn has_room(&self) -> bool {
        true
    }

    fn append(&mut self, sym: u8) {
        self.push_symbol(sym);
    }

    fn candidate(&self) -> &[u8] {
        self.trailing()
    }

    fn emit(&mut self) {
        self.complete_phrase();
    }
}

/// Greedy LZ78 parser: grows a candidate phrase one symbol at a time and
/// emits it as soon as it is not in the phrase set.
struct Lz78Parser<S, P> {
    phrases: S,
    store: P,
    state: ParseState,
}

impl<S, P> Lz78Parser<S, P>
where
    S: PhraseSet,
    P: PhraseStore,
{
    fn new(store: P) -> Self {
        Self {
            phrases: S::new(),
            store,
            state: ParseState::Accumulating,
        }
    }

    fn consume(&mut self, sym: u8) -> ComplexityResult<ParseState> {
        self.store.append(sym);
        self.state = if self.phrases.insert_if_absent(self.store.candidate())? {
            self.store.emit();
            ParseState::Emitted
        } else {
            ParseState::Accumulating
        };
        Ok(self.state)
    }

    fn num_phrases(&self) -> u64 {
        self.phrases.len()
    }
}

/// Outcome of the bounded parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Complexity {
    /// Number of distinct phrases found
    pub count: u64,
    /// Number of input symbols parsed
    pub consumed: usize,
    /// True if parsing stopped early because the dictionary buffer filled up,
    /// in which case `count` may undercount the full parse
    pub truncated: bool,
}

/// [`complexity_with_config`] with the default configuration: silently
/// truncating on a short buffer and rejecting reserved bytes in the input.
pub fn complexity(input: &[u8], dict: &mut [u8]) -> ComplexityResult<Complexity> {
    complexity_with_config(input, dict, &ComplexityConfig::default())
}

/// Computes the LZ78 complexity of `input`, writing the dictionary into
/// `dict` in printable form: phrases separated by `.`, followed by a NUL.
/// `dict` should hold [`capacity`]`(input.len())` bytes.
///
/// The buffer is zeroed first and never written past its end. If it fills
/// up, the remaining input is not parsed (see [`OverflowPolicy`]). Empty
/// input gives a count of zero and an all-zero buffer.
pub fn complexity_with_config(
    input: &[u8],
    dict: &mut [u8],
    config: &ComplexityConfig,
) -> ComplexityResult<Complexity> {
    bounded_complexity::<HashPhraseSet>(input, dict, config)
}

fn bounded_complexity<S: PhraseSet>(
    input: &[u8],
    dict: &mut [u8],
    config: &ComplexityConfig,
) -> ComplexityResult<Complexity> {
    let input = config.reserved.effective_input(input)?;
    let required = capacity(input.len());
    if config.overflow == OverflowPolicy::Fail && !input.is_empty() && dict.len() < required {
        return Err(ComplexityError::InsufficientCapacity {
            required,
            available: dict.len(),
        });
    }

    dict.fill(0);
    if input.is_empty() || dict.is_empty() {
        return Ok(Complexity {
            count: 0,
            consumed: 0,
            truncated: !input.is_empty(),
        });
    }
    let dict_len = dict.len();
    debug!("Parsing {} symbols into a {dict_len} byte dictionary", input.len());

    let mut parser: Lz78Parser<S, _> = Lz78Parser::new(BufferCursor::new(dict));
    let mut consumed = 0;
    for &sym in input {
        if !parser.store.has_room() {
            break;
        }
        parser.consume(sym)?;
        consumed += 1;
    }

    let count = parser.num_phrases();
    let terminator_pos = parser.store.terminate();
    render_printable(parser.store.dict, terminator_pos);

    let truncated = consumed < input.len();
    if truncated {
        warn!(
            "Dictionary buffer of {dict_len} bytes filled after {consumed} of {} symbols; complexity {count} is a lower bound",
            input.len()
        );
    }

    Ok(Complexity {
        count,
        consumed,
        truncated,
    })
}

/// [`running_complexity_with_config`] with the default configuration.
pub fn running_complexity(
    input: &[u8],
    dict: &mut [u8],
    counts: &mut [u64],
) -> ComplexityResult<usize> {
    running_complexity_with_config(input, dict, counts, &ComplexityConfig::default())
}

/// Computes the LZ78 complexity of every prefix of `input`: `counts[i]` is
/// the number of distinct phrases after parsing symbol `i`. The raw
/// dictionary (NUL-separated phrases closed by [`DICT_TERMINATOR`]) is
/// written to `dict`. Returns the number of symbols parsed.
///
/// This variant never truncates. `counts` must have one slot per input
/// symbol and `dict` must hold at least [`capacity`]`(input.len())` bytes.
/// Empty input only clears the first byte of `dict`. Under
/// [`crate::ReservedSymbolPolicy::StopAtSeparator`], parsing ends at the
/// first NUL and the slots from there on hold the final count.
pub fn running_complexity_with_config(
    input: &[u8],
    dict: &mut [u8],
    counts: &mut [u64],
    config: &ComplexityConfig,
) -> ComplexityResult<usize> {
    if counts.len() != input.len() {
        return Err(ComplexityError::CountsLengthMismatch {
            expected: input.len(),
            actual: counts.len(),
        });
    }
    let input = config.reserved.effective_input(input)?;
    if input.is_empty() {
        if let Some(first) = dict.first_mut() {
            *first = 0;
        }
        counts.fill(0);
        return Ok(0);
    }

    let required = capacity(input.len());
    if dict.len() < required {
        return Err(ComplexityError::InsufficientCapacity {
            required,
            available: dict.len(),
        });
    }
    dict.fill(0);
    debug!("Computing running complexity of {} symbols", input.len());

    let (parsed, rest) = counts.split_at_mut(input.len());
    let mut parser: Lz78Parser<HashPhraseSet, _> = Lz78Parser::new(BufferCursor::new(dict));
    for (&sym, count) in input.iter().zip(parsed.iter_mut()) {
        parser.consume(sym)?;
        *count = parser.num_phrases();
    }
    rest.fill(parser.num_phrases());
    parser.store.terminate();

    Ok(input.len())
}

/// Owned result of a full LZ78 parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lz78Parse {
    dictionary: Dictionary,
    running: Vec<u64>,
}

impl Lz78Parse {
    /// Number of distinct phrases in the parse
    pub fn complexity(&self) -> u64 {
        self.dictionary.len() as u64
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Complexity after each input symbol
    pub fn running(&self) -> &[u64] {
        &self.running
    }

    pub fn into_parts(self) -> (Dictionary, Vec<u64>) {
        (self.dictionary, self.running)
    }
}

/// Parses `input` with the default phrase set. Every byte value is allowed,
/// since phrase boundaries are stored explicitly.
pub fn parse(input: &[u8]) -> ComplexityResult<Lz78Parse> {
    parse_with::<HashPhraseSet>(input)
}

pub fn parse_with<S: PhraseSet>(input: &[u8]) -> ComplexityResult<Lz78Parse> {
    let mut running: Vec<u64> = Vec::new();
    running.try_reserve_exact(input.len())?;
    let dictionary = parse_owned::<S>(input, |count| running.push(count))?;
    Ok(Lz78Parse {
        dictionary,
        running,
    })
}

/// LZ78 complexity of `input`, without any buffer or truncation concerns
pub fn lz78_complexity(input: &[u8]) -> ComplexityResult<u64> {
    let dictionary = parse_owned::<HashPhraseSet>(input, |_| {})?;
    Ok(dictionary.len() as u64)
}

/// LZ78 complexity of every prefix of `input`
pub fn running_lz78_complexity(input: &[u8]) -> ComplexityResult<Vec<u64>> {
    parse(input).map(|parse| parse.running)
}

fn parse_owned<S: PhraseSet>(
    input: &[u8],
    mut on_symbol: impl FnMut(u64),
) -> ComplexityResult<Dictionary> {
    let mut dictionary = Dictionary::new();
    dictionary.try_reserve(input.len())?;

    let mut parser: Lz78Parser<S, _> = Lz78Parser::new(dictionary);
    for &sym in input {
        parser.consume(sym)?;
        on_symbol(parser.num_phrases());
    }
    Ok(parser.store)
}
