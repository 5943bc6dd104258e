//! LZ78 complexity of symbol sequences.
//!
//! The LZ78 complexity of a sequence is the number of distinct phrases in its
//! greedy LZ78 parse: every phrase is the shortest prefix of the remaining
//! input that has not been seen as a phrase before. For instance,
//! `000101000101111010001010100010101000000010000010` parses into
//! ```text
//! 0 | 00 | 1 | 01 | 000 | 10 | 11 | 110 | 100 | 010 | 101 | 0001 | 0101 | 0000 | 00010 | 00001 | 0
//! ```
//! and has complexity 16 (the trailing `0` is not novel and is not counted).
//!
//! Two entry points write into caller-owned buffers, byte-compatible with the
//! classic NUL-separated dictionary layout: [`complexity`] returns the final
//! count and [`running_complexity`] records the count after every symbol.
//! [`parse`] and friends return owned results instead.

pub mod binarise;
pub mod complexity;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod normalization;
pub mod phrase_set;
pub mod storage;

pub use complexity::{
    complexity, complexity_with_config, lz78_complexity, parse, parse_with, running_complexity,
    running_complexity_with_config, running_lz78_complexity, Complexity, Lz78Parse,
};
pub use config::{ComplexityConfig, OverflowPolicy, ReservedSymbolPolicy};
pub use dictionary::{capacity, Dictionary, DICT_SEPARATOR, DICT_TERMINATOR, PRINTABLE_SEPARATOR};
pub use error::{ComplexityError, ComplexityResult};
