use hashbrown::{HashMap, HashSet};

use crate::error::ComplexityResult;

/// Set of the distinct phrases seen so far in one parse. Phrases are only
/// ever added, and each is added exactly once, when it is first completed.
pub trait PhraseSet {
    fn new() -> Self
    where
        Self: Sized;

    /// Records `phrase` if it has not been seen before. Returns true if the
    /// phrase was new.
    ///
    /// Fails only if the set could not grow.
    fn insert_if_absent(&mut self, phrase: &[u8]) -> ComplexityResult<bool>;

    /// Number of distinct phrases inserted so far
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Phrase set backed by a hash table of owned phrases.
#[derive(Debug, Clone, Default)]
pub struct HashPhraseSet {
    phrases: HashSet<Box<[u8]>>,
}

impl PhraseSet for HashPhraseSet {
    fn new() -> Self {
        Self {
            phrases: HashSet::new(),
        }
    }

    fn insert_if_absent(&mut self, phrase: &[u8]) -> ComplexityResult<bool> {
        if self.phrases.contains(phrase) {
            return Ok(false);
        }

        self.phrases.try_reserve(1)?;
        let mut owned = Vec::new();
        owned.try_reserve_exact(phrase.len())?;
        owned.extend_from_slice(phrase);
        self.phrases.insert(owned.into_boxed_slice());

        Ok(true)
    }

    fn len(&self) -> u64 {
        self.phrases.len() as u64
    }
}

/// Phrase set stored as a prefix tree. The tree structure is a map from
/// (parent node, symbol) to child node, with the root at index 0. For
/// instance, after inserting the phrases 0, 00, 1, 01, 11 the branches are
///```ignore
///                                []
///                           [0]      [1]
///                       [00]  [01]      [11]
/// ```
/// Nodes are numbered in creation order. A node is only a member of the set
/// once a phrase ending at it has been inserted, so intermediate nodes can
/// exist without being counted.
#[derive(Debug, Clone)]
pub struct TriePhraseSet {
    branches: HashMap<(u64, u8), u64>,
    /// `members[i]` is true if the phrase ending at node `i` is in the set
    members: Vec<bool>,
    n_phrases: u64,
}

impl TriePhraseSet {
    pub const ROOT_IDX: u64 = 0;

    pub fn get_child_idx(&self, idx: u64, sym: u8) -> Option<&u64> {
        self.branches.get(&(idx, sym))
    }

    /// Number of nodes in the tree, including the root
    pub fn num_nodes(&self) -> u64 {
        self.members.len() as u64
    }

    fn add_leaf(&mut self, idx: u64, sym: u8) -> ComplexityResult<u64> {
        self.branches.try_reserve(1)?;
        self.members.try_reserve(1)?;

        let child_idx = self.num_nodes();
        self.branches.insert((idx, sym), child_idx);
        self.members.push(false);
        Ok(child_idx)
    }
}

impl Default for TriePhraseSet {
    fn default() -> Self {
        <Self as PhraseSet>::new()
    }
}

impl PhraseSet for TriePhraseSet {
    fn new() -> Self {
        Self {
            branches: HashMap::new(),
            members: vec![false],
            n_phrases: 0,
        }
    }

    fn insert_if_absent(&mut self, phrase: &[u8]) -> ComplexityResult<bool> {
        let mut state_idx = Self::ROOT_IDX;
        for &sym in phrase {
            let next = self.get_child_idx(state_idx, sym).copied();
            state_idx = match next {
                Some(child) => child,
                None => self.add_leaf(state_idx, sym)?,
            };
        }

        let member = &mut self.members[state_idx as usize];
        if *member {
            return Ok(false);
        }
        *member = true;
        self.n_phrases += 1;
        Ok(true)
    }

    fn len(&self) -> u64 {
        self.n_phrases
    }
}
