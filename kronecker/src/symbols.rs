use core::fmt;

use itertools::Itertools;

use crate::error::{Error, Result};

/// An ordered set of distinct symbol names.
///
/// Names are kept sorted, so two sets built from the same names compare equal
/// regardless of construction order, and set merges are linear scans.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymbolSet {
    names: Vec<String>,
}

impl SymbolSet {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err(Error::InvalidArgument(format!(
                    "duplicate symbol {:?}",
                    pair[0],
                )));
            }
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates the names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Indices in `self` of the symbols that `other` and `self` share.
    pub fn positions_of(&self, other: &SymbolSet) -> Vec<usize> {
        let mut positions = Vec::new();
        let mut cursor = 0;
        for name in &other.names {
            while cursor < self.names.len() && self.names[cursor] < *name {
                cursor += 1;
            }
            if cursor < self.names.len() && self.names[cursor] == *name {
                positions.push(cursor);
            }
        }
        positions
    }

    /// The sorted union of the two sets.
    pub fn merge(&self, other: &SymbolSet) -> SymbolSet {
        let names = self
            .names
            .iter()
            .merge(other.names.iter())
            .dedup()
            .cloned()
            .collect();
        SymbolSet { names }
    }

    /// Describes how `self` extends into `superset`: for each index of
    /// `self`, the run of superset-only names inserted just before it (index
    /// `len` appends at the end). Fails when `self` is not a subset.
    pub fn insertion_map_to(&self, superset: &SymbolSet) -> Result<InsertionMap> {
        let mut entries: Vec<(usize, Vec<String>)> = Vec::new();
        let mut cursor = 0usize;
        for name in &superset.names {
            if cursor < self.names.len() && self.names[cursor] == *name {
                cursor += 1;
            } else {
                match entries.last_mut() {
                    Some((index, run)) if *index == cursor => run.push(name.clone()),
                    _ => entries.push((cursor, vec![name.clone()])),
                }
            }
        }
        if cursor < self.names.len() {
            return Err(Error::InvalidArgument(format!(
                "symbol {:?} is missing from the target set {superset}",
                self.names[cursor],
            )));
        }
        Ok(InsertionMap { entries })
    }
}

impl fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.names.iter().join(", "))
    }
}

/// Ascending `(index, names)` runs describing where a superset inserts new
/// symbols relative to a base set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertionMap {
    entries: Vec<(usize, Vec<String>)>,
}

impl InsertionMap {
    pub fn entries(&self) -> &[(usize, Vec<String>)] {
        &self.entries
    }

    /// Total number of inserted symbols.
    pub fn inserted(&self) -> usize {
        self.entries.iter().map(|(_, names)| names.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
