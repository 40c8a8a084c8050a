use std::io::{self, Read, Write};

use anyhow::{Result, bail};

use pxl_types::wire;

use crate::tags::TagSet;

/// Ordered sequence of `(TagSet rule, T value)` entries with
/// most-specific-match resolution.
///
/// Insertion order is preserved for iteration and serialization, but match
/// resolution is specificity-based: the non-empty rule that is a subset of
/// the query with the most tags wins, ties going to the earliest-inserted
/// entry. An entry with the empty rule is the base fallback, used when no
/// non-empty rule matches; at most one such entry may exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLookup<T> {
    rules: Vec<TagSet>,
    values: Vec<T>,
}

impl<T> Default for TagLookup<T> {
    fn default() -> Self {
        Self { rules: Vec::new(), values: Vec::new() }
    }
}

impl<T> TagLookup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[TagSet] {
        &self.rules
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Append an entry. Duplicate non-empty rules are permitted; a second
    /// empty rule is an error, since the base fallback must stay unique.
    pub fn add(&mut self, rule: TagSet, value: T) -> Result<()> {
        if rule.is_empty() && self.has_base_fallback() {
            bail!("TagLookup already has a base fallback entry");
        }
        self.rules.push(rule);
        self.values.push(value);
        Ok(())
    }

    /// Remove the entry at `index`, shifting subsequent entries down.
    pub fn remove_at(&mut self, index: usize) -> T {
        self.rules.remove(index);
        self.values.remove(index)
    }

    fn base_fallback_index(&self) -> Option<usize> {
        self.rules.iter().position(TagSet::is_empty)
    }

    pub fn has_base_fallback(&self) -> bool {
        self.base_fallback_index().is_some()
    }

    pub fn get_base_fallback(&self) -> Option<&T> {
        self.base_fallback_index().map(|i| &self.values[i])
    }

    /// Remove and return the base fallback entry, if present.
    pub fn try_remove_base_fallback(&mut self) -> Option<T> {
        self.base_fallback_index().map(|i| self.remove_at(i))
    }

    /// Resolve a query tag set to the most specific matching value.
    ///
    /// Non-empty rules that are subsets of the query compete on cardinality;
    /// the earliest-inserted entry wins a tie. With no non-empty match the
    /// base fallback is returned if present.
    pub fn lookup(&self, query: &TagSet) -> Option<&T> {
        let mut best: Option<(usize, usize)> = None; // (cardinality, index)
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.is_empty() || !rule.is_subset_of(query) {
                continue;
            }
            let beats = match best {
                Some((cardinality, _)) => rule.len() > cardinality,
                None => true,
            };
            if beats {
                best = Some((rule.len(), i));
            }
        }
        match best {
            Some((_, i)) => Some(&self.values[i]),
            None => self.get_base_fallback(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagSet, &T)> {
        self.rules.iter().zip(self.values.iter())
    }

    /// Write entry count, then each `(rule, value)` pair in insertion order.
    /// The caller supplies the element codec.
    pub fn serialize<W, F>(&self, writer: &mut W, mut write_value: F) -> io::Result<()>
    where
        W: Write,
        F: FnMut(&mut W, &T) -> io::Result<()>,
    {
        wire::write_i32_le(writer, self.count() as i32)?;
        for (rule, value) in self.iter() {
            rule.write(writer)?;
            write_value(writer, value)?;
        }
        Ok(())
    }

    /// Read the count-prefixed pair sequence written by [`Self::serialize`],
    /// reproducing entry order. A stream carrying two empty rules is
    /// rejected.
    pub fn deserialize<R, F>(reader: &mut R, mut read_value: F) -> Result<Self>
    where
        R: Read,
        F: FnMut(&mut R) -> Result<T>,
    {
        let count = wire::read_count(reader)?;
        let mut lookup = Self::new();
        for _ in 0..count {
            let rule = TagSet::read(reader)?;
            let value = read_value(reader)?;
            lookup.add(rule, value)?;
        }
        Ok(lookup)
    }
}
