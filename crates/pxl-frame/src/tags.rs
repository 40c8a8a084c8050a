use std::io::{self, Read, Write};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use pxl_types::wire;

/// Unordered set of symbolic tags, used as a rule key for conditional
/// lookups (masks, attachments).
///
/// Tags are stored sorted and deduplicated, so equality is set equality and
/// serialization order is canonical regardless of construction order, which
/// the bit-exact network encoding requires. There is no mutating API; a
/// `TagSet` is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// The empty rule, matching only as the base fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(tag: impl Into<String>) -> Self {
        Self { tags: vec![tag.into()] }
    }

    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        tags.sort();
        tags.dedup();
        Self { tags }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }

    pub fn is_subset_of(&self, other: &TagSet) -> bool {
        self.tags.iter().all(|t| other.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        wire::write_i32_le(writer, self.tags.len() as i32)?;
        for tag in &self.tags {
            wire::write_string(writer, tag)?;
        }
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let count = wire::read_count(reader)?;
        let mut tags = Vec::with_capacity(count);
        for _ in 0..count {
            tags.push(wire::read_string(reader)?);
        }
        // Re-canonicalize in case the stream was not sorted
        Ok(Self::from_tags(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_canonicalizes() {
        let a = TagSet::from_tags(["thick", "held", "thick"]);
        let b = TagSet::from_tags(["held", "thick"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_subset() {
        let query = TagSet::from_tags(["held", "thick", "metal"]);
        assert!(TagSet::empty().is_subset_of(&query));
        assert!(TagSet::single("thick").is_subset_of(&query));
        assert!(TagSet::from_tags(["held", "metal"]).is_subset_of(&query));
        assert!(!TagSet::single("wood").is_subset_of(&query));
        assert!(!query.is_subset_of(&TagSet::single("thick")));
    }

    #[test]
    fn test_contains() {
        let t = TagSet::from_tags(["b", "a", "c"]);
        assert!(t.contains("a"));
        assert!(t.contains("c"));
        assert!(!t.contains("d"));
    }

    #[test]
    fn test_wire_round_trip() {
        let t = TagSet::from_tags(["zeta", "alpha"]);
        let mut buf = Vec::new();
        t.write(&mut buf).unwrap();
        let back = TagSet::read(&mut buf.as_slice()).unwrap();
        assert_eq!(back, t);

        // Serialization order is canonical
        let mut buf2 = Vec::new();
        TagSet::from_tags(["alpha", "zeta"]).write(&mut buf2).unwrap();
        assert_eq!(buf, buf2);
    }

    #[test]
    fn test_empty_round_trip() {
        let mut buf = Vec::new();
        TagSet::empty().write(&mut buf).unwrap();
        assert_eq!(buf.len(), 4);
        assert!(TagSet::read(&mut buf.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn test_serde_json_round_trip() {
        let t = TagSet::from_tags(["held", "thick"]);
        let json = serde_json::to_string(&t).unwrap();
        let back: TagSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    proptest::proptest! {
        #[test]
        fn prop_wire_round_trip(tags in proptest::collection::vec("[a-z]{1,8}", 0..6)) {
            let t = TagSet::from_tags(tags);
            let mut buf = Vec::new();
            t.write(&mut buf).unwrap();
            proptest::prop_assert_eq!(TagSet::read(&mut buf.as_slice()).unwrap(), t);
        }
    }
}
