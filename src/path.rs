//! Structural addresses accumulated during traversal.
//!
//! A [`Path`] is the stable identifier of one node inside a compiled tree,
//! rendered in the `record.user.tags[2]` form that form layers bind to and
//! error messages quote. Paths are cheap value types: descending clones the
//! parent and appends one segment.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Structural address of a node, built root-down.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Path::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Descend into a named field: `a` → `a.name`.
    pub fn key(&self, name: &str) -> Self {
        let mut out = self.clone();
        out.segments.push(Segment::Key(name.to_string()));
        out
    }

    /// Descend into a positional slot: `a` → `a[3]`.
    pub fn index(&self, index: usize) -> Self {
        let mut out = self.clone();
        out.segments.push(Segment::Index(index));
        out
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Rendered form, e.g. `record.user.tags[2]` or `[0].to`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            match seg {
                Segment::Key(k) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(k)?;
                }
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys_and_indices() {
        let p = Path::root().key("record").key("user").key("tags").index(2);
        assert_eq!(p.render(), "record.user.tags[2]");
    }

    #[test]
    fn root_is_empty_and_index_needs_no_dot() {
        assert_eq!(Path::root().render(), "");
        let p = Path::root().index(0).key("to");
        assert_eq!(p.render(), "[0].to");
    }

    #[test]
    fn descent_does_not_mutate_the_parent() {
        let parent = Path::root().key("a");
        let _child = parent.key("b");
        assert_eq!(parent.render(), "a");
    }
}
