//! Dot-glued namespaces and domain/TLD splitting.

use crate::segments::{PathError, PathSegments};
use regex::Regex;
use std::fmt;

/// The glue every [`Namespace`] is split and joined on.
pub const NAMESPACE_GLUE: &str = ".";

/// Public-suffix labels consulted by [`Namespace::split_domain`] when no
/// explicit list is supplied. Multi-label entries ("co.uk") are matched as
/// whole suffixes.
pub const DEFAULT_TLDS: &[&str] = &[
    "com", "org", "net", "io", "dev", "app", "edu", "gov", "mil", "int", "info", "biz", "co.uk",
    "org.uk", "ac.uk", "com.au", "co.jp",
];

/// A dot-glued path used for tree addressing.
///
/// Parsing never fails: empty labels are dropped, so `"a..b"` is the
/// two-label namespace `a.b` and `""` is the empty namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    path: PathSegments,
}

/// Result of splitting a namespace at a recognized top-level domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSplit {
    /// The recognized suffix, e.g. `co.uk`.
    pub tld: Namespace,
    /// Everything left of the suffix, e.g. `example` in `example.co.uk`.
    pub child_domain: Namespace,
}

impl Namespace {
    /// Parses `text` on the dot glue, dropping empty labels.
    pub fn parse(text: &str) -> Self {
        Self {
            path: PathSegments {
                segments: text
                    .split(NAMESPACE_GLUE)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                glue: NAMESPACE_GLUE.to_string(),
            },
        }
    }

    /// Builds a namespace from pre-split labels; labels containing a dot
    /// are rejected.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            path: PathSegments::from_segments(segments, NAMESPACE_GLUE)?,
        })
    }

    pub fn empty() -> Self {
        Self::parse("")
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.path.get(index)
    }

    pub fn segments(&self) -> &[String] {
        self.path.segments()
    }

    pub fn path(&self) -> &PathSegments {
        &self.path
    }

    pub fn join(&self) -> String {
        self.path.join()
    }

    pub fn append(&mut self, label: &str) -> Result<(), PathError> {
        self.path.append(label)
    }

    pub fn prepend(&mut self, label: &str) -> Result<(), PathError> {
        self.path.prepend(label)
    }

    pub fn sub_range(&self, start: usize, end: usize) -> Self {
        Self {
            path: self.path.sub_range(start, end),
        }
    }

    pub fn drop_first(&mut self) -> Option<String> {
        self.path.drop_first()
    }

    pub fn is_prefix_of(&self, other: &Namespace) -> bool {
        self.path.is_prefix_of(&other.path)
    }

    /// See [`PathSegments::match_percentage`].
    pub fn match_percentage(&self, other: &Namespace) -> u32 {
        self.path.match_percentage(&other.path)
    }

    /// See [`PathSegments::compile_pattern`].
    pub fn compile_pattern(&self) -> Result<Regex, PathError> {
        self.path.compile_pattern()
    }

    /// Returns a copy with every label lowercased.
    pub fn to_lowercase(&self) -> Self {
        Self {
            path: PathSegments {
                segments: self
                    .path
                    .segments
                    .iter()
                    .map(|s| s.to_ascii_lowercase())
                    .collect(),
                glue: NAMESPACE_GLUE.to_string(),
            },
        }
    }

    /// Splits the namespace into a recognized TLD suffix and the remaining
    /// child domain.
    ///
    /// The scan walks suffixes from shortest to longest (right to left):
    /// for `"shop.example.co.uk"` the single label `uk` is not in the
    /// default list but `co.uk` is, so the split is `co.uk` /
    /// `shop.example`. Matching is case-insensitive. Returns `None` when no
    /// suffix is recognized or when the whole namespace is itself a TLD
    /// with nothing left of it.
    pub fn split_domain(&self, tlds: &[&str]) -> Option<DomainSplit> {
        let labels = self.path.segments();
        for start in (1..labels.len()).rev() {
            let suffix = labels[start..].join(NAMESPACE_GLUE).to_ascii_lowercase();
            if tlds.iter().any(|t| t.to_ascii_lowercase() == suffix) {
                return Some(DomainSplit {
                    tld: self.sub_range(start, labels.len()),
                    child_domain: self.sub_range(0, start),
                });
            }
        }
        None
    }

    /// [`split_domain`] against [`DEFAULT_TLDS`].
    ///
    /// [`split_domain`]: Namespace::split_domain
    pub fn split_domain_default(&self) -> Option<DomainSplit> {
        self.split_domain(DEFAULT_TLDS)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

impl From<PathSegments> for Namespace {
    /// Re-glues arbitrary segments onto the dot separator. Segments that
    /// themselves contain dots split further.
    fn from(path: PathSegments) -> Self {
        Namespace::parse(&path.segments().join(NAMESPACE_GLUE))
    }
}
