//! Filesystem-flavored paths with an absolute/relative flag.

use crate::namespace::Namespace;
use crate::segments::{PathError, PathSegments};
use regex::Regex;
use std::fmt;

/// Separator characters a [`NodePath`] can be glued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathSeparator {
    #[default]
    Slash,
    Backslash,
    Underscore,
}

impl PathSeparator {
    pub fn as_char(self) -> char {
        match self {
            PathSeparator::Slash => '/',
            PathSeparator::Backslash => '\\',
            PathSeparator::Underscore => '_',
        }
    }

    /// The separator to fall back on when text already uses this one.
    pub fn complement(self) -> PathSeparator {
        match self {
            PathSeparator::Slash => PathSeparator::Backslash,
            PathSeparator::Backslash => PathSeparator::Slash,
            PathSeparator::Underscore => PathSeparator::Slash,
        }
    }

    /// Picks the first separator that occurs in `text`, defaulting to
    /// `Slash`.
    pub fn detect(text: &str) -> PathSeparator {
        for ch in text.chars() {
            match ch {
                '/' => return PathSeparator::Slash,
                '\\' => return PathSeparator::Backslash,
                '_' => return PathSeparator::Underscore,
                _ => {}
            }
        }
        PathSeparator::Slash
    }
}

/// A separator-glued path that remembers whether it was written absolute
/// (with a leading separator) and which separator it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    path: PathSegments,
    absolute: bool,
    separator: PathSeparator,
}

impl NodePath {
    /// Parses `text` on the given separator. A leading separator marks the
    /// path absolute; empty segments are dropped either way.
    pub fn parse(text: &str, separator: PathSeparator) -> Self {
        let sep = separator.as_char();
        let absolute = text.starts_with(sep);
        Self {
            path: PathSegments {
                segments: text
                    .split(sep)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                glue: sep.to_string(),
            },
            absolute,
            separator,
        }
    }

    /// Parses `text` after detecting its separator.
    pub fn parse_detected(text: &str) -> Self {
        Self::parse(text, PathSeparator::detect(text))
    }

    pub fn from_segments<I, S>(
        segments: I,
        separator: PathSeparator,
        absolute: bool,
    ) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            path: PathSegments::from_segments(segments, &separator.as_char().to_string())?,
            absolute,
            separator,
        })
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn set_absolute(&mut self, absolute: bool) {
        self.absolute = absolute;
    }

    pub fn separator(&self) -> PathSeparator {
        self.separator
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

    pub fn append(&mut self, segment: &str) -> Result<(), PathError> {
        self.path.append(segment)
    }

    pub fn sub_range(&self, start: usize, end: usize) -> Self {
        Self {
            path: self.path.sub_range(start, end),
            // A sliced path no longer starts at the original head.
            absolute: self.absolute && start == 0,
            separator: self.separator,
        }
    }

    pub fn drop_first(&mut self) -> Option<String> {
        let head = self.path.drop_first();
        if head.is_some() {
            self.absolute = false;
        }
        head
    }

    pub fn is_prefix_of(&self, other: &NodePath) -> bool {
        self.path.is_prefix_of(&other.path)
    }

    /// See [`PathSegments::match_percentage`].
    pub fn match_percentage(&self, other: &NodePath) -> u32 {
        self.path.match_percentage(&other.path)
    }

    /// See [`PathSegments::compile_pattern`].
    pub fn compile_pattern(&self) -> Result<Regex, PathError> {
        self.path.compile_pattern()
    }

    /// Renders the path, restoring the leading separator when absolute.
    pub fn render(&self) -> String {
        let body = self.path.join();
        if self.absolute {
            let mut out = String::with_capacity(body.len() + 1);
            out.push(self.separator.as_char());
            out.push_str(&body);
            out
        } else {
            body
        }
    }

    /// Re-glues the segments onto the dot separator, losing the absolute
    /// flag.
    pub fn to_namespace(&self) -> Namespace {
        Namespace::from(self.path.clone())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
