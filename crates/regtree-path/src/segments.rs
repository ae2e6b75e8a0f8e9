//! Ordered path segments glued by a separator string.

use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Largest `N-M` span expanded into an alternation; wider ranges stay literal.
const MAX_RANGE_SPAN: u64 = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path glue must not be empty")]
    EmptyGlue,
    #[error("path segment must not be empty")]
    EmptySegment,
    #[error("segment {0:?} contains the glue {1:?}")]
    SegmentContainsGlue(String, String),
    #[error("pattern compilation failed: {0}")]
    Pattern(String),
}

/// An ordered sequence of non-empty string segments plus the separator
/// ("glue") they were split on.
///
/// Invariant: no segment ever contains the glue literal; [`append`] and
/// [`prepend`] enforce this. A `PathSegments` is a cheap value object,
/// recreated per operation.
///
/// [`append`]: PathSegments::append
/// [`prepend`]: PathSegments::prepend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments {
    pub(crate) segments: Vec<String>,
    pub(crate) glue: String,
}

impl PathSegments {
    /// Creates an empty path with the given glue.
    pub fn new(glue: impl Into<String>) -> Result<Self, PathError> {
        let glue = glue.into();
        if glue.is_empty() {
            return Err(PathError::EmptyGlue);
        }
        Ok(Self {
            segments: Vec::new(),
            glue,
        })
    }

    /// Splits `text` on the literal glue. Empty tokens are dropped, so
    /// `"a..b"` parsed with glue `"."` yields `["a", "b"]`.
    pub fn parse(text: &str, glue: &str) -> Result<Self, PathError> {
        let mut out = Self::new(glue)?;
        out.segments = text
            .split(glue)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Ok(out)
    }

    /// Builds a path from pre-split segments, validating each one.
    pub fn from_segments<I, S>(segments: I, glue: &str) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::new(glue)?;
        for seg in segments {
            out.append(&seg.into())?;
        }
        Ok(out)
    }

    pub fn glue(&self) -> &str {
        &self.glue
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    fn check_segment(&self, segment: &str) -> Result<(), PathError> {
        if segment.is_empty() {
            return Err(PathError::EmptySegment);
        }
        if segment.contains(&self.glue) {
            return Err(PathError::SegmentContainsGlue(
                segment.to_string(),
                self.glue.clone(),
            ));
        }
        Ok(())
    }

    /// Appends a segment at the tail; rejects segments containing the glue.
    pub fn append(&mut self, segment: &str) -> Result<(), PathError> {
        self.check_segment(segment)?;
        self.segments.push(segment.to_string());
        Ok(())
    }

    /// Prepends a segment at the head; rejects segments containing the glue.
    pub fn prepend(&mut self, segment: &str) -> Result<(), PathError> {
        self.check_segment(segment)?;
        self.segments.insert(0, segment.to_string());
        Ok(())
    }

    /// Returns the `[start, end)` sub-range as a new path. Bounds are
    /// clamped, so out-of-range indices yield a shorter (possibly empty)
    /// path rather than an error.
    pub fn sub_range(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.segments.len());
        let start = start.min(end);
        Self {
            segments: self.segments[start..end].to_vec(),
            glue: self.glue.clone(),
        }
    }

    /// Removes and returns the head segment.
    pub fn drop_first(&mut self) -> Option<String> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.segments.remove(0))
        }
    }

    /// Returns a copy with the segment order reversed.
    pub fn reversed(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.reverse();
        Self {
            segments,
            glue: self.glue.clone(),
        }
    }

    /// Renders the path as a glue-joined string.
    pub fn join(&self) -> String {
        self.segments.join(&self.glue)
    }

    /// Returns `true` when `other` starts with every segment of `self`.
    pub fn is_prefix_of(&self, other: &PathSegments) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| a == b)
    }

    /// Scores how well `other` matches this path.
    ///
    /// Each of `self`'s segments is worth `100 / len` (integer arithmetic,
    /// accumulated as `matched * 100 / len`). The walk proceeds
    /// position-by-position while segments are equal and stops at the first
    /// mismatch, returning the partial sum. When all of `self` matched and
    /// `other` is longer, `10` is added per extra segment.
    ///
    /// 0 = no match, 100 = exact, >100 = `other` is a strict descendant of
    /// `self`. The scoring ranks lookups by specificity.
    pub fn match_percentage(&self, other: &PathSegments) -> u32 {
        let len = self.segments.len();
        if len == 0 {
            // The empty path is a prefix of everything.
            return 100 + 10 * other.segments.len() as u32;
        }
        let mut matched = 0usize;
        for (a, b) in self.segments.iter().zip(&other.segments) {
            if a != b {
                break;
            }
            matched += 1;
        }
        if matched < len {
            return (matched * 100 / len) as u32;
        }
        let mut score = 100u32;
        if other.segments.len() > len {
            score += 10 * (other.segments.len() - len) as u32;
        }
        score
    }

    /// Compiles the path into a case-insensitive matching pattern.
    ///
    /// Segments are joined with the escaped glue literal; each `*` becomes a
    /// `(.*)` capture and each `N-M` numeric token expands into the
    /// alternation `(N|N+1|…|M)`. If the assembled pattern fails to
    /// compile, the whole path is retried as a literal-quoted pattern.
    pub fn compile_pattern(&self) -> Result<Regex, PathError> {
        let glue = regex::escape(&self.glue);
        let mut pattern = String::from("^");
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                pattern.push_str(&glue);
            }
            pattern.push_str(&segment_pattern(seg));
        }
        pattern.push('$');

        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => Ok(re),
            Err(_) => {
                let literal = format!("^{}$", regex::escape(&self.join()));
                RegexBuilder::new(&literal)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| PathError::Pattern(err.to_string()))
            }
        }
    }
}

impl fmt::Display for PathSegments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

fn range_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)-(\d+)").unwrap())
}

/// Translates one segment into pattern text: `*` → `(.*)`, `N-M` → an
/// alternation of the literals in the range, everything else quoted.
fn segment_pattern(segment: &str) -> String {
    let re = range_token_regex();
    let mut out = String::with_capacity(segment.len() + 8);
    let mut last = 0usize;
    for caps in re.captures_iter(segment) {
        let m = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        out.push_str(&wildcard_literal(&segment[last..m.start()]));
        match expand_range(&caps[1], &caps[2]) {
            Some(alt) => out.push_str(&alt),
            None => out.push_str(&wildcard_literal(m.as_str())),
        }
        last = m.end();
    }
    out.push_str(&wildcard_literal(&segment[last..]));
    out
}

/// Quotes a chunk of segment text, turning each `*` into `(.*)`.
fn wildcard_literal(chunk: &str) -> String {
    let mut out = String::with_capacity(chunk.len() + 4);
    for part in chunk.split('*') {
        if !out.is_empty() {
            out.push_str("(.*)");
        }
        out.push_str(&regex::escape(part));
    }
    if chunk.is_empty() {
        out.clear();
    }
    out
}

fn expand_range(lo: &str, hi: &str) -> Option<String> {
    let lo: u64 = lo.parse().ok()?;
    let hi: u64 = hi.parse().ok()?;
    if hi < lo || hi - lo > MAX_RANGE_SPAN {
        return None;
    }
    let mut out = String::from("(");
    for n in lo..=hi {
        if n > lo {
            out.push('|');
        }
        out.push_str(&n.to_string());
    }
    out.push(')');
    Some(out)
}
