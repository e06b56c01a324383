use regex::{Captures, Regex};

/// A byte span within a document, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Locates where a transformation applies in the document.
///
/// Anchors are resolved against the current document text every time they
/// are used; byte offsets from earlier resolutions are never cached, so
/// replacements that change the document length cannot corrupt later anchors.
///
/// Only the first match is ever used. Patch authors are expected to write
/// anchors that target a single occurrence; a second occurrence is ignored
/// rather than disambiguated.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// Exact, case-sensitive substring. First occurrence wins.
    Literal(String),
    /// Regex with capture groups, for multi-line or templated matches.
    Pattern(Regex),
    /// A 1-based line number. Matches the content of that line, excluding
    /// the line terminator.
    ///
    /// Position-fragile: if the document has shifted since the patch was
    /// written, this silently targets unrelated content. Prefer content
    /// anchors; pair line anchors with a presence check that recognizes the
    /// text being repaired.
    Line(usize),
}

/// A resolved anchor: the matched span plus captures when the anchor is a
/// pattern. Captures borrow the document and are consumed immediately by
/// the replacement step, never persisted.
pub struct AnchorHit<'d> {
    pub span: Span,
    pub captures: Option<Captures<'d>>,
}

impl Anchor {
    /// Resolve this anchor against the current document text.
    ///
    /// Returns `None` when the anchor does not match. That is not an error:
    /// it signals that the owning transformation should be skipped, either
    /// because the patch was already applied in a different shape or because
    /// the document diverged from what the patch expects.
    pub fn resolve<'d>(&self, doc: &'d str) -> Option<AnchorHit<'d>> {
        match self {
            Anchor::Literal(needle) => {
                let start = doc.find(needle.as_str())?;
                Some(AnchorHit {
                    span: Span::new(start, start + needle.len()),
                    captures: None,
                })
            }
            Anchor::Pattern(re) => {
                let caps = re.captures(doc)?;
                let whole = caps.get(0)?;
                Some(AnchorHit {
                    span: Span::new(whole.start(), whole.end()),
                    captures: Some(caps),
                })
            }
            Anchor::Line(number) => line_span(doc, *number).map(|span| AnchorHit {
                span,
                captures: None,
            }),
        }
    }

    /// Whether the anchor matches anywhere in the document.
    pub fn is_present(&self, doc: &str) -> bool {
        match self {
            Anchor::Literal(needle) => doc.contains(needle.as_str()),
            Anchor::Pattern(re) => re.is_match(doc),
            Anchor::Line(number) => line_span(doc, *number).is_some(),
        }
    }
}

/// Byte span of the content of the 1-based line `number`, excluding the
/// trailing `\n` (and `\r` for CRLF documents). `None` when the document has
/// fewer lines.
fn line_span(doc: &str, number: usize) -> Option<Span> {
    if number == 0 {
        return None;
    }
    let mut start = 0;
    for (idx, raw) in doc.split_inclusive('\n').enumerate() {
        if idx + 1 == number {
            let content = raw.strip_suffix('\n').unwrap_or(raw);
            let content = content.strip_suffix('\r').unwrap_or(content);
            return Some(Span::new(start, start + content.len()));
        }
        start += raw.len();
    }
    None
}
