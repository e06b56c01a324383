//! The transformation unit: presence check, anchor, replacement.
//!
//! A transformation either applies cleanly or is skipped. All the reasons a
//! transformation cannot apply (anchor absent, template referencing a capture
//! the anchor did not produce) collapse into a skip outcome; nothing here can
//! leave the document partially substituted.

use crate::anchor::{Anchor, AnchorHit};
use regex::{Captures, Regex};
use std::fmt;

/// Predicate deciding whether a transformation's effect is already present
/// in the document. This is what makes re-running a patch set a no-op: the
/// check must hold immediately after the transformation applies and must not
/// have held immediately before.
#[derive(Debug, Clone)]
pub enum Presence {
    /// Applied once the document contains this exact text.
    Contains(String),
    /// Applied once this pattern matches anywhere in the document.
    Matches(Regex),
    /// Applied once this text no longer appears. Used by corruption repairs,
    /// where "done" means the broken text is gone.
    Gone(String),
}

impl Presence {
    pub fn is_applied(&self, doc: &str) -> bool {
        match self {
            Presence::Contains(text) => doc.contains(text.as_str()),
            Presence::Matches(re) => re.is_match(doc),
            Presence::Gone(text) => !doc.contains(text.as_str()),
        }
    }
}

/// The text spliced into the anchor's span.
#[derive(Debug, Clone)]
pub struct Replacement {
    /// Literal text, or a template expanded from the anchor's captures.
    /// `$1`, `$name`, and `${name}` refer to capture groups; `$$` is a
    /// literal dollar. Capture references only resolve for pattern anchors.
    pub template: String,
    /// Prefix every rendered line after the first with the leading
    /// whitespace of the line the anchor starts on, so multi-line insertions
    /// sit at the surrounding indentation depth.
    pub match_indent: bool,
    /// Cap the rendered text to this many characters, truncating on a
    /// character boundary and appending an ellipsis.
    pub max_chars: Option<usize>,
}

impl Replacement {
    pub fn literal(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            match_indent: false,
            max_chars: None,
        }
    }

    /// Render the final replacement text for a resolved anchor.
    fn render(&self, doc: &str, hit: &AnchorHit<'_>) -> Result<String, SkipReason> {
        let mut text = match &hit.captures {
            Some(caps) => expand_template(&self.template, caps)?,
            None => self.template.clone(),
        };
        if self.match_indent {
            text = reindent(&text, line_indent_at(doc, hit.span.start));
        }
        if let Some(max) = self.max_chars {
            text = cap_chars(&text, max);
        }
        Ok(text)
    }
}

/// One anchor-based change, owned by a patch set and immutable once defined.
#[derive(Debug, Clone)]
pub struct Transformation {
    pub id: String,
    pub presence: Presence,
    pub anchor: Anchor,
    pub replacement: Replacement,
}

/// Outcome of applying a single transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "StepResult carries the new document text when applied"]
pub enum StepResult {
    /// The transformation changed the document; here is the new text.
    Applied(String),
    /// The presence check held, or the splice would have been a no-op.
    AlreadyApplied,
    /// The transformation could not apply this run. The document is
    /// unchanged.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The anchor did not match. Ambiguous by design: either the patch was
    /// already applied in a shape the presence check does not recognize, or
    /// the document diverged from what the patch expects.
    AnchorAbsent,
    /// The replacement template referenced a capture group the anchor did
    /// not produce.
    MissingCapture(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AnchorAbsent => write!(f, "anchor absent"),
            SkipReason::MissingCapture(name) => {
                write!(f, "template references missing capture '{name}'")
            }
        }
    }
}

impl Transformation {
    /// Apply this transformation to the document.
    ///
    /// Pure: the only effect is the returned text. No I/O happens here.
    pub fn apply(&self, doc: &str) -> StepResult {
        if self.presence.is_applied(doc) {
            return StepResult::AlreadyApplied;
        }

        let Some(hit) = self.anchor.resolve(doc) else {
            return StepResult::Skipped(SkipReason::AnchorAbsent);
        };

        let rendered = match self.replacement.render(doc, &hit) {
            Ok(text) => text,
            Err(reason) => return StepResult::Skipped(reason),
        };

        // Splicing identical text would report a change that isn't one.
        if rendered == doc[hit.span.start..hit.span.end] {
            return StepResult::AlreadyApplied;
        }

        let mut next = String::with_capacity(doc.len() + rendered.len() - hit.span.len());
        next.push_str(&doc[..hit.span.start]);
        next.push_str(&rendered);
        next.push_str(&doc[hit.span.end..]);
        StepResult::Applied(next)
    }
}

/// Expand `$1` / `$name` / `${name}` references against the anchor's
/// captures. Unlike `Captures::expand`, a reference to a group that does not
/// exist or did not participate in the match is an error, so a bad template
/// can never silently produce a partial substitution.
fn expand_template(template: &str, caps: &Captures<'_>) -> Result<String, SkipReason> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, tail) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(close) => (&braced[..close], &braced[close + 1..]),
                None => {
                    // Unterminated brace: treat the dollar literally.
                    out.push('$');
                    rest = after;
                    continue;
                }
            }
        } else {
            let len = after
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            if len == 0 {
                out.push('$');
                rest = after;
                continue;
            }
            (&after[..len], &after[len..])
        };

        let group = if name.bytes().all(|b| b.is_ascii_digit()) {
            name.parse::<usize>().ok().and_then(|idx| caps.get(idx))
        } else {
            caps.name(name)
        };

        match group {
            Some(m) => out.push_str(m.as_str()),
            None => return Err(SkipReason::MissingCapture(name.to_string())),
        }
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}

/// Leading whitespace of the line containing `offset`.
fn line_indent_at(doc: &str, offset: usize) -> &str {
    let line_start = doc[..offset].rfind('\n').map_or(0, |pos| pos + 1);
    let line = &doc[line_start..];
    let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..indent_len]
}

/// Prefix every line after the first with `indent`. The first line continues
/// the anchor's own line, which is already indented. Blank lines stay blank.
fn reindent(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + indent.len() * 8);
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if idx > 0 && line != "\n" && !line.is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out
}

/// Cap `text` to at most `max` characters. Truncation happens on a character
/// boundary, trailing whitespace is trimmed, and an ellipsis marks the cut.
fn cap_chars(text: &str, max: usize) -> String {
    if max == 0 {
        // Even the ellipsis would exceed a zero budget.
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let truncated: String = text.chars().take(keep).collect();
    let mut out = truncated.trim_end().to_string();
    out.push('…');
    out
}
