//! An ordered sequence of transformations representing one upgrade pass.
//!
//! Order is significant: a later transformation may assume text inserted by
//! an earlier one exists, so the fold never reorders and never retries a
//! failed match with a relaxed anchor. Every anchor is re-resolved against
//! the current document state, never against offsets cached from before an
//! earlier splice.

use crate::transform::{SkipReason, StepResult, Transformation};

#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    pub name: String,
    pub description: Option<String>,
    pub transforms: Vec<Transformation>,
}

/// Per-run accounting of what each transformation did, keyed by ordinal
/// (position in the patch set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "RunReport decides whether the document is written back"]
pub struct RunReport {
    /// Whether the final text differs from the input text.
    pub changed: bool,
    /// Ordinals that applied this run.
    pub applied: Vec<usize>,
    /// Ordinals whose presence check already held.
    pub already_applied: Vec<usize>,
    /// Ordinals that could not apply, with the reason.
    pub skipped: Vec<(usize, SkipReason)>,
}

impl PatchSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            transforms: Vec::new(),
        }
    }

    /// Fold the transformations over the document in ordinal order.
    ///
    /// Pure: callers decide what to do with the returned text. `changed` is
    /// a byte comparison of final text against input, so a run where every
    /// transformation was already applied or skipped reports `false` and the
    /// returned text is identical to the input.
    pub fn run(&self, doc: &str) -> (String, RunReport) {
        let mut current = doc.to_string();
        let mut report = RunReport::default();

        for (ordinal, transform) in self.transforms.iter().enumerate() {
            match transform.apply(&current) {
                StepResult::Applied(next) => {
                    current = next;
                    report.applied.push(ordinal);
                }
                StepResult::AlreadyApplied => report.already_applied.push(ordinal),
                StepResult::Skipped(reason) => report.skipped.push((ordinal, reason)),
            }
        }

        report.changed = current != doc;
        (current, report)
    }
}
