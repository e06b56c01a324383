//! Anchorpatch: idempotent anchor-based text patching
//!
//! A small engine that mutates a single text document by locating anchors
//! (literal substrings, regex patterns with captures, or 1-based line
//! numbers) and splicing replacement text into the matched span.
//!
//! # Architecture
//!
//! Every change is a [`Transformation`]: a presence check, an anchor, and a
//! replacement. Transformations are grouped into an ordered [`PatchSet`] and
//! folded over the document; the [`engine`] reads the document once, runs
//! the fold in memory, and writes back atomically only when something
//! changed.
//!
//! # Idempotence
//!
//! Each transformation carries an explicit presence check that holds exactly
//! when its effect is already in the document, so re-running a patch set is
//! always a no-op. An anchor that fails to match is a per-transformation
//! skip, never a fatal error; only document-level read/write failures
//! escalate to the caller.
//!
//! # Example
//!
//! ```
//! use anchorpatch::{Anchor, PatchSet, Presence, Replacement, Transformation};
//!
//! let mut set = PatchSet::new("rename-widget");
//! set.transforms.push(Transformation {
//!     id: "popover".to_string(),
//!     presence: Presence::Contains("st.popover(".to_string()),
//!     anchor: Anchor::Literal("st.popander(".to_string()),
//!     replacement: Replacement::literal("st.popover("),
//! });
//!
//! let (patched, report) = set.run("with st.popander(\"Help\"):\n");
//! assert!(report.changed);
//! assert_eq!(patched, "with st.popover(\"Help\"):\n");
//! ```

pub mod anchor;
pub mod config;
pub mod document;
pub mod engine;
pub mod patchset;
pub mod transform;

// Re-exports
pub use anchor::{Anchor, AnchorHit, Span};
pub use config::{load_from_path, load_from_str, ConfigError, PatchSetConfig, ValidationError};
pub use document::DocumentError;
pub use engine::{check, execute, Outcome};
pub use patchset::{PatchSet, RunReport};
pub use transform::{Presence, Replacement, SkipReason, StepResult, Transformation};
