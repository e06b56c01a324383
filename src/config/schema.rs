use crate::anchor::Anchor;
use crate::patchset::PatchSet;
use crate::transform::{Presence, Replacement, Transformation};
use regex::Regex;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchSetConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub transforms: Vec<TransformDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Default target document. The caller may override it; the engine never
    /// embeds a path of its own.
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransformDefinition {
    pub id: String,
    pub presence: PresenceDefinition,
    pub anchor: AnchorDefinition,
    pub replacement: ReplacementDefinition,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PresenceDefinition {
    /// Applied once this exact text is present.
    Contains { text: String },
    /// Applied once this pattern matches.
    Matches { pattern: String },
    /// Applied once this text is no longer present.
    Gone { text: String },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AnchorDefinition {
    Literal {
        text: String,
    },
    Pattern {
        pattern: String,
    },
    /// 1-based line number. Position-fragile; last resort.
    Line {
        number: usize,
    },
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ReplacementDefinition {
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub match_indent: bool,
    #[serde(default)]
    pub max_chars: Option<usize>,
}

impl PatchSetConfig {
    /// Structural checks that need no regex compilation. Pattern validity is
    /// checked by `compile`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.transforms.is_empty() {
            issues.push(ValidationIssue::EmptyTransformList);
        }

        for def in &self.transforms {
            if def.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    transform_id: None,
                    field: "id",
                });
            }

            match &def.presence {
                PresenceDefinition::Contains { text } | PresenceDefinition::Gone { text } => {
                    if text.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            transform_id: Some(def.id.clone()),
                            field: "presence.text",
                        });
                    }
                }
                PresenceDefinition::Matches { pattern } => {
                    if pattern.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            transform_id: Some(def.id.clone()),
                            field: "presence.pattern",
                        });
                    }
                }
            }

            match &def.anchor {
                AnchorDefinition::Literal { text } => {
                    if text.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            transform_id: Some(def.id.clone()),
                            field: "anchor.text",
                        });
                    }
                }
                AnchorDefinition::Pattern { pattern } => {
                    if pattern.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            transform_id: Some(def.id.clone()),
                            field: "anchor.pattern",
                        });
                    }
                }
                AnchorDefinition::Line { number } => {
                    if *number == 0 {
                        issues.push(ValidationIssue::InvalidValue {
                            transform_id: Some(def.id.clone()),
                            message: "line numbers are 1-based; 0 is not a line".to_string(),
                        });
                    }
                }
            }

            if let Some(max) = def.replacement.max_chars {
                if max == 0 {
                    issues.push(ValidationIssue::InvalidValue {
                        transform_id: Some(def.id.clone()),
                        message: "max_chars must be at least 1".to_string(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Compile the definitions into a runnable patch set. Regexes compile
    /// here; a pattern that does not compile is reported with the owning
    /// transform's id.
    pub fn compile(&self) -> Result<PatchSet, ValidationError> {
        let mut issues = Vec::new();
        let mut transforms = Vec::with_capacity(self.transforms.len());

        for def in &self.transforms {
            let presence = match &def.presence {
                PresenceDefinition::Contains { text } => Some(Presence::Contains(text.clone())),
                PresenceDefinition::Gone { text } => Some(Presence::Gone(text.clone())),
                PresenceDefinition::Matches { pattern } => match Regex::new(pattern) {
                    Ok(re) => Some(Presence::Matches(re)),
                    Err(e) => {
                        issues.push(ValidationIssue::InvalidPattern {
                            transform_id: Some(def.id.clone()),
                            field: "presence.pattern",
                            message: e.to_string(),
                        });
                        None
                    }
                },
            };

            let anchor = match &def.anchor {
                AnchorDefinition::Literal { text } => Some(Anchor::Literal(text.clone())),
                AnchorDefinition::Line { number } => Some(Anchor::Line(*number)),
                AnchorDefinition::Pattern { pattern } => match Regex::new(pattern) {
                    Ok(re) => Some(Anchor::Pattern(re)),
                    Err(e) => {
                        issues.push(ValidationIssue::InvalidPattern {
                            transform_id: Some(def.id.clone()),
                            field: "anchor.pattern",
                            message: e.to_string(),
                        });
                        None
                    }
                },
            };

            if let (Some(presence), Some(anchor)) = (presence, anchor) {
                transforms.push(Transformation {
                    id: def.id.clone(),
                    presence,
                    anchor,
                    replacement: Replacement {
                        template: def.replacement.template.clone(),
                        match_indent: def.replacement.match_indent,
                        max_chars: def.replacement.max_chars,
                    },
                });
            }
        }

        if issues.is_empty() {
            Ok(PatchSet {
                name: self.meta.name.clone(),
                description: self.meta.description.clone(),
                transforms,
            })
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyTransformList,
    MissingField {
        transform_id: Option<String>,
        field: &'static str,
    },
    InvalidValue {
        transform_id: Option<String>,
        message: String,
    },
    InvalidPattern {
        transform_id: Option<String>,
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyTransformList => {
                write!(f, "patch set contains no transformations")
            }
            ValidationIssue::MissingField {
                transform_id,
                field,
            } => match transform_id {
                Some(id) => write!(f, "transform '{id}' missing required field '{field}'"),
                None => write!(f, "transform missing required field '{field}'"),
            },
            ValidationIssue::InvalidValue {
                transform_id,
                message,
            } => match transform_id {
                Some(id) => write!(f, "transform '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid transform configuration: {message}"),
            },
            ValidationIssue::InvalidPattern {
                transform_id,
                field,
                message,
            } => match transform_id {
                Some(id) => write!(f, "transform '{id}' has invalid '{field}': {message}"),
                None => write!(f, "invalid '{field}': {message}"),
            },
        }
    }
}
