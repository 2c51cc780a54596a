//! Image URL classification by host:port marker.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Missing,
    NeedsMigration,
    Correct,
    External,
}

impl Classification {
    pub fn code(self) -> &'static str {
        match self {
            Classification::Missing => "MISSING",
            Classification::NeedsMigration => "NEEDS_MIGRATION",
            Classification::Correct => "CORRECT",
            Classification::External => "EXTERNAL",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Holds the two markers. Matching is plain, case-sensitive `contains`.
#[derive(Debug, Clone)]
pub struct Classifier {
    deprecated: String,
    current: String,
}

impl Classifier {
    pub fn new(deprecated: impl Into<String>, current: impl Into<String>) -> Self {
        Classifier {
            deprecated: deprecated.into(),
            current: current.into(),
        }
    }

    pub fn deprecated(&self) -> &str {
        &self.deprecated
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Deprecated marker wins over current when both are present.
    pub fn classify(&self, image_ref: Option<&str>) -> Classification {
        match image_ref {
            None | Some("") => Classification::Missing,
            Some(url) if url.contains(&self.deprecated) => Classification::NeedsMigration,
            Some(url) if url.contains(&self.current) => Classification::Correct,
            Some(_) => Classification::External,
        }
    }

    /// Human-readable verdict for the report line.
    pub fn describe(&self, class: Classification) -> String {
        match class {
            Classification::Missing => format!("{} (no image)", class),
            Classification::NeedsMigration => {
                format!("{} (deprecated host {})", class, self.deprecated())
            }
            Classification::Correct => format!("{} (current host {})", class, self.current()),
            Classification::External => format!("{} (unknown host)", class),
        }
    }
}
