use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::TraceError;

/// Revision of the document grammar below. Bump when any pattern changes meaning.
pub const PATTERN_VERSION: u32 = 1;

/// How strictly acceptance criteria lines are recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Only `N. WHEN ... THE **Component** SHALL ...` lines count
    Strict,
    /// Any numbered line counts
    Lenient,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Strict => write!(f, "strict"),
            ExtractionMode::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ExtractionMode::Strict),
            "lenient" => Ok(ExtractionMode::Lenient),
            other => Err(TraceError::InvalidMode(other.to_string())),
        }
    }
}

macro_rules! pattern {
    ($(#[$doc:meta])* $name:ident, $re:expr) => {
        $(#[$doc])*
        pub fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).expect(concat!("valid pattern: ", stringify!($name))))
        }
    };
}

pattern!(
    /// `### Requirement 3: Title`
    requirement_header,
    r"(?m)^###[ \t]+Requirement[ \t]+(\d+):[ \t]*([^\r\n]*?)[ \t]*\r?$"
);

pattern!(
    /// `#### Acceptance Criteria`
    acceptance_criteria_header,
    r"(?m)^####[ \t]+Acceptance Criteria[ \t]*\r?$"
);

pattern!(
    /// Any markdown header; group 1 is the run of `#`
    markdown_header,
    r"(?m)^(#{1,6})[ \t]+\S"
);

pattern!(
    /// `2. Any text` inside an acceptance criteria subsection
    lenient_criterion,
    r"^\s*(\d+)\.\s+(.+?)\s*$"
);

pattern!(
    /// `2. WHEN ... THE **Component** SHALL ...`
    strict_criterion,
    r"^\s*(\d+)\.\s+WHEN\b.*?\bTHE\s+\*\*([A-Za-z0-9_]+)\*\*\s+SHALL\b"
);

pattern!(
    /// `- [ ] 2.1. Title`, also `[x]` for completed items
    task_item,
    r"^\s*[-*]\s+\[([ xX])\]\s+(\d+(?:\.\d+)*)\.?\s*(.*?)\s*$"
);

pattern!(
    /// Any `- [ ]` checklist line, numbered or not
    checklist_item,
    r"^\s*[-*]\s+\[[ xX]\]\s"
);

pattern!(
    /// `_Requirements: 1.1, 2.3_`
    requirements_annotation,
    r"_Requirements:\s*([^_\r\n]*?)\s*_"
);

pattern!(
    /// `| **Component** |` cell in a blueprint table
    component_cell,
    r"\|\s*\*\*([A-Za-z0-9_]+)\*\*\s*\|"
);

pattern!(
    /// `## 3. Browsed Sources`, the number prefix is optional
    sources_header,
    r"(?m)^##[ \t]+(?:\d+\.[ \t]+)?Browsed Sources[ \t]*\r?$"
);

pattern!(
    /// `- [1] https://example.com/page`
    source_line,
    r"^\s*-\s+\[(\d+)\]\s+(https?://\S+)"
);

pattern!(
    /// `| **Technology** | rationale text |`
    rationale_row,
    r"^\s*\|\s*\*\*(.+?)\*\*\s*\|\s*(.+?)\s*\|"
);

pattern!(
    /// `[cite:4]`
    citation_marker,
    r"\[cite:(\d+)\]"
);

pattern!(
    /// A citation marker opening the remainder of a line
    leading_citation,
    r"^\s*\[cite:\d+\]"
);

pattern!(
    /// A numeral, optionally a decimal or percentage
    numeral,
    r"\d+(?:\.\d+)?%?"
);

pattern!(
    /// Superlative or certainty wording
    certainty_word,
    r"(?i)\b(excellent|proven|ideal|best|optimal)\b"
);

/// Patterns that depend on the extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternSet {
    pub mode: ExtractionMode,
}

impl PatternSet {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    /// Pattern a criterion line must match in this mode
    pub fn criterion(&self) -> &'static Regex {
        match self.mode {
            ExtractionMode::Strict => strict_criterion(),
            ExtractionMode::Lenient => lenient_criterion(),
        }
    }

    /// Whether the criterion body text is retained
    pub fn keeps_text(&self) -> bool {
        self.mode == ExtractionMode::Lenient
    }
}
