use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;

use crate::models::ResearchDoc;

/// A finding that makes a research document fail the audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitationError {
    ResearchFileMissing(String),
    MissingSourcesSection,
    NoSources,
    NoCitations,
    /// A `[cite:N]` marker with no matching declared source
    Dangling { index: String },
    /// Fewer citations than declared sources
    LowDensity { citations: usize, sources: usize },
}

impl fmt::Display for CitationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationError::ResearchFileMissing(name) => {
                write!(f, "Research file not found: {}", name)
            }
            CitationError::MissingSourcesSection => write!(f, "Missing 'Browsed Sources' section"),
            CitationError::NoSources => write!(f, "No sources found in research document"),
            CitationError::NoCitations => {
                write!(f, "No citations found in technology rationales")
            }
            CitationError::Dangling { index } => {
                write!(f, "Citation [cite:{}] references non-existent source", index)
            }
            CitationError::LowDensity { citations, sources } => write!(
                f,
                "Too few citations ({}) for number of sources ({})",
                citations, sources
            ),
        }
    }
}

impl Serialize for CitationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of auditing one research document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceResult {
    pub source_count: usize,
    pub citation_count: usize,
    pub citation_errors: Vec<CitationError>,
    /// Advisory only, never affects validity
    pub uncited_claims: Vec<String>,
}

impl EvidenceResult {
    /// Apply the citation rules to a parsed research document
    pub fn audit(doc: &ResearchDoc) -> Self {
        let mut result = EvidenceResult {
            source_count: doc.source_count(),
            citation_count: doc.citations.len(),
            citation_errors: Vec::new(),
            uncited_claims: doc.uncited_claims.clone(),
        };

        if !doc.has_sources_section() {
            log::warn!("Research document has no Browsed Sources section");
            result.citation_errors.push(CitationError::MissingSourcesSection);
            return result;
        }

        for citation in &doc.citations {
            if !doc.has_source(&citation.index) {
                log::warn!(
                    "Dangling citation [cite:{}] in rationale for {}",
                    citation.index,
                    citation.technology
                );
                result.citation_errors.push(CitationError::Dangling {
                    index: citation.index.clone(),
                });
            }
        }

        if result.source_count == 0 {
            result.citation_errors.push(CitationError::NoSources);
        }

        if result.citation_count == 0 {
            result.citation_errors.push(CitationError::NoCitations);
        }

        if result.citation_count < result.source_count {
            result.citation_errors.push(CitationError::LowDensity {
                citations: result.citation_count,
                sources: result.source_count,
            });
        }

        result
    }

    /// Result for a research file that could not be found
    pub fn missing_file(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        EvidenceResult {
            citation_errors: vec![CitationError::ResearchFileMissing(name)],
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.citation_errors.is_empty()
    }
}
