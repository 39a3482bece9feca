use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Composite identifier of an acceptance criterion, e.g. `3.2`
///
/// Ordering is numeric on both parts, so `2.3` sorts before `10.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId {
    pub requirement: u32,
    pub index: u32,
}

impl CriterionId {
    pub fn new(requirement: u32, index: u32) -> Self {
        Self { requirement, index }
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.requirement, self.index)
    }
}

impl FromStr for CriterionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (req, idx) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("Not a criterion identifier: {}", s))?;
        let requirement = req
            .parse::<u32>()
            .map_err(|_| format!("Invalid requirement number in '{}'", s))?;
        let index = idx
            .parse::<u32>()
            .map_err(|_| format!("Invalid criterion index in '{}'", s))?;
        Ok(Self { requirement, index })
    }
}

/// A single acceptance criterion owned by a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub id: CriterionId,
    /// Full criterion text (lenient mode only)
    pub text: Option<String>,
    /// Responsible component named in a strict `WHEN ... THE **X** SHALL` clause
    pub component: Option<String>,
}

/// A numbered requirement section and its acceptance criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub number: u32,
    pub title: String,
    pub criteria: Vec<AcceptanceCriterion>,
}

impl Requirement {
    pub fn criterion_ids(&self) -> impl Iterator<Item = CriterionId> + '_ {
        self.criteria.iter().map(|c| c.id)
    }
}

/// Parsed requirements document, requirements kept in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsDoc {
    pub requirements: Vec<Requirement>,
}

impl RequirementsDoc {
    /// Union of every criterion identifier across all requirements
    pub fn all_criteria(&self) -> BTreeSet<CriterionId> {
        self.requirements
            .iter()
            .flat_map(|r| r.criterion_ids())
            .collect()
    }

    pub fn total_criteria(&self) -> usize {
        self.requirements.iter().map(|r| r.criteria.len()).sum()
    }

    /// Component names referenced by strict-mode criteria
    pub fn referenced_components(&self) -> BTreeSet<String> {
        self.requirements
            .iter()
            .flat_map(|r| r.criteria.iter())
            .filter_map(|c| c.component.clone())
            .collect()
    }
}

/// A checklist item from the task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task number as written, e.g. `3` or `2.1`
    pub id: String,
    pub title: String,
    pub done: bool,
    /// Raw reference tokens from `_Requirements: ..._` annotations
    pub references: Vec<String>,
}

impl Task {
    pub fn references_token(&self, token: &str) -> bool {
        self.references.iter().any(|r| r == token)
    }
}

/// Parsed task list, tasks kept in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// Every distinct reference token claimed by any task
    pub fn reference_tokens(&self) -> BTreeSet<String> {
        self.tasks
            .iter()
            .flat_map(|t| t.references.iter().cloned())
            .collect()
    }

    /// Tasks that carry no requirement references at all
    pub fn orphans(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.references.is_empty()).collect()
    }
}

/// Distinct component names declared in a design blueprint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub components: BTreeSet<String>,
}

/// Inline `[cite:N]` marker found in a rationale row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Index digits as written, which may exceed any declarable source index
    pub index: String,
    /// Technology named in the rationale row holding the marker
    pub technology: String,
}

/// Parsed research document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchDoc {
    /// `None` when the Browsed Sources section is absent
    pub sources: Option<BTreeMap<u32, String>>,
    pub citations: Vec<Citation>,
    pub uncited_claims: Vec<String>,
}

impl ResearchDoc {
    pub fn has_sources_section(&self) -> bool {
        self.sources.is_some()
    }

    pub fn source_count(&self) -> usize {
        self.sources.as_ref().map_or(0, |s| s.len())
    }

    pub fn has_source(&self, index: &str) -> bool {
        let Ok(index) = index.parse::<u32>() else {
            return false;
        };
        self.sources
            .as_ref()
            .is_some_and(|s| s.contains_key(&index))
    }
}

/// Sort reference tokens: `R.I` tokens numerically, anything else after them lexically
pub fn compare_reference_tokens(a: &str, b: &str) -> Ordering {
    match (a.parse::<CriterionId>(), b.parse::<CriterionId>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
