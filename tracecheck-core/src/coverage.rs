use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{compare_reference_tokens, CriterionId, RequirementsDoc, TaskList};

/// Result of reconciling criteria against task reference tokens
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageResult {
    pub total: usize,
    pub covered: BTreeSet<CriterionId>,
    pub missing: BTreeSet<CriterionId>,
    /// Tokens that name no known criterion, sorted with [`compare_reference_tokens`]
    pub invalid: Vec<String>,
    pub coverage: f64,
}

impl CoverageResult {
    /// Reconcile the full criterion set with the tokens claimed by tasks
    pub fn compute(criteria: &BTreeSet<CriterionId>, references: &BTreeSet<String>) -> Self {
        let mut covered = BTreeSet::new();
        let mut invalid = Vec::new();

        for token in references {
            match token.parse::<CriterionId>() {
                Ok(id) if criteria.contains(&id) && id.to_string() == *token => {
                    covered.insert(id);
                }
                _ => invalid.push(token.clone()),
            }
        }
        invalid.sort_by(|a, b| compare_reference_tokens(a, b));

        let missing: BTreeSet<CriterionId> = criteria.difference(&covered).copied().collect();

        let coverage = if criteria.is_empty() {
            100.0
        } else {
            (covered.len() as f64 / criteria.len() as f64) * 100.0
        };

        CoverageResult {
            total: criteria.len(),
            covered,
            missing,
            invalid,
            coverage,
        }
    }

    /// Reconcile a parsed requirements document with a parsed task list
    pub fn from_documents(requirements: &RequirementsDoc, tasks: &TaskList) -> Self {
        Self::compute(&requirements.all_criteria(), &tasks.reference_tokens())
    }

    /// Simple validity: every criterion is covered
    pub fn is_valid(&self) -> bool {
        self.coverage == 100.0
    }

    /// Traceability validity: fully covered and no task points at an unknown criterion
    pub fn is_traceable(&self) -> bool {
        self.is_valid() && self.invalid.is_empty()
    }

    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }

    /// Missing criteria in numeric order, rendered as `R.I`
    pub fn missing_ids(&self) -> Vec<String> {
        self.missing.iter().map(|id| id.to_string()).collect()
    }

    pub fn covered_ids(&self) -> Vec<String> {
        self.covered.iter().map(|id| id.to_string()).collect()
    }
}

/// Tasks claiming a criterion, in task list order
pub fn implementing_tasks(tasks: &TaskList, criterion: &CriterionId) -> Vec<String> {
    let token = criterion.to_string();
    tasks
        .tasks
        .iter()
        .filter(|t| t.references_token(&token))
        .map(|t| t.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn ids(list: &[&str]) -> BTreeSet<CriterionId> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn tokens(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partial_coverage() {
        let result = CoverageResult::compute(&ids(&["1.1", "1.2"]), &tokens(&["1.1"]));
        assert_eq!(result.total, 2);
        assert_eq!(result.covered_count(), 1);
        assert_eq!(result.missing_ids(), vec!["1.2"]);
        assert_eq!(result.coverage, 50.0);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_full_coverage() {
        let result = CoverageResult::compute(&ids(&["1.1", "1.2"]), &tokens(&["1.1", "1.2"]));
        assert_eq!(result.coverage, 100.0);
        assert!(result.missing.is_empty());
        assert!(result.is_valid());
        assert!(result.is_traceable());
    }

    #[test]
    fn test_invalid_reference_is_not_covered_or_missing() {
        let result =
            CoverageResult::compute(&ids(&["1.1", "1.2"]), &tokens(&["1.1", "1.2", "1.3"]));
        assert_eq!(result.invalid, vec!["1.3"]);
        assert!(!result.covered.contains(&"1.3".parse::<CriterionId>().unwrap()));
        assert!(!result.missing.contains(&"1.3".parse::<CriterionId>().unwrap()));
        assert!(result.is_valid());
        assert!(!result.is_traceable());
    }

    #[test]
    fn test_non_canonical_token_is_invalid() {
        let result = CoverageResult::compute(&ids(&["1.1"]), &tokens(&["01.1", "foo"]));
        assert_eq!(result.invalid, vec!["01.1", "foo"]);
        assert_eq!(result.covered_count(), 0);
    }

    #[test]
    fn test_zero_criteria_is_fully_covered() {
        let result = CoverageResult::compute(&BTreeSet::new(), &tokens(&["2.1"]));
        assert_eq!(result.total, 0);
        assert_eq!(result.coverage, 100.0);
        assert!(result.missing.is_empty());
        assert_eq!(result.invalid, vec!["2.1"]);
    }

    #[test]
    fn test_partition_and_monotonicity() {
        let criteria = ids(&["1.1", "1.2", "2.1", "10.1"]);
        let mut refs = tokens(&["1.1"]);
        let before = CoverageResult::compute(&criteria, &refs);

        let union: BTreeSet<CriterionId> = before.covered.union(&before.missing).copied().collect();
        assert_eq!(union, criteria);
        assert!(before.covered.is_disjoint(&before.missing));

        refs.insert("10.1".to_string());
        let after = CoverageResult::compute(&criteria, &refs);
        assert_eq!(after.covered_count(), before.covered_count() + 1);
        assert_eq!(after.missing.len(), before.missing.len() - 1);
    }

    #[test]
    fn test_missing_sorted_numerically() {
        let result = CoverageResult::compute(&ids(&["10.1", "2.3", "2.10", "1.1"]), &tokens(&[]));
        assert_eq!(result.missing_ids(), vec!["1.1", "2.3", "2.10", "10.1"]);
    }

    #[test]
    fn test_implementing_tasks_in_order() {
        let tasks = TaskList {
            tasks: vec![
                Task {
                    id: "3".to_string(),
                    title: String::new(),
                    done: false,
                    references: vec!["1.1".to_string()],
                },
                Task {
                    id: "1".to_string(),
                    title: String::new(),
                    done: false,
                    references: vec!["1.2".to_string(), "1.1".to_string()],
                },
            ],
        };
        let id: CriterionId = "1.1".parse().unwrap();
        assert_eq!(implementing_tasks(&tasks, &id), vec!["3", "1"]);
        let id: CriterionId = "2.1".parse().unwrap();
        assert!(implementing_tasks(&tasks, &id).is_empty());
    }
}
