use serde::Serialize;

use crate::coverage::implementing_tasks;
use crate::error::Result;
use crate::evidence::CitationError;
use crate::patterns::PATTERN_VERSION;
use crate::validator::{TraceabilityReport, ValidationReport, Verdict};

const BANNER_WIDTH: usize = 80;

/// Machine-readable summary of the simple validator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub covered: usize,
    pub missing: Vec<String>,
    pub coverage: f64,
    pub valid: bool,
}

impl From<&ValidationReport> for ValidationSummary {
    fn from(report: &ValidationReport) -> Self {
        Self {
            total: report.coverage.total,
            covered: report.coverage.covered_count(),
            missing: report.coverage.missing_ids(),
            coverage: report.coverage.coverage,
            valid: report.is_valid(),
        }
    }
}

/// Pretty-printed JSON summary of the simple validator
pub fn validation_json(report: &ValidationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ValidationSummary::from(report))?)
}

/// Console report of the simple validator
pub fn render_validation_report(report: &ValidationReport) -> String {
    let heavy = "=".repeat(BANNER_WIDTH);
    let light = "-".repeat(BANNER_WIDTH);
    let coverage = &report.coverage;
    let mut output = String::new();

    output.push_str(&format!("\n{}\n", heavy));
    output.push_str("SPECIFICATION VALIDATION REPORT\n");
    output.push_str(&format!("{}\n\n", heavy));

    if !report.errors.is_empty() {
        output.push_str("ERRORS\n");
        output.push_str(&format!("{}\n", light));
        for error in &report.errors {
            output.push_str(&format!("  - {}\n", error));
        }
        output.push('\n');
    }

    output.push_str("SUMMARY\n");
    output.push_str(&format!("{}\n", light));
    if let Some(mode) = report.mode {
        output.push_str(&format!(
            "Extraction Mode:       {} (patterns v{})\n",
            mode, PATTERN_VERSION
        ));
    }
    output.push_str(&format!("Total Criteria:        {}\n", coverage.total));
    output.push_str(&format!("Covered by Tasks:      {}\n", coverage.covered_count()));
    output.push_str(&format!("Coverage:              {:.1}%\n\n", coverage.coverage));

    if !coverage.missing.is_empty() {
        output.push_str("MISSING CRITERIA\n");
        output.push_str(&format!("{}\n", light));
        for id in coverage.missing_ids() {
            output.push_str(&format!("  - {}\n", id));
        }
        output.push('\n');
    }

    output.push_str("VALIDATION STATUS\n");
    output.push_str(&format!("{}\n", light));
    match &report.failure {
        Some(failure) => {
            output.push_str(&format!(
                "❌ FAILED - {} stage: {}\n\n",
                failure.stage, failure.message
            ));
        }
        None if report.is_valid() => output.push_str("✅ PASSED - All criteria covered\n\n"),
        None => output.push_str(&format!(
            "❌ FAILED - {} uncovered\n\n",
            coverage.missing.len()
        )),
    }

    output.push_str(&format!("{}\n", heavy));
    output
}

/// Machine-readable form of the traceability report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceabilitySummary {
    pub total_criteria: usize,
    pub covered_criteria: usize,
    pub coverage_percentage: f64,
    pub covered: Vec<String>,
    pub missing: Vec<String>,
    pub invalid_references: Vec<String>,
    pub orphan_tasks: Vec<String>,
    pub total_sources: usize,
    pub total_citations: usize,
    pub citation_errors: Vec<CitationError>,
    pub uncited_claims: Vec<String>,
    pub requirements_valid: bool,
    pub research_valid: bool,
    pub verdict: Verdict,
    pub valid: bool,
}

impl From<&TraceabilityReport> for TraceabilitySummary {
    fn from(report: &TraceabilityReport) -> Self {
        Self {
            total_criteria: report.coverage.total,
            covered_criteria: report.coverage.covered_count(),
            coverage_percentage: report.coverage.coverage,
            covered: report.coverage.covered_ids(),
            missing: report.coverage.missing_ids(),
            invalid_references: report.coverage.invalid.clone(),
            orphan_tasks: report.tasks.orphans().iter().map(|t| t.id.clone()).collect(),
            total_sources: report.evidence.source_count,
            total_citations: report.evidence.citation_count,
            citation_errors: report.evidence.citation_errors.clone(),
            uncited_claims: report.evidence.uncited_claims.clone(),
            requirements_valid: report.requirements_valid(),
            research_valid: report.evidence_valid(),
            verdict: report.verdict(),
            valid: report.verdict().is_pass(),
        }
    }
}

pub fn traceability_json(report: &TraceabilityReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&TraceabilitySummary::from(report))?)
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Markdown traceability matrix, coverage analysis, evidence audit and verdict
///
/// At most `max_claims` uncited claims are listed; the rest are counted.
pub fn render_traceability_report(report: &TraceabilityReport, max_claims: usize) -> String {
    let coverage = &report.coverage;
    let evidence = &report.evidence;
    let mut output = String::new();

    output.push_str("# Validation Report\n\n");
    output.push_str("## 1. Requirements to Tasks Traceability Matrix\n\n");
    output.push_str("| Requirement | Acceptance Criterion | Implementing Task(s) | Status |\n");
    output.push_str("|---|---|---|---|\n");

    for requirement in &report.requirements.requirements {
        for criterion in &requirement.criteria {
            let tasks: Vec<String> = implementing_tasks(&report.tasks, &criterion.id)
                .into_iter()
                .map(|id| format!("Task {}", id))
                .collect();
            let status = if tasks.is_empty() { "Missing" } else { "Covered" };
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                requirement.number,
                criterion.id,
                list_or_none(&tasks),
                status
            ));
        }
    }

    output.push_str("\n## 2. Coverage Analysis\n\n");
    output.push_str("### Summary\n");
    output.push_str(&format!(
        "- **Extraction Mode**: {} (patterns v{})\n",
        report.mode, PATTERN_VERSION
    ));
    output.push_str(&format!("- **Total Acceptance Criteria**: {}\n", coverage.total));
    output.push_str(&format!(
        "- **Criteria Covered by Tasks**: {}\n",
        coverage.covered_count()
    ));
    output.push_str(&format!(
        "- **Coverage Percentage**: {:.1}%\n\n",
        coverage.coverage
    ));

    output.push_str("### Detailed Status\n");
    output.push_str(&format!(
        "- **Covered Criteria**: {}\n",
        list_or_none(&coverage.covered_ids())
    ));
    output.push_str(&format!(
        "- **Missing Criteria**: {}\n",
        list_or_none(&coverage.missing_ids())
    ));
    output.push_str(&format!(
        "- **Invalid References**: {}\n",
        list_or_none(&coverage.invalid)
    ));

    let orphans = report.tasks.orphans();
    if !orphans.is_empty() {
        output.push_str("\n### Tasks Without Requirement References\n");
        for task in orphans {
            let state = if task.done { " (done)" } else { "" };
            output.push_str(&format!("- Task {}: {}{}\n", task.id, task.title, state));
        }
    }

    output.push_str("\n## 3. Research Evidence Validation\n\n");
    output.push_str("### Summary\n");
    output.push_str(&format!("- **Total Sources**: {}\n", evidence.source_count));
    output.push_str(&format!("- **Total Citations**: {}\n", evidence.citation_count));
    output.push_str(&format!(
        "- **Research Validation**: {}\n\n",
        if evidence.is_valid() { "PASSED" } else { "FAILED" }
    ));

    output.push_str("### Evidence Quality\n");
    output.push_str(&format!(
        "- **Citation Errors**: {}\n",
        evidence.citation_errors.len()
    ));
    output.push_str(&format!(
        "- **Uncited Claims**: {}\n",
        evidence.uncited_claims.len()
    ));

    if !evidence.citation_errors.is_empty() {
        output.push_str("\n#### Citation Issues:\n");
        for error in &evidence.citation_errors {
            output.push_str(&format!("- {}\n", error));
        }
    }

    if !evidence.uncited_claims.is_empty() {
        output.push_str("\n#### Uncited Factual Claims:\n");
        for claim in evidence.uncited_claims.iter().take(max_claims) {
            output.push_str(&format!("- {}\n", claim));
        }
        if evidence.uncited_claims.len() > max_claims {
            output.push_str(&format!(
                "- ... and {} more\n",
                evidence.uncited_claims.len() - max_claims
            ));
        }
    }

    output.push_str("\n## 4. Final Validation\n\n");
    output.push_str(&verdict_message(report));
    output.push('\n');
    output
}

fn verdict_message(report: &TraceabilityReport) -> String {
    let coverage = &report.coverage;
    let evidence = &report.evidence;
    let missing = coverage.missing.len();
    let invalid = coverage.invalid.len();
    let errors = evidence.citation_errors.len();
    let claims = evidence.uncited_claims.len();

    match report.verdict() {
        Verdict::Passed => format!(
            "[PASS] **VALIDATION PASSED**\n\nAll {} acceptance criteria are fully traced to implementation tasks AND all research claims are properly cited with verifiable sources. The plan is validated and ready for execution.",
            coverage.total
        ),
        Verdict::RequirementsFailed => format!(
            "[FAIL] **VALIDATION FAILED** - Requirements Issues\n\n{} criteria not covered, {} invalid references. Research evidence is properly cited, but requirements traceability needs attention.",
            missing, invalid
        ),
        Verdict::EvidenceFailed => format!(
            "[FAIL] **VALIDATION FAILED** - Research Evidence Issues\n\nRequirements traceability is complete, but research evidence has {} citation errors and {} uncited claims. This violates the evidence-based protocol and prevents professional use.",
            errors, claims
        ),
        Verdict::BothFailed => format!(
            "[FAIL] **VALIDATION FAILED** - Multiple Issues\n\nRequirements: {} criteria not covered, {} invalid references. Research: {} citation errors, {} uncited claims.",
            missing, invalid, errors, claims
        ),
    }
}
