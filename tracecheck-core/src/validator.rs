use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::config::{FileNames, ProjectConfig};
use crate::coverage::CoverageResult;
use crate::error::Result;
use crate::evidence::EvidenceResult;
use crate::extract;
use crate::models::{RequirementsDoc, TaskList};
use crate::patterns::ExtractionMode;
use crate::storage::SpecDirectory;

/// Step of the simple validator that can stop the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Files,
    Components,
    Requirements,
    Tasks,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Files => write!(f, "Files"),
            Stage::Components => write!(f, "Components"),
            Stage::Requirements => write!(f, "Requirements"),
            Stage::Tasks => write!(f, "Tasks"),
        }
    }
}

/// Structural failure that short-circuits the simple validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Outcome of the simple validator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub mode: Option<ExtractionMode>,
    pub components: BTreeSet<String>,
    pub coverage: CoverageResult,
    pub failure: Option<StageFailure>,
    /// Fatal I/O messages, e.g. `Missing: tasks.md`
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failure.is_none() && self.coverage.is_valid()
    }

    fn fail(mut self, stage: Stage, message: impl Into<String>) -> Self {
        let message = message.into();
        log::warn!("{} stage failed: {}", stage, message);
        self.failure = Some(StageFailure { stage, message });
        self
    }
}

/// Coverage gate over blueprint, requirements and tasks documents
pub struct Validator {
    dir: SpecDirectory,
    files: FileNames,
    mode: ExtractionMode,
}

impl Validator {
    pub fn new(dir: SpecDirectory, config: &ProjectConfig) -> Self {
        Self {
            dir,
            files: config.files.clone(),
            mode: config.validate_mode,
        }
    }

    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> ValidationReport {
        log::info!("Starting validation of {}", self.dir.path().display());
        let mut report = ValidationReport {
            mode: Some(self.mode),
            ..Default::default()
        };

        let names = [
            &self.files.blueprint,
            &self.files.requirements,
            &self.files.tasks,
        ];
        for name in names {
            if !self.dir.exists(name) {
                report.errors.push(format!("Missing: {}", name));
            }
        }
        if !report.errors.is_empty() {
            let message = report.errors.join(", ");
            return report.fail(Stage::Files, message);
        }

        let read = |name: &str| self.dir.read(name);
        let (blueprint, requirements, tasks) = match (
            read(&self.files.blueprint),
            read(&self.files.requirements),
            read(&self.files.tasks),
        ) {
            (Ok(b), Ok(r), Ok(t)) => (b, r, t),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                report.errors.push(e.to_string());
                return report.fail(Stage::Files, e.to_string());
            }
        };

        report.components = extract::parse_blueprint(&blueprint).components;
        if report.components.is_empty() {
            return report.fail(
                Stage::Components,
                format!("No components found in {}", self.files.blueprint),
            );
        }

        let requirements = extract::parse_requirements(&requirements, self.mode);
        if requirements.total_criteria() == 0 {
            return report.fail(
                Stage::Requirements,
                format!("No acceptance criteria found in {}", self.files.requirements),
            );
        }
        if self.mode == ExtractionMode::Strict {
            for name in requirements.referenced_components().difference(&report.components) {
                log::warn!(
                    "Component {} named in {} is not declared in {}",
                    name,
                    self.files.requirements,
                    self.files.blueprint
                );
            }
        }

        let tasks = extract::parse_tasks(&tasks);
        if tasks.reference_tokens().is_empty() {
            return report.fail(
                Stage::Tasks,
                format!("No requirement tags found in {}", self.files.tasks),
            );
        }

        report.coverage = CoverageResult::from_documents(&requirements, &tasks);
        log::info!(
            "Coverage {:.1}% ({}/{})",
            report.coverage.coverage,
            report.coverage.covered_count(),
            report.coverage.total
        );
        report
    }
}

/// Combined requirements and research outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    RequirementsFailed,
    EvidenceFailed,
    BothFailed,
}

impl Verdict {
    pub fn from_flags(requirements_valid: bool, evidence_valid: bool) -> Self {
        match (requirements_valid, evidence_valid) {
            (true, true) => Verdict::Passed,
            (false, true) => Verdict::RequirementsFailed,
            (true, false) => Verdict::EvidenceFailed,
            (false, false) => Verdict::BothFailed,
        }
    }

    pub fn is_pass(&self) -> bool {
        *self == Verdict::Passed
    }
}

/// Outcome of the traceability validator
#[derive(Debug, Clone, PartialEq)]
pub struct TraceabilityReport {
    pub mode: ExtractionMode,
    pub requirements: RequirementsDoc,
    pub tasks: TaskList,
    pub coverage: CoverageResult,
    pub evidence: EvidenceResult,
}

impl TraceabilityReport {
    pub fn requirements_valid(&self) -> bool {
        self.coverage.is_traceable()
    }

    pub fn evidence_valid(&self) -> bool {
        self.evidence.is_valid()
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_flags(self.requirements_valid(), self.evidence_valid())
    }
}

/// Traceability matrix plus research evidence audit
pub struct TraceabilityValidator {
    dir: SpecDirectory,
    files: FileNames,
    mode: ExtractionMode,
}

impl TraceabilityValidator {
    pub fn new(dir: SpecDirectory, config: &ProjectConfig) -> Self {
        Self {
            dir,
            files: config.files.clone(),
            mode: config.trace_mode,
        }
    }

    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Missing requirements or tasks documents abort the run
    pub fn run(&self) -> Result<TraceabilityReport> {
        let requirements =
            extract::parse_requirements(&self.dir.read(&self.files.requirements)?, self.mode);
        let tasks = extract::parse_tasks(&self.dir.read(&self.files.tasks)?);
        let coverage = CoverageResult::from_documents(&requirements, &tasks);

        let evidence = if self.dir.exists(&self.files.research) {
            let doc = extract::parse_research(&self.dir.read(&self.files.research)?);
            EvidenceResult::audit(&doc)
        } else {
            log::warn!("Research file not found: {}", self.files.research);
            EvidenceResult::missing_file(&self.dir.resolve(&self.files.research))
        };

        if !coverage.invalid.is_empty() {
            log::warn!("Invalid task references: {}", coverage.invalid.join(", "));
        }

        Ok(TraceabilityReport {
            mode: self.mode,
            requirements,
            tasks,
            coverage,
            evidence,
        })
    }
}
