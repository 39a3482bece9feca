pub mod config;
pub mod coverage;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod models;
pub mod patterns;
pub mod report;
pub mod storage;
pub mod validator;

// Re-export commonly used types
pub use config::{get_config_path, FileNames, ProjectConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
pub use coverage::{implementing_tasks, CoverageResult};
pub use error::{Result, TraceError};
pub use evidence::{CitationError, EvidenceResult};
pub use models::{
    AcceptanceCriterion, Blueprint, Citation, CriterionId, Requirement, RequirementsDoc,
    ResearchDoc, Task, TaskList,
};
pub use patterns::{ExtractionMode, PatternSet, PATTERN_VERSION};
pub use report::{
    render_traceability_report, render_validation_report, traceability_json, validation_json,
    TraceabilitySummary, ValidationSummary,
};
pub use storage::SpecDirectory;
pub use validator::{
    Stage, StageFailure, TraceabilityReport, TraceabilityValidator, ValidationReport, Validator,
    Verdict,
};
