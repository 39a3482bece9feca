use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use crate::models::{
    AcceptanceCriterion, Blueprint, Citation, CriterionId, Requirement, RequirementsDoc,
    ResearchDoc, Task, TaskList,
};
use crate::patterns::{self, ExtractionMode, PatternSet};

/// Parse `### Requirement N: Title` sections and their acceptance criteria
pub fn parse_requirements(content: &str, mode: ExtractionMode) -> RequirementsDoc {
    let set = PatternSet::new(mode);

    let mut headers = Vec::new();
    for caps in patterns::requirement_header().captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        headers.push((whole.start(), whole.end(), caps[1].to_string(), caps[2].to_string()));
    }

    let mut requirements: Vec<Requirement> = Vec::new();
    let mut seen = BTreeSet::new();

    for (i, (_, body_start, number, title)) in headers.iter().enumerate() {
        let section_end = headers.get(i + 1).map_or(content.len(), |next| next.0);

        let number: u32 = match number.parse() {
            Ok(n) => n,
            Err(_) => {
                log::warn!("Skipping requirement with unusable number '{}'", number);
                continue;
            }
        };
        if !seen.insert(number) {
            log::warn!("Duplicate Requirement {} ignored", number);
            continue;
        }

        let section = &content[*body_start..section_end];
        let criteria = match acceptance_criteria_span(section) {
            Some(span) => parse_criteria(number, &section[span], &set),
            None => {
                log::debug!("Requirement {} has no acceptance criteria", number);
                Vec::new()
            }
        };

        requirements.push(Requirement {
            number,
            title: title.trim().to_string(),
            criteria,
        });
    }

    let doc = RequirementsDoc { requirements };
    log::debug!(
        "Found {} requirements with {} criteria ({} mode)",
        doc.requirements.len(),
        doc.total_criteria(),
        mode
    );
    doc
}

/// Byte range of the `#### Acceptance Criteria` body within a requirement section
fn acceptance_criteria_span(section: &str) -> Option<Range<usize>> {
    let header = patterns::acceptance_criteria_header().find(section)?;
    let start = header.end();

    // Ends at the next header of level 1-4
    let end = patterns::markdown_header()
        .captures_iter(&section[start..])
        .find(|caps| caps[1].len() <= 4)
        .and_then(|caps| caps.get(0))
        .map_or(section.len(), |m| start + m.start());

    Some(start..end)
}

fn parse_criteria(requirement: u32, body: &str, set: &PatternSet) -> Vec<AcceptanceCriterion> {
    let mut criteria: Vec<AcceptanceCriterion> = Vec::new();

    for line in body.lines() {
        let Some(caps) = set.criterion().captures(line) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<u32>() else {
            continue;
        };
        let id = CriterionId::new(requirement, index);
        if criteria.iter().any(|c| c.id == id) {
            log::warn!("Duplicate acceptance criterion {} ignored", id);
            continue;
        }

        let component = patterns::strict_criterion()
            .captures(line)
            .map(|c| c[2].to_string());
        let text = set.keeps_text().then(|| caps[2].to_string());

        criteria.push(AcceptanceCriterion {
            id,
            text,
            component,
        });
    }

    criteria
}

/// Parse checklist items and their `_Requirements: ..._` annotations
///
/// Lines following a checklist item, up to the next one, belong to that item.
/// Unnumbered checklist items close the previous block but are not tasks, so
/// their annotations are dropped.
pub fn parse_tasks(content: &str) -> TaskList {
    let mut tasks = Vec::new();
    let mut current: Option<Task> = None;

    for line in content.lines() {
        if patterns::checklist_item().is_match(line) {
            if let Some(task) = current.take() {
                tasks.push(task);
            }
            match patterns::task_item().captures(line) {
                Some(caps) => {
                    let title = patterns::requirements_annotation().replace_all(&caps[3], "");
                    current = Some(Task {
                        id: caps[2].to_string(),
                        title: title.trim().to_string(),
                        done: !caps[1].trim().is_empty(),
                        references: Vec::new(),
                    });
                }
                None => log::debug!("Ignoring unnumbered checklist item: {}", line.trim()),
            }
        }

        for caps in patterns::requirements_annotation().captures_iter(line) {
            match current.as_mut() {
                Some(task) => {
                    for token in split_references(&caps[1]) {
                        if !task.references.contains(&token) {
                            task.references.push(token);
                        }
                    }
                }
                None => log::debug!("Ignoring requirements annotation outside any task: {}", line.trim()),
            }
        }
    }

    if let Some(task) = current {
        tasks.push(task);
    }

    let list = TaskList { tasks };
    log::debug!(
        "Found {} tasks referencing {} distinct tokens",
        list.tasks.len(),
        list.reference_tokens().len()
    );
    list
}

fn split_references(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Collect the distinct `| **Component** |` names from a blueprint
pub fn parse_blueprint(content: &str) -> Blueprint {
    let components: BTreeSet<String> = patterns::component_cell()
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect();

    log::debug!("Found {} components", components.len());
    Blueprint { components }
}

/// Parse sources, rationale citations and factual claims from a research document
pub fn parse_research(content: &str) -> ResearchDoc {
    let sources_span = sources_section_span(content);

    let sources = sources_span.as_ref().map(|span| {
        let mut sources = BTreeMap::new();
        for line in content[span.body.clone()].lines() {
            let Some(caps) = patterns::source_line().captures(line) else {
                continue;
            };
            let Ok(index) = caps[1].parse::<u32>() else {
                log::warn!("Source index out of range: [{}]", &caps[1]);
                continue;
            };
            if sources.contains_key(&index) {
                log::warn!("Duplicate source [{}] ignored", index);
                continue;
            }
            sources.insert(index, caps[2].to_string());
        }
        sources
    });

    let mut citations = Vec::new();
    for line in content.lines() {
        let Some(row) = patterns::rationale_row().captures(line) else {
            continue;
        };
        for caps in patterns::citation_marker().captures_iter(&row[2]) {
            citations.push(Citation {
                index: caps[1].to_string(),
                technology: row[1].trim().to_string(),
            });
        }
    }

    let claims_text = match &sources_span {
        Some(span) => format!(
            "{}{}",
            &content[..span.whole.start],
            &content[span.whole.end..]
        ),
        None => content.to_string(),
    };
    let uncited_claims = find_uncited_claims(&claims_text);

    log::debug!(
        "Found {} sources, {} citations, {} uncited claims",
        sources.as_ref().map_or(0, |s| s.len()),
        citations.len(),
        uncited_claims.len()
    );

    ResearchDoc {
        sources,
        citations,
        uncited_claims,
    }
}

struct SectionSpan {
    /// Header through end of section
    whole: Range<usize>,
    /// Body after the header line
    body: Range<usize>,
}

fn sources_section_span(content: &str) -> Option<SectionSpan> {
    let header = patterns::sources_header().find(content)?;
    let body_start = header.end();

    // Ends at the next header of level 1-2
    let end = patterns::markdown_header()
        .captures_iter(&content[body_start..])
        .find(|caps| caps[1].len() <= 2)
        .and_then(|caps| caps.get(0))
        .map_or(content.len(), |m| body_start + m.start());

    Some(SectionSpan {
        whole: header.start()..end,
        body: body_start..end,
    })
}

/// Sentences that read like factual claims and carry no citation marker
pub fn find_uncited_claims(content: &str) -> Vec<String> {
    let mut claims = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || is_table_separator(trimmed) {
            continue;
        }

        for (sentence, cited) in split_sentences(line) {
            let sentence = sentence.trim();
            if sentence.is_empty() || cited {
                continue;
            }
            if patterns::numeral().is_match(sentence) || patterns::certainty_word().is_match(sentence)
            {
                claims.push(sentence.to_string());
            }
        }
    }

    claims
}

fn is_table_separator(line: &str) -> bool {
    line.starts_with('|') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Split a line into sentences, pairing each with whether it is cited
///
/// Citation markers directly after a sentence terminator belong to the
/// sentence they follow.
fn split_sentences(line: &str) -> Vec<(&str, bool)> {
    let bytes = line.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let terminator = matches!(bytes[i], b'.' | b'!' | b'?')
            && bytes.get(i + 1).map_or(true, |next| next.is_ascii_whitespace());
        if !terminator {
            i += 1;
            continue;
        }

        let sentence = &line[start..=i];
        let mut rest = i + 1;
        let mut trailing = false;
        while let Some(m) = patterns::leading_citation().find(&line[rest..]) {
            trailing = true;
            rest += m.end();
        }

        sentences.push((sentence, trailing || patterns::citation_marker().is_match(sentence)));
        start = rest;
        i = rest;
    }

    if start < line.len() {
        let sentence = &line[start..];
        sentences.push((sentence, patterns::citation_marker().is_match(sentence)));
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIREMENTS: &str = r#"# Requirements Document

## Requirements

### Requirement 1: User Login

**User Story:** As a user, I want to log in.

#### Acceptance Criteria

1. WHEN a user submits valid credentials THE **AuthService** SHALL issue a session token
2. The login page shall load in under 2 seconds
3. WHEN credentials are invalid THE **AuthService** SHALL reject the request

### Requirement 2: Audit Trail

#### Acceptance Criteria

1. WHEN a session starts THE **AuditLog** SHALL record the event

### Requirement 10: Reporting

No criteria written yet.
"#;

    #[test]
    fn test_parse_requirements_lenient() {
        let doc = parse_requirements(REQUIREMENTS, ExtractionMode::Lenient);
        assert_eq!(doc.requirements.len(), 3);
        assert_eq!(doc.requirements[0].number, 1);
        assert_eq!(doc.requirements[0].title, "User Login");
        assert_eq!(doc.requirements[0].criteria.len(), 3);
        assert_eq!(doc.requirements[1].criteria.len(), 1);
        assert!(doc.requirements[2].criteria.is_empty());
        assert_eq!(doc.total_criteria(), 4);

        let second = &doc.requirements[0].criteria[1];
        assert_eq!(second.id.to_string(), "1.2");
        assert_eq!(
            second.text.as_deref(),
            Some("The login page shall load in under 2 seconds")
        );
        assert_eq!(second.component, None);
    }

    #[test]
    fn test_parse_requirements_strict_skips_unconditional_lines() {
        let doc = parse_requirements(REQUIREMENTS, ExtractionMode::Strict);
        let ids: Vec<String> = doc.all_criteria().iter().map(|c| c.to_string()).collect();
        assert_eq!(ids, vec!["1.1", "1.3", "2.1"]);

        let first = &doc.requirements[0].criteria[0];
        assert_eq!(first.text, None);
        assert_eq!(first.component.as_deref(), Some("AuthService"));

        let components: Vec<String> = doc.referenced_components().into_iter().collect();
        assert_eq!(components, vec!["AuditLog", "AuthService"]);
    }

    #[test]
    fn test_criteria_subsection_ends_at_next_header() {
        let content = r#"### Requirement 1: Foo

#### Acceptance Criteria

1. First
2. Second

#### Notes

3. Not a criterion
"#;
        let doc = parse_requirements(content, ExtractionMode::Lenient);
        assert_eq!(doc.total_criteria(), 2);
    }

    #[test]
    fn test_deeper_header_does_not_end_criteria() {
        let content = r#"### Requirement 1: Foo

#### Acceptance Criteria

1. First

##### Detail

2. Second
"#;
        let doc = parse_requirements(content, ExtractionMode::Lenient);
        assert_eq!(doc.total_criteria(), 2);
    }

    #[test]
    fn test_header_on_first_line_is_found() {
        let content = "### Requirement 4: First line\n#### Acceptance Criteria\n1. Works\n";
        let doc = parse_requirements(content, ExtractionMode::Lenient);
        assert_eq!(doc.requirements.len(), 1);
        assert_eq!(doc.requirements[0].criteria[0].id.to_string(), "4.1");
    }

    #[test]
    fn test_duplicate_requirement_and_criterion_keep_first() {
        let content = r#"### Requirement 1: Foo
#### Acceptance Criteria
1. First
1. Again
### Requirement 1: Foo again
#### Acceptance Criteria
1. Other
"#;
        let doc = parse_requirements(content, ExtractionMode::Lenient);
        assert_eq!(doc.requirements.len(), 1);
        assert_eq!(doc.requirements[0].criteria.len(), 1);
        assert_eq!(doc.requirements[0].criteria[0].text.as_deref(), Some("First"));
    }

    #[test]
    fn test_parse_requirements_is_idempotent() {
        let a = parse_requirements(REQUIREMENTS, ExtractionMode::Lenient);
        let b = parse_requirements(REQUIREMENTS, ExtractionMode::Lenient);
        assert_eq!(a, b);
        assert_eq!(
            a.all_criteria().into_iter().collect::<Vec<_>>(),
            b.all_criteria().into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_parse_tasks() {
        let content = r#"# Implementation Plan

- [ ] 1. Set up project structure
  - Create the workspace layout
  - _Requirements: 1.1, 1.2_

- [x] 2. Implement login _Requirements: 1.3_
  - [ ] 2.1 Write tests
    - _Requirements: 2.1,  , 1.3_

- [ ] 3. Write docs
"#;
        let list = parse_tasks(content);
        assert_eq!(list.tasks.len(), 4);

        assert_eq!(list.tasks[0].id, "1");
        assert_eq!(list.tasks[0].title, "Set up project structure");
        assert_eq!(list.tasks[0].references, vec!["1.1", "1.2"]);
        assert!(!list.tasks[0].done);

        assert_eq!(list.tasks[1].title, "Implement login");
        assert_eq!(list.tasks[1].references, vec!["1.3"]);
        assert!(list.tasks[1].done);

        assert_eq!(list.tasks[2].id, "2.1");
        assert_eq!(list.tasks[2].references, vec!["2.1", "1.3"]);

        assert!(list.tasks[3].references.is_empty());
        assert_eq!(list.orphans().len(), 1);

        let tokens: Vec<String> = list.reference_tokens().into_iter().collect();
        assert_eq!(tokens, vec!["1.1", "1.2", "1.3", "2.1"]);
    }

    #[test]
    fn test_unnumbered_checklist_item_ends_previous_task() {
        let content = "- [ ] 1. Foo _Requirements: 1.1_\n- [ ] Bar _Requirements: 1.2_\n  - _Requirements: 1.3_\n";
        let list = parse_tasks(content);
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].references, vec!["1.1"]);
        assert!(crate::coverage::implementing_tasks(&list, &CriterionId::new(1, 2)).is_empty());
        assert!(crate::coverage::implementing_tasks(&list, &CriterionId::new(1, 3)).is_empty());
    }

    #[test]
    fn test_annotation_before_first_task_is_ignored() {
        let content = "_Requirements: 9.9_\n- [ ] 1. Only task\n";
        let list = parse_tasks(content);
        assert_eq!(list.tasks.len(), 1);
        assert!(list.reference_tokens().is_empty());
    }

    #[test]
    fn test_parse_blueprint() {
        let content = r#"| Component | Responsibility |
|---|---|
| **AuthService** | Issues tokens |
| **AuditLog** | Records events |
| **AuthService** | Duplicate row |
"#;
        let blueprint = parse_blueprint(content);
        let names: Vec<String> = blueprint.components.into_iter().collect();
        assert_eq!(names, vec!["AuditLog", "AuthService"]);
    }

    #[test]
    fn test_parse_blueprint_empty() {
        assert!(parse_blueprint("# Blueprint\n\nNothing here.\n").components.is_empty());
    }

    const RESEARCH: &str = r#"# Research

## 1. Summary

Rust is the best choice for this system.

## 2. Technology Rationale

| Technology | Rationale |
|---|---|
| **Rust** | Memory safety without GC [cite:1] |
| **SQLite** | Embedded and reliable [cite:2] [cite:9] |

## 3. Browsed Sources

- [1] https://www.rust-lang.org/
- [2] https://sqlite.org/about.html
- not a source line

## 4. Notes

Benchmarks show a 40% speedup. [cite:1] This is stated plainly.
"#;

    #[test]
    fn test_parse_research_sources_and_citations() {
        let doc = parse_research(RESEARCH);
        let sources = doc.sources.as_ref().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get(&2).map(String::as_str), Some("https://sqlite.org/about.html"));

        let indices: Vec<&str> = doc.citations.iter().map(|c| c.index.as_str()).collect();
        assert_eq!(indices, vec!["1", "2", "9"]);
        assert_eq!(doc.citations[2].technology, "SQLite");
    }

    #[test]
    fn test_parse_research_uncited_claims() {
        let doc = parse_research(RESEARCH);
        assert_eq!(doc.uncited_claims, vec!["Rust is the best choice for this system."]);
    }

    #[test]
    fn test_parse_research_without_sources_section() {
        let doc = parse_research("# Research\n\n| **Rust** | Fast [cite:1] |\n");
        assert!(!doc.has_sources_section());
        assert_eq!(doc.citations.len(), 1);
    }

    #[test]
    fn test_split_sentences_attaches_trailing_citation() {
        let sentences = split_sentences("It is 20% faster. [cite:3] It is proven.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].1);
        assert_eq!(sentences[1].0.trim(), "It is proven.");
        assert!(!sentences[1].1);
    }

    #[test]
    fn test_decimal_does_not_split_sentence() {
        let claims = find_uncited_claims("Version 3.5 is optimal for us.");
        assert_eq!(claims, vec!["Version 3.5 is optimal for us."]);
    }
}
