// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Semantic config diff — the core of [`crate::validator`]'s
//! `SemanticDiffValidator`.
//!
//! A config is tokenized into *sections*: a column-0 line starts a new
//! section, and every indented line beneath it belongs to that section
//! until the next column-0 line. Sections are classified ADDED / REMOVED /
//! MODIFIED / UNCHANGED by comparing line-sets, ignoring order within a
//! section — a device that re-emits the same ACL lines in a different
//! order did not semantically change anything.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Classification of one section between two configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// Present only in `after`.
    Added,
    /// Present only in `before`.
    Removed,
    /// Present in both, with a different line-set.
    Modified,
    /// Present in both with an identical line-set (order-insensitive).
    Unchanged,
}

/// One section-level change, carrying both line-sets for the caller's
/// audit/diff display.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SectionChange {
    /// The section header line (column-0 text).
    pub section: String,
    /// What happened to this section.
    pub change_type: ChangeKind,
    /// Lines belonging to this section in `before` (empty if ADDED).
    pub before_lines: Vec<String>,
    /// Lines belonging to this section in `after` (empty if REMOVED).
    pub after_lines: Vec<String>,
}

struct Section {
    header: String,
    lines: Vec<String>,
}

fn parse_sections(config: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for line in config.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with('!') || line.trim_start().starts_with('#') {
            continue;
        }
        let is_top_level = !line.starts_with(' ') && !line.starts_with('\t');
        if is_top_level {
            sections.push(Section { header: line.to_string(), lines: alloc::vec![line.to_string()] });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line.to_string());
        }
        // Indented lines preceding any top-level header belong to no
        // section and are dropped.
    }
    sections
}

/// Two line-sets are equal as sets, ignoring order and duplicate count —
/// a section is UNCHANGED if it contains exactly the same lines, however
/// they are arranged.
fn same_line_set(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut sorted_a: Vec<&str> = a.iter().map(String::as_str).collect();
    let mut sorted_b: Vec<&str> = b.iter().map(String::as_str).collect();
    sorted_a.sort_unstable();
    sorted_b.sort_unstable();
    sorted_a == sorted_b
}

/// Compute the full section-level diff between `before` and `after`,
/// including UNCHANGED sections.
///
/// Ordering: ADDED and MODIFIED sections are emitted in the order they
/// first appear in `after`; REMOVED sections are then emitted in the order
/// they first appeared in `before`. UNCHANGED sections follow the same
/// after-then-before ordering rule, appended last within each half so
/// callers that filter them out see a stable prefix.
pub fn diff_sections(before: &str, after: &str) -> Vec<SectionChange> {
    let before_sections = parse_sections(before);
    let after_sections = parse_sections(after);

    let mut changes = Vec::new();

    for after_section in &after_sections {
        match before_sections.iter().find(|b| b.header == after_section.header) {
            None => changes.push(SectionChange {
                section: after_section.header.clone(),
                change_type: ChangeKind::Added,
                before_lines: Vec::new(),
                after_lines: after_section.lines.clone(),
            }),
            Some(before_section) => {
                let change_type = if same_line_set(&before_section.lines, &after_section.lines) {
                    ChangeKind::Unchanged
                } else {
                    ChangeKind::Modified
                };
                changes.push(SectionChange {
                    section: after_section.header.clone(),
                    change_type,
                    before_lines: before_section.lines.clone(),
                    after_lines: after_section.lines.clone(),
                });
            }
        }
    }

    for before_section in &before_sections {
        if !after_sections.iter().any(|a| a.header == before_section.header) {
            changes.push(SectionChange {
                section: before_section.header.clone(),
                change_type: ChangeKind::Removed,
                before_lines: before_section.lines.clone(),
                after_lines: Vec::new(),
            });
        }
    }

    changes
}

/// Outcome of the semantic diff validator's SKIP/FAIL/PASS decision tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Before/after state or `running_config` was missing or empty.
    Skip,
    /// No ADDED/REMOVED/MODIFIED sections were found — a write operation
    /// that produced no semantic change is treated as ineffective, not a
    /// clean pass. Carries the message the caller should surface.
    Fail(String),
    /// At least one section changed. Only ADDED/REMOVED/MODIFIED entries
    /// are included; UNCHANGED sections carry no signal and are dropped.
    Pass(Vec<SectionChange>),
}

/// Run the semantic diff check against `before`/`after` running-config
/// snapshots for `tool_name`.
pub fn validate_config_diff(tool_name: &str, before: Option<&str>, after: Option<&str>) -> DiffOutcome {
    let (before, after) = match (before, after) {
        (Some(before), Some(after)) if !before.trim().is_empty() && !after.trim().is_empty() => {
            (before, after)
        }
        _ => return DiffOutcome::Skip,
    };

    let changed: Vec<SectionChange> = diff_sections(before, after)
        .into_iter()
        .filter(|change| change.change_type != ChangeKind::Unchanged)
        .collect();

    if changed.is_empty() {
        DiffOutcome::Fail(alloc::format!("no semantic config changes detected after {tool_name}"))
    } else {
        DiffOutcome::Pass(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_before_skips() {
        assert_eq!(
            validate_config_diff("show_interfaces", None, Some("interface Gi0/1\n status up")),
            DiffOutcome::Skip
        );
    }

    #[test]
    fn empty_strings_skip() {
        assert_eq!(
            validate_config_diff("show_interfaces", Some(""), Some("interface Gi0/1")),
            DiffOutcome::Skip
        );
    }

    #[test]
    fn identical_configs_fail_no_diff() {
        let config = "interface Gi0/1\n status up\nhostname r1";
        let outcome = validate_config_diff("configure_vlan", Some(config), Some(config));
        assert_eq!(
            outcome,
            DiffOutcome::Fail("no semantic config changes detected after configure_vlan".to_string())
        );
    }

    #[test]
    fn reordered_lines_within_a_section_are_unchanged() {
        let before = "acl PERMIT_LIST\n permit tcp any any\n permit udp any any";
        let after = "acl PERMIT_LIST\n permit udp any any\n permit tcp any any";
        let outcome = validate_config_diff("apply_acl", Some(before), Some(after));
        assert!(matches!(outcome, DiffOutcome::Fail(_)));
    }

    #[test]
    fn detects_added_removed_modified_sections() {
        let before = "interface Gi0/1\n status up\nhostname r1\nvlan 10\n name old";
        let after = "interface Gi0/1\n status down\nhostname r1\nvlan 20\n name new";

        let outcome = validate_config_diff("configure_vlan", Some(before), Some(after));
        let changes = match outcome {
            DiffOutcome::Pass(changes) => changes,
            other => panic!("expected Pass, got {other:?}"),
        };

        assert!(changes
            .iter()
            .any(|c| c.section == "interface Gi0/1" && c.change_type == ChangeKind::Modified));
        assert!(changes.iter().any(|c| c.section == "vlan 20" && c.change_type == ChangeKind::Added));
        assert!(changes.iter().any(|c| c.section == "vlan 10" && c.change_type == ChangeKind::Removed));
        assert!(!changes.iter().any(|c| c.section == "hostname r1"));
    }

    #[test]
    fn deterministic_ordering() {
        let before = "a\nb\n body-b";
        let after = "c\nb\n body-b-changed";
        let first = validate_config_diff("tool", Some(before), Some(after));
        let second = validate_config_diff("tool", Some(before), Some(after));
        assert_eq!(first, second);
    }
}
