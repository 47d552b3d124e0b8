//! Assignment versions: named, append-only snapshots for before/after comparison.
//!
//! CRITICAL: history is append-only. A recorded version is never mutated, and
//! editing an assignment means recording a new version. Retention is bounded:
//! once a history is full the oldest version after the first is dropped, and
//! once the store is full the least recently recorded history is dropped.
//! Version numbers are never reused.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Assignment, BloomLevel, QuestionFormat};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentVersion {
    pub id: Uuid,
    /// 1-based position in the history.
    pub number: u32,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assignment: Assignment,
}

/// Summary row for list endpoints (no payload).
impl AssignmentVersion {
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id,
            number: self.number,
            label: self.label.clone(),
            created_at: self.created_at,
            question_count: self.assignment.problem_count(),
            estimated_minutes: self.assignment.estimated_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub id: Uuid,
    pub number: u32,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub question_count: usize,
    pub estimated_minutes: u32,
}

pub const DEFAULT_MAX_VERSIONS_PER_ASSIGNMENT: usize = 50;
pub const DEFAULT_MAX_TRACKED_ASSIGNMENTS: usize = 1000;

#[derive(Debug, Clone)]
pub struct VersionHistory {
    versions: Vec<AssignmentVersion>,
    next_number: u32,
    max_versions: usize,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::with_capacity_limit(DEFAULT_MAX_VERSIONS_PER_ASSIGNMENT)
    }
}

impl VersionHistory {
    /// `max_versions` is clamped to at least 2 so the original and latest both survive.
    pub fn with_capacity_limit(max_versions: usize) -> Self {
        Self {
            versions: Vec::new(),
            next_number: 1,
            max_versions: max_versions.max(2),
        }
    }

    pub fn record(
        &mut self,
        label: impl Into<String>,
        description: Option<String>,
        assignment: Assignment,
        now: DateTime<Utc>,
    ) -> &AssignmentVersion {
        if self.versions.len() >= self.max_versions {
            // The first version is the generated original and is kept for comparison.
            let evicted = self.versions.remove(1);
            warn!(
                "Version history of assignment {} is full ({}); dropped version {}",
                evicted.assignment.id, self.max_versions, evicted.number
            );
        }
        let number = self.next_number;
        self.next_number += 1;
        self.versions.push(AssignmentVersion {
            id: Uuid::new_v4(),
            number,
            label: label.into(),
            description,
            created_at: now,
            assignment,
        });
        &self.versions[self.versions.len() - 1]
    }

    pub fn get(&self, number: u32) -> Option<&AssignmentVersion> {
        self.versions.iter().find(|v| v.number == number)
    }

    pub fn latest(&self) -> Option<&AssignmentVersion> {
        self.versions.last()
    }

    pub fn list(&self) -> Vec<VersionSummary> {
        self.versions.iter().map(AssignmentVersion::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// In-memory store keyed by assignment id, bounded in both dimensions.
#[derive(Debug)]
pub struct VersionStore {
    histories: HashMap<Uuid, TrackedHistory>,
    max_assignments: usize,
    max_versions: usize,
    /// Monotonic counter; higher means more recently recorded.
    clock: u64,
}

#[derive(Debug)]
struct TrackedHistory {
    history: VersionHistory,
    last_recorded: u64,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_TRACKED_ASSIGNMENTS, DEFAULT_MAX_VERSIONS_PER_ASSIGNMENT)
    }
}

impl VersionStore {
    pub fn with_limits(max_assignments: usize, max_versions: usize) -> Self {
        Self {
            histories: HashMap::new(),
            max_assignments: max_assignments.max(1),
            max_versions,
            clock: 0,
        }
    }

    pub fn record(
        &mut self,
        label: impl Into<String>,
        description: Option<String>,
        assignment: Assignment,
        now: DateTime<Utc>,
    ) -> AssignmentVersion {
        let assignment_id = assignment.id;
        if !self.histories.contains_key(&assignment_id) {
            self.evict_for_new_history();
        }

        self.clock += 1;
        let max_versions = self.max_versions;
        let tracked = self
            .histories
            .entry(assignment_id)
            .or_insert_with(|| TrackedHistory {
                history: VersionHistory::with_capacity_limit(max_versions),
                last_recorded: 0,
            });
        tracked.last_recorded = self.clock;
        let version = tracked
            .history
            .record(label, description, assignment, now)
            .clone();
        info!(
            "Recorded version {} ('{}') of assignment {}",
            version.number, version.label, assignment_id
        );
        version
    }

    pub fn history(&self, assignment_id: Uuid) -> Option<&VersionHistory> {
        self.histories.get(&assignment_id).map(|t| &t.history)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    fn evict_for_new_history(&mut self) {
        while self.histories.len() >= self.max_assignments {
            let Some(oldest) = self
                .histories
                .iter()
                .min_by_key(|(_, t)| t.last_recorded)
                .map(|(id, _)| *id)
            else {
                return;
            };
            if let Some(evicted) = self.histories.remove(&oldest) {
                warn!(
                    "Version store is full ({}); dropped history of assignment {} ({} versions)",
                    self.max_assignments,
                    oldest,
                    evicted.history.len()
                );
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Comparison
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelDelta {
    pub bloom_level: BloomLevel,
    pub before: u32,
    pub after: u32,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatChange {
    pub problem_id: String,
    pub before: QuestionFormat,
    pub after: QuestionFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionComparison {
    pub question_delta: i64,
    pub minutes_delta: i64,
    pub histogram: Vec<LevelDelta>,
    pub added_problems: Vec<String>,
    pub removed_problems: Vec<String>,
    pub format_changes: Vec<FormatChange>,
    pub text_changes: Vec<String>,
}

pub fn compare_assignments(before: &Assignment, after: &Assignment) -> VersionComparison {
    let before_hist = before.realized_histogram();
    let after_hist = after.realized_histogram();
    let histogram = BloomLevel::ALL
        .into_iter()
        .map(|level| {
            let b = before_hist.get(level);
            let a = after_hist.get(level);
            LevelDelta {
                bloom_level: level,
                before: b,
                after: a,
                delta: i64::from(a) - i64::from(b),
            }
        })
        .collect();

    let before_by_id: HashMap<&str, _> = before.problems().map(|p| (p.id.as_str(), p)).collect();
    let after_ids: BTreeSet<&str> = after.problems().map(|p| p.id.as_str()).collect();

    let added_problems = after
        .problems()
        .filter(|p| !before_by_id.contains_key(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect();
    let removed_problems = before
        .problems()
        .filter(|p| !after_ids.contains(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect();

    let mut format_changes = Vec::new();
    let mut text_changes = Vec::new();
    for problem in after.problems() {
        if let Some(old) = before_by_id.get(problem.id.as_str()) {
            if old.format != problem.format {
                format_changes.push(FormatChange {
                    problem_id: problem.id.clone(),
                    before: old.format,
                    after: problem.format,
                });
            }
            if old.text != problem.text {
                text_changes.push(problem.id.clone());
            }
        }
    }

    VersionComparison {
        question_delta: after.problem_count() as i64 - before.problem_count() as i64,
        minutes_delta: i64::from(after.estimated_minutes) - i64::from(before.estimated_minutes),
        histogram,
        added_problems,
        removed_problems,
        format_changes,
        text_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::generator::generate_assignment;
    use crate::generation::validation::validate_intent;
    use crate::models::{AssignmentType, BloomBuckets, DifficultyRange, Intent, SectionStrategy};

    fn make_assignment() -> Assignment {
        let intent = Intent {
            assignment_type: AssignmentType::Homework,
            title: Some("Ecosystems".to_string()),
            topic: "Ecosystems".to_string(),
            question_count: 6,
            time_budget_minutes: 30,
            distribution: BloomBuckets::new([50, 50, 0, 0, 0, 0]),
            preferred_formats: vec![],
            section_strategy: SectionStrategy::AiGenerated,
            tips_enabled: false,
            difficulty_range: DifficultyRange::Easy,
        };
        generate_assignment(&validate_intent(intent).unwrap(), Utc::now())
    }

    #[test]
    fn test_history_is_append_only_and_numbered() {
        let mut history = VersionHistory::default();
        let assignment = make_assignment();
        history.record("Draft", None, assignment.clone(), Utc::now());
        history.record("Final", Some("after review".into()), assignment, Utc::now());
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(1).unwrap().label, "Draft");
        assert_eq!(history.latest().unwrap().number, 2);
        assert!(history.get(3).is_none());
    }

    #[test]
    fn test_store_keys_by_assignment_id() {
        let mut store = VersionStore::default();
        let a = make_assignment();
        let b = make_assignment();
        store.record("v1", None, a.clone(), Utc::now());
        store.record("v2", None, a.clone(), Utc::now());
        store.record("v1", None, b.clone(), Utc::now());
        assert_eq!(store.history(a.id).unwrap().len(), 2);
        assert_eq!(store.history(b.id).unwrap().len(), 1);
        assert!(store.history(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_full_history_drops_oldest_after_original() {
        let mut history = VersionHistory::with_capacity_limit(3);
        let assignment = make_assignment();
        for label in ["Generated", "Edit 1", "Edit 2", "Edit 3", "Edit 4"] {
            history.record(label, None, assignment.clone(), Utc::now());
        }
        assert_eq!(history.len(), 3);
        let numbers: Vec<u32> = history.list().iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![1, 4, 5]);
        assert_eq!(history.get(1).unwrap().label, "Generated");
        assert!(history.get(2).is_none());
        assert_eq!(history.latest().unwrap().label, "Edit 4");
    }

    #[test]
    fn test_store_drops_least_recently_recorded_history() {
        let mut store = VersionStore::with_limits(2, 10);
        let a = make_assignment();
        let b = make_assignment();
        let c = make_assignment();
        store.record("v1", None, a.clone(), Utc::now());
        store.record("v1", None, b.clone(), Utc::now());
        store.record("v2", None, a.clone(), Utc::now());
        store.record("v1", None, c.clone(), Utc::now());

        assert_eq!(store.len(), 2);
        assert!(store.history(b.id).is_none());
        assert_eq!(store.history(a.id).unwrap().len(), 2);
        assert_eq!(store.history(c.id).unwrap().len(), 1);
    }

    #[test]
    fn test_store_stays_bounded_under_many_assignments() {
        let mut store = VersionStore::with_limits(5, 2);
        let template = make_assignment();
        for _ in 0..50 {
            let mut assignment = template.clone();
            assignment.id = Uuid::new_v4();
            for _ in 0..4 {
                store.record("edit", None, assignment.clone(), Utc::now());
            }
        }
        assert_eq!(store.len(), 5);
        assert!(store
            .histories
            .values()
            .all(|t| t.history.len() == 2));
    }

    #[test]
    fn test_compare_identical_has_no_changes() {
        let a = make_assignment();
        let cmp = compare_assignments(&a, &a);
        assert_eq!(cmp.question_delta, 0);
        assert!(cmp.added_problems.is_empty());
        assert!(cmp.removed_problems.is_empty());
        assert!(cmp.format_changes.is_empty());
        assert!(cmp.histogram.iter().all(|d| d.delta == 0));
    }

    #[test]
    fn test_compare_detects_removed_and_changed_problems() {
        let before = make_assignment();
        let mut after = before.clone();
        let removed = after.sections[0].problems.pop().unwrap();
        after.sections[0].problems[0].format = QuestionFormat::ShortAnswer;
        after.sections[0].problems[0].text.push_str(" (revised)");

        let cmp = compare_assignments(&before, &after);
        assert_eq!(cmp.question_delta, -1);
        assert_eq!(cmp.removed_problems, vec![removed.id]);
        assert_eq!(cmp.format_changes.len(), 1);
        assert_eq!(cmp.text_changes, vec![after.sections[0].problems[0].id.clone()]);
        let total_delta: i64 = cmp.histogram.iter().map(|d| d.delta).sum();
        assert_eq!(total_delta, -1);
    }
}
