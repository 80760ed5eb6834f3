//! Completion tracking for progress bars.

use nquester_common::{NpcId, QuestId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-student completion counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentProgress {
    /// Quests this student hands out
    pub total_quests: usize,
    /// Distinct quests completed for this student
    pub completed: HashSet<QuestId>,
}

impl StudentProgress {
    /// Completion percentage in `[0, 100]`.
    #[must_use]
    pub fn percentage(&self) -> f32 {
        percentage(self.completed.len(), self.total_quests)
    }
}

fn percentage(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (done.min(total) as f32 / total as f32 * 100.0).clamp(0.0, 100.0)
}

/// Aggregates quest attempts and completions.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    total_quests: usize,
    attempts: HashMap<QuestId, u32>,
    completed: HashSet<QuestId>,
    students: BTreeMap<NpcId, StudentProgress>,
}

impl ProgressTracker {
    /// Creates a tracker for a catalog of `total_quests` quests.
    #[must_use]
    pub fn new(total_quests: usize) -> Self {
        Self {
            total_quests,
            ..Self::default()
        }
    }

    /// Sets the catalog size.
    pub fn set_total_quests(&mut self, total: usize) {
        self.total_quests = total;
    }

    /// Catalog size.
    #[must_use]
    pub const fn total_quests(&self) -> usize {
        self.total_quests
    }

    /// Records one attempt. Completions count once per quest id.
    pub fn record_quest_attempt(&mut self, quest_id: &QuestId, completed: bool) {
        *self.attempts.entry(quest_id.clone()).or_insert(0) += 1;
        if completed {
            self.completed.insert(quest_id.clone());
        }
    }

    /// Attempts recorded for a quest.
    #[must_use]
    pub fn attempts(&self, quest_id: &str) -> u32 {
        self.attempts.get(quest_id).copied().unwrap_or(0)
    }

    /// Distinct completed quests.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Completed / total * 100, or 0 for an empty catalog.
    #[must_use]
    pub fn completion_percentage(&self) -> f32 {
        percentage(self.completed.len(), self.total_quests)
    }

    /// Registers a student NPC and how many quests they hand out.
    pub fn register_student(&mut self, npc: NpcId, total_quests: usize) {
        self.students.entry(npc).or_default().total_quests = total_quests;
    }

    /// Records a completed quest for a registered student. Unknown students are ignored.
    pub fn record_student_completion(&mut self, npc: &str, quest_id: &QuestId) {
        if let Some(student) = self.students.get_mut(npc) {
            student.completed.insert(quest_id.clone());
        }
    }

    /// Progress of one student.
    #[must_use]
    pub fn student(&self, npc: &str) -> Option<&StudentProgress> {
        self.students.get(npc)
    }

    /// Completion percentage of one student, 0 when unknown.
    #[must_use]
    pub fn student_percentage(&self, npc: &str) -> f32 {
        self.students.get(npc).map_or(0.0, StudentProgress::percentage)
    }

    /// Average percentage over registered students.
    #[must_use]
    pub fn average_student_percentage(&self) -> f32 {
        if self.students.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.students.values().map(StudentProgress::percentage).sum();
        sum / self.students.len() as f32
    }

    /// Iterates registered students.
    pub fn students(&self) -> impl Iterator<Item = (&NpcId, &StudentProgress)> {
        self.students.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog_is_zero() {
        let tracker = ProgressTracker::new(0);
        assert!(tracker.completion_percentage().abs() < f32::EPSILON);
    }

    #[test]
    fn test_completion_counted_once() {
        let mut tracker = ProgressTracker::new(4);
        let quest = QuestId::new("q1");
        tracker.record_quest_attempt(&quest, false);
        tracker.record_quest_attempt(&quest, true);
        tracker.record_quest_attempt(&quest, true);

        assert_eq!(tracker.attempts("q1"), 3);
        assert_eq!(tracker.completed_count(), 1);
        assert!((tracker.completion_percentage() - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_full_completion_is_hundred() {
        let mut tracker = ProgressTracker::new(2);
        tracker.record_quest_attempt(&QuestId::new("a"), true);
        tracker.record_quest_attempt(&QuestId::new("b"), true);
        assert!((tracker.completion_percentage() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_student_progress() {
        let mut tracker = ProgressTracker::new(10);
        tracker.register_student(NpcId::new("book_student"), 1);
        tracker.register_student(NpcId::new("art_student"), 1);
        tracker.record_student_completion("book_student", &QuestId::new("quest_student_book"));
        tracker.record_student_completion("ghost", &QuestId::new("x"));

        assert!((tracker.student_percentage("book_student") - 100.0).abs() < f32::EPSILON);
        assert!(tracker.student_percentage("art_student").abs() < f32::EPSILON);
        assert!((tracker.average_student_percentage() - 50.0).abs() < f32::EPSILON);
        assert!(tracker.student("ghost").is_none());
    }
}
