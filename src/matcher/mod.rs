//! Task-to-process matching
//!
//! Given a free-text task description, pick the stored process whose name is
//! most similar. The default similarity is a Jaccard index over the sets of
//! distinct characters of the case-folded inputs. It is deliberately crude,
//! and kept behind the [`Scorer`] trait so a stronger matcher can be swapped
//! in without touching the replay pipeline.

use std::collections::HashSet;

use crate::action::Action;
use crate::store::ProcessMap;

/// A similarity score between a task description and a process name.
///
/// Implementations must be symmetric and bounded to `[0, 1]`.
pub trait Scorer {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Jaccard index over distinct characters, case-folded.
///
/// `score("", "")` is defined as 0 (an empty union matches nothing), so the
/// result is always a plain number.
pub struct CharSetJaccard;

impl Scorer for CharSetJaccard {
    fn score(&self, a: &str, b: &str) -> f64 {
        let set_a: HashSet<char> = a.to_lowercase().chars().collect();
        let set_b: HashSet<char> = b.to_lowercase().chars().collect();

        let union = set_a.union(&set_b).count();
        if union == 0 {
            return 0.0;
        }
        let intersection = set_a.intersection(&set_b).count();
        intersection as f64 / union as f64
    }
}

/// Selects the best stored process for a task description.
pub struct TaskMatcher {
    scorer: Box<dyn Scorer>,
    threshold: f64,
}

impl Default for TaskMatcher {
    fn default() -> Self {
        Self {
            scorer: Box::new(CharSetJaccard),
            threshold: 0.5,
        }
    }
}

impl TaskMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_scorer(scorer: Box<dyn Scorer>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    /// Find the best-matching process for `task`.
    ///
    /// Returns the winning name and its action sequence only when the best
    /// score is strictly above the threshold. Ties are broken
    /// deterministically: names are visited in ascending order and the first
    /// top scorer wins.
    pub fn find<'a>(&self, task: &str, processes: &'a ProcessMap) -> Option<(&'a str, &'a [Action])> {
        let mut best: Option<(&str, &[Action])> = None;
        let mut best_score = 0.0f64;

        for (name, actions) in processes {
            let score = self.scorer.score(task, name);
            log::debug!("similarity({:?}, {:?}) = {:.3}", task, name, score);
            if score > best_score {
                best_score = score;
                best = Some((name.as_str(), actions.as_slice()));
            }
        }

        if best_score > self.threshold {
            best
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    #[test]
    fn test_score_is_symmetric() {
        let scorer = CharSetJaccard;
        for (a, b) in [
            ("login email", "log in to email"),
            ("abc", "xyz"),
            ("", "abc"),
            ("搜索 天气", "查询天气"),
        ] {
            let ab = scorer.score(a, b);
            let ba = scorer.score(b, a);
            assert!((ab - ba).abs() < f64::EPSILON, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_score_bounds() {
        let scorer = CharSetJaccard;
        for (a, b) in [("login", "logout"), ("a", "b"), ("same", "same")] {
            let s = scorer.score(a, b);
            assert!((0.0..=1.0).contains(&s));
        }
        assert_eq!(scorer.score("checkout", "checkout"), 1.0);
        assert_eq!(scorer.score("", ""), 0.0);
    }

    #[test]
    fn test_score_is_case_folded() {
        let scorer = CharSetJaccard;
        assert_eq!(scorer.score("LOGIN", "login"), 1.0);
    }

    #[test]
    fn test_match_above_threshold() {
        let mut processes = ProcessMap::new();
        processes.insert(
            "login email".to_string(),
            vec![Action::navigate("https://mail.example.com")],
        );

        let matcher = TaskMatcher::new();
        // shares every character with the stored name
        let hit = matcher.find("log in to email", &processes);
        assert_eq!(hit.map(|(name, _)| name), Some("login email"));
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        // score("ab", "abcd") = |{a,b}| / |{a,b,c,d}| = 0.5 exactly:
        // at the threshold the matcher must report nothing.
        let scorer = CharSetJaccard;
        assert_eq!(scorer.score("ab", "abcd"), 0.5);

        let mut processes = ProcessMap::new();
        processes.insert("abcd".to_string(), vec![Action::navigate("https://a")]);

        let matcher = TaskMatcher::new();
        assert!(matcher.find("ab", &processes).is_none());
    }

    #[test]
    fn test_below_threshold_reports_nothing() {
        let mut processes = ProcessMap::new();
        processes.insert(
            "order groceries".to_string(),
            vec![Action::navigate("https://shop.example.com")],
        );

        let matcher = TaskMatcher::new();
        assert!(matcher.find("xyzw", &processes).is_none());
    }

    #[test]
    fn test_tie_break_is_first_in_name_order() {
        // both names are permutations of the task's character set, so they
        // score identically; the first in ascending name order must win.
        let mut processes = ProcessMap::new();
        processes.insert("bca".to_string(), vec![Action::navigate("https://b")]);
        processes.insert("acb".to_string(), vec![Action::navigate("https://a")]);

        let matcher = TaskMatcher::new();
        let hit = matcher.find("abc", &processes);
        assert_eq!(hit.map(|(name, _)| name), Some("acb"));
    }
}
