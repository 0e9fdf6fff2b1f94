//! Collected user preferences
//!
//! Two views over the same categories: `persisted` accumulates for the
//! lifetime of the conversation and rides along on every outgoing request,
//! while `displayed` holds only the answers picked since the last submission
//! (the editable tags in a front end's input field). Every mutation goes
//! through helpers that touch both maps, so a category present in the
//! displayed view always has the same value in the persisted view.

use std::collections::BTreeMap;

/// The two preference views, mutated in lockstep
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    persisted: BTreeMap<String, String>,
    displayed: BTreeMap<String, String>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer for a category in both views; re-answering overwrites
    pub fn set(&mut self, category: impl Into<String>, answer: impl Into<String>) {
        let category = category.into();
        let answer = answer.into();
        self.persisted.insert(category.clone(), answer.clone());
        self.displayed.insert(category, answer);
    }

    /// Remove a category from both views; unknown categories are a no-op
    pub fn remove(&mut self, category: &str) {
        self.persisted.remove(category);
        self.displayed.remove(category);
    }

    /// Drop the displayed view after its contents were folded into a turn,
    /// keeping the persisted view intact
    pub fn clear_displayed(&mut self) {
        self.displayed.clear();
    }

    /// Drop both views (conversation reset)
    pub fn clear(&mut self) {
        self.persisted.clear();
        self.displayed.clear();
    }

    pub fn persisted(&self) -> &BTreeMap<String, String> {
        &self.persisted
    }

    pub fn displayed(&self) -> &BTreeMap<String, String> {
        &self.displayed
    }

    pub fn displayed_is_empty(&self) -> bool {
        self.displayed.is_empty()
    }

    /// Render the persisted view as `"category: answer"` pairs, comma-joined
    /// in key order; empty when nothing has been collected
    pub fn summary(&self) -> String {
        self.persisted
            .iter()
            .map(|(category, answer)| format!("{}: {}", category, answer))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_touches_both_views() {
        let mut prefs = PreferenceStore::new();
        prefs.set("Budget", "1000-1500");

        assert_eq!(prefs.persisted().get("Budget").map(String::as_str), Some("1000-1500"));
        assert_eq!(prefs.displayed().get("Budget").map(String::as_str), Some("1000-1500"));
    }

    #[test]
    fn test_reanswer_overwrites() {
        let mut prefs = PreferenceStore::new();
        prefs.set("Budget", "<1000");
        prefs.set("Budget", "1000-1500");

        assert_eq!(prefs.persisted().len(), 1);
        assert_eq!(prefs.persisted().get("Budget").map(String::as_str), Some("1000-1500"));
    }

    #[test]
    fn test_remove_touches_both_views() {
        let mut prefs = PreferenceStore::new();
        prefs.set("Budget", "1000-1500");
        prefs.set("Color", "white");
        prefs.remove("Budget");

        assert!(!prefs.persisted().contains_key("Budget"));
        assert!(!prefs.displayed().contains_key("Budget"));
        assert!(prefs.persisted().contains_key("Color"));
    }

    #[test]
    fn test_remove_missing_is_a_noop() {
        let mut prefs = PreferenceStore::new();
        prefs.set("Budget", "1000-1500");

        let before_persisted = prefs.persisted().clone();
        let before_displayed = prefs.displayed().clone();
        prefs.remove("Material");

        assert_eq!(prefs.persisted(), &before_persisted);
        assert_eq!(prefs.displayed(), &before_displayed);
    }

    #[test]
    fn test_clear_displayed_keeps_persisted() {
        let mut prefs = PreferenceStore::new();
        prefs.set("Budget", "1000-1500");
        prefs.clear_displayed();

        assert!(prefs.displayed_is_empty());
        assert_eq!(prefs.persisted().len(), 1);
    }

    #[test]
    fn test_summary_is_sorted_and_comma_joined() {
        let mut prefs = PreferenceStore::new();
        prefs.set("Color", "white");
        prefs.set("Budget", "1000-1500");

        assert_eq!(prefs.summary(), "Budget: 1000-1500, Color: white");
    }

    #[test]
    fn test_summary_empty_when_unset() {
        assert_eq!(PreferenceStore::new().summary(), "");
    }

    /// Mutation script for the invariant property test
    #[derive(Debug, Clone)]
    enum Op {
        Set(String, String),
        Remove(String),
        ClearDisplayed,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let key = prop::sample::select(vec!["Budget", "Color", "Size", "Brand"]);
        let value = "[a-z]{1,8}";
        prop_oneof![
            (key.clone(), value).prop_map(|(k, v)| Op::Set(k.to_string(), v)),
            key.prop_map(|k| Op::Remove(k.to_string())),
            Just(Op::ClearDisplayed),
        ]
    }

    proptest! {
        /// Every category in the displayed view is in the persisted view
        /// with the same value, whatever the mutation order
        #[test]
        fn prop_displayed_subset_of_persisted(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut prefs = PreferenceStore::new();
            for op in ops {
                match op {
                    Op::Set(category, answer) => prefs.set(category, answer),
                    Op::Remove(category) => prefs.remove(&category),
                    Op::ClearDisplayed => prefs.clear_displayed(),
                }

                for (category, answer) in prefs.displayed() {
                    prop_assert_eq!(prefs.persisted().get(category), Some(answer));
                }
            }
        }
    }
}
