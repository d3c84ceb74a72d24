//! Form state controller: keeps dependent fields' visibility and
//! required-ness in step with their trigger.
//!
//! Each [`ConditionalGroup`] is a two-state machine:
//!
//! ```text
//!   HiddenNotRequired --(trigger == sentinel)--> VisibleRequired
//!   VisibleRequired   --(trigger != sentinel)--> HiddenNotRequired  (dependent value cleared)
//! ```

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    HiddenNotRequired,
    VisibleRequired,
}

impl Visibility {
    fn for_value(value: &str, sentinel: &str) -> Self {
        if value == sentinel {
            Visibility::VisibleRequired
        } else {
            Visibility::HiddenNotRequired
        }
    }
}

/// A dependent field shown only while its trigger holds the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalGroup {
    pub trigger: String,
    pub sentinel: String,
    pub dependent: String,
}

impl ConditionalGroup {
    pub fn new(
        trigger: impl Into<String>,
        sentinel: impl Into<String>,
        dependent: impl Into<String>,
    ) -> Self {
        Self {
            trigger: trigger.into(),
            sentinel: sentinel.into(),
            dependent: dependent.into(),
        }
    }
}

/// A visibility change produced by a trigger edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub dependent: String,
    pub to: Visibility,
    /// The dependent's value must be cleared (Visible -> Hidden only).
    pub clear_value: bool,
}

/// Current visibility of every dependent field, keyed by dependent name.
#[derive(Debug, Clone, Default)]
pub struct ConditionalState {
    groups: Vec<ConditionalGroup>,
    states: HashMap<String, Visibility>,
}

impl ConditionalState {
    /// Evaluate every group against the trigger values present at
    /// initialization.
    pub fn initialize<'a>(
        groups: &[ConditionalGroup],
        value_of: impl Fn(&str) -> Option<&'a str>,
    ) -> Self {
        let states = groups
            .iter()
            .map(|g| {
                let value = value_of(&g.trigger).unwrap_or_default();
                (g.dependent.clone(), Visibility::for_value(value, &g.sentinel))
            })
            .collect();
        Self {
            groups: groups.to_vec(),
            states,
        }
    }

    pub fn visibility(&self, field: &str) -> Option<Visibility> {
        self.states.get(field).copied()
    }

    /// True for a dependent field that is currently hidden. Fields that are
    /// not dependents are never hidden.
    pub fn is_hidden(&self, field: &str) -> bool {
        self.visibility(field) == Some(Visibility::HiddenNotRequired)
    }

    pub fn is_conditionally_required(&self, field: &str) -> bool {
        self.visibility(field) == Some(Visibility::VisibleRequired)
    }

    pub fn is_trigger(&self, field: &str) -> bool {
        self.groups.iter().any(|g| g.trigger == field)
    }

    /// Re-evaluate every group driven by `trigger` after it took `value`.
    /// Returns the transitions that actually happened.
    pub fn on_trigger_changed(&mut self, trigger: &str, value: &str) -> Vec<Transition> {
        let mut changes = Vec::new();
        for group in self.groups.iter().filter(|g| g.trigger == trigger) {
            let next = Visibility::for_value(value, &group.sentinel);
            let prev = self
                .states
                .insert(group.dependent.clone(), next)
                .unwrap_or(Visibility::HiddenNotRequired);
            if prev != next {
                debug!(
                    trigger,
                    dependent = %group.dependent,
                    ?next,
                    "conditional field transition"
                );
                changes.push(Transition {
                    dependent: group.dependent.clone(),
                    to: next,
                    clear_value: next == Visibility::HiddenNotRequired,
                });
            }
        }
        changes
    }

    /// Force every group back to hidden.
    pub fn collapse_all(&mut self) {
        for state in self.states.values_mut() {
            *state = Visibility::HiddenNotRequired;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purpose_group() -> Vec<ConditionalGroup> {
        vec![ConditionalGroup::new("purpose", "Own Stay", "timelineToMoveIn")]
    }

    #[test]
    fn starts_hidden_without_sentinel() {
        let state = ConditionalState::initialize(&purpose_group(), |_| None);
        assert!(state.is_hidden("timelineToMoveIn"));
        assert!(!state.is_conditionally_required("timelineToMoveIn"));
        assert!(!state.is_hidden("purpose"));
    }

    #[test]
    fn starts_visible_when_trigger_already_holds_sentinel() {
        let state = ConditionalState::initialize(&purpose_group(), |name| {
            (name == "purpose").then_some("Own Stay")
        });
        assert!(state.is_conditionally_required("timelineToMoveIn"));
    }

    #[test]
    fn transitions_both_ways() {
        let mut state = ConditionalState::initialize(&purpose_group(), |_| None);

        let shown = state.on_trigger_changed("purpose", "Own Stay");
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].to, Visibility::VisibleRequired);
        assert!(!shown[0].clear_value);

        // same value again is not a transition
        assert!(state.on_trigger_changed("purpose", "Own Stay").is_empty());

        let hidden = state.on_trigger_changed("purpose", "Investment");
        assert_eq!(hidden.len(), 1);
        assert!(hidden[0].clear_value);
        assert!(state.is_hidden("timelineToMoveIn"));
    }

    #[test]
    fn collapse_all_hides_everything() {
        let mut state = ConditionalState::initialize(&purpose_group(), |_| Some("Own Stay"));
        state.collapse_all();
        assert!(state.is_hidden("timelineToMoveIn"));
    }
}
