//! Phase C: tree-of-thoughts sibling plans.
//!
//! Every primary plan gets 2-4 ranked alternatives: zero or more built from
//! the same predicted tools at different commitment levels, plus a
//! fixed-reliability fallback that is always present so `adapt` always has
//! something to fall back to after a repeated failure.

use crate::plan::{Alternative, PlanStep, Priority, StepType};

const FALLBACK_RELIABILITY: f64 = 0.9;

/// Builds the alternative list for a primary plan built from `tools`.
#[must_use]
pub fn generate_alternatives(tools: &[String]) -> Vec<Alternative> {
    let mut alternatives = Vec::with_capacity(4);

    if !tools.is_empty() {
        alternatives.push(Alternative {
            label: "tool_focused".to_string(),
            steps: vec![
                PlanStep::new(StepType::Chat, Priority::Critical).with_expected_tools(tools.to_vec()),
                PlanStep::new(StepType::ToolExecution, Priority::Critical),
                PlanStep::new(StepType::Chat, Priority::Critical),
            ],
            reliability: 0.75,
        });
    }

    alternatives.push(Alternative {
        label: "direct_answer".to_string(),
        steps: vec![PlanStep::new(StepType::Chat, Priority::Critical)],
        reliability: 0.6,
    });

    if tools.len() > 1 {
        alternatives.push(Alternative {
            label: "partial_tools".to_string(),
            steps: vec![
                PlanStep::new(StepType::Chat, Priority::Critical).with_expected_tools(vec![tools[0].clone()]),
                PlanStep::new(StepType::ToolExecution, Priority::Critical),
                PlanStep::new(StepType::Chat, Priority::Normal),
            ],
            reliability: 0.5,
        });
    }

    alternatives.push(Alternative {
        label: "fallback".to_string(),
        steps: vec![PlanStep::new(StepType::Chat, Priority::Critical)],
        reliability: FALLBACK_RELIABILITY,
    });

    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_includes_fixed_fallback() {
        let alternatives = generate_alternatives(&[]);
        let fallback = alternatives.iter().find(|a| a.label == "fallback").unwrap();
        assert!((fallback.reliability - FALLBACK_RELIABILITY).abs() < f64::EPSILON);
    }

    #[test]
    fn bounds_alternative_count() {
        let none = generate_alternatives(&[]);
        assert!(none.len() >= 2 && none.len() <= 4);

        let many = generate_alternatives(&["multiply".to_string(), "divide".to_string()]);
        assert!(many.len() >= 2 && many.len() <= 4);
    }

    #[test]
    fn adds_tool_focused_only_when_tools_present() {
        let none = generate_alternatives(&[]);
        assert!(!none.iter().any(|a| a.label == "tool_focused"));

        let with_tools = generate_alternatives(&["multiply".to_string()]);
        assert!(with_tools.iter().any(|a| a.label == "tool_focused"));
    }
}
