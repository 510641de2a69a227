//! Phase B: strategy selection and hierarchical task-network decomposition.

use crate::classifiers;
use crate::context::AgentContext;
use crate::plan::{PlanStep, Priority, StepType};

use super::intent::{Intent, TaskType};

/// The execution shape chosen for a recognized intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    /// Keep options open; the first step deliberately probes rather than commits.
    Adaptive,
    /// Two or more independent goals that do not depend on each other's output.
    Parallel,
    /// One action, no tool dispatch expected.
    Direct,
    /// An ordered chain of dependent steps (`"... then ..."`).
    Sequential,
    /// Deep or ambiguous enough to warrant an explicit tool -> reflect -> answer chain.
    Hierarchical,
}

impl StrategyType {
    /// The plan-strategy tag this selection is recorded under.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adaptive => "adaptive",
            Self::Parallel => "parallel",
            Self::Direct => "direct",
            Self::Sequential => "sequential",
            Self::Hierarchical => "hierarchical",
        }
    }
}

/// Picks a strategy for `intent`/`text`, in fixed priority order: adaptive,
/// parallel, direct, sequential, hierarchical, and direct again as the
/// catch-all. Returns the chosen strategy and a one-line reasoning string.
#[must_use]
pub fn select_strategy(intent: &Intent, text: &str) -> (StrategyType, String) {
    if intent.task_type == TaskType::Unknown
        || (intent.degraded && !intent.constraints.is_empty())
        || classifiers::has_uncertainty(text)
    {
        return (StrategyType::Adaptive, "task type unknown or uncertainty detected, keeping options open".to_string());
    }
    if classifiers::matches_search_and_analyze(text) {
        return (StrategyType::Parallel, "two independent goals detected (search + analyze)".to_string());
    }
    if matches!(intent.complexity, super::intent::Complexity::Simple) && intent.secondary.is_empty() {
        return (StrategyType::Direct, "single simple goal, no secondary intents".to_string());
    }
    if classifiers::has_sequence_marker(text) || intent.task_type == TaskType::MultiStep {
        return (StrategyType::Sequential, "ordered sequence marker found in request".to_string());
    }
    if matches!(intent.complexity, super::intent::Complexity::Complex | super::intent::Complexity::Expert) {
        return (StrategyType::Hierarchical, "complexity warrants an explicit decomposition".to_string());
    }
    (StrategyType::Direct, "no stronger signal, defaulting to a direct reply".to_string())
}

/// Predicts which registered tools the recognized task type is likely to
/// need, independent of whether the user named them explicitly.
#[must_use]
pub fn predict_tools(intent: &Intent, text: &str, ctx: &AgentContext) -> Vec<String> {
    let family = match intent.task_type {
        TaskType::Calculation => Some("calculation"),
        TaskType::Search => Some("search"),
        TaskType::Analysis => Some("analysis"),
        TaskType::Creation => Some("creation"),
        _ => classifiers::task_type_for_text(text),
    };

    let mut names: Vec<String> = ctx
        .tools()
        .definitions()
        .into_iter()
        .filter(|def| {
            let name_mentioned = classifiers::contains_any(text, &[def.name.as_str()]);
            let family_match = family == Some("calculation") && classifiers::is_math_tool_name(&def.name);
            name_mentioned || family_match
        })
        .map(|def| def.name)
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Expands `strategy` into a concrete step list.
#[must_use]
pub fn decompose(strategy: StrategyType, text: &str, tools: &[String]) -> Vec<PlanStep> {
    match strategy {
        StrategyType::Direct => vec![PlanStep::new(StepType::Chat, Priority::Critical)],
        StrategyType::Adaptive => {
            vec![PlanStep::new(StepType::Chat, Priority::Critical).with_expected_tools(tools.to_vec())]
        }
        StrategyType::Parallel | StrategyType::Hierarchical if tools.is_empty() => {
            vec![PlanStep::new(StepType::Chat, Priority::Critical)]
        }
        StrategyType::Parallel => vec![
            PlanStep::new(StepType::Chat, Priority::Critical).with_expected_tools(tools.to_vec()),
            PlanStep::new(StepType::ToolExecution, Priority::Critical),
            PlanStep::new(StepType::Chat, Priority::Normal),
        ],
        StrategyType::Hierarchical => vec![
            PlanStep::new(StepType::Chat, Priority::Critical).with_expected_tools(tools.to_vec()),
            PlanStep::new(StepType::ToolExecution, Priority::Critical),
            PlanStep::new(StepType::Reflection, Priority::Optional),
            PlanStep::new(StepType::Chat, Priority::Normal),
        ],
        StrategyType::Sequential => decompose_sequential(text, tools),
    }
}

/// Splits `text` on its sequence markers and builds one `chat -> tool_execution`
/// pair per clause, tagging each chat step with the arithmetic operation (or,
/// failing that, the full predicted tool set) that clause seems to need, then
/// appends a final synthesis chat step.
fn decompose_sequential(text: &str, tools: &[String]) -> Vec<PlanStep> {
    let clauses = classifiers::split_on_sequence_marker(text);
    if clauses.len() < 2 {
        return vec![
            PlanStep::new(StepType::Chat, Priority::Critical).with_expected_tools(tools.to_vec()),
            PlanStep::new(StepType::ToolExecution, Priority::Critical),
            PlanStep::new(StepType::Chat, Priority::Normal),
        ];
    }

    let mut steps = Vec::with_capacity(clauses.len() * 2 + 1);
    for clause in &clauses {
        let expected = classifiers::operation_for_clause(clause)
            .map(|op| tools.iter().filter(|t| t.starts_with(op) || *t == op).cloned().collect::<Vec<_>>())
            .filter(|matched| !matched.is_empty())
            .unwrap_or_else(|| tools.to_vec());
        steps.push(
            PlanStep::new(StepType::Chat, Priority::Critical)
                .with_seed(clause.clone())
                .with_expected_tools(expected),
        );
        steps.push(PlanStep::new(StepType::ToolExecution, Priority::Critical));
    }
    steps.push(PlanStep::new(StepType::Chat, Priority::Normal));
    steps
}

#[cfg(test)]
mod tests {
    use super::super::intent::Complexity;
    use super::*;

    fn intent(complexity: Complexity, task_type: TaskType) -> Intent {
        Intent {
            primary: "test".to_string(),
            secondary: Vec::new(),
            context: String::new(),
            complexity,
            task_type,
            constraints: Vec::new(),
            degraded: true,
        }
    }

    #[test]
    fn picks_sequential_on_sequence_marker() {
        let i = intent(Complexity::Moderate, TaskType::Calculation);
        let (strategy, _) = select_strategy(&i, "Multiply 12 by 7, then divide by 4");
        assert_eq!(strategy, StrategyType::Sequential);
    }

    #[test]
    fn picks_direct_for_simple_single_goal() {
        let i = intent(Complexity::Simple, TaskType::Communication);
        let (strategy, _) = select_strategy(&i, "Tell me a joke.");
        assert_eq!(strategy, StrategyType::Direct);
    }

    #[test]
    fn picks_parallel_for_search_and_analyze() {
        let i = intent(Complexity::Moderate, TaskType::Search);
        let (strategy, _) = select_strategy(&i, "Search the docs and analyze the results");
        assert_eq!(strategy, StrategyType::Parallel);
    }

    #[test]
    fn picks_adaptive_for_unknown_task_type_even_without_uncertainty_words() {
        let i = intent(Complexity::Simple, TaskType::Unknown);
        let (strategy, _) = select_strategy(&i, "Handle the thing from earlier.");
        assert_eq!(strategy, StrategyType::Adaptive);
    }

    #[test]
    fn decomposes_sequential_into_per_clause_steps() {
        let steps = decompose(
            StrategyType::Sequential,
            "Multiply 12 by 7, then divide by 4",
            &["multiply".to_string(), "divide".to_string()],
        );
        // two clauses -> 2 (chat, tool_execution) pairs + final synthesis chat
        assert_eq!(steps.len(), 5);
    }
}
