//! Keyword/regex tables shared by the heuristic planner, the quantum
//! planner, and the reflector.
//!
//! Per the design notes, these live as a fixed, enumerable table of
//! patterns rather than scattered inline regexes, so the heuristics can be
//! audited (or localized) in one place.

use std::sync::LazyLock;

use regex::Regex;

/// Words whose presence in user text marks a tool as "potentially needed"
/// when they also appear in that tool's description.
pub const TOOL_DESCRIPTION_ACTION_WORDS: &[&str] =
    &["calculate", "compute", "add", "get", "fetch", "find", "search", "convert", "format"];

/// Words that suggest a math tool is wanted, independent of the tool's own
/// description text.
pub const MATH_ACTION_WORDS: &[&str] =
    &["add", "sum", "plus", "calculate", "compute", "multiply", "divide", "subtract"];

/// Keywords suggesting the planner should not commit to one path (feeds
/// the quantum planner's `adaptive` strategy selection).
pub const UNCERTAINTY_KEYWORDS: &[&str] =
    &["maybe", "not sure", "uncertain", "might", "possibly", "unclear", "i don't know", "unsure"];

static MULTI_STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(then|after|next)\b|\band then\b|\barea\b.*\b(divide|multiply)\b|\bcalculate\b.*\bthen\b")
        .expect("valid regex")
});

static SEQUENCE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(then|after|next)\b").expect("valid regex"));

static SEQUENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*,?\s*\b(then|after that|next)\b\s*,?\s*").expect("valid regex"));

static NUMERIC_EXPRESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*(?:[x×*/÷+-]|\bby\b)\s*\d+").expect("valid regex"));

static SEARCH_AND_ANALYZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(search|find|look up)\b.*\band\b.*\b(analyz|examine|review)\w*\b").expect("valid regex"));

/// Tool-name-family regexes used by the quantum planner to predict which
/// tools a task type is likely to need, independent of the registered
/// tools' own descriptions.
pub static TASK_TYPE_TOOL_FAMILIES: LazyLock<[(&'static str, Regex); 4]> = LazyLock::new(|| {
    [
        ("calculation", Regex::new(r"(?i)\b(add|subtract|multiply|divide|calculate|compute|sum|math)\w*\b").expect("valid regex")),
        ("search", Regex::new(r"(?i)\b(search|find|get|fetch|query|look\s?up)\w*\b").expect("valid regex")),
        ("analysis", Regex::new(r"(?i)\b(analyz|examine|review|process)\w*\b").expect("valid regex")),
        ("creation", Regex::new(r"(?i)\b(creat|generat|make|build)\w*\b").expect("valid regex")),
    ]
});

/// Per-clause arithmetic operation keywords, used by the sequential
/// decomposition to pick a tool family for each clause of a `"... then ..."`
/// instruction.
pub static OPERATION_KEYWORDS: LazyLock<[(&'static str, Regex); 4]> = LazyLock::new(|| {
    [
        ("multiply", Regex::new(r"(?i)\b(multipl\w*|area)\b|[×*]").expect("valid regex")),
        ("divide", Regex::new(r"(?i)\bdivid\w*\b|[÷/]").expect("valid regex")),
        ("add", Regex::new(r"(?i)\b(add|sum|plus)\w*\b|\+").expect("valid regex")),
        ("subtract", Regex::new(r"(?i)\b(subtract|minus)\w*\b|-").expect("valid regex")),
    ]
});

static MATH_TOOL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(add|subtract|multiply|divide|calculate|math)").expect("valid regex"));

/// True if any `word` in `words` appears in `text` (case-insensitive,
/// substring match — the source classifiers do not require word
/// boundaries for tool/description names).
#[must_use]
pub fn contains_any(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    words.iter().any(|w| lower.contains(&w.to_lowercase()))
}

/// True if `text` contains a numeric expression pattern like `"15 by 8"`
/// or `"3 * 4"`.
#[must_use]
pub fn has_numeric_expression(text: &str) -> bool {
    NUMERIC_EXPRESSION_RE.is_match(text)
}

/// True if `text` carries a multi-step marker (`then`, `after`, `next`,
/// `and then`, or one of the fixed compound patterns).
#[must_use]
pub fn is_multi_step(text: &str) -> bool {
    MULTI_STEP_RE.is_match(text)
}

/// True if `text` contains a bare sequence marker (`then`/`after`/`next`),
/// the weaker condition used by the quantum planner's strategy selection.
#[must_use]
pub fn has_sequence_marker(text: &str) -> bool {
    SEQUENCE_MARKER_RE.is_match(text)
}

/// True if `text` matches the `"search ... and ... analyze"` family used to
/// detect parallelizable multi-goal requests.
#[must_use]
pub fn matches_search_and_analyze(text: &str) -> bool {
    SEARCH_AND_ANALYZE_RE.is_match(text)
}

/// Splits `text` on its first sequence separator (`then`/`after that`/
/// `next`), returning one substring per clause in order. Returns a single
/// element if no separator is present.
#[must_use]
pub fn split_on_sequence_marker(text: &str) -> Vec<String> {
    SEQUENCE_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// True if `tool_name` matches the fixed math-tool-name family
/// (`^(add|subtract|multiply|divide|calculate|math)`, case-insensitive).
#[must_use]
pub fn is_math_tool_name(tool_name: &str) -> bool {
    MATH_TOOL_NAME_RE.is_match(tool_name)
}

/// The operation family (`"multiply"`, `"divide"`, `"add"`, `"subtract"`)
/// whose keywords first match in `clause`, if any.
#[must_use]
pub fn operation_for_clause(clause: &str) -> Option<&'static str> {
    OPERATION_KEYWORDS.iter().find(|(_, re)| re.is_match(clause)).map(|(name, _)| *name)
}

/// The task-type family (`"calculation"`, `"search"`, `"analysis"`,
/// `"creation"`) whose keywords first match in `text`, if any.
#[must_use]
pub fn task_type_for_text(text: &str) -> Option<&'static str> {
    TASK_TYPE_TOOL_FAMILIES.iter().find(|(_, re)| re.is_match(text)).map(|(name, _)| *name)
}

/// True if any uncertainty keyword appears in `text`.
#[must_use]
pub fn has_uncertainty(text: &str) -> bool {
    contains_any(text, UNCERTAINTY_KEYWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_multi_step_markers() {
        assert!(is_multi_step("Calculate the area, then divide by 3."));
        assert!(is_multi_step("Do this and then do that."));
        assert!(!is_multi_step("Just add two numbers."));
    }

    #[test]
    fn detects_numeric_expressions() {
        assert!(has_numeric_expression("a rectangle 15 by 8"));
        assert!(has_numeric_expression("3 * 4"));
        assert!(!has_numeric_expression("no numbers here"));
    }

    #[test]
    fn splits_on_sequence_marker() {
        let clauses = split_on_sequence_marker("Multiply 12 by 7, then divide by 4");
        assert_eq!(clauses.len(), 2);
        assert!(clauses[0].to_lowercase().contains("multiply"));
        assert!(clauses[1].to_lowercase().contains("divide"));
    }

    #[test]
    fn classifies_operations_per_clause() {
        assert_eq!(operation_for_clause("multiply 12 by 7"), Some("multiply"));
        assert_eq!(operation_for_clause("divide by 4"), Some("divide"));
        assert_eq!(operation_for_clause("add 2 and 3"), Some("add"));
        assert_eq!(operation_for_clause("subtract 1"), Some("subtract"));
        assert_eq!(operation_for_clause("say hello"), None);
    }

    #[test]
    fn math_tool_name_family() {
        assert!(is_math_tool_name("multiply"));
        assert!(is_math_tool_name("Calculate_area"));
        assert!(!is_math_tool_name("search_web"));
    }
}
