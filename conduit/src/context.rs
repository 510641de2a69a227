//! The immutable conversation snapshot threaded through the agent loop.
//!
//! Every transition below consumes `self` and returns a new [`AgentContext`];
//! cheap fields are copied and shared fields ([`ToolBox`], [`ProviderPool`])
//! are `Arc`-cloned, so no suspension point ever observes a stale snapshot
//! being mutated out from under it.

use std::sync::Arc;

use tracing::debug;

use crate::message::{Message, Role};
use crate::metrics::Metrics;
use crate::options::Options;
use crate::providers::ProviderPool;
use crate::tool::ToolBox;

/// Bookkeeping carried alongside the message list.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Planner/executor iterations completed so far.
    pub step_count: u32,
    /// Set once the conversation has reached a final answer.
    pub is_complete: bool,
    /// Description of the most recent step's error, if any.
    pub last_error: Option<String>,
    /// Accumulated counters for this run.
    pub metrics: Metrics,
}

/// A full snapshot of one run: messages, tools, providers, policy, and
/// bookkeeping.
#[derive(Clone)]
pub struct AgentContext {
    messages: Vec<Message>,
    tools: Arc<ToolBox>,
    providers: Arc<ProviderPool>,
    options: Arc<Options>,
    state: RunState,
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("messages", &self.messages.len())
            .field("state", &self.state)
            .finish()
    }
}

impl AgentContext {
    /// Builds the initial snapshot for a run.
    #[must_use]
    pub fn new(
        messages: Vec<Message>,
        tools: Arc<ToolBox>,
        providers: Arc<ProviderPool>,
        options: Arc<Options>,
    ) -> Self {
        Self {
            messages,
            tools,
            providers,
            options,
            state: RunState::default(),
        }
    }

    /// The conversation so far.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The registered tools.
    #[must_use]
    pub fn tools(&self) -> &ToolBox {
        &self.tools
    }

    /// The configured provider pool.
    #[must_use]
    pub fn providers(&self) -> &ProviderPool {
        &self.providers
    }

    /// The run's frozen policy.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Current bookkeeping state.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Appends `delta` to the conversation and applies history pruning.
    #[must_use]
    pub fn append_messages(mut self, delta: Vec<Message>) -> Self {
        self.messages.extend(delta);
        prune(
            &mut self.messages,
            self.options.max_history_length,
            self.options.preserve_system_messages,
        );
        self
    }

    /// Replaces the last message, as applied by the reflector's correction
    /// pass (the agent loop splices a corrected assistant turn in place).
    #[must_use]
    pub fn replace_last_message(mut self, message: Message) -> Self {
        if let Some(last) = self.messages.last_mut() {
            *last = message;
        }
        self
    }

    /// Applies a step-result delta to the bookkeeping state.
    #[must_use]
    pub fn update_state(mut self, is_complete: bool, error: Option<String>) -> Self {
        self.state.step_count += 1;
        self.state.is_complete = is_complete;
        self.state.last_error = error;
        self
    }

    /// Merges metrics produced by the last step.
    #[must_use]
    pub fn update_metrics(mut self, delta: Metrics) -> Self {
        self.state.metrics.merge(delta);
        self
    }
}

/// Prunes `messages` in place once they exceed `max_history_length`,
/// preserving every system message when `preserve_system` is set and never
/// splitting an assistant tool-call from the tool responses that answer it.
fn prune(messages: &mut Vec<Message>, max_history_length: usize, preserve_system: bool) {
    if max_history_length == 0 || messages.len() <= max_history_length {
        return;
    }

    if !preserve_system {
        let start = adjust_cut_for_tool_boundary(messages, messages.len() - max_history_length);
        messages.drain(..start);
        return;
    }

    let system_count = messages.iter().filter(|m| m.role == Role::System).count();
    if system_count >= max_history_length {
        let mut kept_system = 0usize;
        let keep_from_end = messages
            .iter()
            .rev()
            .take_while(|m| {
                if m.role == Role::System && kept_system < max_history_length {
                    kept_system += 1;
                    true
                } else {
                    false
                }
            })
            .count();
        let start = messages.len() - keep_from_end;
        messages.drain(..start);
        return;
    }

    let keep_non_system = max_history_length - system_count;
    let non_system_indices: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role != Role::System)
        .map(|(i, _)| i)
        .collect();

    if non_system_indices.len() <= keep_non_system {
        return;
    }

    let naive_cut = non_system_indices[non_system_indices.len() - keep_non_system];
    let cut = adjust_cut_for_tool_boundary(messages, naive_cut);

    let mut kept = Vec::with_capacity(max_history_length + 4);
    for (i, message) in messages.drain(..).enumerate() {
        if message.role == Role::System || i >= cut {
            kept.push(message);
        }
    }
    *messages = kept;
}

/// Pushes a naive cut index back until it does not fall strictly between an
/// assistant message with unresolved tool-calls and the tool responses that
/// answer them.
fn adjust_cut_for_tool_boundary(messages: &[Message], mut start: usize) -> usize {
    loop {
        if start == 0 || start >= messages.len() {
            return start;
        }
        let Some(candidate) = messages.get(start) else {
            return start;
        };
        if candidate.role != Role::Tool {
            return start;
        }
        let Some(call_id) = candidate.tool_call_id.as_deref() else {
            return start;
        };
        let owner = messages[..start].iter().rposition(|m| {
            m.role == Role::Assistant
                && m.tool_calls
                    .as_ref()
                    .is_some_and(|calls| calls.iter().any(|c| c.id == call_id))
        });
        match owner {
            Some(owner_idx) if owner_idx < start => {
                debug!(owner_idx, start, "pushing prune cut back across tool-call boundary");
                start = owner_idx;
            }
            _ => return start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;

    fn user(n: usize) -> Message {
        Message::user(format!("turn {n}"))
    }

    #[test]
    fn no_pruning_below_threshold() {
        let mut messages = vec![Message::system("sys"), user(1), user(2)];
        prune(&mut messages, 10, true);
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn preserves_all_system_messages() {
        let mut messages = vec![Message::system("sys")];
        for i in 0..40 {
            messages.push(user(i));
        }
        prune(&mut messages, 10, true);
        assert_eq!(messages.iter().filter(|m| m.role == Role::System).count(), 1);
        assert!(messages.len() <= 11);
    }

    #[test]
    fn keeps_only_tail_when_not_preserving_system() {
        let mut messages = vec![Message::system("sys")];
        for i in 0..10 {
            messages.push(user(i));
        }
        prune(&mut messages, 5, false);
        assert_eq!(messages.len(), 5);
        assert!(messages.iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn does_not_split_tool_call_from_its_response() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "add".to_string(),
            arguments: serde_json::json!({}),
        };
        let mut messages = vec![Message::system("sys")];
        for i in 0..5 {
            messages.push(user(i));
        }
        messages.push(Message::assistant_tool_calls(vec![call]));
        messages.push(Message::tool_response("call_1", "add", "3"));
        messages.push(Message::assistant("done"));

        // Naive cut (len=9, max=2) would land between the tool-call message
        // and its response; the pair must survive together.
        prune(&mut messages, 2, true);

        let has_call = messages
            .iter()
            .any(|m| m.role == Role::Assistant && m.has_tool_calls());
        let has_response = messages.iter().any(|m| m.role == Role::Tool);
        assert_eq!(has_call, has_response);
    }
}
