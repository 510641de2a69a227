//! Planning: turns the latest user turn into a [`crate::plan::Plan`], and
//! adapts that plan after every executor step.
//!
//! Two flavors are exposed: [`heuristic`], a fast one-shot keyword
//! classifier, and [`quantum`], a hierarchical task-network planner with
//! tree-of-thoughts alternatives and self-healing adaptation. Both produce
//! the same [`crate::plan::Plan`] type; only `quantum`'s carries a populated
//! [`crate::plan::QuantumMeta`].

pub mod heuristic;
pub mod quantum;
