//! Execution plan
//!
//! A tiny DAG assembled per invocation from the resolved analyst selection.
//! Nodes and edges live in `BTreeSet`s, so two selections with the same
//! members produce structurally identical plans regardless of request order.

use std::collections::BTreeSet;

use crate::registry::AnalystId;

/// A node of the execution graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeId {
    Entry,
    Analyst(AnalystId),
    Risk,
    PortfolioStage,
    Exit,
}

/// The per-invocation graph: fixed spine plus one fan-out node per selected
/// graph analyst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub nodes: BTreeSet<NodeId>,
    pub edges: BTreeSet<(NodeId, NodeId)>,
}

impl ExecutionPlan {
    /// The analyst fan-out nodes, in canonical order.
    pub fn analyst_nodes(&self) -> Vec<AnalystId> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                NodeId::Analyst(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

pub struct PlanBuilder;

impl PlanBuilder {
    /// Build the plan for a selection. Standalone producers never appear as
    /// nodes; with zero graph analysts the entry wires straight into risk.
    pub fn build(selection: &[AnalystId]) -> ExecutionPlan {
        let mut nodes = BTreeSet::from([
            NodeId::Entry,
            NodeId::Risk,
            NodeId::PortfolioStage,
            NodeId::Exit,
        ]);
        let mut edges = BTreeSet::from([
            (NodeId::Risk, NodeId::PortfolioStage),
            (NodeId::PortfolioStage, NodeId::Exit),
        ]);

        let mut fan_out = 0;
        for id in selection.iter().filter(|id| !id.is_standalone()) {
            let node = NodeId::Analyst(*id);
            nodes.insert(node);
            edges.insert((NodeId::Entry, node));
            edges.insert((node, NodeId::Risk));
            fan_out += 1;
        }
        if fan_out == 0 {
            edges.insert((NodeId::Entry, NodeId::Risk));
        }

        ExecutionPlan { nodes, edges }
    }
}
