//! Expression graph — the per-search arena of nodes and derivation edges.
//!
//! Nodes are addressed by [`NodeId`] (an arena index) and looked up by
//! [`ExpressionId`]; edges reference nodes by index, so cyclic credential
//! webs never form owning reference cycles. The graph is built lazily:
//! a node's incoming edges are materialized the first time the resolver
//! asks for them, and the whole graph is dropped when the search ends.
//!
//! Edge direction follows derivation: an edge `from → to` means members of
//! `from` are (partly) members of `to`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::credential::{CredentialId, MAX_WEIGHT};
use crate::expression::{Expression, ExpressionId};
use crate::principal::Principal;
use crate::store::CredentialStore;

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Arena index of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(usize);

/// Where a derivation edge comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum EdgeKind {
    /// An issued credential `to ← from`.
    Credential { id: CredentialId },
    /// Synthesized hop `x.B → p.A.B` for a member `x` of `p.A`.
    Linked { via: Principal },
    /// One side of an intersection feeding the intersection.
    IntersectionSide,
}

/// A derivation edge between two nodes.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Weight contributed by the edge itself (100 for synthesized edges).
    pub weight: u8,
    pub kind: EdgeKind,
}

/// One expression plus its incoming edges.
#[derive(Debug, Clone)]
pub struct Node {
    pub expr: Expression,
    pub id: ExpressionId,
    /// `None` until expanded.
    incoming: Option<Vec<EdgeId>>,
}

/// Lazily built graph over a credential store.
pub struct ExpressionGraph<'s, S: CredentialStore + ?Sized> {
    store: &'s S,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<ExpressionId, NodeId>,
    /// Linked hops already synthesized, keyed by (linked node, member).
    links: HashMap<(NodeId, Principal), EdgeId>,
}

impl<'s, S: CredentialStore + ?Sized> ExpressionGraph<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
            links: HashMap::new(),
        }
    }

    /// Return the node for `expr`, creating it if needed.
    pub fn node(&mut self, expr: &Expression) -> NodeId {
        let id = expr.id();
        if let Some(&node) = self.index.get(&id) {
            return node;
        }
        let node = NodeId(self.nodes.len());
        self.nodes.push(Node {
            expr: expr.clone(),
            id: id.clone(),
            incoming: None,
        });
        self.index.insert(id, node);
        node
    }

    pub fn get(&self, node: NodeId) -> &Node {
        &self.nodes[node.0]
    }

    pub fn edge(&self, edge: EdgeId) -> &Edge {
        &self.edges[edge.0]
    }

    /// Look up an already-built node.
    pub fn find(&self, id: &ExpressionId) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Incoming edges of `node`, expanding it on first access.
    ///
    /// - `SimpleMember` has none (it is a leaf).
    /// - `SimpleInclusion` gets one edge per distinct credential source.
    ///   Of parallel credentials the latest issued counts, and a source
    ///   whose latest credential has weight 0 is revoked and gets no edge.
    /// - `IntersectionInclusion` gets one edge per side.
    /// - `LinkedInclusion` only has the hops added through [`Self::link`].
    pub fn incoming(&mut self, node: NodeId) -> Vec<EdgeId> {
        if let Some(edges) = &self.nodes[node.0].incoming {
            return edges.clone();
        }

        let expr = self.nodes[node.0].expr.clone();
        let edges = match &expr {
            Expression::SimpleMember { .. } | Expression::LinkedInclusion { .. } => Vec::new(),
            Expression::SimpleInclusion { principal, role } => {
                let store = self.store;
                let mut latest: Vec<(Expression, u8, CredentialId)> = Vec::new();
                let mut seen: HashMap<ExpressionId, usize> = HashMap::new();
                for credential in store.credentials_for(principal, role) {
                    let entry = (
                        credential.source.clone(),
                        credential.weight,
                        credential.id.clone(),
                    );
                    match seen.get(&credential.source.id()) {
                        Some(&i) => latest[i] = entry,
                        None => {
                            seen.insert(credential.source.id(), latest.len());
                            latest.push(entry);
                        }
                    }
                }
                latest
                    .into_iter()
                    .filter(|(_, weight, _)| *weight > 0)
                    .map(|(source, weight, id)| {
                        let from = self.node(&source);
                        self.add_edge(from, node, weight, EdgeKind::Credential { id })
                    })
                    .collect()
            }
            Expression::IntersectionInclusion { .. } => match expr.intersection_sides() {
                Some((left, right)) => {
                    let a = self.node(&left);
                    let b = self.node(&right);
                    vec![
                        self.add_edge(a, node, MAX_WEIGHT, EdgeKind::IntersectionSide),
                        self.add_edge(b, node, MAX_WEIGHT, EdgeKind::IntersectionSide),
                    ]
                }
                None => Vec::new(),
            },
        };

        log::trace!("expanded {} with {} incoming edges", expr, edges.len());
        self.nodes[node.0].incoming = Some(edges.clone());
        edges
    }

    /// Synthesize the hop `member.B → p.A.B` for a member of `p.A`.
    ///
    /// Each member is linked at most once per graph, however many paths
    /// reach it. Returns `None` when `linked` is not a `LinkedInclusion`.
    pub fn link(&mut self, linked: NodeId, member: &Principal) -> Option<EdgeId> {
        let role_b = match &self.nodes[linked.0].expr {
            Expression::LinkedInclusion { role_b, .. } => role_b.clone(),
            _ => return None,
        };

        let key = (linked, member.clone());
        if let Some(&edge) = self.links.get(&key) {
            return Some(edge);
        }

        let from = self.node(&Expression::of_role(member, &role_b));
        let edge = self.add_edge(
            from,
            linked,
            MAX_WEIGHT,
            EdgeKind::Linked {
                via: member.clone(),
            },
        );
        self.links.insert(key, edge);
        self.nodes[linked.0]
            .incoming
            .get_or_insert_with(Vec::new)
            .push(edge);
        Some(edge)
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, weight: u8, kind: EdgeKind) -> EdgeId {
        let edge = EdgeId(self.edges.len());
        self.edges.push(Edge {
            from,
            to,
            weight,
            kind,
        });
        edge
    }
}
