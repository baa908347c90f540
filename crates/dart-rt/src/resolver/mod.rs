//! Resolver — backward search from a target expression to its members.
//!
//! The search walks the [`ExpressionGraph`] depth-first from the target
//! towards `SimpleMember` leaves:
//!
//! - `SimpleMember` is a leaf worth full weight;
//! - `SimpleInclusion` unions every credential source, composing weights
//!   with the configured [`WeightRule`];
//! - `LinkedInclusion(p, A, B)` resolves `p.A`, then for each distinct
//!   member `x` resolves `x.B`; the path keeps both single-hop derivations;
//! - `IntersectionInclusion` resolves both sides and keeps members found
//!   on both, at the weaker of the two side weights.
//!
//! Expressions being expanded on the current branch form the active set.
//! Meeting one again cuts the branch without a solution, which is how
//! cyclic role inclusion terminates.
//!
//! The walk keeps its own task stack instead of recursing, so arbitrarily
//! long acyclic chains resolve without exhausting the thread's stack.

pub mod solution;
pub mod weight;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::credential::MAX_WEIGHT;
use crate::expression::Expression;
use crate::graph::{EdgeId, ExpressionGraph, NodeId};
use crate::principal::{Principal, RoleName};
use crate::store::CredentialStore;

pub use solution::{PathEdge, Solution, SolutionId};
pub use weight::WeightRule;

/// Search configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Weight composition along chains.
    pub weight_rule: WeightRule,
    /// Maximum derivation depth; deeper branches are cut. `None` = unbounded.
    pub max_depth: Option<usize>,
}

/// Counters describing one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes materialized in the graph.
    pub nodes: usize,
    /// Edges materialized in the graph.
    pub edges: usize,
    /// Branches terminated by the cycle guard.
    pub cycles_cut: usize,
    /// Branches terminated by `max_depth`.
    pub depth_cut: usize,
}

/// Solutions plus statistics.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub solutions: BTreeMap<SolutionId, Solution>,
    pub stats: SearchStats,
}

/// Backward search over a credential store.
pub struct Resolver<'s, S: CredentialStore + ?Sized> {
    store: &'s S,
    options: SearchOptions,
}

impl<'s, S: CredentialStore + ?Sized> Resolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_options(store, SearchOptions::default())
    }

    pub fn with_options(store: &'s S, options: SearchOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Every member of `target` with positive weight, one solution per
    /// distinct (member, path). An empty map means no member qualifies.
    pub fn search(&self, target: &Expression) -> BTreeMap<SolutionId, Solution> {
        self.search_with_report(target).solutions
    }

    /// [`Resolver::search`] plus graph and pruning statistics.
    pub fn search_with_report(&self, target: &Expression) -> SearchReport {
        let mut walk = Walk::new(self.store, self.options);
        let root = walk.graph.node(target);
        let derivations = walk.run(root);

        let mut solutions: BTreeMap<SolutionId, Solution> = BTreeMap::new();
        for derivation in derivations {
            let path: Vec<PathEdge> = walk
                .trails
                .flatten(derivation.path)
                .into_iter()
                .map(|edge| walk.path_edge(edge))
                .collect();
            let id = SolutionId::compute(&derivation.member, &path);
            let req_stack_size = crate::proof::required_stack_depth(&path);

            match solutions.get_mut(&id) {
                Some(existing) if existing.weight >= derivation.weight => {}
                Some(existing) => existing.weight = derivation.weight,
                None => {
                    solutions.insert(
                        id.clone(),
                        Solution {
                            id,
                            target: target.clone(),
                            member: derivation.member,
                            path,
                            weight: derivation.weight,
                            req_stack_size,
                        },
                    );
                }
            }
        }

        let mut stats = walk.stats;
        stats.nodes = walk.graph.node_count();
        stats.edges = walk.graph.edge_count();

        log::debug!(
            "search {target}: {} solutions ({} nodes, {} edges, {} cycle cuts, {} depth cuts)",
            solutions.len(),
            stats.nodes,
            stats.edges,
            stats.cycles_cut,
            stats.depth_cut
        );

        SearchReport { solutions, stats }
    }
}

/// Search `target` with default options.
pub fn search<S: CredentialStore + ?Sized>(
    store: &S,
    target: &Expression,
) -> BTreeMap<SolutionId, Solution> {
    Resolver::new(store).search(target)
}

/// Solutions meeting a caller's acceptance threshold, strongest first.
pub fn accept(solutions: &BTreeMap<SolutionId, Solution>, min_weight: u8) -> Vec<&Solution> {
    let mut accepted: Vec<&Solution> = solutions
        .values()
        .filter(|s| s.weight >= min_weight)
        .collect();
    accepted.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.member.cmp(&b.member)));
    accepted
}

/// A member reached from some node, with the edges that reach it.
struct Derivation {
    member: Principal,
    weight: u8,
    path: Trail,
}

/// Handle to a path fragment in [`Trails`]. `None` is the empty path.
#[derive(Debug, Clone, Copy, Default)]
struct Trail(Option<usize>);

#[derive(Debug, Clone, Copy)]
enum Segment {
    Edge(EdgeId),
    Join(Trail, Trail),
}

/// Path fragments shared between derivations.
///
/// Extending or joining a path is O(1); a path is only laid out as a
/// vector once it reaches a solution.
#[derive(Debug, Default)]
struct Trails {
    segments: Vec<Segment>,
}

impl Trails {
    fn push(&mut self, segment: Segment) -> Trail {
        self.segments.push(segment);
        Trail(Some(self.segments.len() - 1))
    }

    fn edge(&mut self, edge: EdgeId) -> Trail {
        self.push(Segment::Edge(edge))
    }

    fn join(&mut self, left: Trail, right: Trail) -> Trail {
        match (left.0, right.0) {
            (None, _) => right,
            (_, None) => left,
            _ => self.push(Segment::Join(left, right)),
        }
    }

    /// `edge` followed by `rest`.
    fn prepend(&mut self, edge: EdgeId, rest: Trail) -> Trail {
        let head = self.edge(edge);
        self.join(head, rest)
    }

    fn flatten(&self, trail: Trail) -> Vec<EdgeId> {
        let mut out = Vec::new();
        let mut pending = vec![trail];
        while let Some(Trail(at)) = pending.pop() {
            let Some(at) = at else { continue };
            match self.segments[at] {
                Segment::Edge(edge) => out.push(edge),
                Segment::Join(left, right) => {
                    pending.push(right);
                    pending.push(left);
                }
            }
        }
        out
    }
}

/// Pending work of the walk. A `Resolve` task leaves exactly one entry on
/// the result stack; the other tasks resume a node after a child resolved.
enum Task {
    Resolve {
        node: NodeId,
        depth: usize,
    },
    Inclusion {
        node: NodeId,
        depth: usize,
        edges: Vec<EdgeId>,
        next: usize,
        found: Vec<Derivation>,
    },
    LinkedHead {
        node: NodeId,
        depth: usize,
    },
    LinkedTail {
        node: NodeId,
        depth: usize,
        order: Vec<Principal>,
        heads: HashMap<Principal, Vec<Derivation>>,
        next: usize,
        edge: EdgeId,
        found: Vec<Derivation>,
    },
    IntersectionLeft {
        node: NodeId,
        depth: usize,
        edges: [EdgeId; 2],
    },
    IntersectionRight {
        node: NodeId,
        edges: [EdgeId; 2],
        left: Vec<Derivation>,
    },
}

struct Walk<'s, S: CredentialStore + ?Sized> {
    graph: ExpressionGraph<'s, S>,
    trails: Trails,
    /// Nodes on the current branch. Node ids map one-to-one to expression ids.
    active: HashSet<NodeId>,
    options: SearchOptions,
    stats: SearchStats,
    tasks: Vec<Task>,
    results: Vec<Vec<Derivation>>,
}

impl<'s, S: CredentialStore + ?Sized> Walk<'s, S> {
    fn new(store: &'s S, options: SearchOptions) -> Self {
        Self {
            graph: ExpressionGraph::new(store),
            trails: Trails::default(),
            active: HashSet::new(),
            options,
            stats: SearchStats::default(),
            tasks: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Depth-first walk from `root` on an explicit task stack, so chain
    /// length is bounded by memory rather than the thread's stack.
    fn run(&mut self, root: NodeId) -> Vec<Derivation> {
        self.tasks.push(Task::Resolve {
            node: root,
            depth: 0,
        });
        while let Some(task) = self.tasks.pop() {
            match task {
                Task::Resolve { node, depth } => self.enter(node, depth),
                Task::Inclusion {
                    node,
                    depth,
                    edges,
                    next,
                    found,
                } => {
                    let child = self.child_result();
                    self.resume_inclusion(node, depth, edges, next, found, child);
                }
                Task::LinkedHead { node, depth } => {
                    let child = self.child_result();
                    self.resume_linked_head(node, depth, child);
                }
                Task::LinkedTail {
                    node,
                    depth,
                    order,
                    heads,
                    next,
                    edge,
                    mut found,
                } => {
                    let tails = self.child_result();
                    let via_heads = order
                        .get(next)
                        .and_then(|via| heads.get(via))
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    self.link_tails(edge, via_heads, &tails, &mut found);
                    self.next_tail(node, depth, order, heads, next + 1, found);
                }
                Task::IntersectionLeft { node, depth, edges } => {
                    let left = self.child_result();
                    if left.is_empty() {
                        self.finish(node, Vec::new());
                    } else {
                        let right_from = self.graph.edge(edges[1]).from;
                        self.tasks.push(Task::IntersectionRight { node, edges, left });
                        self.schedule(right_from, depth + 1);
                    }
                }
                Task::IntersectionRight { node, edges, left } => {
                    let right = self.child_result();
                    let found = self.intersect(edges, &left, &right);
                    self.finish(node, found);
                }
            }
        }
        self.child_result()
    }

    fn schedule(&mut self, node: NodeId, depth: usize) {
        self.tasks.push(Task::Resolve { node, depth });
    }

    fn child_result(&mut self) -> Vec<Derivation> {
        self.results.pop().unwrap_or_default()
    }

    fn finish(&mut self, node: NodeId, found: Vec<Derivation>) {
        self.active.remove(&node);
        self.results.push(found);
    }

    fn enter(&mut self, node: NodeId, depth: usize) {
        if self.active.contains(&node) {
            self.stats.cycles_cut += 1;
            log::trace!("cycle at {}; branch cut", self.graph.get(node).expr);
            self.results.push(Vec::new());
            return;
        }
        if self.options.max_depth.is_some_and(|max| depth > max) {
            self.stats.depth_cut += 1;
            self.results.push(Vec::new());
            return;
        }

        self.active.insert(node);
        let expr = self.graph.get(node).expr.clone();
        match &expr {
            Expression::SimpleMember { member } => {
                let leaf = Derivation {
                    member: member.clone(),
                    weight: MAX_WEIGHT,
                    path: Trail::default(),
                };
                self.finish(node, vec![leaf]);
            }
            Expression::SimpleInclusion { .. } => {
                let edges = self.graph.incoming(node);
                self.next_source(node, depth, edges, 0, Vec::new());
            }
            Expression::LinkedInclusion {
                principal, role_a, ..
            } => {
                let head = self.graph.node(&Expression::of_role(principal, role_a));
                self.tasks.push(Task::LinkedHead { node, depth });
                self.schedule(head, depth + 1);
            }
            Expression::IntersectionInclusion { .. } => {
                let edges = self.graph.incoming(node);
                let &[left_edge, right_edge] = edges.as_slice() else {
                    self.finish(node, Vec::new());
                    return;
                };
                let left_from = self.graph.edge(left_edge).from;
                self.tasks.push(Task::IntersectionLeft {
                    node,
                    depth,
                    edges: [left_edge, right_edge],
                });
                self.schedule(left_from, depth + 1);
            }
        }
    }

    /// Resolve the source of `edges[next]`, or finish once all are done.
    fn next_source(
        &mut self,
        node: NodeId,
        depth: usize,
        edges: Vec<EdgeId>,
        next: usize,
        found: Vec<Derivation>,
    ) {
        let Some(&edge) = edges.get(next) else {
            self.finish(node, found);
            return;
        };
        let from = self.graph.edge(edge).from;
        self.tasks.push(Task::Inclusion {
            node,
            depth,
            edges,
            next,
            found,
        });
        self.schedule(from, depth + 1);
    }

    fn resume_inclusion(
        &mut self,
        node: NodeId,
        depth: usize,
        edges: Vec<EdgeId>,
        next: usize,
        mut found: Vec<Derivation>,
        sources: Vec<Derivation>,
    ) {
        let rule = self.options.weight_rule;
        let edge = edges[next];
        let edge_weight = self.graph.edge(edge).weight;
        for d in sources {
            let weight = rule.chain(d.weight, edge_weight);
            if weight == 0 {
                continue;
            }
            found.push(Derivation {
                member: d.member,
                weight,
                path: self.trails.prepend(edge, d.path),
            });
        }
        self.next_source(node, depth, edges, next + 1, found);
    }

    fn resume_linked_head(&mut self, node: NodeId, depth: usize, derived: Vec<Derivation>) {
        // Group derivations of p.A by the intermediate member x.
        let mut order: Vec<Principal> = Vec::new();
        let mut heads: HashMap<Principal, Vec<Derivation>> = HashMap::new();
        for d in derived {
            if !heads.contains_key(&d.member) {
                order.push(d.member.clone());
            }
            heads.entry(d.member.clone()).or_default().push(d);
        }
        self.next_tail(node, depth, order, heads, 0, Vec::new());
    }

    /// Link the next intermediate member and resolve its `x.B`, or finish.
    fn next_tail(
        &mut self,
        node: NodeId,
        depth: usize,
        order: Vec<Principal>,
        heads: HashMap<Principal, Vec<Derivation>>,
        mut next: usize,
        found: Vec<Derivation>,
    ) {
        while let Some(via) = order.get(next) {
            if let Some(edge) = self.graph.link(node, via) {
                let tail = self.graph.edge(edge).from;
                self.tasks.push(Task::LinkedTail {
                    node,
                    depth,
                    order,
                    heads,
                    next,
                    edge,
                    found,
                });
                self.schedule(tail, depth + 1);
                return;
            }
            next += 1;
        }
        self.finish(node, found);
    }

    fn link_tails(
        &mut self,
        edge: EdgeId,
        heads: &[Derivation],
        tails: &[Derivation],
        found: &mut Vec<Derivation>,
    ) {
        let rule = self.options.weight_rule;
        for t in tails {
            for h in heads {
                let weight = rule.chain(t.weight, h.weight);
                if weight == 0 {
                    continue;
                }
                // Head derivation first so the path ends at the member's leaf.
                let rest = self.trails.join(h.path, t.path);
                found.push(Derivation {
                    member: t.member.clone(),
                    weight,
                    path: self.trails.prepend(edge, rest),
                });
            }
        }
    }

    fn intersect(
        &mut self,
        [left_edge, right_edge]: [EdgeId; 2],
        left: &[Derivation],
        right: &[Derivation],
    ) -> Vec<Derivation> {
        let rule = self.options.weight_rule;
        let mut out = Vec::new();
        for l in left {
            for r in right.iter().filter(|r| r.member == l.member) {
                let weight = rule.intersect(l.weight, r.weight);
                if weight == 0 {
                    continue;
                }
                let a = self.trails.prepend(left_edge, l.path);
                let b = self.trails.prepend(right_edge, r.path);
                out.push(Derivation {
                    member: l.member.clone(),
                    weight,
                    path: self.trails.join(a, b),
                });
            }
        }
        out
    }

    fn path_edge(&self, edge: EdgeId) -> PathEdge {
        let e = self.graph.edge(edge);
        let to = self.graph.get(e.to);
        let from = self.graph.get(e.from);
        PathEdge {
            to: to.expr.clone(),
            to_id: to.id.clone(),
            from: from.expr.clone(),
            from_id: from.id.clone(),
            weight: e.weight,
            kind: e.kind.clone(),
        }
    }
}
