//! Processing order for payload records.

use crate::transfer::domain::{EntityKey, EntityRecord};
use std::collections::{BTreeSet, HashMap};

/// A payload record scheduled for reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlannedEntity {
    pub record: EntityRecord,
    /// References to payload records on the same dependency cycle. These are
    /// treated as resolved when the record is checked.
    pub cycle_peers: BTreeSet<EntityKey>,
}

impl PlannedEntity {
    pub(crate) fn is_cyclic(&self) -> bool {
        !self.cycle_peers.is_empty()
    }
}

/// Orders records so that every payload record is processed after the payload
/// records it depends on.
///
/// `records` must already be in base order (type rank, then payload order).
/// The sort is stable: ready records are always taken lowest base position
/// first. Records on a dependency cycle are grouped into strongly connected
/// components. When nothing is ready, the lowest-positioned record whose
/// whole component has no pending dependencies outside itself is released,
/// and its pending references, all inside that component, become cycle peers.
/// Records that only depend on a cycle wait until their dependencies are
/// scheduled and are never released early.
pub(crate) fn processing_plan(records: Vec<EntityRecord>) -> Vec<PlannedEntity> {
    let graph = DependencyGraph::build(&records);
    let component_of = strongly_connected_components(&graph.providers);
    let order = graph.schedule(&component_of);

    let keys: Vec<EntityKey> = records.iter().map(EntityRecord::key).collect();
    let mut slots: Vec<Option<EntityRecord>> = records.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|(position, peer_positions)| {
            let record = slots.get_mut(position)?.take()?;
            let self_reference = record.key();
            let mut cycle_peers: BTreeSet<EntityKey> = peer_positions
                .iter()
                .filter_map(|peer| keys.get(*peer).cloned())
                .collect();
            if record.dependencies().contains(&self_reference) {
                cycle_peers.insert(self_reference);
            }
            Some(PlannedEntity {
                record,
                cycle_peers,
            })
        })
        .collect()
}

/// Dependency edges between payload positions. Self-references and
/// references to records outside the payload carry no edge.
struct DependencyGraph {
    /// Positions each record depends on.
    providers: Vec<Vec<usize>>,
    /// Positions depending on each record.
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    fn build(records: &[EntityRecord]) -> Self {
        let mut position_of: HashMap<EntityKey, usize> = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            position_of.entry(record.key()).or_insert(position);
        }

        let mut providers: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        for (position, record) in records.iter().enumerate() {
            for dependency in record.dependencies() {
                let Some(&provider) = position_of.get(dependency) else {
                    continue;
                };
                if provider == position {
                    continue;
                }
                if let (Some(inbound), Some(outbound)) =
                    (providers.get_mut(position), dependents.get_mut(provider))
                {
                    inbound.push(provider);
                    outbound.push(position);
                }
            }
        }
        Self {
            providers,
            dependents,
        }
    }

    /// Returns `(position, cycle peer positions)` in processing order.
    fn schedule(&self, component_of: &[usize]) -> Vec<(usize, BTreeSet<usize>)> {
        let count = self.providers.len();
        let same_component =
            |left: usize, right: usize| component_of.get(left) == component_of.get(right);
        let mut pending: Vec<usize> = self.providers.iter().map(Vec::len).collect();
        let mut outside_pending: HashMap<usize, usize> = HashMap::new();
        for (position, inbound) in self.providers.iter().enumerate() {
            let outside = inbound
                .iter()
                .filter(|provider| !same_component(position, **provider))
                .count();
            if let Some(&component) = component_of.get(position) {
                *outside_pending.entry(component).or_default() += outside;
            }
        }
        let component_unblocked = |by_component: &HashMap<usize, usize>, position: usize| {
            component_of
                .get(position)
                .and_then(|component| by_component.get(component))
                .is_none_or(|remaining| *remaining == 0)
        };
        let mut ready: BTreeSet<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, remaining)| **remaining == 0)
            .map(|(position, _)| position)
            .collect();
        let mut emitted = vec![false; count];
        let mut order: Vec<(usize, BTreeSet<usize>)> = Vec::with_capacity(count);

        while order.len() < count {
            let (next, peers) = match ready.pop_first() {
                Some(position) => (position, BTreeSet::new()),
                None => {
                    let Some(released) = (0..count).find(|position| {
                        emitted.get(*position) == Some(&false)
                            && component_unblocked(&outside_pending, *position)
                    }) else {
                        break;
                    };
                    let peers = self
                        .providers
                        .get(released)
                        .into_iter()
                        .flatten()
                        .copied()
                        .filter(|provider| emitted.get(*provider) == Some(&false))
                        .collect();
                    (released, peers)
                }
            };
            if let Some(done) = emitted.get_mut(next) {
                *done = true;
            }
            for &dependent in self.dependents.get(next).into_iter().flatten() {
                if !same_component(next, dependent)
                    && let Some(remaining) = component_of
                        .get(dependent)
                        .and_then(|component| outside_pending.get_mut(component))
                {
                    *remaining = remaining.saturating_sub(1);
                }
                if let Some(remaining) = pending.get_mut(dependent) {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 && emitted.get(dependent) == Some(&false) {
                        ready.insert(dependent);
                    }
                }
            }
            order.push((next, peers));
        }
        order
    }
}

/// Labels every position with the root position of its strongly connected
/// component.
///
/// Iterative Tarjan, so deep dependency chains cannot exhaust the stack.
fn strongly_connected_components(providers: &[Vec<usize>]) -> Vec<usize> {
    let mut search = ComponentSearch::new(providers.len());
    for root in 0..providers.len() {
        if search.is_visited(root) {
            continue;
        }
        search.visit(root);
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some((node, edge)) = frames.last().copied() {
            let successor = providers.get(node).and_then(|out| out.get(edge)).copied();
            if let Some(next) = successor {
                if let Some(frame) = frames.last_mut() {
                    frame.1 += 1;
                }
                if !search.is_visited(next) {
                    search.visit(next);
                    frames.push((next, 0));
                } else if search.is_on_stack(next) {
                    search.lower(node, search.index_of(next));
                }
            } else {
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    search.lower(parent, search.low_link_of(node));
                }
                search.close(node);
            }
        }
    }
    search.component_of
}

/// Bookkeeping for one strongly connected component search.
struct ComponentSearch {
    index: Vec<Option<usize>>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    component_of: Vec<usize>,
    next_index: usize,
}

impl ComponentSearch {
    fn new(count: usize) -> Self {
        Self {
            index: vec![None; count],
            low_link: vec![0; count],
            on_stack: vec![false; count],
            stack: Vec::with_capacity(count),
            component_of: (0..count).collect(),
            next_index: 0,
        }
    }

    fn is_visited(&self, node: usize) -> bool {
        self.index.get(node).copied().flatten().is_some()
    }

    fn is_on_stack(&self, node: usize) -> bool {
        self.on_stack.get(node).copied().unwrap_or(false)
    }

    fn index_of(&self, node: usize) -> usize {
        self.index.get(node).copied().flatten().unwrap_or(usize::MAX)
    }

    fn low_link_of(&self, node: usize) -> usize {
        self.low_link.get(node).copied().unwrap_or(usize::MAX)
    }

    fn visit(&mut self, node: usize) {
        if let (Some(index), Some(low_link), Some(on_stack)) = (
            self.index.get_mut(node),
            self.low_link.get_mut(node),
            self.on_stack.get_mut(node),
        ) {
            *index = Some(self.next_index);
            *low_link = self.next_index;
            *on_stack = true;
            self.next_index += 1;
            self.stack.push(node);
        }
    }

    fn lower(&mut self, node: usize, candidate: usize) {
        if let Some(low_link) = self.low_link.get_mut(node) {
            *low_link = (*low_link).min(candidate);
        }
    }

    /// Pops the finished component rooted at `node`, if `node` is a root.
    fn close(&mut self, node: usize) {
        if self.low_link_of(node) != self.index_of(node) {
            return;
        }
        while let Some(member) = self.stack.pop() {
            if let Some(on_stack) = self.on_stack.get_mut(member) {
                *on_stack = false;
            }
            if let Some(component) = self.component_of.get_mut(member) {
                *component = node;
            }
            if member == node {
                break;
            }
        }
    }
}
