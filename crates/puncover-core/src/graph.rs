//! Call graph over enhanced symbols using petgraph, with worst-case stack paths

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::{condensation, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::Address;
use crate::symbols::SymbolTable;

/// Deepest chain of calls starting at one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackPath {
    /// Sum of the stack sizes along `path`. Unknown stack sizes count as 0.
    pub total_stack: u64,
    pub path: Vec<Address>,
    /// Some function on the path is part of a recursive cycle, so the
    /// real worst case is unbounded.
    pub recursive: bool,
}

/// Call relationships between functions. Built once from an enhanced table.
pub struct CallGraph {
    inner: DiGraph<Address, ()>,
    index: HashMap<Address, NodeIndex>,
    callee_view: StackView,
    caller_view: StackView,
}

impl std::fmt::Debug for CallGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl CallGraph {
    /// Build from the callee lists of every symbol in the table.
    pub fn from_symbols(symbols: &SymbolTable) -> Self {
        let mut inner = DiGraph::new();
        let mut index = HashMap::new();
        for address in symbols.addresses() {
            index.insert(address, inner.add_node(address));
        }
        for symbol in symbols.iter() {
            for callee in &symbol.callees {
                if let (Some(from), Some(to)) = (index.get(&symbol.address), index.get(callee)) {
                    inner.add_edge(*from, *to, ());
                }
            }
        }

        let stack: HashMap<Address, u64> = symbols
            .iter()
            .map(|s| (s.address, s.stack_size.unwrap_or(0)))
            .collect();

        let mut reversed = inner.clone();
        reversed.reverse();

        let callee_view = StackView::new(&inner, &stack);
        let caller_view = StackView::new(&reversed, &stack);

        CallGraph {
            inner,
            index,
            callee_view,
            caller_view,
        }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn callees(&self, address: Address) -> Vec<Address> {
        self.neighbors(address, Direction::Outgoing)
    }

    pub fn callers(&self, address: Address) -> Vec<Address> {
        self.neighbors(address, Direction::Incoming)
    }

    fn neighbors(&self, address: Address, direction: Direction) -> Vec<Address> {
        let Some(idx) = self.index.get(&address) else {
            return Vec::new();
        };
        let mut out: Vec<Address> = self
            .inner
            .neighbors_directed(*idx, direction)
            .map(|n| self.inner[n])
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Deepest stack reachable by following callees from `address`.
    pub fn deepest_callee_tree(&self, address: Address) -> Result<StackPath, CoreError> {
        self.callee_view
            .path_from(address)
            .ok_or(CoreError::UnknownSymbol(address))
    }

    /// Deepest stack over all chains of callers that end in `address`.
    /// The path runs from `address` outwards to the outermost caller.
    pub fn deepest_caller_tree(&self, address: Address) -> Result<StackPath, CoreError> {
        self.caller_view
            .path_from(address)
            .ok_or(CoreError::UnknownSymbol(address))
    }
}

/// Longest-path table over the condensation of a call graph.
struct StackView {
    own_stack: HashMap<Address, u64>,
    component_of: HashMap<Address, NodeIndex>,
    representative: HashMap<NodeIndex, Address>,
    best: HashMap<NodeIndex, Best>,
}

#[derive(Clone, Copy)]
struct Best {
    total: u64,
    next: Option<NodeIndex>,
    recursive: bool,
}

impl StackView {
    fn new(graph: &DiGraph<Address, ()>, stack: &HashMap<Address, u64>) -> Self {
        let self_recursive: Vec<Address> = graph
            .node_indices()
            .filter(|n| graph.contains_edge(*n, *n))
            .map(|n| graph[n])
            .collect();

        let condensed = condensation(graph.clone(), true);
        let mut component_of = HashMap::new();
        let mut representative = HashMap::new();
        let mut local = HashMap::new();
        let mut cyclic = HashMap::new();

        for component in condensed.node_indices() {
            let members = &condensed[component];
            for address in members {
                component_of.insert(*address, component);
            }
            let rep = members
                .iter()
                .copied()
                .max_by_key(|a| (stack.get(a).copied().unwrap_or(0), std::cmp::Reverse(*a)))
                .unwrap_or_default();
            representative.insert(component, rep);
            local.insert(component, stack.get(&rep).copied().unwrap_or(0));
            cyclic.insert(
                component,
                members.len() > 1 || members.iter().any(|a| self_recursive.contains(a)),
            );
        }

        // condensation() with make_acyclic never leaves a cycle behind
        let order = toposort(&condensed, None).unwrap_or_default();
        let mut best: HashMap<NodeIndex, Best> = HashMap::new();
        for component in order.into_iter().rev() {
            let deepest = condensed
                .neighbors_directed(component, Direction::Outgoing)
                .filter_map(|n| best.get(&n).map(|b| (n, *b)))
                .max_by_key(|(n, b)| (b.total, std::cmp::Reverse(representative[n])));

            let own = local[&component];
            let is_cyclic = cyclic[&component];
            let entry = match deepest {
                Some((n, b)) => Best {
                    total: own + b.total,
                    next: Some(n),
                    recursive: is_cyclic || b.recursive,
                },
                None => Best {
                    total: own,
                    next: None,
                    recursive: is_cyclic,
                },
            };
            best.insert(component, entry);
        }

        StackView {
            own_stack: stack.clone(),
            component_of,
            representative,
            best,
        }
    }

    fn path_from(&self, address: Address) -> Option<StackPath> {
        let start = *self.component_of.get(&address)?;
        let first = self.best.get(&start)?;

        // a recursive group is charged at its largest member further down the
        // chain, but the starting function pays only its own frame
        let below = first
            .next
            .and_then(|n| self.best.get(&n))
            .map_or(0, |b| b.total);
        let total_stack = self.own_stack.get(&address).copied().unwrap_or(0) + below;

        let mut path = vec![address];
        let mut cursor = first.next;
        while let Some(component) = cursor {
            path.push(self.representative[&component]);
            cursor = self.best.get(&component).and_then(|b| b.next);
        }

        Some(StackPath {
            total_stack,
            path,
            recursive: first.recursive,
        })
    }
}
