//! Emission order for a [`ParseResult`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::{debug, warn};
use petgraph::Direction;
use petgraph::algo::kosaraju_scc;
use petgraph::graphmap::DiGraphMap;

use crate::ir::{IrOperation, ParseResult, TypeDecl, TypeId, TypeTable};

/// Declarations and operations in the order a backend emits them.
#[derive(Debug, Clone)]
pub struct SynthesisPlan<'a> {
    pub result: &'a ParseResult,
    /// Every declaration after the ones it depends on.
    pub types: Vec<&'a TypeDecl>,
    /// Document path order, then fixed method order within a path.
    pub operations: Vec<&'a IrOperation>,
}

/// Order the extracted declarations and operations for rendering.
pub fn plan(result: &ParseResult) -> SynthesisPlan<'_> {
    let order = dependency_order(&result.types);
    debug!(
        "planned {} types and {} operations",
        order.len(),
        result.operations.len()
    );
    SynthesisPlan {
        result,
        types: order.into_iter().map(|id| result.types.get(id)).collect(),
        operations: result.operations.iter().collect(),
    }
}

/// Topological order over non-recursive use sites, ties broken by first-seen
/// position.
fn dependency_order(types: &TypeTable) -> Vec<TypeId> {
    let mut graph = DiGraphMap::<TypeId, ()>::new();
    for decl in types.iter() {
        graph.add_node(decl.id);
    }
    for decl in types.iter() {
        for dep in decl.dependencies() {
            if dep != decl.id {
                graph.add_edge(dep, decl.id, ());
            }
        }
    }

    let mut pending: Vec<usize> = types
        .iter()
        .map(|decl| {
            graph
                .neighbors_directed(decl.id, Direction::Incoming)
                .count()
        })
        .collect();
    let mut ready: BinaryHeap<Reverse<(usize, TypeId)>> = types
        .iter()
        .filter(|decl| pending[decl.id.index()] == 0)
        .map(|decl| Reverse((decl.first_seen, decl.id)))
        .collect();

    let mut order = Vec::with_capacity(types.len());
    while let Some(Reverse((_, id))) = ready.pop() {
        order.push(id);
        for next in graph.neighbors_directed(id, Direction::Outgoing) {
            let count = &mut pending[next.index()];
            *count -= 1;
            if *count == 0 {
                ready.push(Reverse((types.get(next).first_seen, next)));
            }
        }
    }

    if order.len() < types.len() {
        for cycle in kosaraju_scc(&graph).into_iter().filter(|scc| scc.len() > 1) {
            let names: Vec<_> = cycle.iter().map(|id| types.get(*id).name.as_str()).collect();
            warn!("dependency cycle among {}", names.join(", "));
        }
        let mut rest: Vec<&TypeDecl> = types
            .iter()
            .filter(|decl| pending[decl.id.index()] > 0)
            .collect();
        rest.sort_by_key(|decl| decl.first_seen);
        order.extend(rest.into_iter().map(|decl| decl.id));
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{RecordDecl, TypeDeclKind, TypeRef};

    fn decl(id: usize, deps: &[(usize, bool)]) -> TypeDecl {
        let variants = deps
            .iter()
            .map(|(dep, recursive)| TypeRef::Named {
                id: TypeId(*dep),
                name: format!("T{dep}"),
                recursive: *recursive,
            })
            .collect();
        TypeDecl {
            id: TypeId(id),
            name: format!("T{id}"),
            kind: TypeDeclKind::Alias(TypeRef::Union(variants)),
            description: None,
            location: String::new(),
            first_seen: id,
            deprecated: false,
        }
    }

    fn names(types: &TypeTable) -> Vec<String> {
        dependency_order(types)
            .into_iter()
            .map(|id| types.get(id).name.clone())
            .collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let types = TypeTable::from_decls(vec![
            decl(0, &[(2, false)]),
            decl(1, &[]),
            decl(2, &[(1, false)]),
        ]);
        assert_eq!(names(&types), vec!["T1", "T2", "T0"]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let types = TypeTable::from_decls(vec![decl(0, &[]), decl(1, &[]), decl(2, &[])]);
        assert_eq!(names(&types), vec!["T0", "T1", "T2"]);
    }

    #[test]
    fn test_recursive_edges_ignored() {
        let types = TypeTable::from_decls(vec![
            decl(0, &[(1, false)]),
            decl(1, &[(0, true)]),
        ]);
        assert_eq!(names(&types), vec!["T1", "T0"]);
    }

    #[test]
    fn test_unbroken_cycle_falls_back_to_first_seen() {
        let types = TypeTable::from_decls(vec![
            decl(0, &[]),
            decl(1, &[(2, false)]),
            decl(2, &[(1, false)]),
        ]);
        assert_eq!(names(&types), vec!["T0", "T1", "T2"]);
    }

    #[test]
    fn test_plan_keeps_operation_order() {
        let result = ParseResult {
            info: crate::ir::IrInfo {
                title: "T".to_string(),
                description: None,
                version: "1".to_string(),
            },
            base_url: None,
            servers: Vec::new(),
            security: Vec::new(),
            common_headers: Vec::new(),
            common_params: Vec::new(),
            operations: Vec::new(),
            types: TypeTable::from_decls(vec![TypeDecl {
                kind: TypeDeclKind::Record(RecordDecl {
                    fields: Vec::new(),
                    extra: Default::default(),
                }),
                ..decl(0, &[])
            }]),
            diagnostics: Vec::new(),
        };
        let plan = plan(&result);
        assert_eq!(plan.types.len(), 1);
        assert!(plan.operations.is_empty());
    }
}
