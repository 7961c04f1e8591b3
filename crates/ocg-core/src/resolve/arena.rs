use std::collections::HashMap;

use crate::parse::schema::SchemaOrRef;

/// Stable identifier of a schema slot, assigned at first sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A schema slot of the document, borrowed for the life of the run.
#[derive(Debug)]
pub struct SchemaNode<'doc> {
    pub slot: &'doc SchemaOrRef,
    /// Local JSON pointer of the slot.
    pub pointer: String,
    /// Registry key when the slot is a `components.schemas` entry.
    pub component: Option<String>,
}

/// Arena of every schema slot the pipeline has touched, indexed by
/// [`SchemaId`] and by pointer.
#[derive(Debug, Default)]
pub struct SchemaArena<'doc> {
    nodes: Vec<SchemaNode<'doc>>,
    by_pointer: HashMap<String, SchemaId>,
}

impl<'doc> SchemaArena<'doc> {
    /// Return the id already assigned to `pointer`, or assign the next one.
    pub fn intern(
        &mut self,
        pointer: &str,
        slot: &'doc SchemaOrRef,
        component: Option<&str>,
    ) -> SchemaId {
        if let Some(id) = self.by_pointer.get(pointer) {
            return *id;
        }
        let id = SchemaId(self.nodes.len());
        self.nodes.push(SchemaNode {
            slot,
            pointer: pointer.to_string(),
            component: component.map(str::to_string),
        });
        self.by_pointer.insert(pointer.to_string(), id);
        id
    }

    pub fn find(&self, pointer: &str) -> Option<SchemaId> {
        self.by_pointer.get(pointer).copied()
    }

    pub fn get(&self, id: SchemaId) -> &SchemaNode<'doc> {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
