pub mod arena;
pub mod pointer;
pub mod resolver;

pub use arena::{SchemaArena, SchemaId, SchemaNode};
pub use resolver::{Component, RefResolver, Resolution};
