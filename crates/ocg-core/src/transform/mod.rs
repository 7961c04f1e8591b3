pub mod extract;
pub mod name_normalizer;
pub mod type_mapper;

pub use extract::extract;
