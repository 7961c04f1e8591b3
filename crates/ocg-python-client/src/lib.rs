pub mod emitters;
pub mod generator;
pub mod reserved;
pub mod type_mapper;

pub use generator::PythonClientGenerator;
