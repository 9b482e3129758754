pub mod registry;
pub mod schema;

pub use registry::{describe, invoke, list_operations, OperationDescriptor};
