pub mod definition;
pub mod registry;

pub use definition::{
    Category, DefinitionFactory, NodeParams, NodeTypeDefinition, NodeTypeRegistration,
    NumericBounds, ParamKind, ParameterSchema, ParameterSpec, PortSpec,
};
pub use registry::NodeCatalog;
