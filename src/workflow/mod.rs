pub mod builder;
pub mod engine;
pub mod graph;
pub mod types;

pub use builder::PipelineBuilder;
pub use engine::WorkflowEngine;
pub use graph::WorkflowGraph;
pub use types::*;
