//! Colored De Bruijn Micro-Assembly
//! ================================
//!
//! The graph layer of the caller: strand-annotated nodes and edges, the
//! read-to-graph builder, pruning and compression passes, and the bounded
//! source-to-sink path enumeration.

pub mod builder;
pub mod dot;
pub mod edge;
pub mod flow;
pub mod graph;
pub mod node;
pub mod path;

pub use builder::{GraphBuilder, RefInfos, SequencedRead};
pub use edge::{Edge, EdgeHandle, EdgeKind};
pub use flow::MaxFlowEnumerator;
pub use graph::{ComponentInfo, Graph, NodeMap};
pub use node::{Node, NodeNeighbour};
pub use path::{Path, PathBuilder};
