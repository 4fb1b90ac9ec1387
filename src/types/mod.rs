//! Core types for the temporal web graph.

pub mod node;
pub mod edge;
pub mod slice;
pub mod subnetwork;

pub use node::{Node, NodeId, NodeKind};
pub use edge::{Edge, EdgeType};
pub use slice::{SliceInput, SliceOutcome, SliceReport, TimeMarker, EDGES_FILE, VERTICES_FILE};
pub use subnetwork::SubnetworkResult;
