pub mod common;
pub mod community;
pub mod pathfinding;
pub mod topology;

pub use common::{sorted_intersection, GraphView};
pub use community::{connected_components, ComponentResult};
pub use pathfinding::{
    bfs_layers, bounded_chain, budget_exhausted, can_improve, shortcuts_interior, ChainLimits,
    Layer,
};
pub use topology::{common_neighbor_pairs, CommonNeighbors};
