//! Family hierarchy and its tidy tree layout.

mod hierarchy;
mod layout;

pub use hierarchy::{Couple, Hierarchy, HierarchyNode, NodeId, TreeEntry};
pub use layout::{Point, TreeLayout, ViewBox, layout};
