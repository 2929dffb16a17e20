mod component;
mod render;
mod state;
mod types;

pub use component::FamilyTree;
pub use state::Generation;
