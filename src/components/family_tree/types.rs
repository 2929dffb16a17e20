use crate::model::Person;
use crate::tree::{NodeId, TreeEntry, ViewBox};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
	pub id: NodeId,
	pub x: f64,
	pub y: f64,
	pub entry: TreeEntry,
	pub collapsible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneLink {
	/// SVG path data.
	pub path: String,
	pub into_couple: bool,
}

/// Everything one render pass draws.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub view_box: ViewBox,
	pub nodes: Vec<SceneNode>,
	pub links: Vec<SceneLink>,
}

impl Scene {
	/// Persons drawn in this scene, partners included.
	pub fn persons(&self) -> impl Iterator<Item = &Person> {
		self.nodes.iter().flat_map(|node| {
			let persons: Vec<&Person> = match &node.entry {
				TreeEntry::Person(p) => vec![p],
				TreeEntry::Couple(c) => c.partners().collect(),
			};
			persons
		})
	}
}
