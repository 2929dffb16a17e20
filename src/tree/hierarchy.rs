use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::StructureError;
use crate::model::{Family, FamilyNode, PartnerRef, Person, Relationship};

/// Index of a node inside its [`Hierarchy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A relationship together with the two persons it absorbed.
#[derive(Clone, Debug, PartialEq)]
pub struct Couple {
	pub relationship: Relationship,
	pub left: Option<Person>,
	pub right: Option<Person>,
}

impl Couple {
	pub fn partners(&self) -> impl Iterator<Item = &Person> {
		self.left.iter().chain(self.right.iter())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum TreeEntry {
	Person(Person),
	Couple(Couple),
}

impl TreeEntry {
	pub fn id(&self) -> &str {
		match self {
			TreeEntry::Person(p) => &p.id,
			TreeEntry::Couple(c) => &c.relationship.id,
		}
	}

	pub fn name(&self) -> &str {
		match self {
			TreeEntry::Person(p) => &p.name,
			TreeEntry::Couple(c) => &c.relationship.name,
		}
	}

	pub fn is_couple(&self) -> bool {
		matches!(self, TreeEntry::Couple(_))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
	pub entry: TreeEntry,
	pub parent: Option<NodeId>,
	pub depth: usize,
	children: Vec<NodeId>,
	hidden: Vec<NodeId>,
}

impl HierarchyNode {
	/// Children currently displayed.
	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// Children cached while the node is collapsed.
	pub fn hidden_children(&self) -> &[NodeId] {
		&self.hidden
	}

	pub fn is_collapsed(&self) -> bool {
		!self.hidden.is_empty()
	}
}

/// Single rooted tree of persons and couples.
///
/// Nodes live in an arena; `NodeId`s are stable across toggles, so a toggled
/// copy can be laid out and rendered against the same ids.
#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy {
	nodes: Vec<HierarchyNode>,
	root: NodeId,
}

impl Hierarchy {
	/// Build the tree for a family.
	///
	/// Persons named as partners of a relationship are absorbed into the couple
	/// node. A node hangs under its own `parentId`; a couple without one takes
	/// the place of the first partner that has a parent. References to an
	/// absorbed person are redirected to the couple that absorbed them.
	pub fn build(family: &Family) -> Result<Self, StructureError> {
		let mut seen = HashSet::new();
		for node in &family.nodes {
			if !seen.insert(node.id()) {
				return Err(StructureError::DuplicateId(node.id().to_string()));
			}
		}

		let mut absorbed: HashMap<&str, &str> = HashMap::new();
		for rel in family.relationships() {
			for partner in rel.partners.iter() {
				if let Some(pid) = partner.person_id.as_deref() {
					absorbed.entry(pid).or_insert(rel.id.as_str());
				}
			}
		}

		let entries: Vec<TreeEntry> = family
			.nodes
			.iter()
			.filter_map(|node| match node {
				FamilyNode::Person(p) if absorbed.contains_key(p.id.as_str()) => None,
				FamilyNode::Person(p) => Some(TreeEntry::Person(p.clone())),
				FamilyNode::Relationship(r) => Some(TreeEntry::Couple(Couple {
					relationship: r.clone(),
					left: partner_person(family, &r.partners.left),
					right: partner_person(family, &r.partners.right),
				})),
			})
			.collect();

		let index: HashMap<&str, usize> = entries
			.iter()
			.enumerate()
			.map(|(i, e)| (e.id(), i))
			.collect();

		let mut parents = Vec::with_capacity(entries.len());
		for entry in &entries {
			let declared = match entry {
				TreeEntry::Person(p) => p.parent_id.as_deref(),
				TreeEntry::Couple(c) => c
					.relationship
					.parent_id
					.as_deref()
					.or_else(|| c.partners().find_map(|p| p.parent_id.as_deref())),
			};
			let parent = match declared {
				None => None,
				Some(pid) => {
					let target = absorbed.get(pid).copied().unwrap_or(pid);
					match index.get(target) {
						Some(&i) => Some(i),
						None => {
							return Err(StructureError::UnknownParent {
								child: entry.id().to_string(),
								parent: pid.to_string(),
							});
						}
					}
				}
			};
			parents.push(parent);
		}

		let roots: Vec<usize> = (0..entries.len()).filter(|&i| parents[i].is_none()).collect();
		let root = match roots.as_slice() {
			[] => return Err(StructureError::NoRoot),
			[root] => *root,
			many => {
				return Err(StructureError::MultipleRoots(
					many.iter().map(|&i| entries[i].id().to_string()).collect(),
				));
			}
		};

		let mut children = vec![Vec::new(); entries.len()];
		for (i, parent) in parents.iter().enumerate() {
			if let Some(p) = parent {
				children[*p].push(NodeId(i));
			}
		}

		let mut depths = vec![None; entries.len()];
		let mut stack = vec![(root, 0)];
		while let Some((i, depth)) = stack.pop() {
			depths[i] = Some(depth);
			stack.extend(children[i].iter().map(|c| (c.0, depth + 1)));
		}
		let unreachable: Vec<String> = depths
			.iter()
			.enumerate()
			.filter(|(_, d)| d.is_none())
			.map(|(i, _)| entries[i].id().to_string())
			.collect();
		if !unreachable.is_empty() {
			return Err(StructureError::Cycle(unreachable));
		}

		let nodes: Vec<HierarchyNode> = entries
			.into_iter()
			.zip(children)
			.enumerate()
			.map(|(i, (entry, children))| HierarchyNode {
				entry,
				parent: parents[i].map(NodeId),
				depth: depths[i].unwrap_or_default(),
				children,
				hidden: Vec::new(),
			})
			.collect();
		debug!(
			"built hierarchy: {} nodes, {} absorbed partners",
			nodes.len(),
			absorbed.len()
		);

		Ok(Self {
			nodes,
			root: NodeId(root),
		})
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Number of nodes, displayed or hidden.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn get(&self, id: NodeId) -> Option<&HierarchyNode> {
		self.nodes.get(id.0)
	}

	/// Panics on an id that does not belong to this hierarchy.
	pub fn node(&self, id: NodeId) -> &HierarchyNode {
		&self.nodes[id.0]
	}

	pub fn find(&self, entry_id: &str) -> Option<NodeId> {
		self.nodes
			.iter()
			.position(|n| n.entry.id() == entry_id)
			.map(NodeId)
	}

	/// Whether clicking the node changes anything.
	pub fn is_collapsible(&self, id: NodeId) -> bool {
		self.get(id)
			.is_some_and(|n| !n.children.is_empty() || !n.hidden.is_empty())
	}

	/// Displayed nodes in pre-order.
	pub fn visible(&self) -> Vec<NodeId> {
		let mut out = Vec::with_capacity(self.nodes.len());
		let mut stack = vec![self.root];
		while let Some(id) = stack.pop() {
			out.push(id);
			stack.extend(self.node(id).children.iter().rev());
		}
		out
	}

	/// Displayed parent → child pairs.
	pub fn links(&self) -> Vec<(NodeId, NodeId)> {
		self.visible()
			.into_iter()
			.flat_map(|p| self.node(p).children.iter().map(move |&c| (p, c)))
			.collect()
	}

	/// Copy with `id` collapsed if expanded, or expanded if collapsed.
	pub fn toggled(&self, id: NodeId) -> Self {
		let mut next = self.clone();
		if let Some(node) = next.nodes.get_mut(id.0) {
			if !node.children.is_empty() {
				node.hidden = std::mem::take(&mut node.children);
			} else if !node.hidden.is_empty() {
				node.children = std::mem::take(&mut node.hidden);
			}
		}
		next
	}

	pub fn expanded_all(&self) -> Self {
		let mut next = self.clone();
		for node in &mut next.nodes {
			if !node.hidden.is_empty() {
				node.children = std::mem::take(&mut node.hidden);
			}
		}
		next
	}

	/// Copy with every node collapsed; only the root stays visible.
	pub fn collapsed_all(&self) -> Self {
		let mut next = self.clone();
		for node in &mut next.nodes {
			if !node.children.is_empty() {
				node.hidden = std::mem::take(&mut node.children);
			}
		}
		next
	}
}

fn partner_person(family: &Family, partner: &PartnerRef) -> Option<Person> {
	partner
		.person_id
		.as_deref()
		.and_then(|id| family.person(id))
		.cloned()
}
