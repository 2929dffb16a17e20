use std::collections::HashMap;

use crate::config::LayoutConfig;

use super::hierarchy::{Hierarchy, NodeId};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

/// Axis-aligned box in layout coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewBox {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl ViewBox {
	/// Parse an SVG `viewBox` attribute.
	pub fn parse(raw: &str) -> Option<Self> {
		let values: Vec<f64> = raw
			.split(|c: char| c.is_whitespace() || c == ',')
			.filter(|s| !s.is_empty())
			.map(str::parse)
			.collect::<Result<_, _>>()
			.ok()?;
		match values.as_slice() {
			[x, y, width, height] => Some(Self {
				x: *x,
				y: *y,
				width: width.abs(),
				height: height.abs(),
			}),
			_ => None,
		}
	}

	pub fn attr(&self) -> String {
		format!("{} {} {} {}", self.x, self.y, self.width, self.height)
	}
}

/// Coordinates of the displayed nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
	positions: HashMap<NodeId, Point>,
	min: Point,
	max: Point,
}

impl TreeLayout {
	pub fn position(&self, id: NodeId) -> Option<Point> {
		self.positions.get(&id).copied()
	}

	pub fn len(&self) -> usize {
		self.positions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}

	/// Bounds of all node centres, padded on every side.
	pub fn view_box(&self, padding: f64) -> ViewBox {
		ViewBox {
			x: self.min.x - padding,
			y: self.min.y - padding,
			width: self.max.x - self.min.x + 2.0 * padding,
			height: self.max.y - self.min.y + 2.0 * padding,
		}
	}
}

// Per-node bookkeeping of the Buchheim/Walker tidy tree algorithm.
#[derive(Clone, Debug)]
struct Walk {
	node: Option<NodeId>,
	parent: Option<usize>,
	children: Vec<usize>,
	/// Sibling index.
	index: usize,
	/// Default ancestor handed to `apportion` for the next sibling.
	default_ancestor: Option<usize>,
	ancestor: usize,
	thread: Option<usize>,
	prelim: f64,
	modifier: f64,
	change: f64,
	shift: f64,
}

impl Walk {
	fn new(slot: usize, node: Option<NodeId>, parent: Option<usize>, index: usize) -> Self {
		Self {
			node,
			parent,
			children: Vec::new(),
			index,
			default_ancestor: None,
			ancestor: slot,
			thread: None,
			prelim: 0.0,
			modifier: 0.0,
			change: 0.0,
			shift: 0.0,
		}
	}
}

struct Walker<'a> {
	tree: &'a Hierarchy,
	config: &'a LayoutConfig,
	walks: Vec<Walk>,
}

/// Lay out the displayed part of the tree.
///
/// x comes from the tidy tree algorithm scaled by `node_width`, y is
/// `depth * level_height`. The root sits at x = 0.
pub fn layout(tree: &Hierarchy, config: &LayoutConfig) -> TreeLayout {
	let mut walker = Walker::new(tree, config);
	let order = walker.post_order();
	for &v in &order {
		walker.first_walk(v);
	}

	// Slot 0 is the virtual parent of the root.
	walker.walks[0].modifier = -walker.walks[1].prelim;
	let mut positions = HashMap::with_capacity(order.len());
	let mut min = Point {
		x: f64::INFINITY,
		y: f64::INFINITY,
	};
	let mut max = Point {
		x: f64::NEG_INFINITY,
		y: f64::NEG_INFINITY,
	};
	for &v in order.iter().rev() {
		let parent_mod = walker.parent(v).map_or(0.0, |p| walker.walks[p].modifier);
		let x = walker.walks[v].prelim + parent_mod;
		walker.walks[v].modifier += parent_mod;
		let Some(id) = walker.walks[v].node else {
			continue;
		};
		let point = Point {
			x: x * config.node_width,
			y: tree.node(id).depth as f64 * config.level_height,
		};
		min.x = min.x.min(point.x);
		min.y = min.y.min(point.y);
		max.x = max.x.max(point.x);
		max.y = max.y.max(point.y);
		positions.insert(id, point);
	}

	TreeLayout {
		positions,
		min,
		max,
	}
}

impl<'a> Walker<'a> {
	fn new(tree: &'a Hierarchy, config: &'a LayoutConfig) -> Self {
		let mut walks = vec![Walk::new(0, None, None, 0), Walk::new(1, Some(tree.root()), Some(0), 0)];
		walks[0].children.push(1);
		let mut stack = vec![1];
		while let Some(slot) = stack.pop() {
			let Some(id) = walks[slot].node else {
				continue;
			};
			for (i, &child) in tree.node(id).children().iter().enumerate() {
				let child_slot = walks.len();
				walks.push(Walk::new(child_slot, Some(child), Some(slot), i));
				walks[slot].children.push(child_slot);
				stack.push(child_slot);
			}
		}
		Self {
			tree,
			config,
			walks,
		}
	}

	/// Slots below the virtual root, children before parents.
	fn post_order(&self) -> Vec<usize> {
		let mut out = Vec::with_capacity(self.walks.len());
		let mut stack = vec![(1, false)];
		while let Some((v, visited)) = stack.pop() {
			if visited {
				out.push(v);
			} else {
				stack.push((v, true));
				stack.extend(self.walks[v].children.iter().rev().map(|&c| (c, false)));
			}
		}
		out
	}

	fn parent(&self, v: usize) -> Option<usize> {
		self.walks[v].parent
	}

	fn separation(&self, a: usize, b: usize) -> f64 {
		let is_couple = |slot: usize| {
			self.walks[slot]
				.node
				.is_some_and(|id| self.tree.node(id).entry.is_couple())
		};
		if is_couple(a) && is_couple(b) {
			self.config.couple_separation
		} else {
			self.config.sibling_separation
		}
	}

	fn next_left(&self, v: usize) -> Option<usize> {
		self.walks[v].children.first().copied().or(self.walks[v].thread)
	}

	fn next_right(&self, v: usize) -> Option<usize> {
		self.walks[v].children.last().copied().or(self.walks[v].thread)
	}

	fn left_sibling(&self, v: usize) -> Option<usize> {
		let index = self.walks[v].index;
		if index == 0 {
			return None;
		}
		self.parent(v).map(|p| self.walks[p].children[index - 1])
	}

	fn first_walk(&mut self, v: usize) {
		let Some(parent) = self.parent(v) else {
			return;
		};
		let w = self.left_sibling(v);
		if let (Some(&first), Some(&last)) = (
			self.walks[v].children.first(),
			self.walks[v].children.last(),
		) {
			self.execute_shifts(v);
			let midpoint = (self.walks[first].prelim + self.walks[last].prelim) / 2.0;
			if let Some(w) = w {
				self.walks[v].prelim = self.walks[w].prelim + self.separation(v, w);
				self.walks[v].modifier = self.walks[v].prelim - midpoint;
			} else {
				self.walks[v].prelim = midpoint;
			}
		} else if let Some(w) = w {
			self.walks[v].prelim = self.walks[w].prelim + self.separation(v, w);
		}
		let ancestor = self.walks[parent]
			.default_ancestor
			.unwrap_or(self.walks[parent].children[0]);
		self.walks[parent].default_ancestor = Some(self.apportion(v, w, ancestor));
	}

	fn apportion(&mut self, v: usize, w: Option<usize>, mut ancestor: usize) -> usize {
		let Some(w) = w else {
			return ancestor;
		};
		let Some(parent) = self.parent(v) else {
			return ancestor;
		};
		let (mut vip, mut vop, mut vim) = (v, v, w);
		let mut vom = self.walks[parent].children[0];
		let mut sip = self.walks[vip].modifier;
		let mut sop = self.walks[vop].modifier;
		let mut sim = self.walks[vim].modifier;
		let mut som = self.walks[vom].modifier;

		let mut next_im = self.next_right(vim);
		let mut next_ip = self.next_left(vip);
		while let (Some(im), Some(ip)) = (next_im, next_ip) {
			vim = im;
			vip = ip;
			vom = self.next_left(vom).unwrap_or(vom);
			vop = self.next_right(vop).unwrap_or(vop);
			self.walks[vop].ancestor = v;
			let shift = self.walks[vim].prelim + sim - self.walks[vip].prelim - sip
				+ self.separation(vim, vip);
			if shift > 0.0 {
				let from = self.next_ancestor(vim, v, ancestor);
				self.move_subtree(from, v, shift);
				sip += shift;
				sop += shift;
			}
			sim += self.walks[vim].modifier;
			sip += self.walks[vip].modifier;
			som += self.walks[vom].modifier;
			sop += self.walks[vop].modifier;
			next_im = self.next_right(vim);
			next_ip = self.next_left(vip);
		}

		if let Some(im) = next_im {
			if self.next_right(vop).is_none() {
				self.walks[vop].thread = Some(im);
				self.walks[vop].modifier += sim - sop;
			}
		}
		if let Some(ip) = next_ip {
			if self.next_left(vom).is_none() {
				self.walks[vom].thread = Some(ip);
				self.walks[vom].modifier += sip - som;
				ancestor = v;
			}
		}
		ancestor
	}

	fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
		let candidate = self.walks[vim].ancestor;
		if self.parent(candidate) == self.parent(v) {
			candidate
		} else {
			ancestor
		}
	}

	fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
		let span = self.walks[wp].index as f64 - self.walks[wm].index as f64;
		let change = shift / span;
		self.walks[wp].change -= change;
		self.walks[wp].shift += shift;
		self.walks[wm].change += change;
		self.walks[wp].prelim += shift;
		self.walks[wp].modifier += shift;
	}

	fn execute_shifts(&mut self, v: usize) {
		let (mut shift, mut change) = (0.0, 0.0);
		for i in (0..self.walks[v].children.len()).rev() {
			let w = self.walks[v].children[i];
			self.walks[w].prelim += shift;
			self.walks[w].modifier += shift;
			change += self.walks[w].change;
			shift += self.walks[w].shift + change;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Family, FamilyDocument};

	fn hierarchy(json: &str) -> Hierarchy {
		let doc: FamilyDocument = serde_json::from_str(json).unwrap();
		Hierarchy::build(&Family::from_document(&doc).unwrap()).unwrap()
	}

	fn x_of(h: &Hierarchy, l: &TreeLayout, id: &str) -> f64 {
		l.position(h.find(id).unwrap()).unwrap().x
	}

	const FAN: &str = r#"{ "nodes": [
		{ "id": "root", "name": "Root" },
		{ "id": "a", "name": "A", "parentId": "root" },
		{ "id": "b", "name": "B", "parentId": "root" },
		{ "id": "c", "name": "C", "parentId": "root" }
	] }"#;

	#[test]
	fn single_node_sits_at_origin() {
		let h = hierarchy(r#"{ "nodes": [ { "id": "x", "name": "X" } ] }"#);
		let l = layout(&h, &LayoutConfig::default());
		assert_eq!(l.position(h.root()), Some(Point { x: 0.0, y: 0.0 }));
		assert_eq!(
			l.view_box(100.0),
			ViewBox {
				x: -100.0,
				y: -100.0,
				width: 200.0,
				height: 200.0
			}
		);
	}

	#[test]
	fn children_are_centred_under_parent() {
		let h = hierarchy(FAN);
		let l = layout(&h, &LayoutConfig::default());
		assert_eq!(x_of(&h, &l, "root"), 0.0);
		assert_eq!(x_of(&h, &l, "a"), -240.0);
		assert_eq!(x_of(&h, &l, "b"), 0.0);
		assert_eq!(x_of(&h, &l, "c"), 240.0);
		assert_eq!(l.position(h.find("a").unwrap()).unwrap().y, 160.0);
	}

	#[test]
	fn couples_are_spread_wider() {
		let h = hierarchy(
			r#"{ "nodes": [
				{ "id": "root", "name": "Root" },
				{ "id": "r1", "name": "A y B", "isRelationship": true, "parentId": "root" },
				{ "id": "r2", "name": "C y D", "isRelationship": true, "parentId": "root" }
			] }"#,
		);
		let l = layout(&h, &LayoutConfig::default());
		assert_eq!(x_of(&h, &l, "r2") - x_of(&h, &l, "r1"), 300.0);
	}

	#[test]
	fn subtrees_do_not_overlap() {
		let h = hierarchy(
			r#"{ "nodes": [
				{ "id": "root", "name": "Root" },
				{ "id": "a", "name": "A", "parentId": "root" },
				{ "id": "b", "name": "B", "parentId": "root" },
				{ "id": "a1", "name": "A1", "parentId": "a" },
				{ "id": "a2", "name": "A2", "parentId": "a" },
				{ "id": "b1", "name": "B1", "parentId": "b" },
				{ "id": "b2", "name": "B2", "parentId": "b" }
			] }"#,
		);
		let l = layout(&h, &LayoutConfig::default());
		let row: Vec<f64> = ["a1", "a2", "b1", "b2"]
			.iter()
			.map(|id| x_of(&h, &l, id))
			.collect();
		for pair in row.windows(2) {
			assert!(pair[1] - pair[0] >= 240.0, "{row:?}");
		}
		assert_eq!(x_of(&h, &l, "root"), 0.0);
	}

	#[test]
	fn collapsed_children_are_not_laid_out() {
		let h = hierarchy(FAN);
		let collapsed = h.toggled(h.root());
		let l = layout(&collapsed, &LayoutConfig::default());
		assert_eq!(l.len(), 1);
		assert!(l.position(h.find("a").unwrap()).is_none());
	}

	#[test]
	fn layout_is_deterministic() {
		let h = hierarchy(FAN);
		let config = LayoutConfig::default();
		assert_eq!(layout(&h, &config), layout(&h, &config));
	}

	#[test]
	fn view_box_round_trips_through_attribute() {
		let vb = ViewBox::parse("-340 -100 680 520").unwrap();
		assert_eq!(vb.width, 680.0);
		assert_eq!(ViewBox::parse(&vb.attr()), Some(vb));
		assert_eq!(ViewBox::parse("1 2 3"), None);
	}
}
