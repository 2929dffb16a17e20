use std::collections::HashMap;

use chrono::NaiveDate;
use leptos::prelude::*;
use web_sys::MouseEvent;

use super::state::{HoverTooltip, TreeViewState};
use super::types::{Scene, SceneLink, SceneNode};
use crate::config::AssetPaths;
use crate::model::{PartnerRef, Person, Sex};
use crate::tooltip::{TooltipContent, couple_tooltip, person_tooltip};
use crate::tree::{Couple, Hierarchy, NodeId, Point, TreeEntry, TreeLayout};

pub const PERSON_RADIUS: f64 = 30.0;
pub const PARTNER_RADIUS: f64 = 30.0;
pub const PARTNER_OFFSET: f64 = 45.0;
pub const CONNECTOR_HALF: f64 = 15.0;
const AVATAR_SIZE: f64 = 60.0;

const ACTIVE_STROKE: &str = "#1a73e8";
const IDLE_STROKE: &str = "#ccc";
const RING: &str = "💍";

/// Collect nodes and link paths of the displayed tree.
pub fn scene(tree: &Hierarchy, layout: &TreeLayout, padding: f64) -> Scene {
	let nodes = tree
		.visible()
		.into_iter()
		.filter_map(|id| {
			let p = layout.position(id)?;
			Some(SceneNode {
				id,
				x: p.x,
				y: p.y,
				entry: tree.node(id).entry.clone(),
				collapsible: tree.is_collapsible(id),
			})
		})
		.collect();
	let links = tree
		.links()
		.into_iter()
		.filter_map(|(source, target)| {
			let into_couple = tree.node(target).entry.is_couple();
			Some(SceneLink {
				path: link_path(layout.position(source)?, layout.position(target)?, into_couple),
				into_couple,
			})
		})
		.collect();
	Scene {
		view_box: layout.view_box(padding),
		nodes,
		links,
	}
}

/// Straight line into couples, vertical cubic curve into persons.
pub fn link_path(source: Point, target: Point, into_couple: bool) -> String {
	if into_couple {
		format!("M {} {} L {} {}", source.x, source.y, target.x, target.y)
	} else {
		let mid_y = (source.y + target.y) / 2.0;
		format!(
			"M{},{}C{},{},{},{},{},{}",
			source.x, source.y, source.x, mid_y, target.x, mid_y, target.x, target.y
		)
	}
}

/// Which avatar circle of a node a pattern fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarSlot {
	Single,
	Left,
	Right,
}

/// Pattern ids are keyed by arena index, so they are unique and valid in
/// `url(#...)` whatever the data ids look like.
pub fn pattern_id(node: NodeId, slot: AvatarSlot) -> String {
	match slot {
		AvatarSlot::Single => format!("avatar-{}", node.0),
		AvatarSlot::Left => format!("avatar-{}-left", node.0),
		AvatarSlot::Right => format!("avatar-{}-right", node.0),
	}
}

/// Pattern id and person for every avatar circle in the scene.
pub fn avatar_slots(scene: &Scene) -> Vec<(String, Option<Person>)> {
	scene
		.nodes
		.iter()
		.flat_map(|node| match &node.entry {
			TreeEntry::Person(p) => vec![(pattern_id(node.id, AvatarSlot::Single), Some(p.clone()))],
			TreeEntry::Couple(c) => vec![
				(pattern_id(node.id, AvatarSlot::Left), c.left.clone()),
				(pattern_id(node.id, AvatarSlot::Right), c.right.clone()),
			],
		})
		.collect()
}

/// Signals shared by every glyph of one tree view.
#[derive(Clone, Copy)]
pub struct RenderContext {
	pub tree: RwSignal<Hierarchy>,
	pub view: RwSignal<TreeViewState>,
	/// Resolved avatar path per person id.
	pub avatars: RwSignal<HashMap<String, String>>,
	pub paths: StoredValue<AssetPaths>,
	pub today: NaiveDate,
}

impl RenderContext {
	fn toggle(&self, id: NodeId) {
		self.tree.update(|t| *t = t.toggled(id));
		self.view.update(TreeViewState::hide_tooltip);
	}

	fn show(&self, content: TooltipContent, ev: &MouseEvent) {
		self.view.update(|v| {
			v.show_tooltip(content, f64::from(ev.client_x()), f64::from(ev.client_y()))
		});
	}

	fn hide(&self) {
		self.view.update(TreeViewState::hide_tooltip);
	}

	fn avatar_href(&self, person_id: Option<&str>, sex: Sex) -> String {
		person_id
			.and_then(|id| self.avatars.with(|m| m.get(id).cloned()))
			.unwrap_or_else(|| self.paths.with_value(|p| p.default_avatar(sex)))
	}

	fn partner_tooltip(&self, partner: &PartnerRef, person: Option<&Person>) -> TooltipContent {
		match person {
			Some(p) => person_tooltip(p, self.today),
			None => TooltipContent {
				heading: partner.name.clone(),
				..TooltipContent::default()
			},
		}
	}
}

fn avatar_pattern(ctx: RenderContext, id: String, person: Option<Person>) -> impl IntoView + use<> {
	let (person_id, sex) = match &person {
		Some(p) => (Some(p.id.clone()), p.sex),
		None => (None, Sex::default()),
	};
	view! {
		<pattern id=id width="1" height="1" patternUnits="objectBoundingBox">
			<image
				width=AVATAR_SIZE.to_string()
				height=AVATAR_SIZE.to_string()
				preserveAspectRatio="xMidYMid slice"
				href=move || ctx.avatar_href(person_id.as_deref(), sex)
			/>
		</pattern>
	}
}

/// `<pattern>`s for every avatar in the scene.
pub fn patterns(ctx: RenderContext, scene: &Scene) -> impl IntoView + use<> {
	avatar_slots(scene)
		.into_iter()
		.map(|(id, person)| avatar_pattern(ctx, id, person))
		.collect_view()
}

pub fn links(scene: &Scene) -> impl IntoView + use<> {
	scene
		.links
		.iter()
		.map(|link| {
			view! {
				<path
					class=if link.into_couple { "link link-couple" } else { "link" }
					d=link.path.clone()
					fill="none"
					stroke=IDLE_STROKE
					stroke-width="2"
				/>
			}
		})
		.collect_view()
}

pub fn nodes(ctx: RenderContext, scene: &Scene) -> impl IntoView + use<> {
	scene
		.nodes
		.iter()
		.map(|node| match &node.entry {
			TreeEntry::Person(p) => person_glyph(ctx, node, p.clone()).into_any(),
			TreeEntry::Couple(c) => couple_glyph(ctx, node, c.clone()).into_any(),
		})
		.collect_view()
}

fn translate(node: &SceneNode) -> String {
	format!("translate({},{})", node.x, node.y)
}

fn person_glyph(ctx: RenderContext, node: &SceneNode, person: Person) -> impl IntoView + use<> {
	let id = node.id;
	let stroke = if node.collapsible { ACTIVE_STROKE } else { IDLE_STROKE };
	let fill = format!("url(#{})", pattern_id(id, AvatarSlot::Single));
	view! {
		<g class="node" transform=translate(node)>
			<circle
				r=PERSON_RADIUS.to_string()
				fill=fill
				stroke=stroke
				stroke-width="3"
				style="cursor: pointer;"
				on:click=move |ev: MouseEvent| {
					ev.stop_propagation();
					ctx.toggle(id);
				}
				on:mouseover=move |ev: MouseEvent| ctx.show(person_tooltip(&person, ctx.today), &ev)
				on:mouseout=move |_: MouseEvent| ctx.hide()
			/>
		</g>
	}
}

fn couple_glyph(ctx: RenderContext, node: &SceneNode, couple: Couple) -> impl IntoView + use<> {
	let id = node.id;
	let collapsible = node.collapsible;
	let left_tip = ctx.partner_tooltip(&couple.relationship.partners.left, couple.left.as_ref());
	let right_tip = ctx.partner_tooltip(&couple.relationship.partners.right, couple.right.as_ref());
	let ring_tip = couple_tooltip(&couple, collapsible);
	view! {
		<g class="node relationship" transform=translate(node)>
			<circle
				cx=(-PARTNER_OFFSET).to_string()
				r=PARTNER_RADIUS.to_string()
				fill=format!("url(#{})", pattern_id(id, AvatarSlot::Left))
				stroke=ACTIVE_STROKE
				stroke-width="3"
				on:mouseover=move |ev: MouseEvent| ctx.show(left_tip.clone(), &ev)
				on:mouseout=move |_: MouseEvent| ctx.hide()
			/>
			<line
				x1=(-CONNECTOR_HALF).to_string()
				y1="0"
				x2=CONNECTOR_HALF.to_string()
				y2="0"
				stroke=ACTIVE_STROKE
				stroke-width="3"
				style="pointer-events: none;"
			/>
			<circle
				cx=PARTNER_OFFSET.to_string()
				r=PARTNER_RADIUS.to_string()
				fill=format!("url(#{})", pattern_id(id, AvatarSlot::Right))
				stroke=ACTIVE_STROKE
				stroke-width="3"
				on:mouseover=move |ev: MouseEvent| ctx.show(right_tip.clone(), &ev)
				on:mouseout=move |_: MouseEvent| ctx.hide()
			/>
			<text
				class="ring"
				x="0"
				y="0"
				dy="0.3em"
				text-anchor="middle"
				style="font-size: 14px; cursor: pointer; pointer-events: all;"
				on:click=move |ev: MouseEvent| {
					ev.stop_propagation();
					ctx.toggle(id);
				}
				on:mouseover=move |ev: MouseEvent| ctx.show(ring_tip.clone(), &ev)
				on:mouseout=move |_: MouseEvent| ctx.hide()
			>
				{RING}
			</text>
		</g>
	}
}

pub fn tooltip(tip: HoverTooltip) -> impl IntoView {
	let HoverTooltip { content, x, y } = tip;
	view! {
		<div class="tooltip" style=format!("left: {}px; top: {}px; opacity: 0.9;", x + 10.0, y - 28.0)>
			<strong>{content.heading}</strong>
			{content
				.lines
				.into_iter()
				.map(|line| view! { <br /><span class="detail">{line}</span> })
				.collect_view()}
			{content.hint.map(|hint| view! { <br /><span class="hint">{hint}</span> })}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::LayoutConfig;
	use crate::model::{Family, FamilyDocument};
	use crate::tree::layout;

	fn hierarchy() -> Hierarchy {
		let doc: FamilyDocument = serde_json::from_str(
			r#"{ "nodes": [
				{ "id": "ana", "name": "Ana" },
				{ "id": "luis", "name": "Luis" },
				{ "id": "r1", "name": "Ana y Luis", "isRelationship": true },
				{ "id": "marta", "name": "Marta", "parentId": "r1" },
				{ "id": "jose", "name": "Jose" },
				{ "id": "r2", "name": "Marta y Jose", "isRelationship": true, "parentId": "r1" },
				{ "id": "eva", "name": "Eva", "parentId": "r1" }
			] }"#,
		)
		.unwrap();
		Hierarchy::build(&Family::from_document(&doc).unwrap()).unwrap()
	}

	#[test]
	fn links_into_couples_are_straight() {
		let a = Point { x: 0.0, y: 0.0 };
		let b = Point { x: 120.0, y: 160.0 };
		assert_eq!(link_path(a, b, true), "M 0 0 L 120 160");
		assert_eq!(link_path(a, b, false), "M0,0C0,80,120,80,120,160");
	}

	#[test]
	fn scene_covers_visible_nodes_and_links() {
		let h = hierarchy();
		let l = layout(&h, &LayoutConfig::default());
		let s = scene(&h, &l, 100.0);
		assert_eq!(s.nodes.len(), 3);
		assert_eq!(s.links.len(), 2);
		assert_eq!(s.links.iter().filter(|l| l.into_couple).count(), 1);
		assert!(s.nodes[0].collapsible);
		assert_eq!(s.view_box, l.view_box(100.0));

		let names: Vec<&str> = s.persons().map(|p| p.name.as_str()).collect();
		assert_eq!(names, ["Ana", "Luis", "Marta", "Jose", "Eva"]);
	}

	#[test]
	fn collapsing_drops_descendants_from_scene() {
		let h = hierarchy();
		let collapsed = h.toggled(h.root());
		let s = scene(&collapsed, &layout(&collapsed, &LayoutConfig::default()), 100.0);
		assert_eq!(s.nodes.len(), 1);
		assert!(s.links.is_empty());
		assert!(s.nodes[0].collapsible);
	}

	#[test]
	fn pattern_ids_are_unique_whatever_the_data_ids() {
		let doc: FamilyDocument = serde_json::from_str(
			r#"{ "nodes": [
				{ "id": "a", "name": "Ana" },
				{ "id": "b", "name": "Luis" },
				{ "id": "7", "name": "Ana y Luis", "isRelationship": true },
				{ "id": "left-7", "name": "Marta", "parentId": "7" },
				{ "id": "1.5", "name": "Eva", "parentId": "7" },
				{ "id": "1-5", "name": "Juan", "parentId": "7" },
				{ "id": "ana y luis", "name": "Sara", "parentId": "7" }
			] }"#,
		)
		.unwrap();
		let h = Hierarchy::build(&Family::from_document(&doc).unwrap()).unwrap();
		let s = scene(&h, &layout(&h, &LayoutConfig::default()), 100.0);
		let ids: Vec<String> = avatar_slots(&s).into_iter().map(|(id, _)| id).collect();
		assert_eq!(ids.len(), 6);
		let unique: std::collections::HashSet<&String> = ids.iter().collect();
		assert_eq!(unique.len(), ids.len());
		assert!(ids.iter().all(|id| id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')));
		assert_eq!(ids[0], "avatar-0-left");
		assert_eq!(ids[1], "avatar-0-right");
	}
}
