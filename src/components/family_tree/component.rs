use std::collections::HashMap;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;
use web_sys::{MouseEvent, WheelEvent};

use super::render::{self, RenderContext};
use super::state::{AvatarProbes, TreeViewState};
use crate::avatar;
use crate::config::AppConfig;
use crate::dates::today;
use crate::loader::LoadedFamily;
use crate::model::Person;
use crate::tree::layout;

#[component]
pub fn FamilyTree(
	loaded: LoadedFamily,
	#[prop(default = AppConfig::default())] config: AppConfig,
) -> impl IntoView {
	let svg_ref = NodeRef::<leptos::svg::Svg>::new();
	let LoadedFamily {
		paths, hierarchy, ..
	} = loaded;

	let ctx = RenderContext {
		tree: RwSignal::new(hierarchy),
		view: RwSignal::new(TreeViewState::new(config.zoom_extent)),
		avatars: RwSignal::new(HashMap::new()),
		paths: StoredValue::new(paths),
		today: today(),
	};
	let expanded = RwSignal::new(true);

	let (layout_config, padding) = (config.layout.clone(), config.view_padding);
	let scene = Memo::new(move |_| {
		ctx.tree
			.with(|t| render::scene(t, &layout(t, &layout_config), padding))
	});
	let tooltip = Memo::new(move |_| ctx.view.with(|v| v.tooltip.clone()));

	let probes = StoredValue::new(AvatarProbes::default());
	Effect::new(move |_| {
		let displayed: Vec<Person> = scene.with(|s| s.persons().cloned().collect());
		let (tag, start) = ctx.avatars.with_untracked(|resolved| {
			probes
				.try_update_value(|state| {
					state.begin_pass(displayed.iter().map(|p| p.id.as_str()), |id| {
						resolved.contains_key(id)
					})
				})
				.unwrap_or_default()
		});
		if start.is_empty() {
			return;
		}
		debug!("resolving {} avatars (pass {tag})", start.len());
		let paths = ctx.paths.get_value();
		for person in displayed.into_iter().filter(|p| start.contains(&p.id)) {
			let paths = paths.clone();
			spawn_local(async move {
				let href = avatar::resolve(&paths, &person).await;
				let keep = probes
					.try_update_value(|state| state.settle(tag, &person.id))
					.unwrap_or(false);
				if !keep {
					debug!("dropping stale avatar for '{}'", person.id);
					return;
				}
				ctx.avatars.try_update(|m| {
					m.insert(person.id, href);
				});
			});
		}
	});

	// Pointer position relative to the SVG element, and the element size.
	let pointer = move |ev: &MouseEvent| -> Option<(f64, f64, f64, f64)> {
		let svg = svg_ref.get_untracked()?;
		let rect = svg.get_bounding_client_rect();
		Some((
			f64::from(ev.client_x()) - rect.left(),
			f64::from(ev.client_y()) - rect.top(),
			rect.width(),
			rect.height(),
		))
	};

	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y, _, _)) = pointer(&ev) {
			ctx.view.update(|v| v.start_pan(x, y));
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if !ctx.view.with_untracked(|v| v.pan.active) {
			return;
		}
		let Some((x, y, w, h)) = pointer(&ev) else {
			return;
		};
		let scale = scene.with_untracked(|s| TreeViewState::fit_scale(&s.view_box, w, h));
		ctx.view.update(|v| v.pan_to(x, y, scale));
	};

	let on_mouseup = move |_: MouseEvent| ctx.view.update(TreeViewState::end_pan);

	let on_mouseleave = move |_: MouseEvent| {
		ctx.view.update(|v| {
			v.end_pan();
			v.hide_tooltip();
		})
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y, w, h)) = pointer(&ev) else {
			return;
		};
		let (vx, vy) =
			scene.with_untracked(|s| TreeViewState::screen_to_view(&s.view_box, w, h, x, y));
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		ctx.view.update(|v| v.zoom_at(vx, vy, factor));
	};

	let on_toggle_all = move |_: MouseEvent| {
		let expand = !expanded.get_untracked();
		ctx.tree.update(|t| {
			*t = if expand {
				t.expanded_all()
			} else {
				t.collapsed_all()
			}
		});
		expanded.set(expand);
		ctx.view.update(TreeViewState::recenter);
	};

	let on_center = move |_: MouseEvent| ctx.view.update(TreeViewState::recenter);

	view! {
		<div class="tree-controls">
			<button
				id="toggle-tree"
				class="control-button"
				title="Expandir/Colapsar todo"
				on:click=on_toggle_all
			>
				{move || if expanded.get() { "⤢" } else { "⤡" }}
			</button>
			<button id="center-tree" class="control-button" title="Centrar árbol" on:click=on_center>
				"⌖"
			</button>
		</div>
		<svg
			node_ref=svg_ref
			class="family-tree"
			width="100%"
			height="100%"
			viewBox=move || scene.with(|s| s.view_box.attr())
			style="cursor: grab;"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
		>
			<defs>{move || scene.with(|s| render::patterns(ctx, s))}</defs>
			<g class="viewport" transform=move || ctx.view.with(|v| v.transform.attr())>
				<g class="links-group">{move || scene.with(render::links)}</g>
				<g class="nodes-group">{move || scene.with(|s| render::nodes(ctx, s))}</g>
			</g>
		</svg>
		{move || tooltip.get().map(render::tooltip)}
	}
}
