use std::collections::HashSet;

use crate::tooltip::TooltipContent;
use crate::tree::ViewBox;

/// Pan/zoom applied to the tree group, in viewBox units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn attr(&self) -> String {
		format!("translate({},{}) scale({})", self.x, self.y, self.k)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Tooltip anchored at viewport (client) coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverTooltip {
	pub content: TooltipContent,
	pub x: f64,
	pub y: f64,
}

/// Interaction state of the tree view.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeViewState {
	pub transform: ViewTransform,
	pub pan: PanState,
	pub tooltip: Option<HoverTooltip>,
	pub zoom_extent: (f64, f64),
}

impl TreeViewState {
	pub fn new(zoom_extent: (f64, f64)) -> Self {
		Self {
			transform: ViewTransform::default(),
			pan: PanState::default(),
			tooltip: None,
			zoom_extent,
		}
	}

	/// Screen pixels per viewBox unit when the box is fitted ("meet") into an
	/// element of `width` x `height` pixels.
	pub fn fit_scale(view_box: &ViewBox, width: f64, height: f64) -> f64 {
		if view_box.width <= 0.0 || view_box.height <= 0.0 {
			return 1.0;
		}
		let scale = (width / view_box.width).min(height / view_box.height);
		if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
	}

	/// Map a point relative to the SVG element into viewBox coordinates.
	pub fn screen_to_view(view_box: &ViewBox, width: f64, height: f64, sx: f64, sy: f64) -> (f64, f64) {
		let s = Self::fit_scale(view_box, width, height);
		let (ox, oy) = (
			(width - view_box.width * s) / 2.0,
			(height - view_box.height * s) / 2.0,
		);
		(view_box.x + (sx - ox) / s, view_box.y + (sy - oy) / s)
	}

	pub fn start_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	/// Follow the pointer while panning; `scale` is pixels per viewBox unit.
	pub fn pan_to(&mut self, sx: f64, sy: f64, scale: f64) {
		if !self.pan.active {
			return;
		}
		self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x) / scale;
		self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y) / scale;
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zoom by `factor` keeping the viewBox point (vx, vy) fixed.
	pub fn zoom_at(&mut self, vx: f64, vy: f64, factor: f64) {
		let (min, max) = self.zoom_extent;
		let new_k = (self.transform.k * factor).clamp(min, max);
		let ratio = new_k / self.transform.k;
		self.transform.x = vx - (vx - self.transform.x) * ratio;
		self.transform.y = vy - (vy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Back to the fitted tree.
	pub fn recenter(&mut self) {
		self.transform = ViewTransform::default();
		self.pan = PanState::default();
	}

	pub fn show_tooltip(&mut self, content: TooltipContent, x: f64, y: f64) {
		self.tooltip = Some(HoverTooltip { content, x, y });
	}

	pub fn hide_tooltip(&mut self) {
		self.tooltip = None;
	}
}

/// Monotonic tag for async work; only work tagged with the latest value is
/// current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
	/// Supersede all earlier work and return the new tag.
	pub fn begin(&mut self) -> u64 {
		self.0 += 1;
		self.0
	}

	pub fn is_current(&self, tag: u64) -> bool {
		self.0 == tag
	}
}

/// Bookkeeping of avatar probes across render passes.
///
/// A probe still running for a displayed person is not restarted. A probe
/// that settles after a newer pass is only accepted when its person is still
/// displayed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AvatarProbes {
	generation: Generation,
	displayed: HashSet<String>,
	in_flight: HashSet<String>,
}

impl AvatarProbes {
	/// Start a render pass showing `displayed`. Returns the pass tag and the
	/// ids that need a probe: not `resolved` and not already in flight.
	pub fn begin_pass<'a>(
		&mut self,
		displayed: impl IntoIterator<Item = &'a str>,
		resolved: impl Fn(&str) -> bool,
	) -> (u64, Vec<String>) {
		let tag = self.generation.begin();
		self.displayed = displayed.into_iter().map(str::to_string).collect();
		let mut start: Vec<String> = self
			.displayed
			.iter()
			.filter(|id| !resolved(id) && !self.in_flight.contains(*id))
			.cloned()
			.collect();
		start.sort();
		self.in_flight.extend(start.iter().cloned());
		(tag, start)
	}

	/// Settle the probe for `id` started in pass `tag`; true when its result
	/// should be stored.
	pub fn settle(&mut self, tag: u64, id: &str) -> bool {
		self.in_flight.remove(id);
		self.generation.is_current(tag) || self.displayed.contains(id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vb() -> ViewBox {
		ViewBox {
			x: -100.0,
			y: -100.0,
			width: 400.0,
			height: 200.0,
		}
	}

	#[test]
	fn fit_scale_uses_the_tighter_axis() {
		assert_eq!(TreeViewState::fit_scale(&vb(), 800.0, 800.0), 2.0);
		assert_eq!(TreeViewState::fit_scale(&vb(), 800.0, 200.0), 1.0);
	}

	#[test]
	fn screen_maps_to_view_box_with_letterboxing() {
		// 800x800 element, box drawn 800x400 centred vertically (200px bars).
		let (x, y) = TreeViewState::screen_to_view(&vb(), 800.0, 800.0, 0.0, 200.0);
		assert_eq!((x, y), (-100.0, -100.0));
		let (x, y) = TreeViewState::screen_to_view(&vb(), 800.0, 800.0, 400.0, 400.0);
		assert_eq!((x, y), (100.0, 0.0));
	}

	#[test]
	fn zoom_is_clamped_and_keeps_anchor() {
		let mut state = TreeViewState::new((0.5, 2.0));
		state.zoom_at(10.0, 20.0, 1.1);
		assert!((state.transform.k - 1.1).abs() < 1e-9);
		// The anchor point stays where it was on screen.
		let (ax, ay) = (
			10.0 * state.transform.k + state.transform.x,
			20.0 * state.transform.k + state.transform.y,
		);
		assert!((ax - 10.0).abs() < 1e-9 && (ay - 20.0).abs() < 1e-9);

		for _ in 0..50 {
			state.zoom_at(0.0, 0.0, 1.1);
		}
		assert_eq!(state.transform.k, 2.0);
		for _ in 0..50 {
			state.zoom_at(0.0, 0.0, 0.9);
		}
		assert_eq!(state.transform.k, 0.5);
	}

	#[test]
	fn pan_moves_by_screen_delta_over_scale() {
		let mut state = TreeViewState::new((0.5, 2.0));
		state.pan_to(50.0, 50.0, 2.0);
		assert_eq!(state.transform, ViewTransform::default());

		state.start_pan(10.0, 10.0);
		state.pan_to(30.0, 50.0, 2.0);
		assert_eq!((state.transform.x, state.transform.y), (10.0, 20.0));
		state.end_pan();
		state.pan_to(100.0, 100.0, 2.0);
		assert_eq!((state.transform.x, state.transform.y), (10.0, 20.0));

		state.recenter();
		assert_eq!(state.transform, ViewTransform::default());
	}

	#[test]
	fn only_the_latest_generation_is_current() {
		let mut generation = Generation::default();
		let first = generation.begin();
		assert!(generation.is_current(first));
		let second = generation.begin();
		assert!(!generation.is_current(first));
		assert!(generation.is_current(second));
	}

	#[test]
	fn probes_are_not_restarted_while_in_flight() {
		let mut probes = AvatarProbes::default();
		let (_, start) = probes.begin_pass(["ana", "luis"], |_| false);
		assert_eq!(start, ["ana", "luis"]);
		let (_, start) = probes.begin_pass(["ana", "luis", "eva"], |_| false);
		assert_eq!(start, ["eva"]);
		let (_, start) = probes.begin_pass(["ana", "eva"], |id| id == "ana");
		assert!(start.is_empty());
	}

	#[test]
	fn stale_probe_is_kept_only_for_displayed_persons() {
		let mut probes = AvatarProbes::default();
		let (old, _) = probes.begin_pass(["ana", "luis"], |_| false);
		let (new, _) = probes.begin_pass(["ana"], |_| false);
		assert!(probes.settle(old, "ana"));
		assert!(!probes.settle(old, "luis"));
		// A dropped probe is started again once its person shows up.
		let (_, start) = probes.begin_pass(["ana", "luis"], |id| id == "ana");
		assert_eq!(start, ["luis"]);
		assert!(!probes.generation.is_current(new));
	}
}
