use chrono::NaiveDate;
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, MouseEvent, Node};

use crate::calendar::{BirthdayOccurrence, DayCell, MonthCursor, month_grid};
use crate::config::AppConfig;
use crate::model::Person;

const WEEKDAYS: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

const TOOLTIP_GAP: f64 = 10.0;
const TOOLTIP_WIDTH: f64 = 250.0;
/// Each birthday takes two lines of this height.
const TOOLTIP_LINE: f64 = 19.6;
const TOOLTIP_PADDING: f64 = 20.0;

/// Screen rectangle of a day cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellRect {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

/// Top-left corner for a tooltip of `size` next to `cell`: to its right,
/// flipped left when it would leave the viewport, vertically centred and
/// clamped to the viewport.
pub fn place_tooltip(cell: CellRect, size: (f64, f64), viewport: (f64, f64)) -> (f64, f64) {
	let (w, h) = size;
	let (vw, vh) = viewport;
	let mut left = cell.left + cell.width + TOOLTIP_GAP;
	if left + w > vw {
		left = cell.left - w - TOOLTIP_GAP;
	}
	let top = cell.top + cell.height / 2.0 - h / 2.0;
	let top = if top < 0.0 {
		0.0
	} else if top + h > vh {
		(vh - h).max(0.0)
	} else {
		top
	};
	(left, top)
}

fn estimated_size(birthdays: &[BirthdayOccurrence]) -> (f64, f64) {
	(
		TOOLTIP_WIDTH,
		TOOLTIP_PADDING + birthdays.len() as f64 * 2.0 * TOOLTIP_LINE,
	)
}

#[derive(Clone, Debug, PartialEq)]
struct BirthdayTooltip {
	birthdays: Vec<BirthdayOccurrence>,
	left: f64,
	top: f64,
}

fn viewport() -> (f64, f64) {
	let Some(window) = web_sys::window() else {
		return (0.0, 0.0);
	};
	let dim = |v: Result<JsValue, JsValue>| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or_default()
	};
	(dim(window.inner_width()), dim(window.inner_height()))
}

/// Birthday calendar panel with month navigation.
#[component]
pub fn Calendar(
	persons: Vec<Person>,
	today: NaiveDate,
	#[prop(default = AppConfig::default())] config: AppConfig,
) -> impl IntoView {
	let persons = StoredValue::new(persons);
	let cursor = RwSignal::new(MonthCursor::containing(today));
	let grid = Memo::new(move |_| {
		let cursor = cursor.get();
		persons.with_value(|p| month_grid(cursor, today, p))
	});
	let tooltip = RwSignal::new(None::<BirthdayTooltip>);
	let open = RwSignal::new(false);
	let panel_ref = NodeRef::<leptos::html::Aside>::new();

	// On narrow screens the panel is a drawer closed by any click outside it.
	let breakpoint = config.calendar_breakpoint;
	let outside_click = window_event_listener(ev::click, move |ev| {
		if !open.get_untracked() || viewport().0 > breakpoint {
			return;
		}
		let inside = match (panel_ref.get_untracked(), ev.target()) {
			(Some(panel), Some(target)) => target
				.dyn_ref::<Node>()
				.is_some_and(|node| panel.contains(Some(node))),
			_ => false,
		};
		if !inside {
			open.set(false);
		}
	});
	on_cleanup(move || outside_click.remove());

	let on_toggle = move |ev: MouseEvent| {
		ev.stop_propagation();
		open.update(|o| *o = !*o);
	};

	let day = move |cell: DayCell| {
		let mut class = String::from("calendar-day");
		if !cell.in_month {
			class.push_str(" other-month");
		}
		if cell.is_today {
			class.push_str(" today");
		}
		if cell.has_birthday() {
			class.push_str(" has-birthday");
		}
		let number = cell.day();
		let birthdays = cell.birthdays;
		let on_enter = move |ev: MouseEvent| {
			if birthdays.is_empty() {
				return;
			}
			let Some(target) = ev
				.current_target()
				.and_then(|t| t.dyn_into::<Element>().ok())
			else {
				return;
			};
			let rect = target.get_bounding_client_rect();
			let cell = CellRect {
				left: rect.left(),
				top: rect.top(),
				width: rect.width(),
				height: rect.height(),
			};
			let (left, top) = place_tooltip(cell, estimated_size(&birthdays), viewport());
			tooltip.set(Some(BirthdayTooltip {
				birthdays: birthdays.clone(),
				left,
				top,
			}));
		};
		view! {
			<div class=class on:mouseenter=on_enter on:mouseleave=move |_: MouseEvent| tooltip.set(None)>
				{number}
			</div>
		}
	};

	view! {
		<button
			id="toggle-calendar"
			class="calendar-toggle"
			title="Calendario de cumpleaños"
			on:click=on_toggle
		>
			"📅"
		</button>
		<aside
			node_ref=panel_ref
			class=move || if open.get() { "calendar-container open" } else { "calendar-container" }
		>
			<div class="calendar-header">
				<button
					id="prev-month"
					title="Mes anterior"
					on:click=move |_: MouseEvent| cursor.update(|c| *c = c.previous())
				>
					"‹"
				</button>
				<h2 id="calendar-title">{move || cursor.get().title()}</h2>
				<button
					id="next-month"
					title="Mes siguiente"
					on:click=move |_: MouseEvent| cursor.update(|c| *c = c.next())
				>
					"›"
				</button>
			</div>
			<div class="calendar-weekdays">
				{WEEKDAYS.iter().map(|d| view! { <div class="weekday">{*d}</div> }).collect_view()}
			</div>
			<div id="calendar-days" class="calendar-days">
				{move || grid.get().into_iter().map(day).collect_view()}
			</div>
		</aside>
		{move || {
			tooltip
				.get()
				.map(|tip| {
					view! {
						<div
							class="birthday-tooltip"
							style=format!("position: fixed; left: {}px; top: {}px;", tip.left, tip.top)
						>
							{tip
								.birthdays
								.into_iter()
								.map(|b| {
									view! {
										<div class="birthday-entry">
											<strong>{b.name.clone()}</strong>
											<br />
											{b.describe()}
										</div>
									}
								})
								.collect_view()}
						</div>
					}
				})
		}}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const CELL: CellRect = CellRect {
		left: 100.0,
		top: 300.0,
		width: 40.0,
		height: 40.0,
	};

	#[test]
	fn tooltip_sits_right_of_the_cell() {
		assert_eq!(place_tooltip(CELL, (250.0, 60.0), (1280.0, 800.0)), (150.0, 290.0));
	}

	#[test]
	fn tooltip_flips_left_near_the_right_edge() {
		let cell = CellRect { left: 1200.0, ..CELL };
		assert_eq!(place_tooltip(cell, (250.0, 60.0), (1280.0, 800.0)), (940.0, 290.0));
	}

	#[rstest]
	#[case(0.0, 0.0)]
	#[case(780.0, 700.0)]
	fn tooltip_is_clamped_vertically(#[case] cell_top: f64, #[case] expected_top: f64) {
		let cell = CellRect { top: cell_top, ..CELL };
		let (_, top) = place_tooltip(cell, (250.0, 100.0), (1280.0, 800.0));
		assert_eq!(top, expected_top);
	}

	#[test]
	fn tooltip_height_grows_with_birthdays() {
		let b = BirthdayOccurrence {
			name: "Ana".into(),
			age: 30,
			passed: true,
		};
		let (_, one) = estimated_size(std::slice::from_ref(&b));
		let (_, two) = estimated_size(&[b.clone(), b]);
		assert!(two > one);
	}
}
