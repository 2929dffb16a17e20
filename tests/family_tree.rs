use chrono::NaiveDate;
use family_tree::calendar::{GRID_CELLS, MonthCursor, month_grid};
use family_tree::config::{AppConfig, AssetPaths};
use family_tree::export::canvas_size;
use family_tree::loader::{parse_document, prepare};
use family_tree::tree::{Hierarchy, TreeEntry, layout};
use rstest::rstest;

const FAMILY: &str = r#"{ "nodes": [
	{ "id": 1, "name": "Ana", "birthDate": "1950-03-05", "sex": "F" },
	{ "id": 2, "name": "Luis", "birthDate": "1948-10-19", "sex": "M" },
	{ "id": 3, "name": "Ana y Luis", "isRelationship": true, "celebrationDate": "1972-06-01" },
	{ "id": 4, "name": "Marta", "birthDate": "1975-10-02", "parentId": 3 },
	{ "id": 5, "name": "Pedro", "birthDate": "1977-10-30", "sex": "M", "parentId": 3 },
	{ "id": 6, "name": "Sofia", "birthDate": "1978-01-12" },
	{ "id": 7, "name": "Pedro y Sofia", "isRelationship": true },
	{ "id": 8, "name": "Lucia", "birthDate": "2005-10-19", "parentId": 5 },
	{ "id": 9, "name": "Tomas", "birthDate": "2008-02-29", "sex": "M", "parentId": 7 }
] }"#;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn loaded() -> family_tree::loader::LoadedFamily {
	let doc = parse_document(FAMILY).unwrap();
	prepare(AssetPaths::new("", "perez"), &doc).unwrap()
}

#[test]
fn displayed_nodes_are_free_persons_plus_couples() {
	let loaded = loaded();
	let partners: Vec<&str> = loaded
		.family
		.relationships()
		.flat_map(|r| r.partners.iter().filter_map(|p| p.person_id.as_deref()))
		.collect();
	let free = loaded
		.family
		.persons()
		.filter(|p| !partners.contains(&p.id.as_str()))
		.count();
	let couples = loaded.family.relationships().count();

	let h = &loaded.hierarchy;
	assert_eq!(h.visible().len(), free + couples);
	assert_eq!(h.visible().len(), 5);
	assert_eq!(h.links().len(), h.visible().len() - 1);
}

#[test]
fn children_of_absorbed_partners_hang_under_the_couple() {
	let h = loaded().hierarchy;
	let couple = h.find("7").unwrap();
	let lucia = h.find("8").unwrap();
	let tomas = h.find("9").unwrap();
	assert_eq!(h.node(lucia).parent, Some(couple));
	assert_eq!(h.node(tomas).parent, Some(couple));
	assert!(matches!(h.node(couple).entry, TreeEntry::Couple(_)));
}

#[test]
fn building_is_deterministic() {
	let first = loaded();
	let second = Hierarchy::build(&first.family).unwrap();
	assert_eq!(first.hierarchy, second);
	let config = AppConfig::default();
	assert_eq!(
		layout(&first.hierarchy, &config.layout),
		layout(&second, &config.layout)
	);
}

#[test]
fn layout_follows_depth_and_collapse() {
	let h = loaded().hierarchy;
	let config = AppConfig::default();
	let full = layout(&h, &config.layout);
	for id in h.visible() {
		let p = full.position(id).unwrap();
		assert_eq!(p.y, h.node(id).depth as f64 * config.layout.level_height);
	}

	let collapsed = h.toggled(h.find("7").unwrap());
	let partial = layout(&collapsed, &config.layout);
	assert_eq!(partial.len(), full.len() - 2);
	assert_eq!(collapsed.toggled(h.find("7").unwrap()), h);
}

#[test]
fn export_canvas_matches_view_box() {
	let h = loaded().hierarchy;
	let config = AppConfig::default();
	let view_box = layout(&h, &config.layout).view_box(config.view_padding);
	let (w, h) = canvas_size(&view_box, config.export_scale(1280.0));
	assert_eq!(f64::from(w), (view_box.width * 2.0).round());
	assert_eq!(f64::from(h), (view_box.height * 2.0).round());
}

#[rstest]
#[case(MonthCursor { year: 2026, month: 10 })]
#[case(MonthCursor { year: 2026, month: 2 })]
#[case(MonthCursor { year: 2024, month: 2 })]
#[case(MonthCursor { year: 2027, month: 1 })]
fn calendar_grid_has_42_cells(#[case] cursor: MonthCursor) {
	let persons: Vec<_> = loaded().family.persons().cloned().collect();
	assert_eq!(month_grid(cursor, d(2026, 10, 19), &persons).len(), GRID_CELLS);
}

#[test]
fn october_birthdays_split_around_today() {
	let persons: Vec<_> = loaded().family.persons().cloned().collect();
	let grid = month_grid(MonthCursor { year: 2026, month: 10 }, d(2026, 10, 19), &persons);
	let described: Vec<(u32, String, String)> = grid
		.iter()
		.filter(|c| c.in_month)
		.flat_map(|c| {
			c.birthdays
				.iter()
				.map(move |b| (c.day(), b.name.clone(), b.describe()))
		})
		.collect();
	assert_eq!(
		described,
		[
			(2, "Marta".to_string(), "Cumplió 51 años".to_string()),
			(19, "Luis".to_string(), "Cumplió 78 años".to_string()),
			(19, "Lucia".to_string(), "Cumplió 21 años".to_string()),
			(30, "Pedro".to_string(), "Cumplirá 49 años".to_string()),
		]
	);
	let today = grid.iter().find(|c| c.is_today).unwrap();
	assert_eq!(today.date, d(2026, 10, 19));
	assert!(today.has_birthday());
}
