//! Hover text for tree nodes.

use chrono::NaiveDate;

use crate::dates::{age_on, format_long};
use crate::model::Person;
use crate::tree::Couple;

const UNKNOWN_DATE: &str = "desconocida";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TooltipContent {
	pub heading: String,
	pub lines: Vec<String>,
	pub hint: Option<String>,
}

fn long_or_unknown(date: Option<NaiveDate>) -> String {
	date.map(format_long).unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Name, birth date and age as of `today`.
pub fn person_tooltip(person: &Person, today: NaiveDate) -> TooltipContent {
	let mut lines = vec![format!("Nacimiento: {}", long_or_unknown(person.birth_date))];
	if let Some(birth) = person.birth_date {
		lines.push(format!("Edad: {} años", age_on(birth, today)));
	}
	TooltipContent {
		heading: person.name.clone(),
		lines,
		hint: None,
	}
}

/// Partner names and celebration date, with a click hint for collapsible couples.
pub fn couple_tooltip(couple: &Couple, collapsible: bool) -> TooltipContent {
	let partners = &couple.relationship.partners;
	TooltipContent {
		heading: "Relación entre:".to_string(),
		lines: vec![
			partners.left.name.clone(),
			partners.right.name.clone(),
			format!(
				"Celebración: {}",
				long_or_unknown(couple.relationship.celebration_date)
			),
		],
		hint: collapsible.then(|| "(Click para expandir/colapsar)".to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{PartnerRef, Partners, Relationship, Sex};

	fn d(y: i32, m: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, day).unwrap()
	}

	fn person(name: &str, birth: Option<NaiveDate>) -> Person {
		Person {
			id: name.to_lowercase(),
			name: name.into(),
			image: None,
			birth_date: birth,
			sex: Sex::Male,
			parent_id: None,
		}
	}

	#[test]
	fn person_shows_age_as_of_today() {
		let tip = person_tooltip(&person("Luis", Some(d(2000, 1, 1))), d(2023, 12, 31));
		assert_eq!(tip.heading, "Luis");
		assert_eq!(
			tip.lines,
			["Nacimiento: 1 de enero de 2000", "Edad: 23 años"]
		);
	}

	#[test]
	fn person_without_birth_date() {
		let tip = person_tooltip(&person("Luis", None), d(2024, 1, 1));
		assert_eq!(tip.lines, ["Nacimiento: desconocida"]);
	}

	#[test]
	fn couple_lists_partners_and_celebration() {
		let partner = |name: &str| PartnerRef {
			name: name.into(),
			person_id: Some(name.to_lowercase()),
		};
		let couple = Couple {
			relationship: Relationship {
				id: "r".into(),
				name: "Ana y Luis".into(),
				celebration_date: Some(d(1972, 5, 20)),
				parent_id: None,
				partners: Partners {
					left: partner("Ana"),
					right: partner("Luis"),
				},
			},
			left: None,
			right: None,
		};
		let tip = couple_tooltip(&couple, true);
		assert_eq!(
			tip.lines,
			["Ana", "Luis", "Celebración: 20 de mayo de 1972"]
		);
		assert!(tip.hint.is_some());
		assert!(couple_tooltip(&couple, false).hint.is_none());
	}
}
