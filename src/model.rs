//! Family data as stored in the JSON file and as used by the rest of the app.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::dates::parse_date;
use crate::error::{StructureError, TreeError};

/// Token joining the two partner names of a relationship ("Ana y Luis").
pub const PARTNER_DELIMITER: &str = " y ";

/// Top level of `family-{name}.json`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FamilyDocument {
	pub nodes: Vec<RawNode>,
}

/// A node exactly as it appears in the data file.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
	#[serde(deserialize_with = "de_id")]
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub image: Option<String>,
	#[serde(default)]
	pub birth_date: Option<String>,
	#[serde(default)]
	pub celebration_date: Option<String>,
	#[serde(default, deserialize_with = "de_flag")]
	pub is_relationship: bool,
	#[serde(default)]
	pub sex: Option<String>,
	#[serde(default, deserialize_with = "de_opt_id")]
	pub parent_id: Option<String>,
	#[serde(default)]
	pub partners: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
	Text(String),
	Int(i64),
	Float(f64),
}

impl From<RawId> for String {
	fn from(id: RawId) -> Self {
		match id {
			RawId::Text(s) => s,
			RawId::Int(n) => n.to_string(),
			RawId::Float(n) => n.to_string(),
		}
	}
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
	RawId::deserialize(d).map(String::from)
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
	Ok(Option::<RawId>::deserialize(d)?
		.map(String::from)
		.filter(|id| !id.trim().is_empty()))
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
	Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sex {
	Male,
	#[default]
	Female,
}

impl Sex {
	fn parse(raw: Option<&str>) -> Self {
		match raw.map(str::trim) {
			Some("M") => Sex::Male,
			_ => Sex::Female,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Person {
	pub id: String,
	pub name: String,
	pub image: Option<String>,
	pub birth_date: Option<NaiveDate>,
	pub sex: Sex,
	pub parent_id: Option<String>,
}

/// One side of a couple: the name as written and the person it resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartnerRef {
	pub name: String,
	pub person_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partners {
	pub left: PartnerRef,
	pub right: PartnerRef,
}

impl Partners {
	pub fn iter(&self) -> impl Iterator<Item = &PartnerRef> {
		[&self.left, &self.right].into_iter()
	}

	/// The "A y B" display form.
	pub fn display_name(&self) -> String {
		format!("{}{PARTNER_DELIMITER}{}", self.left.name, self.right.name)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
	pub id: String,
	pub name: String,
	pub celebration_date: Option<NaiveDate>,
	pub parent_id: Option<String>,
	pub partners: Partners,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FamilyNode {
	Person(Person),
	Relationship(Relationship),
}

impl FamilyNode {
	pub fn id(&self) -> &str {
		match self {
			FamilyNode::Person(p) => &p.id,
			FamilyNode::Relationship(r) => &r.id,
		}
	}
}

/// A parsed family, in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Family {
	pub nodes: Vec<FamilyNode>,
}

impl Family {
	pub fn from_document(doc: &FamilyDocument) -> Result<Self, TreeError> {
		let persons: Vec<Person> = doc
			.nodes
			.iter()
			.filter(|n| !n.is_relationship)
			.map(person_from_raw)
			.collect();

		let nodes = doc
			.nodes
			.iter()
			.map(|raw| {
				if raw.is_relationship {
					relationship_from_raw(raw, &persons).map(FamilyNode::Relationship)
				} else {
					Ok(FamilyNode::Person(person_from_raw(raw)))
				}
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self { nodes })
	}

	pub fn persons(&self) -> impl Iterator<Item = &Person> {
		self.nodes.iter().filter_map(|n| match n {
			FamilyNode::Person(p) => Some(p),
			FamilyNode::Relationship(_) => None,
		})
	}

	pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
		self.nodes.iter().filter_map(|n| match n {
			FamilyNode::Relationship(r) => Some(r),
			FamilyNode::Person(_) => None,
		})
	}

	pub fn person(&self, id: &str) -> Option<&Person> {
		self.persons().find(|p| p.id == id)
	}
}

fn person_from_raw(raw: &RawNode) -> Person {
	Person {
		id: raw.id.clone(),
		name: raw.name.clone(),
		image: raw.image.clone().filter(|i| !i.trim().is_empty()),
		birth_date: raw.birth_date.as_deref().and_then(parse_date),
		sex: Sex::parse(raw.sex.as_deref()),
		parent_id: raw.parent_id.clone(),
	}
}

fn relationship_from_raw(raw: &RawNode, persons: &[Person]) -> Result<Relationship, StructureError> {
	let partners = resolve_partners(raw, persons)?;
	Ok(Relationship {
		id: raw.id.clone(),
		name: if raw.name.trim().is_empty() {
			partners.display_name()
		} else {
			raw.name.clone()
		},
		celebration_date: raw.celebration_date.as_deref().and_then(parse_date),
		parent_id: raw.parent_id.clone(),
		partners,
	})
}

fn resolve_partners(raw: &RawNode, persons: &[Person]) -> Result<Partners, StructureError> {
	let by_id = |id: &str| persons.iter().find(|p| p.id == id);
	let by_name = |name: &str| persons.iter().find(|p| p.name == name);

	if let Some([left, right]) = raw.partners.as_deref() {
		let side = |id: &String| PartnerRef {
			name: by_id(id.as_str())
				.map(|p| p.name.clone())
				.unwrap_or_else(|| id.clone()),
			person_id: by_id(id.as_str()).map(|p| p.id.clone()),
		};
		return Ok(Partners {
			left: side(left),
			right: side(right),
		});
	}

	// Extra parts after the first two names are ignored.
	let mut names = raw
		.name
		.split(PARTNER_DELIMITER)
		.map(str::trim)
		.filter(|n| !n.is_empty());
	let (Some(left), Some(right)) = (names.next(), names.next()) else {
		return Err(StructureError::MalformedRelationship(raw.id.clone()));
	};
	let side = |name: &str| PartnerRef {
		name: name.to_string(),
		person_id: by_name(name).map(|p| p.id.clone()),
	};
	Ok(Partners {
		left: side(left),
		right: side(right),
	})
}
