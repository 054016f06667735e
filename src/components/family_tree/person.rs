use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use super::types::{Gender, PersonId, Privacy, human_date};

/// One individual's record as delivered by the data service.
///
/// `parents` and `children` hold nested records in service order. Nested
/// records usually carry only profile fields and parent ids.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersonRecord {
	/// Service id. Numeric strings are accepted.
	#[serde(deserialize_with = "person_id")]
	pub id: PersonId,
	/// WikiTree profile name such as `Doe-1`.
	pub name: Option<String>,
	/// Given name.
	pub first_name: Option<String>,
	/// Current surname.
	pub last_name_current: Option<String>,
	/// Full birth name, when the profile is public.
	pub birth_name: Option<String>,
	/// Birth name as shown for private profiles.
	pub birth_name_private: Option<String>,
	/// `YYYY-MM-DD`, zero components unknown.
	pub birth_date: Option<String>,
	/// Free-text birth place.
	pub birth_location: Option<String>,
	/// `YYYY-MM-DD`, zero components unknown.
	pub death_date: Option<String>,
	/// Free-text death place.
	pub death_location: Option<String>,
	/// `Male`, `Female` or absent.
	pub gender: Option<String>,
	/// Photo reference, carried through only.
	pub photo: Option<String>,
	/// Privacy level of the profile.
	pub privacy: Option<Privacy>,
	/// Father id. Zero means none.
	#[serde(default, deserialize_with = "optional_person_id")]
	pub father: Option<PersonId>,
	/// Mother id. Zero means none.
	#[serde(default, deserialize_with = "optional_person_id")]
	pub mother: Option<PersonId>,
	/// Records of the parents the service resolved.
	#[serde(default, deserialize_with = "keyed_records")]
	pub parents: Vec<PersonRecord>,
	/// Records of the children, in service order.
	#[serde(default, deserialize_with = "keyed_records")]
	pub children: Vec<PersonRecord>,
}

impl PersonRecord {
	/// Nested record of parent `id`, if the service included it.
	pub fn parent_record(&self, id: PersonId) -> Option<&PersonRecord> {
		self.parents.iter().find(|p| p.id == id)
	}
}

/// Profile fields of a person. Refreshed in place when a newer record arrives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
	/// WikiTree profile name such as `Doe-1`.
	pub name: Option<String>,
	/// Given name.
	pub first_name: Option<String>,
	/// Current surname.
	pub last_name_current: Option<String>,
	/// Full birth name, when the profile is public.
	pub birth_name: Option<String>,
	/// Birth name as shown for private profiles.
	pub birth_name_private: Option<String>,
	/// `YYYY-MM-DD`, zero components unknown.
	pub birth_date: Option<String>,
	/// Free-text birth place.
	pub birth_location: Option<String>,
	/// `YYYY-MM-DD`, zero components unknown.
	pub death_date: Option<String>,
	/// Free-text death place.
	pub death_location: Option<String>,
	/// Photo reference, carried through only.
	pub photo: Option<String>,
	/// Drives the outline colour.
	pub gender: Gender,
	/// Passed through from the service.
	pub privacy: Privacy,
}

impl From<&PersonRecord> for Profile {
	fn from(record: &PersonRecord) -> Self {
		Self {
			name: record.name.clone(),
			first_name: record.first_name.clone(),
			last_name_current: record.last_name_current.clone(),
			birth_name: record.birth_name.clone(),
			birth_name_private: record.birth_name_private.clone(),
			birth_date: record.birth_date.clone(),
			birth_location: record.birth_location.clone(),
			death_date: record.death_date.clone(),
			death_location: record.death_location.clone(),
			photo: record.photo.clone(),
			gender: Gender::from_record(record.gender.as_deref()),
			privacy: record.privacy.unwrap_or_default(),
		}
	}
}

/// A parent relationship. `Unresolved` knows the id but has no fetched person attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParentLink {
	/// No parent on record, or a private one.
	#[default]
	None,
	/// Parent id known, person not attached.
	Unresolved(PersonId),
	/// Parent person attached to the graph.
	Resolved(PersonId),
}

impl ParentLink {
	/// Link for a parent id as read from a record.
	pub fn from_id(id: Option<PersonId>) -> Self {
		match id {
			// private parents come through as negative ids
			Some(id) if id.0 > 0 => ParentLink::Unresolved(id),
			_ => ParentLink::None,
		}
	}

	/// Parent id, attached or not.
	pub fn id(self) -> Option<PersonId> {
		match self {
			ParentLink::None => None,
			ParentLink::Unresolved(id) | ParentLink::Resolved(id) => Some(id),
		}
	}

	/// Parent id if the parent is attached.
	pub fn resolved(self) -> Option<PersonId> {
		match self {
			ParentLink::Resolved(id) => Some(id),
			_ => None,
		}
	}

	/// Whether the parent is known but not attached.
	pub fn is_unresolved(self) -> bool {
		matches!(self, ParentLink::Unresolved(_))
	}
}

/// Children keyed by id, iterated in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Children(Vec<PersonId>);

impl Children {
	/// Child ids in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = PersonId> + '_ {
		self.0.iter().copied()
	}

	/// Number of children.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether no children are loaded.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Whether `id` is one of the children.
	pub fn contains(&self, id: PersonId) -> bool {
		self.0.contains(&id)
	}

	/// Later duplicates of a key are ignored, like re-inserting into a map.
	pub fn insert(&mut self, id: PersonId) {
		if !self.contains(id) {
			self.0.push(id);
		}
	}
}

impl FromIterator<PersonId> for Children {
	fn from_iter<I: IntoIterator<Item = PersonId>>(iter: I) -> Self {
		let mut children = Children::default();
		for id in iter {
			children.insert(id);
		}
		children
	}
}

/// A node of the person graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Person {
	id: PersonId,
	profile: Profile,
	father: ParentLink,
	mother: ParentLink,
	children: Children,
	expanded: bool,
}

impl Person {
	/// Person with the record's profile and unattached parents.
	pub fn from_record(record: &PersonRecord) -> Self {
		Self {
			id: record.id,
			profile: Profile::from(record),
			father: ParentLink::from_id(record.father),
			mother: ParentLink::from_id(record.mother),
			children: Children::default(),
			expanded: false,
		}
	}

	/// Stable id of this person.
	pub fn id(&self) -> PersonId {
		self.id
	}

	/// Profile fields of the latest direct fetch.
	pub fn profile(&self) -> &Profile {
		&self.profile
	}

	/// Gender from the profile.
	pub fn gender(&self) -> Gender {
		self.profile.gender
	}

	/// Father link.
	pub fn father(&self) -> ParentLink {
		self.father
	}

	/// Mother link.
	pub fn mother(&self) -> ParentLink {
		self.mother
	}

	/// Loaded children.
	pub fn children(&self) -> &Children {
		&self.children
	}

	/// Whether an expansion fetch of this person has been merged. Another one would return the same record.
	pub fn is_expanded(&self) -> bool {
		self.expanded
	}

	pub(crate) fn mark_expanded(&mut self) {
		self.expanded = true;
	}

	pub(crate) fn set_father(&mut self, link: ParentLink) {
		self.father = link;
	}

	pub(crate) fn set_mother(&mut self, link: ParentLink) {
		self.mother = link;
	}

	pub(crate) fn set_children(&mut self, children: Children) {
		self.children = children;
	}

	pub(crate) fn refresh_profile(&mut self, record: &PersonRecord) {
		self.profile = Profile::from(record);
	}

	/// Birth name, private birth name, given name plus surname, profile name, or `#id`.
	pub fn display_name(&self) -> String {
		let p = &self.profile;
		if let Some(name) = p.birth_name.as_deref().filter(|n| !n.is_empty()) {
			return name.to_string();
		}
		if let Some(name) = p.birth_name_private.as_deref().filter(|n| !n.is_empty()) {
			return name.to_string();
		}
		let joined = [p.first_name.as_deref(), p.last_name_current.as_deref()]
			.into_iter()
			.flatten()
			.filter(|s| !s.is_empty())
			.collect::<Vec<_>>()
			.join(" ");
		if !joined.is_empty() {
			return joined;
		}
		p.name.clone().unwrap_or_else(|| format!("#{}", self.id))
	}

	/// "1850 - 1910" with an empty side for unknown years.
	pub fn lifespan(&self) -> String {
		let birth = year_prefix(self.profile.birth_date.as_deref()).unwrap_or("");
		let death = year_prefix(self.profile.death_date.as_deref()).unwrap_or("");
		format!("{} - {}", birth, death)
	}

	/// "Born March 4, 1850 in Boston." or `None` without date and place.
	pub fn birth_description(&self) -> Option<String> {
		vital_description(
			"Born",
			self.profile.birth_date.as_deref(),
			self.profile.birth_location.as_deref(),
		)
	}

	/// "Died 1910 in Salem." or `None` without date and place.
	pub fn death_description(&self) -> Option<String> {
		vital_description(
			"Died",
			self.profile.death_date.as_deref(),
			self.profile.death_location.as_deref(),
		)
	}
}

fn year_prefix(date: Option<&str>) -> Option<&str> {
	date.and_then(|d| d.get(..4)).filter(|y| *y != "0000")
}

fn vital_description(verb: &str, date: Option<&str>, place: Option<&str>) -> Option<String> {
	let date = date.and_then(human_date);
	let place = place.filter(|p| !p.is_empty());
	match (date, place) {
		(None, None) => None,
		(Some(date), None) => Some(format!("{} {}.", verb, date)),
		(None, Some(place)) => Some(format!("{} in {}.", verb, place)),
		(Some(date), Some(place)) => Some(format!("{} {} in {}.", verb, date, place)),
	}
}

fn parse_id<E: de::Error>(raw: &str) -> Result<PersonId, E> {
	raw.trim()
		.parse::<i64>()
		.map(PersonId)
		.map_err(|_| E::custom(format!("invalid person id {:?}", raw)))
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
	type Value = PersonId;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a person id as integer or numeric string")
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> Result<PersonId, E> {
		Ok(PersonId(v))
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<PersonId, E> {
		i64::try_from(v)
			.map(PersonId)
			.map_err(|_| E::custom("person id out of range"))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<PersonId, E> {
		parse_id(v)
	}
}

fn person_id<'de, D: Deserializer<'de>>(d: D) -> Result<PersonId, D::Error> {
	d.deserialize_any(IdVisitor)
}

fn optional_person_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PersonId>, D::Error> {
	#[derive(Deserialize)]
	struct Wrapped(#[serde(deserialize_with = "person_id")] PersonId);

	let id = Option::<Wrapped>::deserialize(d)?.map(|w| w.0);
	Ok(id.filter(|id| id.0 != 0))
}

/// Accepts `{"12": {...}, "7": {...}}` (order preserved) or a JSON array, including `[]` for none.
fn keyed_records<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<PersonRecord>, D::Error> {
	struct RecordsVisitor;

	impl<'de> Visitor<'de> for RecordsVisitor {
		type Value = Vec<PersonRecord>;

		fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str("a map of person records keyed by id, or a list")
		}

		fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
			Ok(Vec::new())
		}

		fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
			let mut out = Vec::new();
			while let Some(record) = seq.next_element::<PersonRecord>()? {
				out.push(record);
			}
			Ok(out)
		}

		fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
			let mut out = Vec::new();
			while let Some((_key, record)) = map.next_entry::<String, PersonRecord>()? {
				out.push(record);
			}
			Ok(out)
		}
	}

	d.deserialize_any(RecordsVisitor)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(json: &str) -> PersonRecord {
		serde_json::from_str(json).unwrap()
	}

	#[test]
	fn decodes_keyed_children_in_document_order() {
		let r = record(
			r#"{"Id": 1, "Father": 5, "Mother": "6",
			    "Children": {"11": {"Id": 11}, "10": {"Id": 10}, "100": {"Id": 100}}}"#,
		);
		let ids: Vec<_> = r.children.iter().map(|c| c.id.0).collect();
		assert_eq!(ids, vec![11, 10, 100]);
		assert_eq!(r.father, Some(PersonId(5)));
		assert_eq!(r.mother, Some(PersonId(6)));
	}

	#[test]
	fn empty_array_means_no_children_and_zero_means_no_parent() {
		let r = record(r#"{"Id": "3", "Father": 0, "Children": [], "Parents": []}"#);
		assert!(r.children.is_empty());
		assert!(r.parents.is_empty());
		assert_eq!(r.father, None);
		assert_eq!(r.mother, None);
		assert_eq!(r.id, PersonId(3));
	}

	#[test]
	fn unresolved_parent_links_come_from_ids() {
		let p = Person::from_record(&record(r#"{"Id": 1, "Father": 5}"#));
		assert_eq!(p.father(), ParentLink::Unresolved(PersonId(5)));
		assert_eq!(p.mother(), ParentLink::None);
		assert!(p.children().is_empty());
	}

	#[test]
	fn private_parent_ids_are_not_links() {
		let p = Person::from_record(&record(r#"{"Id": 1, "Father": -1, "Mother": "8"}"#));
		assert_eq!(p.father(), ParentLink::None);
		assert_eq!(p.mother(), ParentLink::Unresolved(PersonId(8)));
	}

	#[test]
	fn lifespan_and_vitals() {
		let p = Person::from_record(&record(
			r#"{"Id": 1, "BirthDate": "1850-03-04", "BirthLocation": "Boston",
			    "DeathDate": "0000-00-00", "DeathLocation": "Salem"}"#,
		));
		assert_eq!(p.lifespan(), "1850 - ");
		assert_eq!(p.birth_description().as_deref(), Some("Born March 4, 1850 in Boston."));
		assert_eq!(p.death_description().as_deref(), Some("Died in Salem."));

		let blank = Person::from_record(&record(r#"{"Id": 2}"#));
		assert_eq!(blank.lifespan(), " - ");
		assert_eq!(blank.birth_description(), None);
	}

	#[test]
	fn display_name_falls_back_through_variants() {
		let named = Person::from_record(&record(
			r#"{"Id": 1, "BirthName": "Ann Smith", "FirstName": "Annie"}"#,
		));
		assert_eq!(named.display_name(), "Ann Smith");
		let private = Person::from_record(&record(r#"{"Id": 2, "BirthNamePrivate": "A. Smith"}"#));
		assert_eq!(private.display_name(), "A. Smith");
		let parts = Person::from_record(&record(
			r#"{"Id": 3, "FirstName": "John", "LastNameCurrent": "Doe"}"#,
		));
		assert_eq!(parts.display_name(), "John Doe");
		assert_eq!(Person::from_record(&record(r#"{"Id": 4}"#)).display_name(), "#4");
	}

	#[test]
	fn children_keep_first_insertion() {
		let c: Children = [PersonId(2), PersonId(1), PersonId(2)].into_iter().collect();
		assert_eq!(c.iter().collect::<Vec<_>>(), vec![PersonId(2), PersonId(1)]);
	}
}
