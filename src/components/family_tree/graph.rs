use std::collections::HashMap;

use log::debug;

use super::person::{Children, ParentLink, Person, PersonRecord};
use super::types::PersonId;

/// In-memory person graph shared by both tree directions.
///
/// Persons are never removed. Relationships are ids into this arena, so a key
/// held by a rendered element keeps pointing at the same person while its
/// fields are updated in place.
#[derive(Clone, Debug, Default)]
pub struct PersonGraph {
	persons: HashMap<PersonId, Person>,
}

impl PersonGraph {
	/// Empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Person with `id`, if loaded.
	pub fn get(&self, id: PersonId) -> Option<&Person> {
		self.persons.get(&id)
	}

	/// Whether `id` is loaded.
	pub fn contains(&self, id: PersonId) -> bool {
		self.persons.contains_key(&id)
	}

	/// Number of loaded persons.
	pub fn len(&self) -> usize {
		self.persons.len()
	}

	/// Whether nothing has been loaded yet.
	pub fn is_empty(&self) -> bool {
		self.persons.is_empty()
	}

	/// Attached father, if his record has been fetched through this person.
	pub fn father_of(&self, person: &Person) -> Option<&Person> {
		person.father().resolved().and_then(|id| self.get(id))
	}

	/// Attached mother, if her record has been fetched through this person.
	pub fn mother_of(&self, person: &Person) -> Option<&Person> {
		person.mother().resolved().and_then(|id| self.get(id))
	}

	/// Loaded children in insertion order.
	pub fn children_of<'a>(&'a self, person: &'a Person) -> impl Iterator<Item = &'a Person> + 'a {
		person.children().iter().filter_map(move |id| self.get(id))
	}

	/// Inserts a fetched person as a new root and attaches everything the record resolves.
	pub fn insert_root(&mut self, record: &PersonRecord) -> PersonId {
		self.upsert(record);
		self.attach_to(record.id, record);
		record.id
	}

	/// Merges an expansion fetch into an existing person.
	///
	/// Resolved parents are assigned, the children mapping is replaced
	/// wholesale and the person is marked expanded. Returns `false` and
	/// leaves the graph untouched when `id` is not part of the graph.
	pub fn merge_expansion(&mut self, id: PersonId, record: &PersonRecord) -> bool {
		if !self.contains(id) {
			return false;
		}
		if record.id == id {
			self.upsert(record);
		} else {
			debug!("expansion of {} answered with record {}", id, record.id);
		}
		self.attach_to(id, record);
		if let Some(person) = self.persons.get_mut(&id) {
			person.mark_expanded();
		}
		true
	}

	fn attach_to(&mut self, id: PersonId, record: &PersonRecord) {
		let father = self.resolve_parent(record, record.father);
		let mother = self.resolve_parent(record, record.mother);
		for child in &record.children {
			self.insert_missing(child);
		}
		let children: Children = record.children.iter().map(|c| c.id).collect();

		if let Some(person) = self.persons.get_mut(&id) {
			if let Some(father) = father {
				person.set_father(ParentLink::Resolved(father));
			}
			if let Some(mother) = mother {
				person.set_mother(ParentLink::Resolved(mother));
			}
			person.set_children(children);
		}
	}

	fn resolve_parent(&mut self, record: &PersonRecord, parent: Option<PersonId>) -> Option<PersonId> {
		let parent = record.parent_record(parent?)?;
		self.insert_missing(parent);
		Some(parent.id)
	}

	/// A directly fetched record replaces the profile fields of a known person; relationships stay.
	fn upsert(&mut self, record: &PersonRecord) {
		match self.persons.get_mut(&record.id) {
			Some(person) => person.refresh_profile(record),
			None => {
				self.persons.insert(record.id, Person::from_record(record));
			}
		}
	}

	/// Nested records are partial, so they never overwrite what is already known.
	fn insert_missing(&mut self, record: &PersonRecord) {
		self.persons
			.entry(record.id)
			.or_insert_with(|| Person::from_record(record));
	}
}
