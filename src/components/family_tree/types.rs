use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// Stable identifier of a person record for the lifetime of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for PersonId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i64> for PersonId {
	fn from(id: i64) -> Self {
		Self(id)
	}
}

/// Drives presentation only, never layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gender {
	/// Drawn with a blue outline.
	Male,
	/// Drawn with a red outline.
	Female,
	/// Anything the service did not mark as male or female.
	#[default]
	Unknown,
}

impl Gender {
	/// Reads the service's `Gender` field.
	pub fn from_record(raw: Option<&str>) -> Self {
		match raw {
			Some("Male") => Gender::Male,
			Some("Female") => Gender::Female,
			_ => Gender::Unknown,
		}
	}

	/// Outline colour of a person box.
	pub fn stroke_color(self) -> &'static str {
		match self {
			Gender::Male => "#66c",
			Gender::Female => "#c66",
			Gender::Unknown => "#6c6",
		}
	}
}

/// Privacy classification as reported by the data service. Passed through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Privacy(pub i32);

struct PrivacyVisitor;

impl<'de> Visitor<'de> for PrivacyVisitor {
	type Value = Privacy;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a privacy level as integer or numeric string")
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> Result<Privacy, E> {
		i32::try_from(v)
			.map(Privacy)
			.map_err(|_| E::custom("privacy level out of range"))
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<Privacy, E> {
		i32::try_from(v)
			.map(Privacy)
			.map_err(|_| E::custom("privacy level out of range"))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<Privacy, E> {
		v.trim()
			.parse::<i32>()
			.map(Privacy)
			.map_err(|_| E::custom(format!("invalid privacy level {:?}", v)))
	}
}

impl<'de> Deserialize<'de> for Privacy {
	fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
		d.deserialize_any(PrivacyVisitor)
	}
}

impl Privacy {
	/// Name of the level as shown on WikiTree.
	pub fn label(self) -> &'static str {
		match self.0 {
			60 => "Open",
			50 => "Public",
			40 => "Private with public biography and tree",
			35 => "Private with public tree",
			30 => "Public profile",
			20 => "Private",
			10 => "Unlisted",
			_ => "Unknown",
		}
	}
}

const MONTH_NAMES: [&str; 12] = [
	"January",
	"February",
	"March",
	"April",
	"May",
	"June",
	"July",
	"August",
	"September",
	"October",
	"November",
	"December",
];

/// `YYYY[-MM[-DD]]` where any zero or missing component means unknown.
///
/// Only built by [`PartialDate::parse`], so a known month is always 1 to 12.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialDate {
	year: Option<u16>,
	month: Option<u8>,
	day: Option<u8>,
}

impl PartialDate {
	/// `None` for strings that are not dates, such as "abt 1850".
	pub fn parse(raw: &str) -> Option<Self> {
		let mut parts = raw.trim().split('-');
		let year = parts.next().filter(|p| p.len() == 4)?.parse::<u16>().ok()?;
		let month = match parts.next() {
			Some(p) => Some(p.parse::<u8>().ok().filter(|m| *m <= 12)?),
			None => None,
		};
		let day = match parts.next() {
			Some(p) => Some(p.parse::<u8>().ok().filter(|d| *d <= 31)?),
			None => None,
		};
		if parts.next().is_some() {
			return None;
		}
		Some(Self {
			year: Some(year).filter(|y| *y != 0),
			month: month.filter(|m| *m != 0),
			day: day.filter(|d| *d != 0),
		})
	}

	/// Year, if known.
	pub fn year(&self) -> Option<u16> {
		self.year
	}

	/// Month 1 to 12, if known.
	pub fn month(&self) -> Option<u8> {
		self.month
	}

	/// Day of the month, if known.
	pub fn day(&self) -> Option<u8> {
		self.day
	}

	/// "March 4, 1850", "March 1850" or "1850". `None` when the year is unknown.
	pub fn human(&self) -> Option<String> {
		let year = self.year?;
		let month = self
			.month
			.and_then(|m| MONTH_NAMES.get(usize::from(m).checked_sub(1)?));
		Some(match (month, self.day) {
			(Some(m), Some(d)) => format!("{} {}, {}", m, d, year),
			(Some(m), None) => format!("{} {}", m, year),
			_ => year.to_string(),
		})
	}
}

/// Human readable form of a service date. Strings that are not dates pass through verbatim.
pub fn human_date(raw: &str) -> Option<String> {
	if raw.is_empty() {
		return None;
	}
	match PartialDate::parse(raw) {
		Some(date) => date.human(),
		None => Some(raw.to_string()),
	}
}

/// Position in canvas or layout coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Point at (`x`, `y`).
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}
