//! Data service client for person records.
//!
//! Uses web-sys fetch against the WikiTree `getPerson` endpoint.

use std::future::Future;

use log::debug;
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::error::FetchError;
use super::person::PersonRecord;
use super::types::PersonId;

/// Enough to resolve one more generation of parents and the full children mapping.
pub const PERSON_FIELDS: &[&str] = &[
	"Id",
	"Derived.BirthName",
	"Derived.BirthNamePrivate",
	"FirstName",
	"LastNameCurrent",
	"BirthDate",
	"BirthLocation",
	"DeathDate",
	"DeathLocation",
	"Mother",
	"Father",
	"Children",
	"Parents",
	"Photo",
	"Name",
	"Gender",
	"Privacy",
];

/// Asynchronous source of person records. The completion is delivered exactly once.
pub trait PersonSource {
	/// Fetches the record of `id` restricted to `fields`.
	fn fetch_person(
		&self,
		id: PersonId,
		fields: &[&str],
	) -> impl Future<Output = Result<PersonRecord, FetchError>>;
}

/// `PersonSource` backed by the WikiTree HTTP API.
#[derive(Clone, Debug)]
pub struct WikiTreeClient {
	base_url: String,
}

impl WikiTreeClient {
	/// Client for the API endpoint at `base_url`.
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.to_string(),
		}
	}

	/// `getPerson` URL for `id`.
	pub fn person_url(&self, id: PersonId, fields: &[&str]) -> String {
		format!(
			"{}?action=getPerson&key={}&fields={}&format=json",
			self.base_url,
			id,
			fields.join(",")
		)
	}

	async fn get_text(&self, url: &str) -> Result<String, FetchError> {
		let opts = RequestInit::new();
		opts.set_method("GET");
		opts.set_mode(RequestMode::Cors);

		let request = Request::new_with_str_and_init(url, &opts)
			.map_err(|e| FetchError::Request(format!("{:?}", e)))?;

		let window = web_sys::window().ok_or_else(|| FetchError::Request("no window".into()))?;
		let resp_value = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(|e| FetchError::Request(format!("{:?}", e)))?;

		let resp: Response = resp_value
			.dyn_into()
			.map_err(|_| FetchError::Request("response is not a Response".into()))?;

		if !resp.ok() {
			return Err(FetchError::Http(resp.status()));
		}

		let text = JsFuture::from(resp.text().map_err(|e| FetchError::Request(format!("{:?}", e)))?)
			.await
			.map_err(|e| FetchError::Request(format!("{:?}", e)))?;

		text.as_string()
			.ok_or_else(|| FetchError::Request("response body is not text".into()))
	}
}

impl PersonSource for WikiTreeClient {
	async fn fetch_person(&self, id: PersonId, fields: &[&str]) -> Result<PersonRecord, FetchError> {
		let url = self.person_url(id, fields);
		debug!("fetching person {}", id);
		let body = self.get_text(&url).await?;
		parse_get_person(id, &body)
	}
}

#[derive(Deserialize)]
struct GetPersonEntry {
	#[serde(default)]
	status: serde_json::Value,
	person: Option<PersonRecord>,
}

/// Decodes `[{"status": 0, "person": {...}}]`.
pub fn parse_get_person(id: PersonId, body: &str) -> Result<PersonRecord, FetchError> {
	let entries: Vec<GetPersonEntry> = serde_json::from_str(body)?;
	let entry = entries.into_iter().next().ok_or(FetchError::NotFound(id))?;
	match entry.status.as_i64() {
		None | Some(0) => {}
		Some(status) => return Err(FetchError::Service(status)),
	}
	entry.person.ok_or(FetchError::NotFound(id))
}
