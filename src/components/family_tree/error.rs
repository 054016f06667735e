use thiserror::Error;

use super::types::PersonId;

/// Failure talking to the data service. Always recoverable by retrying.
#[derive(Debug, Error)]
pub enum FetchError {
	/// The browser refused or aborted the request.
	#[error("request failed: {0}")]
	Request(String),
	/// Non-success HTTP status.
	#[error("HTTP {0}")]
	Http(u16),
	/// The service reported a non-zero status for the call.
	#[error("service answered with status {0}")]
	Service(i64),
	/// The body was not the expected JSON.
	#[error("malformed service response: {0}")]
	Decode(#[from] serde_json::Error),
	/// The answer carried no person record.
	#[error("person {0} not found")]
	NotFound(PersonId),
}

/// Errors surfaced by the viewer to its caller.
#[derive(Debug, Error)]
pub enum TreeError {
	/// Layout was asked to draw without a root. Programming error, not retried.
	#[error("missing root")]
	MissingRoot,
	/// An expansion named a person the graph does not hold.
	#[error("person {0} is not part of the loaded tree")]
	UnknownPerson(PersonId),
	/// Loading or expanding failed at the data service.
	#[error(transparent)]
	Fetch(#[from] FetchError),
}
