pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Malformed caller input; the API layer maps this to a 400.
	#[error("{0}")]
	Validation(String),

	/// Unexpected server-side failure; the API layer maps this to a 500.
	#[error("{0}")]
	Internal(String),

	#[error(transparent)]
	Storage(#[from] tavola_storage::Error),

	#[error(transparent)]
	Provider(#[from] tavola_providers::Error),

	#[error(transparent)]
	Ingest(#[from] tavola_ingest::Error),
}
