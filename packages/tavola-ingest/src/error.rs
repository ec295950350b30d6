pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Provider(#[from] tavola_providers::Error),

	#[error(transparent)]
	Storage(#[from] tavola_storage::Error),
}
