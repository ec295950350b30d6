pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error("Invalid header value: {message}")]
	Header { message: String },
	#[error("Provider returned status {status}.")]
	Status { status: String },
	#[error("Malformed provider payload: {message}")]
	Parse { message: String },
	#[error("Gave up after {attempts} attempts: {source}")]
	Exhausted { attempts: u32, source: Box<Error> },
}
