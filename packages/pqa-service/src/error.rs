use crate::ErrorKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	Validation { message: String },
	#[error("Retrieval failed: {message}")]
	Retrieval { message: String },
	#[error("Generation failed: {message}")]
	Generation { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
}
impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Validation { .. } => ErrorKind::Validation,
			Self::Retrieval { .. } => ErrorKind::Retrieval,
			Self::Generation { .. } => ErrorKind::Generation,
			Self::Configuration { .. } => ErrorKind::Configuration,
		}
	}

	/// The message without the variant prefix.
	pub fn message(&self) -> &str {
		match self {
			Self::Validation { message }
			| Self::Retrieval { message }
			| Self::Generation { message }
			| Self::Configuration { message } => message,
		}
	}
}

impl From<pqa_config::Error> for Error {
	fn from(err: pqa_config::Error) -> Self {
		Self::Configuration { message: err.to_string() }
	}
}
