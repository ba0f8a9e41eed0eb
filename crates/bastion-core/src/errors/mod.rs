pub mod adapter_error;
pub mod bastion_error;
pub mod config_error;
pub mod embedding_error;
pub mod error_code;
pub mod retrieval_error;
pub mod session_error;
pub mod storage_error;

pub use adapter_error::AdapterError;
pub use bastion_error::{BastionError, BastionResult};
pub use config_error::ConfigError;
pub use embedding_error::EmbeddingError;
pub use error_code::BastionErrorCode;
pub use retrieval_error::RetrievalError;
pub use session_error::SessionError;
pub use storage_error::StorageError;
