mod api_client;
mod env;
mod file_store;

pub use api_client::{ApiClient, VerificationStatus};
pub use env::DeckbuilderEnv;
pub use file_store::FileStore;
