pub mod credential_storage;
pub mod paths;
pub mod settings_storage;
pub mod storage;

pub use credential_storage::CredentialStorage;
pub use paths::InkletPaths;
pub use settings_storage::SettingsStorage;
pub use storage::AtomicJsonFile;
