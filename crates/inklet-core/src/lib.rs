pub mod document;
pub mod error;
pub mod guard;
pub mod save;
pub mod session;
pub mod theme;
pub mod user;

// Re-export common types
pub use document::{Document, SaveType, Version, VersionListItem};
pub use error::{InkletError, Result};
pub use guard::SessionAuthority;
pub use save::{auto_save_eligible, SaveMode, SaveSettings, SaveSettingsPatch, SaveState};
pub use session::{SessionSnapshot, SessionStatus};
pub use theme::ThemeMode;
pub use user::User;
