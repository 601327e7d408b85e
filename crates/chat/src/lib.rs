/// Trailing context window sent to the backend with each question.
pub mod history;
/// Domain entities for the message log.
pub mod message;
pub mod session;
pub mod settings;

pub use history::{HISTORY_WINDOW_LIMIT, history_window};
pub use message::{Message, Role};
pub use session::{ChatSession, GREETING, SUGGESTED_QUESTIONS};
pub use settings::{ChatSettings, SettingsError, SettingsStore};
