pub mod action;
pub mod agent;
pub mod chat;
pub mod locator;
pub mod matcher;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod store;
pub mod utils;

// Re-export common items
pub use action::{Action, ActionKind};
pub use matcher::TaskMatcher;
pub use recorder::Recorder;
pub use replay::{ReplayConfig, Replayer};
pub use session::BrowserSession;
pub use store::ProcessStore;
pub use utils::config::Config;
