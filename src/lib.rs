// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod engine;
pub mod feedback;
pub mod render;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod texts;
pub mod time_series;
pub mod util;

pub use engine::{InputUpdate, TypingEngine};
pub use session::SessionStatus;
pub use stats::StatsSnapshot;
