//! Application crate for smartbot: CLI, configuration, the session
//! controller that routes typed and spoken questions, and the REPL surface.

pub mod cli;
pub mod config;
pub mod feedback;
pub mod playback;
pub mod repl;
pub mod session;

pub use cli::Cli;
pub use config::AppConfig;
pub use session::{SessionController, TurnOutcome};
