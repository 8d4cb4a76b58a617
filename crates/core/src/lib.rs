pub mod console;
pub mod openai;
pub mod prompt;
pub mod scenario;
pub mod selector;
pub mod service;
pub mod session;

pub use console::{ConsoleLines, spawn_stdin_reader};
pub use prompt::{DEBRIEF_TRIGGER, PromptComposer, build_instructions};
pub use scenario::{CatalogError, Scenario, ScenarioCatalog};
pub use selector::choose_scenario;
pub use service::{PollStrategy, ServiceError, SessionService};
pub use session::{SessionError, SessionOrchestrator, SessionSettings, SessionSummary};
