pub mod diagnostics;
pub mod form_submit;
pub mod host;
pub mod input_synthesizer;
pub mod loop_scheduler;
pub mod scenarios;

pub use host::create_host;
pub use loop_scheduler::AutomationController;
