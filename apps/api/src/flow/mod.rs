// Wizard flow: the explicit state machine plus the snapshot router kept for
// clients that still persist the flat field bag.

pub mod handlers;
pub mod route;
pub mod wizard;

pub use route::{current_route, FlowSnapshot, Goal, Step};
pub use wizard::{next_step, AnalysisSubject, SourceRef, WizardEvent, WizardState};
