//! Combat sessions: membership, scheduling and the engine that drives them

pub mod combat;
pub mod engine;
pub mod events;
pub mod scheduler;
pub mod variant;

pub use combat::{CombatSession, SessionState};
pub use engine::{initial_delay, Engine, EngineBuilder, TruceOutcome, Turn, TurnOutcome};
pub use events::{CombatEvent, CombatObserver, EventLog, LeaveReason, TracingObserver};
pub use scheduler::{ScheduleKey, ScheduleKind, Scheduler, TimerQueue};
pub use variant::{CombatHooks, NoHooks, SessionRules};
