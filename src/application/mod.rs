//! Application services.
//!
//! The cache, detector, registry and dispatcher are driven by the
//! [`scheduler::Scheduler`]; inbound chat commands go through
//! [`command::CommandHandler`].

pub mod broadcast;
pub mod cache;
pub mod command;
pub mod detector;
pub mod lifecycle;
pub mod message;
pub mod registry;
pub mod scheduler;

pub use broadcast::{BroadcastConfig, BroadcastReport, DeliveryFailure, Dispatcher};
pub use cache::CacheStore;
pub use command::{parse_command, BotCommand, CommandHandler, CommandParseError};
pub use detector::detect;
pub use lifecycle::{LifecycleState, SchedulerHandle};
pub use registry::ChatRegistry;
pub use scheduler::{CycleOutcome, Scheduler, SchedulerConfig};
