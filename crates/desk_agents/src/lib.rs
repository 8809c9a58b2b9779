//! # desk_agents
//!
//! Role agents for DeskFlow support-ticket triage.
//!
//! ## Architecture
//!
//! All agents implement the [`Agent`] trait: given a [`Ticket`] and the
//! [`AgentContext`] accumulated so far, an agent produces one [`Analysis`].
//! The analysis may name a next role, which is how handoffs are requested.
//! Agents hold no state between calls.
//!
//! The [`AgentRegistry`] binds exactly one agent to each [`AgentRole`].
//!
//! ## Available Agents
//!
//! | Agent | Role | Hands off to |
//! |-------|------|--------------|
//! | [`CoordinatorAgent`] | Coordinator | specialist matching the ticket |
//! | [`ImplementerAgent`] | Implementer | Tester |
//! | [`InfraAgent`] | Infra | - |
//! | [`TesterAgent`] | Tester | - |
//! | [`AnalystAgent`] | Analyst | - |
//! | [`PlatformAgent`] | PlatformSpecialist | Infra on hosting symptoms |
//!
//! All built-in agents are deterministic keyword heuristics.

pub mod analyst;
pub mod coordinator;
pub mod error;
pub mod implementer;
pub mod infra;
pub mod platform;
pub mod roles;
pub mod signals;
pub mod tester;
pub mod testing;
pub mod ticket;
pub mod traits;

pub use analyst::AnalystAgent;
pub use coordinator::CoordinatorAgent;
pub use error::{AgentError, AgentResult};
pub use implementer::ImplementerAgent;
pub use infra::InfraAgent;
pub use platform::PlatformAgent;
pub use roles::{AgentRegistry, AgentRole};
pub use signals::Signal;
pub use tester::TesterAgent;
pub use ticket::{Ticket, TicketPriority};
pub use traits::{Agent, AgentContext, Analysis, Complexity, MAX_CONFIDENCE};
