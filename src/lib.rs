//! Valet: voice/text-driven desktop assistant.
//!
//! Routes spoken or typed natural-language utterances to one of several
//! handlers: application launching, screen UI automation, screen content
//! analysis (screenshot + OCR + LLM), code-workspace inspection via a
//! local LLM, and conversational chat with optional short-term memory.
//!
//! # Architecture
//!
//! Classification and dispatch are the core; everything at the edges is
//! a collaborator trait:
//! - **Intent classifier**: ordered rule groups, first match wins
//! - **Domain routers**: launcher, code assistant, automation, vision
//! - **Command processor**: fixed-precedence dispatch over the routers
//! - **Session controller**: input/speed modes and the main loop
//!
//! Control flow: raw input → session controller → command processor →
//! matched router → collaborator → result string → speak/print.

pub mod automation;
pub mod code_assistant;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod launcher;
pub mod listen;
pub mod llm;
pub mod memory;
pub mod platform;
pub mod session;
pub mod speech;
pub mod text_input;
pub mod vision;

pub use config::AssistantConfig;
pub use dispatch::{CommandProcessor, DispatchOutcome, DispatchResult};
pub use error::{AssistantError, Result};
pub use intent::{Intent, IntentClassifier};
pub use session::SessionController;
