//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `account` - Session commands (login, signup, logout, whoami, reset-password)
//! - `core` - Client construction and shared utilities (open_client, AlreadyReported)
//! - `views` - Page and form commands (dashboard, transactions, goals, budget, predictions)

pub mod account;
pub mod core;
pub mod views;

// Re-export command functions for main.rs
pub use account::*;
pub use core::*;
pub use views::*;
