//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - init and shared utilities (open_db, load_config, open_service)
//! - `serve` - Web server command
//! - `subscriptions` - Subscription listing and removal
//! - `summary` - Spend summary
//! - `sync` - Provider sync
//! - `transactions` - Provider transaction listing
//! - `users` - Local user registration

pub mod core;
pub mod serve;
pub mod subscriptions;
pub mod summary;
pub mod sync;
pub mod transactions;
pub mod users;

// Re-export command functions for main.rs
pub use core::*;
pub use serve::*;
pub use subscriptions::*;
pub use summary::*;
pub use sync::*;
pub use transactions::*;
pub use users::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
