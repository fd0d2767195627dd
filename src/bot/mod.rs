/// Event fetch and per-event delivery
pub mod alerts;
/// Bot command definitions
pub mod commands;
/// Update routing and command handlers
pub mod handlers;
/// Inline keyboard construction
pub mod menu;
/// Outbound message abstraction
pub mod messaging;
