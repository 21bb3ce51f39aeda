//! Adapters implementing the outbound ports.

pub mod state_adapter;

pub use state_adapter::InMemoryWorldState;
