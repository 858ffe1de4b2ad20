//! Domain event primitives shared by the Bookworm crates.

pub mod bus;

pub use bus::{DomainEvent, EventBus};
