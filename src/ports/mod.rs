//! Ports: the traits this engine depends on.

pub mod outbound;
