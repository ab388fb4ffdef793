//! Ports the ghost service uses outside of its storage drivers.
//!
//! Services depend on traits, never on concrete infrastructure
//! implementations.

pub mod fs;
