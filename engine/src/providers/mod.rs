//! Built-in provider implementations
//!
//! The engine ships one provider family: synthetic in-process generators
//! that back the demo binary and integration tests. Real deployments plug
//! their own implementations of the sdk provider traits.

pub mod synthetic;

pub use synthetic::SyntheticProviders;
