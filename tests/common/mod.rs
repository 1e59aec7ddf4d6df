//! Shared test support for the workflow tests.

pub mod fixtures;

pub use fixtures::TestFixtures;
