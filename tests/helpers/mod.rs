// Shared fixtures for the integration test binaries.
//
// Each [[test]] target pulls this in with a #[path] attribute and gets
// its own compiled copy, so not every helper is referenced by every
// binary.
#![allow(dead_code)]

pub mod failing_store;
pub mod test_data;

pub use failing_store::FailingStore;
pub use test_data::*;
