//! Unit test runner for memory_manager


use core_types::Value;
use memory_manager::{Marker, RootSource};

/// Roots held by a test: a plain list of values
#[derive(Default)]
pub struct TestRoots(pub Vec<Value>);

impl RootSource for TestRoots {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        marker.mark_values(&self.0);
    }
}
