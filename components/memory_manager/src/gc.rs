//! Mark-sweep garbage collection.
//!
//! Collection is stop-the-world and runs inside allocation:
//!
//! 1. Roots are marked through [`RootSource::mark_roots`].
//! 2. Gray objects are popped from an explicit stack and their references
//!    marked (tri-color marking without recursion).
//! 3. The intern table drops strings that were not marked.
//! 4. Unmarked slots are freed and survivors are unmarked for the next cycle.
//!
//! The threshold for the next cycle is `bytes_allocated * grow_factor`, never
//! lower than the configured initial threshold.

use crate::heap::Slot;
use crate::object::Obj;
use core_types::{ObjRef, Value};

/// Configuration for the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct GcConfig {
    /// Heap size that triggers the first collection, and the floor for later
    /// thresholds
    pub initial_threshold: usize,
    /// Multiplier applied to the surviving heap size to get the next
    /// threshold
    pub grow_factor: usize,
    /// Collect on every allocation
    pub stress: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            initial_threshold: 1024 * 1024, // 1MiB
            grow_factor: 2,
            stress: false,
        }
    }
}

impl GcConfig {
    /// Default configuration with stress mode enabled
    pub fn stress() -> Self {
        GcConfig {
            stress: true,
            ..GcConfig::default()
        }
    }
}

/// Statistics accumulated across collections.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GcStats {
    /// Number of completed collections
    pub collections: usize,
    /// Total objects freed
    pub objects_freed: usize,
    /// Total bytes freed
    pub bytes_freed: usize,
    /// Total time spent collecting (microseconds)
    pub total_time_us: u64,
}

/// Anything that holds references the collector must treat as live.
///
/// The VM exposes its value stack, frames, open upvalues and globals through
/// this trait; the compiler wraps the VM's roots and adds the constants of
/// the functions it is still building.
pub trait RootSource {
    /// Mark every root this source holds
    fn mark_roots(&self, marker: &mut Marker<'_>);
}

/// Root source with nothing to mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoots;

impl RootSource for NoRoots {
    fn mark_roots(&self, _marker: &mut Marker<'_>) {}
}

impl<T: RootSource + ?Sized> RootSource for &T {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        (**self).mark_roots(marker);
    }
}

/// Marking state handed to root sources during a collection.
pub struct Marker<'h> {
    slots: &'h mut [Slot],
    gray: &'h mut Vec<ObjRef>,
    scratch: &'h mut Vec<ObjRef>,
    marked: usize,
}

impl<'h> Marker<'h> {
    pub(crate) fn new(
        slots: &'h mut [Slot],
        gray: &'h mut Vec<ObjRef>,
        scratch: &'h mut Vec<ObjRef>,
    ) -> Self {
        gray.clear();
        Marker {
            slots,
            gray,
            scratch,
            marked: 0,
        }
    }

    /// Mark an object reachable
    ///
    /// Stale or already-marked handles are ignored.
    pub fn mark_object(&mut self, r: ObjRef) {
        let Some(slot) = self.slots.get_mut(r.index() as usize) else {
            return;
        };
        if slot.generation != r.generation() {
            return;
        }
        if let Some(entry) = slot.entry.as_mut() {
            if entry.marked {
                return;
            }
            entry.marked = true;
            self.marked += 1;
            // Strings hold no references; they go straight to black.
            if !matches!(entry.obj, Obj::String(_)) {
                self.gray.push(r);
            }
        }
    }

    /// Mark the object a value refers to, if any
    pub fn mark_value(&mut self, value: Value) {
        if let Some(r) = value.as_object() {
            self.mark_object(r);
        }
    }

    /// Mark every value in `values`
    pub fn mark_values<'v>(&mut self, values: impl IntoIterator<Item = &'v Value>) {
        for value in values {
            self.mark_value(*value);
        }
    }

    /// Mark everything `obj` references without marking `obj` itself
    ///
    /// Used for an object that is about to be allocated and therefore has no
    /// slot yet.
    pub fn mark_children(&mut self, obj: &Obj) {
        self.scratch.clear();
        obj.trace(self.scratch);
        for i in 0..self.scratch.len() {
            let child = self.scratch[i];
            self.mark_object(child);
        }
    }

    /// Drain the gray stack, blackening every reachable object
    pub(crate) fn trace_references(&mut self) {
        while let Some(r) = self.gray.pop() {
            self.scratch.clear();
            if let Some(entry) = self.slots[r.index() as usize].entry.as_ref() {
                entry.obj.trace(self.scratch);
            }
            for i in 0..self.scratch.len() {
                let child = self.scratch[i];
                self.mark_object(child);
            }
        }
    }

    /// Number of objects marked so far
    pub fn marked_count(&self) -> usize {
        self.marked
    }
}
