//! Object heap with mark-sweep garbage collection.
//!
//! Objects live in a slab of slots. A slot holds the object, its mark bit
//! and the byte size it was charged. Freed slots bump their generation and
//! go on a free list for reuse, so [`ObjRef`] handles stay small and stale
//! handles are caught instead of aliasing new objects.

use crate::gc::{GcConfig, GcStats, Marker, RootSource};
use crate::interner::Interner;
use crate::object::{hash_string, LoxString, Obj, TABLE_ENTRY_SIZE};
use bytecode_system::ConstantFormatter;
use core_types::{format_number, ObjRef, Value, ValueKind};
use log::{debug, trace};
use std::time::Instant;

pub(crate) struct Entry {
    pub(crate) obj: Obj,
    pub(crate) marked: bool,
    size: usize,
}

pub(crate) struct Slot {
    pub(crate) generation: u16,
    pub(crate) entry: Option<Entry>,
}

/// The object heap.
///
/// # Example
///
/// ```
/// use memory_manager::{Heap, NoRoots};
///
/// let mut heap = Heap::new();
/// let a = heap.intern("abc", &NoRoots);
/// let b = heap.intern("abc", &NoRoots);
/// assert_eq!(a, b);
/// assert_eq!(heap.string(a), "abc");
/// ```
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    strings: Interner,
    bytes_allocated: usize,
    next_gc: usize,
    config: GcConfig,
    stats: GcStats,
    gray: Vec<ObjRef>,
    scratch: Vec<ObjRef>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Creates a new heap with the default collector configuration.
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    /// Creates a new heap with the given collector configuration.
    pub fn with_config(config: GcConfig) -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            strings: Interner::new(),
            bytes_allocated: 0,
            next_gc: config.initial_threshold,
            config,
            stats: GcStats::default(),
            gray: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Allocates an object, collecting first if the heap is over threshold.
    ///
    /// # Arguments
    ///
    /// * `obj` - The object to store
    /// * `roots` - Everything the caller holds that must survive a collection
    ///
    /// References held by `obj` itself are treated as roots, so an object may
    /// be built from handles that are otherwise unreachable.
    ///
    /// # Returns
    ///
    /// Handle to the new object.
    pub fn alloc(&mut self, obj: Obj, roots: &dyn RootSource) -> ObjRef {
        let size = obj.byte_size();
        if self.config.stress || self.bytes_allocated + size > self.next_gc {
            self.collect(roots, Some(&obj));
        }
        self.bytes_allocated += size;
        trace!("allocate {} ({} bytes)", obj.type_name(), size);
        self.insert(obj, size)
    }

    fn insert(&mut self, obj: Obj, size: usize) -> ObjRef {
        let entry = Entry {
            obj,
            marked: false,
            size,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                ObjRef::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("object heap exhausted"));
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                ObjRef::new(index, 0)
            }
        }
    }

    /// Returns the interned string with this content, allocating it if new.
    pub fn intern(&mut self, text: &str, roots: &dyn RootSource) -> ObjRef {
        let hash = hash_string(text);
        match self.find_interned(text, hash) {
            Some(r) => r,
            None => self.register_string(LoxString::with_hash(text, hash), roots),
        }
    }

    /// Like [`Heap::intern`], taking ownership of the text.
    pub fn intern_owned(&mut self, text: String, roots: &dyn RootSource) -> ObjRef {
        let hash = hash_string(&text);
        match self.find_interned(&text, hash) {
            Some(r) => r,
            None => self.register_string(LoxString::with_hash(text, hash), roots),
        }
    }

    fn register_string(&mut self, string: LoxString, roots: &dyn RootSource) -> ObjRef {
        let hash = string.hash();
        let r = self.alloc(Obj::String(string), roots);
        self.strings.insert(hash, r);
        r
    }

    fn find_interned(&self, text: &str, hash: u32) -> Option<ObjRef> {
        let slots = &self.slots;
        self.strings.find(hash, |r| {
            matches!(live_obj(slots, r), Some(Obj::String(s)) if s.as_str() == text)
        })
    }

    /// Looks up an interned string without allocating.
    pub fn find_string(&self, text: &str) -> Option<ObjRef> {
        self.find_interned(text, hash_string(text))
    }

    /// Returns the object behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, which means a root was missed.
    pub fn get(&self, r: ObjRef) -> &Obj {
        live_obj(&self.slots, r).unwrap_or_else(|| panic!("dangling object reference {r}"))
    }

    /// Mutable access to the object behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn get_mut(&mut self, r: ObjRef) -> &mut Obj {
        self.slots
            .get_mut(r.index() as usize)
            .filter(|slot| slot.generation == r.generation())
            .and_then(|slot| slot.entry.as_mut())
            .map(|entry| &mut entry.obj)
            .unwrap_or_else(|| panic!("dangling object reference {r}"))
    }

    /// Returns the object behind a handle, or `None` if it was freed.
    pub fn try_get(&self, r: ObjRef) -> Option<&Obj> {
        live_obj(&self.slots, r)
    }

    /// Checks whether a handle still refers to a live object.
    pub fn contains(&self, r: ObjRef) -> bool {
        live_obj(&self.slots, r).is_some()
    }

    /// Text of a string object.
    ///
    /// # Panics
    ///
    /// Panics if `r` is not a live string.
    pub fn string(&self, r: ObjRef) -> &str {
        match self.get(r) {
            Obj::String(s) => s.as_str(),
            other => panic!("expected string, found {}", other.type_name()),
        }
    }

    /// Sets a field on an instance, charging the heap for new entries.
    ///
    /// Returns `false` if `instance` is not an instance.
    pub fn set_field(&mut self, instance: ObjRef, name: ObjRef, value: Value) -> bool {
        let added = match self.get_mut(instance) {
            Obj::Instance(i) => i.fields.insert(name, value).is_none(),
            _ => return false,
        };
        if added {
            self.charge(instance, TABLE_ENTRY_SIZE);
        }
        true
    }

    /// Adds or replaces a method on a class, charging the heap for new
    /// entries.
    ///
    /// Returns `false` if `class` is not a class.
    pub fn set_method(&mut self, class: ObjRef, name: ObjRef, method: ObjRef) -> bool {
        let added = match self.get_mut(class) {
            Obj::Class(c) => c.methods.insert(name, method).is_none(),
            _ => return false,
        };
        if added {
            self.charge(class, TABLE_ENTRY_SIZE);
        }
        true
    }

    fn charge(&mut self, r: ObjRef, bytes: usize) {
        if let Some(entry) = self.slots[r.index() as usize].entry.as_mut() {
            entry.size += bytes;
        }
        self.bytes_allocated += bytes;
    }

    /// Performs a full collection now.
    pub fn collect_garbage(&mut self, roots: &dyn RootSource) {
        self.collect(roots, None);
    }

    fn collect(&mut self, roots: &dyn RootSource, pending: Option<&Obj>) {
        let started = Instant::now();
        let before = self.bytes_allocated;
        debug!("-- gc begin ({} bytes allocated)", before);

        let marked = {
            let mut marker = Marker::new(&mut self.slots, &mut self.gray, &mut self.scratch);
            roots.mark_roots(&mut marker);
            if let Some(obj) = pending {
                marker.mark_children(obj);
            }
            marker.trace_references();
            marker.marked_count()
        };

        let slots = &self.slots;
        let dropped_strings = self
            .strings
            .retain(|r| live_entry(slots, r).is_some_and(|entry| entry.marked));

        let (objects, bytes) = self.sweep();
        self.bytes_allocated -= bytes;
        self.next_gc = (self.bytes_allocated * self.config.grow_factor)
            .max(self.config.initial_threshold);

        self.stats.collections += 1;
        self.stats.objects_freed += objects;
        self.stats.bytes_freed += bytes;
        self.stats.total_time_us += started.elapsed().as_micros() as u64;

        debug!(
            "-- gc end: marked {} objects, freed {} objects ({} interned), collected {} bytes (from {} to {}) next at {}",
            marked,
            objects,
            dropped_strings,
            bytes,
            before,
            self.bytes_allocated,
            self.next_gc
        );
    }

    fn sweep(&mut self) -> (usize, usize) {
        let mut objects = 0;
        let mut bytes = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            if entry.marked {
                entry.marked = false;
                continue;
            }
            if let Some(entry) = slot.entry.take() {
                trace!("free {} #{} ({} bytes)", entry.obj.type_name(), index, entry.size);
                objects += 1;
                bytes += entry.size;
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index as u32);
        }
        (objects, bytes)
    }

    /// Frees every object, invalidating all outstanding handles.
    pub fn free_all(&mut self) {
        let mut objects = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                objects += 1;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.strings.clear();
        debug!("freed all {} objects ({} bytes)", objects, self.bytes_allocated);
        self.bytes_allocated = 0;
        self.next_gc = self.config.initial_threshold;
    }

    /// Renders a value the way `print` shows it.
    pub fn format_value(&self, value: Value) -> String {
        match value.kind() {
            ValueKind::Nil => "nil".to_string(),
            ValueKind::Bool(b) => b.to_string(),
            ValueKind::Number(n) => format_number(n),
            ValueKind::Object(r) => self.format_object(r),
        }
    }

    fn format_object(&self, r: ObjRef) -> String {
        match self.get(r) {
            Obj::String(s) => s.as_str().to_string(),
            Obj::Function(f) => match f.name {
                Some(name) => format!("<fn {}>", self.string(name)),
                None => "<script>".to_string(),
            },
            Obj::Native(_) => "<native fn>".to_string(),
            Obj::Closure(c) => self.format_object(c.function),
            Obj::Upvalue(_) => "upvalue".to_string(),
            Obj::Class(c) => self.string(c.name).to_string(),
            Obj::Instance(i) => match self.get(i.class) {
                Obj::Class(c) => format!("{} instance", self.string(c.name)),
                _ => "instance".to_string(),
            },
            Obj::BoundMethod(b) => self.format_object(b.method),
        }
    }

    /// Bytes currently charged to live objects
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// Heap size that triggers the next collection
    pub fn next_gc(&self) -> usize {
        self.next_gc
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of interned strings
    pub fn interned_count(&self) -> usize {
        self.strings.len()
    }

    /// Returns the number of garbage collections performed.
    pub fn collection_count(&self) -> usize {
        self.stats.collections
    }

    /// Accumulated collector statistics
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Collector configuration
    pub fn config(&self) -> &GcConfig {
        &self.config
    }
}

impl ConstantFormatter for Heap {
    fn format_constant(&self, value: Value) -> String {
        match value.as_object().and_then(|r| self.try_get(r)) {
            Some(_) => self.format_value(value),
            None if value.is_object() => "<freed>".to_string(),
            None => self.format_value(value),
        }
    }

    fn upvalue_count(&self, value: Value) -> usize {
        value
            .as_object()
            .and_then(|r| self.try_get(r))
            .and_then(Obj::as_function)
            .map_or(0, |f| f.upvalue_count)
    }
}

fn live_entry(slots: &[Slot], r: ObjRef) -> Option<&Entry> {
    slots
        .get(r.index() as usize)
        .filter(|slot| slot.generation == r.generation())
        .and_then(|slot| slot.entry.as_ref())
}

fn live_obj(slots: &[Slot], r: ObjRef) -> Option<&Obj> {
    live_entry(slots, r).map(|entry| &entry.obj)
}
