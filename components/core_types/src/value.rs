//! Lox value representation.
//!
//! A [`Value`] is `nil`, a boolean, a number or a reference to a heap object.
//! Two encodings exist behind the same API:
//!
//! - the default tagged encoding, a plain Rust enum;
//! - the `nan_boxing` encoding, a single `u64` where every non-number hides
//!   inside the payload of a quiet NaN.
//!
//! Callers never see the bits; they use the constructors, the `is_*`/`as_*`
//! accessors, or [`Value::kind`] for exhaustive matching.

use std::fmt;

/// Handle to an object living in the heap slab.
///
/// The handle is a slot index plus the generation of the slot at the time the
/// object was allocated. Freeing a slot bumps its generation, so a stale
/// handle can be detected instead of silently aliasing a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    index: u32,
    generation: u16,
}

impl ObjRef {
    /// Create a handle for `index` at `generation`
    pub fn new(index: u32, generation: u16) -> Self {
        Self { index, generation }
    }

    /// Slot index in the heap slab
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot this handle was issued for
    pub fn generation(self) -> u16 {
        self.generation
    }

    #[cfg_attr(not(feature = "nan_boxing"), allow(dead_code))]
    pub(crate) fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    #[cfg_attr(not(feature = "nan_boxing"), allow(dead_code))]
    pub(crate) fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u16,
        }
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Decoded view of a [`Value`], for exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    /// The `nil` value
    Nil,
    /// `true` or `false`
    Bool(bool),
    /// Double-precision number
    Number(f64),
    /// Reference to a heap object
    Object(ObjRef),
}

#[cfg(not(feature = "nan_boxing"))]
mod repr {
    use super::{ObjRef, ValueKind};

    #[derive(Clone, Copy)]
    pub struct Repr(ValueKind);

    impl Repr {
        pub const NIL: Repr = Repr(ValueKind::Nil);

        pub fn boolean(b: bool) -> Self {
            Repr(ValueKind::Bool(b))
        }

        pub fn number(n: f64) -> Self {
            Repr(ValueKind::Number(n))
        }

        pub fn object(r: ObjRef) -> Self {
            Repr(ValueKind::Object(r))
        }

        pub fn kind(self) -> ValueKind {
            self.0
        }
    }
}

#[cfg(feature = "nan_boxing")]
mod repr {
    use super::{ObjRef, ValueKind};

    const SIGN_BIT: u64 = 0x8000_0000_0000_0000;
    const QNAN: u64 = 0x7ffc_0000_0000_0000;

    const TAG_NIL: u64 = 1;
    const TAG_FALSE: u64 = 2;
    const TAG_TRUE: u64 = 3;

    const NIL_BITS: u64 = QNAN | TAG_NIL;
    const FALSE_BITS: u64 = QNAN | TAG_FALSE;
    const TRUE_BITS: u64 = QNAN | TAG_TRUE;
    const OBJ_MASK: u64 = SIGN_BIT | QNAN;

    #[derive(Clone, Copy)]
    pub struct Repr(u64);

    impl Repr {
        pub const NIL: Repr = Repr(NIL_BITS);

        pub fn boolean(b: bool) -> Self {
            Repr(if b { TRUE_BITS } else { FALSE_BITS })
        }

        pub fn number(n: f64) -> Self {
            // Arbitrary NaN payloads could collide with the tag space.
            if n.is_nan() {
                Repr(f64::NAN.to_bits())
            } else {
                Repr(n.to_bits())
            }
        }

        pub fn object(r: ObjRef) -> Self {
            Repr(OBJ_MASK | r.to_bits())
        }

        pub fn kind(self) -> ValueKind {
            let bits = self.0;
            if bits & QNAN != QNAN {
                ValueKind::Number(f64::from_bits(bits))
            } else if bits & OBJ_MASK == OBJ_MASK {
                ValueKind::Object(ObjRef::from_bits(bits & !OBJ_MASK))
            } else {
                match bits {
                    NIL_BITS => ValueKind::Nil,
                    FALSE_BITS => ValueKind::Bool(false),
                    TRUE_BITS => ValueKind::Bool(true),
                    _ => unreachable!("corrupt NaN-boxed value {bits:#x}"),
                }
            }
        }
    }
}

/// A Lox value.
///
/// Values are `Copy`; objects are shared through their [`ObjRef`] handle and
/// kept alive by the garbage collector, not by the value itself.
///
/// # Examples
///
/// ```
/// use core_types::{Value, ValueKind};
///
/// let v = Value::boolean(false);
/// assert!(v.is_falsey());
/// assert!(matches!(v.kind(), ValueKind::Bool(false)));
/// assert_eq!(Value::number(1.0), Value::from(1.0));
/// ```
#[derive(Clone, Copy)]
pub struct Value(repr::Repr);

impl Value {
    /// The `nil` value
    pub fn nil() -> Self {
        Value(repr::Repr::NIL)
    }

    /// A boolean value
    pub fn boolean(b: bool) -> Self {
        Value(repr::Repr::boolean(b))
    }

    /// A number value
    pub fn number(n: f64) -> Self {
        Value(repr::Repr::number(n))
    }

    /// A reference to a heap object
    pub fn object(r: ObjRef) -> Self {
        Value(repr::Repr::object(r))
    }

    /// Decode the value for matching
    pub fn kind(&self) -> ValueKind {
        self.0.kind()
    }

    /// Check if the value is `nil`
    pub fn is_nil(&self) -> bool {
        matches!(self.kind(), ValueKind::Nil)
    }

    /// Check if the value is a boolean
    pub fn is_bool(&self) -> bool {
        matches!(self.kind(), ValueKind::Bool(_))
    }

    /// Check if the value is a number
    pub fn is_number(&self) -> bool {
        matches!(self.kind(), ValueKind::Number(_))
    }

    /// Check if the value references a heap object
    pub fn is_object(&self) -> bool {
        matches!(self.kind(), ValueKind::Object(_))
    }

    /// The boolean payload, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            ValueKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self.kind() {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The object handle, if this references an object
    pub fn as_object(&self) -> Option<ObjRef> {
        match self.kind() {
            ValueKind::Object(r) => Some(r),
            _ => None,
        }
    }

    /// Lox truthiness: only `nil` and `false` are falsey
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert!(Value::nil().is_falsey());
    /// assert!(!Value::number(0.0).is_falsey());
    /// ```
    pub fn is_falsey(&self) -> bool {
        matches!(self.kind(), ValueKind::Nil | ValueKind::Bool(false))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::nil()
    }
}

/// Lox equality: values of different kinds are never equal, numbers compare
/// by IEEE equality and objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ValueKind::Nil => write!(f, "nil"),
            ValueKind::Bool(b) => write!(f, "{b}"),
            ValueKind::Number(n) => write!(f, "{}", format_number(n)),
            ValueKind::Object(r) => write!(f, "<obj {r}>"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::boolean(b)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::object(r)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::nil()
    }
}

/// Render a number the way `print` shows it.
///
/// Integral values print without a fractional part (`3`), others use the
/// shortest representation that round-trips (`0.5`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        format!("{n}")
    }
}
