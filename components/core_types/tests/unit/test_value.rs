//! Unit tests for Value and ObjRef

use core_types::{ObjRef, Value, ValueKind};

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_nil() {
        let val = Value::nil();
        assert!(val.is_nil());
        assert!(!val.is_bool());
        assert!(matches!(val.kind(), ValueKind::Nil));
    }

    #[test]
    fn test_value_boolean() {
        assert_eq!(Value::boolean(true).as_bool(), Some(true));
        assert_eq!(Value::boolean(false).as_bool(), Some(false));
        assert_eq!(Value::nil().as_bool(), None);
    }

    #[test]
    fn test_value_number() {
        let val = Value::number(1.5);
        assert!(val.is_number());
        assert_eq!(val.as_number(), Some(1.5));
        assert_eq!(val.as_object(), None);
    }

    #[test]
    fn test_value_negative_zero_and_infinity() {
        assert_eq!(Value::number(-0.0).as_number(), Some(-0.0));
        assert_eq!(Value::number(f64::INFINITY).as_number(), Some(f64::INFINITY));
        assert_eq!(
            Value::number(f64::NEG_INFINITY).as_number(),
            Some(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_value_object() {
        let r = ObjRef::new(12, 4);
        let val = Value::object(r);
        assert!(val.is_object());
        assert_eq!(val.as_object(), Some(r));
        assert_eq!(val.as_object().map(ObjRef::index), Some(12));
        assert_eq!(val.as_object().map(ObjRef::generation), Some(4));
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from(2.0), Value::number(2.0));
        assert_eq!(Value::from(true), Value::boolean(true));
        assert_eq!(Value::from(()), Value::nil());
        let r = ObjRef::new(0, 0);
        assert_eq!(Value::from(r), Value::object(r));
    }

    #[test]
    fn test_value_default_is_nil() {
        assert!(Value::default().is_nil());
    }
}

#[cfg(test)]
mod value_truthiness_tests {
    use super::*;

    #[test]
    fn test_only_nil_and_false_are_falsey() {
        assert!(Value::nil().is_falsey());
        assert!(Value::boolean(false).is_falsey());
        assert!(!Value::boolean(true).is_falsey());
        assert!(!Value::number(0.0).is_falsey());
        assert!(!Value::object(ObjRef::new(0, 0)).is_falsey());
    }
}

#[cfg(test)]
mod value_equality_tests {
    use super::*;

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(Value::number(3.0), Value::number(3.0));
        assert_ne!(Value::number(3.0), Value::number(4.0));
        assert_eq!(Value::number(0.0), Value::number(-0.0));
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a = ObjRef::new(1, 0);
        let b = ObjRef::new(2, 0);
        let stale = ObjRef::new(1, 1);
        assert_eq!(Value::object(a), Value::object(a));
        assert_ne!(Value::object(a), Value::object(b));
        assert_ne!(Value::object(a), Value::object(stale));
    }

    #[test]
    fn test_different_kinds_are_unequal() {
        assert_ne!(Value::nil(), Value::number(0.0));
        assert_ne!(Value::boolean(true), Value::number(1.0));
        assert_ne!(Value::object(ObjRef::new(0, 0)), Value::nil());
    }
}
