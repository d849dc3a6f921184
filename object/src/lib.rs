mod ctx;
mod dyobj;
mod error;
mod flags;
mod hash;
mod id;
mod native;

pub mod array;
pub mod map;
pub mod ops;
pub mod string;

pub use ctx::{ClosureCtx, ClosureId};
pub use dyobj::{AttrKey, DynamicObject};
pub use error::{NativeResult, NativeTypeError};
pub use flags::ObjectFlags;
pub use hash::{attr_key, fnv1a};
pub use id::{NativeKey, ObjectId};
pub use native::{Kind, NativeValue};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn ids(n: u32) -> Vec<ObjectId> {
        (0..n).map(|i| ObjectId::new(i, 0)).collect()
    }

    // ── ids and flags ──────────────────────────────────────────────

    #[test]
    fn object_id_raw_round_trip() {
        let id = ObjectId::new(7, 3);
        assert_eq!(ObjectId::from_raw(id.to_raw()), id);
        assert_eq!(id.to_string(), "@7:3");
    }

    #[test]
    fn flags_compose() {
        let f = ObjectFlags::NON_GC.with(ObjectFlags::IMMUTABLE);
        assert!(f.contains(ObjectFlags::NON_GC));
        assert!(f.contains(ObjectFlags::IMMUTABLE));
        assert!(!f.contains(ObjectFlags::INDELIBLE));
        assert_eq!(f.without(ObjectFlags::NON_GC), ObjectFlags::IMMUTABLE);
    }

    #[test]
    fn dynamic_object_attributes() {
        let mut obj = DynamicObject::new();
        let key = attr_key("x");
        assert!(!obj.hasattr(key));
        assert_eq!(obj.putattr(key, ObjectId::new(1, 0)), None);
        assert_eq!(obj.putattr(key, ObjectId::new(2, 0)), Some(ObjectId::new(1, 0)));
        assert_eq!(obj.getattr(key), Some(ObjectId::new(2, 0)));
        assert_eq!(obj.attr_count(), 1);
        assert_eq!(obj.delattr(key), Some(ObjectId::new(2, 0)));
        assert!(!obj.hasattr(key));
    }

    #[test]
    fn attr_key_is_stable() {
        assert_eq!(attr_key("name"), attr_key("name"));
        assert_ne!(attr_key("name"), attr_key("nam"));
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
    }

    // ── arithmetic ─────────────────────────────────────────────────

    #[test]
    fn result_kind_promotes() {
        assert_eq!(ops::result_kind(Kind::Int8, Kind::Int32), Kind::Int32);
        assert_eq!(ops::result_kind(Kind::UInt64, Kind::Dec1), Kind::Dec1);
        assert_eq!(ops::result_kind(Kind::Bool, Kind::Bool), Kind::Int8);
    }

    #[test]
    fn binary_operand_order() {
        let r = ops::sub(&NativeValue::Int64(10), &NativeValue::Int64(3)).unwrap();
        assert_eq!(r, NativeValue::Int64(7));
        let r = ops::div(&NativeValue::Int32(9), &NativeValue::Int32(2)).unwrap();
        assert_eq!(r, NativeValue::Int32(4));
    }

    #[test]
    fn mixed_kinds_widen() {
        let r = ops::add(&NativeValue::Int32(2), &NativeValue::Int64(3)).unwrap();
        assert_eq!(r, NativeValue::Int64(5));
        let r = ops::add(&NativeValue::Int32(1), &NativeValue::Dec2(0.5)).unwrap();
        assert_eq!(r, NativeValue::Dec2(1.5));
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let r = ops::add(&NativeValue::Int8(127), &NativeValue::Int8(1)).unwrap();
        assert_eq!(r, NativeValue::Int8(-128));
        let r = ops::sub(&NativeValue::UInt8(0), &NativeValue::UInt8(1)).unwrap();
        assert_eq!(r, NativeValue::UInt8(255));
    }

    #[test]
    fn integer_division_by_zero() {
        let err = ops::div(&NativeValue::Int64(1), &NativeValue::Int64(0)).unwrap_err();
        assert_eq!(err, NativeTypeError::DivisionByZero);
        let err = ops::rem(&NativeValue::Int64(1), &NativeValue::Int64(0)).unwrap_err();
        assert_eq!(err, NativeTypeError::DivisionByZero);
    }

    #[test]
    fn invalid_operands_are_reported() {
        let err = ops::sub(&NativeValue::Str("a".into()), &NativeValue::Int8(1)).unwrap_err();
        assert!(matches!(err, NativeTypeError::InvalidOperands { op: "sub", .. }));
        let err = ops::bit_and(&NativeValue::Dec2(1.0), &NativeValue::Int8(1)).unwrap_err();
        assert!(matches!(err, NativeTypeError::InvalidOperands { op: "band", .. }));
    }

    #[test]
    fn string_concatenation() {
        let r = ops::add(&NativeValue::Str("ab".into()), &NativeValue::Str("cd".into())).unwrap();
        assert_eq!(r, NativeValue::Str("abcd".into()));
    }

    #[test]
    fn comparisons() {
        let (a, b) = (NativeValue::Int16(3), NativeValue::Dec2(3.5));
        assert_eq!(ops::lt(&a, &b).unwrap(), NativeValue::Bool(true));
        assert_eq!(ops::ge(&a, &b).unwrap(), NativeValue::Bool(false));
        assert_eq!(ops::cmp(&b, &a).unwrap(), NativeValue::Int32(1));
        assert_eq!(
            ops::eq(&NativeValue::Int8(4), &NativeValue::UInt64(4)).unwrap(),
            NativeValue::Bool(true)
        );
    }

    #[test]
    fn unary_ops_mutate_in_place() {
        let mut v = NativeValue::Int32(-5);
        ops::abs(&mut v).unwrap();
        assert_eq!(v, NativeValue::Int32(5));
        ops::inc(&mut v).unwrap();
        assert_eq!(v, NativeValue::Int32(6));
        ops::neg(&mut v).unwrap();
        assert_eq!(v, NativeValue::Int32(-6));
        ops::logical_not(&mut v).unwrap();
        assert_eq!(v, NativeValue::Bool(false));

        let mut v = NativeValue::Int64(16);
        ops::sqrt(&mut v).unwrap();
        assert_eq!(v, NativeValue::Dec2(4.0));
    }

    #[test]
    fn conversions() {
        assert_eq!(
            NativeValue::Str(" 42 ".into()).convert(Kind::Int32).unwrap(),
            NativeValue::Int32(42)
        );
        assert_eq!(
            NativeValue::Dec2(2.9).convert(Kind::Int8).unwrap(),
            NativeValue::Int8(2)
        );
        assert_eq!(
            NativeValue::Int8(7).convert(Kind::Str).unwrap(),
            NativeValue::Str("7".into())
        );
        let err = NativeValue::Array(vec![]).convert(Kind::Int64).unwrap_err();
        assert_eq!(
            err,
            NativeTypeError::Conversion {
                from: Kind::Array,
                to: Kind::Int64
            }
        );
    }

    #[test]
    fn truthiness() {
        assert!(!NativeValue::Int64(0).is_truthy());
        assert!(NativeValue::UInt8(3).is_truthy());
        assert!(!NativeValue::Str(String::new()).is_truthy());
        assert!(NativeValue::Array(ids(1)).is_truthy());
    }

    // ── strings ────────────────────────────────────────────────────

    #[test]
    fn string_positions_count_chars() {
        let s = NativeValue::Str("héllo".into());
        assert_eq!(string::len(&s).unwrap(), NativeValue::UInt64(5));
        let t = NativeValue::Str("llo".into());
        assert_eq!(string::find(&s, &t).unwrap(), NativeValue::Int64(2));
        assert_eq!(
            string::substr_range(&s, &NativeValue::Int64(1), &NativeValue::Int64(2)).unwrap(),
            NativeValue::Str("él".into())
        );
    }

    #[test]
    fn string_find_variants() {
        let s = NativeValue::Str("abcabc".into());
        let t = NativeValue::Str("bc".into());
        assert_eq!(string::rfind(&s, &t).unwrap(), NativeValue::Int64(4));
        assert_eq!(
            string::find_from(&s, &t, &NativeValue::Int64(2)).unwrap(),
            NativeValue::Int64(4)
        );
        assert_eq!(
            string::rfind_before(&s, &t, &NativeValue::Int64(3)).unwrap(),
            NativeValue::Int64(1)
        );
        let missing = NativeValue::Str("zz".into());
        assert_eq!(string::find(&s, &missing).unwrap(), NativeValue::Int64(-1));
    }

    #[test]
    fn string_edits() {
        let mut s = NativeValue::Str("world".into());
        string::insert(&mut s, &NativeValue::Int64(0), &NativeValue::Str("hello ".into())).unwrap();
        assert_eq!(s, NativeValue::Str("hello world".into()));
        string::replace(
            &mut s,
            &NativeValue::Int64(0),
            &NativeValue::Int64(5),
            &NativeValue::Str("HELLO".into()),
        )
        .unwrap();
        assert_eq!(s, NativeValue::Str("HELLO world".into()));
        string::erase_range(&mut s, &NativeValue::Int64(5), &NativeValue::Int64(6)).unwrap();
        assert_eq!(s, NativeValue::Str("HELLO".into()));
        string::push_char(&mut s, &NativeValue::Int32('!' as i32)).unwrap();
        string::to_lower(&mut s).unwrap();
        assert_eq!(s, NativeValue::Str("hello!".into()));
        string::reverse(&mut s).unwrap();
        assert_eq!(s, NativeValue::Str("!olleh".into()));
    }

    #[test]
    fn string_position_out_of_range() {
        let s = NativeValue::Str("abc".into());
        let err = string::substr(&s, &NativeValue::Int64(4)).unwrap_err();
        assert_eq!(err, NativeTypeError::IndexOutOfRange { index: 4, len: 3 });
    }

    #[test]
    fn string_trim() {
        let mut s = NativeValue::Str("  pad  ".into());
        string::trim_start(&mut s).unwrap();
        assert_eq!(s, NativeValue::Str("pad  ".into()));
        string::trim(&mut s).unwrap();
        assert_eq!(s, NativeValue::Str("pad".into()));
    }

    // ── arrays ─────────────────────────────────────────────────────

    #[test]
    fn array_access() {
        let a = NativeValue::Array(ids(3));
        assert_eq!(array::at(&a, &NativeValue::Int64(1)).unwrap(), ObjectId::new(1, 0));
        assert_eq!(array::front(&a).unwrap(), ObjectId::new(0, 0));
        assert_eq!(array::back(&a).unwrap(), ObjectId::new(2, 0));
        let err = array::at(&a, &NativeValue::Int64(3)).unwrap_err();
        assert_eq!(err, NativeTypeError::IndexOutOfRange { index: 3, len: 3 });
        assert!(array::front(&NativeValue::Array(vec![])).is_err());
    }

    #[test]
    fn array_slice_and_stride() {
        let a = NativeValue::Array(ids(5));
        let s = array::slice(&a, &NativeValue::Int64(1), &NativeValue::Int64(3)).unwrap();
        assert_eq!(s, NativeValue::Array(ids(3)[1..].to_vec()));
        let s = array::stride(&a, &NativeValue::Int64(2)).unwrap();
        let expected: Vec<_> = [0, 2, 4].iter().map(|&i| ObjectId::new(i, 0)).collect();
        assert_eq!(s, NativeValue::Array(expected));
        assert!(matches!(
            array::stride(&a, &NativeValue::Int64(0)),
            Err(NativeTypeError::InvalidArgument { op: "arystrd", .. })
        ));
    }

    #[test]
    fn array_mutation() {
        let mut a = NativeValue::Array(ids(2));
        array::append(&mut a, ObjectId::new(9, 0)).unwrap();
        array::put(&mut a, &NativeValue::Int64(0), ObjectId::new(8, 0)).unwrap();
        array::erase(&mut a, &NativeValue::Int64(1)).unwrap();
        assert_eq!(
            a,
            NativeValue::Array(vec![ObjectId::new(8, 0), ObjectId::new(9, 0)])
        );
        array::reverse(&mut a).unwrap();
        assert_eq!(array::pop(&mut a).unwrap(), ObjectId::new(8, 0));
        array::merge(&mut a, &NativeValue::Array(ids(1))).unwrap();
        assert_eq!(array::len(&a).unwrap(), NativeValue::UInt64(2));
        array::clear(&mut a).unwrap();
        assert_eq!(array::is_empty(&a).unwrap(), NativeValue::Bool(true));
    }

    // ── maps ───────────────────────────────────────────────────────

    #[test]
    fn map_operations() {
        let mut m = NativeValue::Map(BTreeMap::new());
        map::put(&mut m, &NativeValue::UInt64(2), ObjectId::new(20, 0)).unwrap();
        map::put(&mut m, &NativeValue::UInt64(1), ObjectId::new(10, 0)).unwrap();
        assert_eq!(map::find(&m, &NativeValue::Int8(1)).unwrap(), NativeValue::Bool(true));
        assert_eq!(map::at(&m, &NativeValue::Int8(2)).unwrap(), ObjectId::new(20, 0));
        assert_eq!(
            map::values(&m).unwrap(),
            NativeValue::Array(vec![ObjectId::new(10, 0), ObjectId::new(20, 0)])
        );
        assert_eq!(
            map::erase(&mut m, &NativeValue::Int8(5)).unwrap_err(),
            NativeTypeError::KeyNotFound(5)
        );
        assert!(map::at(&m, &NativeValue::Int8(-1)).is_err());
    }

    #[test]
    fn map_merge_prefers_rhs() {
        let mut m = NativeValue::Map(BTreeMap::from([(1, ObjectId::new(1, 0))]));
        let n = NativeValue::Map(BTreeMap::from([
            (1, ObjectId::new(5, 0)),
            (2, ObjectId::new(6, 0)),
        ]));
        map::merge(&mut m, &n).unwrap();
        assert_eq!(m, n);
    }
}
