use core::fmt;
use std::collections::BTreeMap;

use crate::hash::fnv1a;
use crate::{NativeResult, NativeTypeError, ObjectId};

/// Type tag of a [`NativeValue`].
///
/// Numeric variants are declared in promotion order: the result kind of a
/// binary arithmetic operation is the greater of its operand kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Dec1,
    Dec2,
    Str,
    Array,
    Map,
}

impl Kind {
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int8 => "int8",
            Kind::UInt8 => "uint8",
            Kind::Int16 => "int16",
            Kind::UInt16 => "uint16",
            Kind::Int32 => "int32",
            Kind::UInt32 => "uint32",
            Kind::Int64 => "int64",
            Kind::UInt64 => "uint64",
            Kind::Dec1 => "dec1",
            Kind::Dec2 => "dec2",
            Kind::Str => "string",
            Kind::Array => "array",
            Kind::Map => "map",
        }
    }

    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Kind::Str | Kind::Array | Kind::Map)
    }

    #[inline]
    pub const fn is_decimal(self) -> bool {
        matches!(self, Kind::Dec1 | Kind::Dec2)
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        self.is_numeric() && !self.is_decimal()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A primitive value: what a native type handle holds and what the
/// evaluation stack of a frame is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    Dec1(f32),
    Dec2(f64),
    Str(String),
    Array(Vec<ObjectId>),
    Map(BTreeMap<u64, ObjectId>),
}

impl Default for NativeValue {
    fn default() -> Self {
        NativeValue::Int64(0)
    }
}

/// Widened numeric view used by arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i128),
    Float(f64),
}

impl Num {
    #[inline]
    pub(crate) fn to_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    /// Floats saturate towards the `i128` range, NaN becomes 0.
    #[inline]
    pub(crate) fn to_i128(self) -> i128 {
        match self {
            Num::Int(i) => i,
            Num::Float(f) => f as i128,
        }
    }
}

impl NativeValue {
    pub fn kind(&self) -> Kind {
        match self {
            NativeValue::Int8(_) => Kind::Int8,
            NativeValue::Int16(_) => Kind::Int16,
            NativeValue::Int32(_) => Kind::Int32,
            NativeValue::Int64(_) => Kind::Int64,
            NativeValue::UInt8(_) => Kind::UInt8,
            NativeValue::UInt16(_) => Kind::UInt16,
            NativeValue::UInt32(_) => Kind::UInt32,
            NativeValue::UInt64(_) => Kind::UInt64,
            NativeValue::Bool(_) => Kind::Bool,
            NativeValue::Dec1(_) => Kind::Dec1,
            NativeValue::Dec2(_) => Kind::Dec2,
            NativeValue::Str(_) => Kind::Str,
            NativeValue::Array(_) => Kind::Array,
            NativeValue::Map(_) => Kind::Map,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            NativeValue::Str(s) => !s.is_empty(),
            NativeValue::Array(a) => !a.is_empty(),
            NativeValue::Map(m) => !m.is_empty(),
            NativeValue::Dec1(f) => *f != 0.0,
            NativeValue::Dec2(f) => *f != 0.0,
            NativeValue::Bool(b) => *b,
            other => other.num("truthy").map(|n| n.to_i128() != 0).unwrap_or(false),
        }
    }

    pub fn repr(&self) -> String {
        self.to_string()
    }

    /// Stable hash over the kind and the textual representation.
    pub fn hash_value(&self) -> u64 {
        let mut bytes = self.kind().name().as_bytes().to_vec();
        bytes.push(b':');
        bytes.extend_from_slice(self.repr().as_bytes());
        fnv1a(&bytes)
    }

    pub(crate) fn num(&self, op: &'static str) -> NativeResult<Num> {
        Ok(match *self {
            NativeValue::Int8(v) => Num::Int(v as i128),
            NativeValue::Int16(v) => Num::Int(v as i128),
            NativeValue::Int32(v) => Num::Int(v as i128),
            NativeValue::Int64(v) => Num::Int(v as i128),
            NativeValue::UInt8(v) => Num::Int(v as i128),
            NativeValue::UInt16(v) => Num::Int(v as i128),
            NativeValue::UInt32(v) => Num::Int(v as i128),
            NativeValue::UInt64(v) => Num::Int(v as i128),
            NativeValue::Bool(v) => Num::Int(v as i128),
            NativeValue::Dec1(v) => Num::Float(v as f64),
            NativeValue::Dec2(v) => Num::Float(v),
            _ => {
                return Err(NativeTypeError::InvalidOperand {
                    op,
                    kind: self.kind(),
                });
            }
        })
    }

    /// Builds a numeric value of `kind`, truncating integers and rounding
    /// decimals the way an `as` cast does.
    pub(crate) fn from_num(kind: Kind, n: Num) -> NativeResult<NativeValue> {
        Ok(match kind {
            Kind::Int8 => NativeValue::Int8(n.to_i128() as i8),
            Kind::Int16 => NativeValue::Int16(n.to_i128() as i16),
            Kind::Int32 => NativeValue::Int32(n.to_i128() as i32),
            Kind::Int64 => NativeValue::Int64(n.to_i128() as i64),
            Kind::UInt8 => NativeValue::UInt8(n.to_i128() as u8),
            Kind::UInt16 => NativeValue::UInt16(n.to_i128() as u16),
            Kind::UInt32 => NativeValue::UInt32(n.to_i128() as u32),
            Kind::UInt64 => NativeValue::UInt64(n.to_i128() as u64),
            Kind::Bool => NativeValue::Bool(match n {
                Num::Int(i) => i != 0,
                Num::Float(f) => f != 0.0,
            }),
            Kind::Dec1 => NativeValue::Dec1(n.to_f64() as f32),
            Kind::Dec2 => NativeValue::Dec2(n.to_f64()),
            Kind::Str | Kind::Array | Kind::Map => {
                return Err(NativeTypeError::Conversion {
                    from: Kind::Int64,
                    to: kind,
                });
            }
        })
    }

    /// Reads an integral (or bool) value as a signed position.
    pub fn as_index(&self, op: &'static str) -> NativeResult<i128> {
        if !self.kind().is_integral() {
            return Err(NativeTypeError::InvalidOperand {
                op,
                kind: self.kind(),
            });
        }
        Ok(self.num(op)?.to_i128())
    }

    /// Reads an integral value as a map key.
    pub fn as_key(&self, op: &'static str) -> NativeResult<u64> {
        let index = self.as_index(op)?;
        u64::try_from(index).map_err(|_| NativeTypeError::InvalidArgument {
            op,
            reason: "map keys must be non-negative",
        })
    }

    pub fn as_str(&self, op: &'static str) -> NativeResult<&str> {
        match self {
            NativeValue::Str(s) => Ok(s),
            other => Err(NativeTypeError::InvalidOperand {
                op,
                kind: other.kind(),
            }),
        }
    }

    pub fn as_string_mut(&mut self, op: &'static str) -> NativeResult<&mut String> {
        match self {
            NativeValue::Str(s) => Ok(s),
            other => Err(NativeTypeError::InvalidOperand {
                op,
                kind: other.kind(),
            }),
        }
    }

    pub fn as_array(&self, op: &'static str) -> NativeResult<&Vec<ObjectId>> {
        match self {
            NativeValue::Array(a) => Ok(a),
            other => Err(NativeTypeError::InvalidOperand {
                op,
                kind: other.kind(),
            }),
        }
    }

    pub fn as_array_mut(&mut self, op: &'static str) -> NativeResult<&mut Vec<ObjectId>> {
        match self {
            NativeValue::Array(a) => Ok(a),
            other => Err(NativeTypeError::InvalidOperand {
                op,
                kind: other.kind(),
            }),
        }
    }

    pub fn as_map(&self, op: &'static str) -> NativeResult<&BTreeMap<u64, ObjectId>> {
        match self {
            NativeValue::Map(m) => Ok(m),
            other => Err(NativeTypeError::InvalidOperand {
                op,
                kind: other.kind(),
            }),
        }
    }

    pub fn as_map_mut(
        &mut self,
        op: &'static str,
    ) -> NativeResult<&mut BTreeMap<u64, ObjectId>> {
        match self {
            NativeValue::Map(m) => Ok(m),
            other => Err(NativeTypeError::InvalidOperand {
                op,
                kind: other.kind(),
            }),
        }
    }

    /// Object ids held by array and map values.
    pub fn object_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_> {
        match self {
            NativeValue::Array(a) => Box::new(a.iter().copied()),
            NativeValue::Map(m) => Box::new(m.values().copied()),
            _ => Box::new(std::iter::empty()),
        }
    }

    // ── conversions ────────────────────────────────────────────────

    pub fn convert(&self, to: Kind) -> NativeResult<NativeValue> {
        let from = self.kind();
        match to {
            Kind::Str => Ok(NativeValue::Str(self.repr())),
            Kind::Bool => Ok(NativeValue::Bool(self.is_truthy())),
            Kind::Array | Kind::Map if from == to => Ok(self.clone()),
            Kind::Array | Kind::Map => Err(NativeTypeError::Conversion { from, to }),
            numeric => match self {
                NativeValue::Str(s) => {
                    let n = parse_num(s).ok_or(NativeTypeError::Conversion { from, to })?;
                    NativeValue::from_num(numeric, n)
                }
                NativeValue::Array(_) | NativeValue::Map(_) => {
                    Err(NativeTypeError::Conversion { from, to })
                }
                _ => NativeValue::from_num(numeric, self.num("convert")?),
            },
        }
    }
}

fn parse_num(s: &str) -> Option<Num> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i128>() {
        return Some(Num::Int(i));
    }
    s.parse::<f64>().ok().map(Num::Float)
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Int8(v) => write!(f, "{v}"),
            NativeValue::Int16(v) => write!(f, "{v}"),
            NativeValue::Int32(v) => write!(f, "{v}"),
            NativeValue::Int64(v) => write!(f, "{v}"),
            NativeValue::UInt8(v) => write!(f, "{v}"),
            NativeValue::UInt16(v) => write!(f, "{v}"),
            NativeValue::UInt32(v) => write!(f, "{v}"),
            NativeValue::UInt64(v) => write!(f, "{v}"),
            NativeValue::Bool(v) => write!(f, "{v}"),
            NativeValue::Dec1(v) => write!(f, "{v}"),
            NativeValue::Dec2(v) => write!(f, "{v}"),
            NativeValue::Str(s) => f.write_str(s),
            NativeValue::Array(items) => {
                f.write_str("[")?;
                for (i, id) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str("]")
            }
            NativeValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, id)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {id}")?;
                }
                f.write_str("}")
            }
        }
    }
}
