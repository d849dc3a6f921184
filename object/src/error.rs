use crate::Kind;

/// Failure of a native value operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeTypeError {
    #[error("`{op}` is not defined for {kind}")]
    InvalidOperand { op: &'static str, kind: Kind },

    #[error("`{op}` is not defined for {lhs} and {rhs}")]
    InvalidOperands {
        op: &'static str,
        lhs: Kind,
        rhs: Kind,
    },

    #[error("`{op}`: {reason}")]
    InvalidArgument {
        op: &'static str,
        reason: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i128, len: usize },

    #[error("key {0} not found")]
    KeyNotFound(u64),

    #[error("cannot convert {from} to {to}")]
    Conversion { from: Kind, to: Kind },
}

pub type NativeResult<T> = Result<T, NativeTypeError>;
