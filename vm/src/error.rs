use heap::HeapError;
use object::{ClosureId, NativeTypeError, ObjectId};

use crate::Signal;

/// Host-level fault: aborts the current [`run`](crate::Process::run).
///
/// Guest exceptions raised with `EXC` are not errors; they unwind through
/// catch sites and only surface as
/// [`RunOutcome::UncaughtException`](crate::RunOutcome::UncaughtException).
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    // ── lookup ─────────────────────────────────────────────────────
    #[error("name `{0}` not found")]
    NameNotFound(String),

    #[error("closure {0} not found")]
    ClosureNotFound(ClosureId),

    #[error("compartment {0} not found")]
    CompartmentNotFound(usize),

    #[error("native type handle not found for {0}")]
    NativeTypeHandleNotFound(String),

    #[error("string literal {0} not found")]
    StringLiteralNotFound(u64),

    #[error("floating-point literal {0} not found")]
    FptLiteralNotFound(u64),

    #[error("frame not found")]
    FrameNotFound,

    #[error("invocation context not found")]
    InvocationCtxNotFound,

    #[error("missing parameter{}", .key.map(|k| format!(" `{k}`")).unwrap_or_default())]
    MissingParameter { key: Option<u64> },

    #[error("attribute `{0}` not found")]
    AttributeNotFound(String),

    // ── invariants ─────────────────────────────────────────────────
    #[error("invalid instruction address {0}")]
    InvalidInstrAddr(i64),

    #[error("evaluation stack is empty")]
    EvaluationStackEmpty,

    #[error("object stack is empty")]
    ObjectStackEmpty,

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    // ── resources ──────────────────────────────────────────────────
    #[error("native type handle pool is full ({capacity} handles)")]
    NativeTypeHandleInsertionError { capacity: usize },

    #[error("object {0} cannot be deleted")]
    ObjectDeletionError(ObjectId),

    #[error("object {0} is not callable")]
    InvocationError(ObjectId),

    #[error("call stack overflow: depth limit {0} reached")]
    CallStackOverflow(usize),

    #[error("invalid process options: {0}")]
    InvalidOptions(&'static str),

    // ── collaborators ──────────────────────────────────────────────
    #[error(transparent)]
    NativeType(#[from] NativeTypeError),

    #[error(transparent)]
    Heap(#[from] HeapError),

    #[error("fatal signal {0}")]
    FatalSignal(Signal),

    #[error("process output: {0}")]
    Output(#[from] std::io::Error),
}

pub type VmResult<T> = Result<T, VmError>;
