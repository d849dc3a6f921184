mod closure;
mod compartment;
mod error;
mod frame;
mod instr;
mod invocation;
mod options;
mod pool;
mod process;
mod signal;
mod traceback;

pub mod loader;

pub use closure::{CatchSite, Closure, Loc};
pub use compartment::{Compartment, MAIN_CLOSURE};
pub use error::{VmError, VmResult};
pub use frame::{CallStack, Frame, VarKey};
pub use instr::{INSTR_TABLE, InstrHandler};
pub use invocation::InvocationCtx;
pub use options::{GcFlag, GcFlags, ProcessOptions};
pub use pool::NativeTypesPool;
pub use process::{Process, RunOutcome};
pub use signal::{Signal, SignalCategory, SignalQueue};
pub use traceback::{TraceEntry, Traceback};
