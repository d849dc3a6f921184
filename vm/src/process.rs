//! The process: owner of all execution state and of the dispatch loop.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use bytecode::Instruction;
use heap::{GcStats, Heap, HeapSettings, RootProvider};
use object::{ClosureCtx, DynamicObject, NativeKey, NativeValue, ObjectId};

use crate::instr::INSTR_TABLE;
use crate::{
    CallStack, Closure, Compartment, Frame, GcFlag, GcFlags, InvocationCtx, NativeTypesPool,
    ProcessOptions, Signal, SignalCategory, SignalQueue, TraceEntry, Traceback, VmError,
    VmResult,
};

/// How a call to [`Process::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The entry frame returned.
    Completed,
    /// `EXIT` with the given status.
    Exited(i32),
    /// A guest exception unwound past the entry frame.
    UncaughtException(ObjectId),
    /// A termination signal without a registered vector.
    Terminated(Signal),
}

pub struct Process {
    pub(crate) options: ProcessOptions,
    pub(crate) heap: Heap,
    pub(crate) pool: NativeTypesPool,
    pub(crate) compartments: Vec<Compartment>,
    pub(crate) call_stack: CallStack,
    /// Contexts in LIFO order. Every frame owns one; the ones above the top
    /// frame's are staged by `PINVK` and not yet invoked.
    pub(crate) invk_ctxs: Vec<InvocationCtx>,
    pub(crate) object_stack: Vec<ObjectId>,
    pub(crate) halt: Option<RunOutcome>,
    /// Call stack as it was when the last uncaught exception started
    /// unwinding.
    uncaught: Option<Traceback>,
    pub(crate) output: Box<dyn Write>,
    gc_flags: GcFlags,
    sig_vectors: HashMap<Signal, Arc<[Instruction]>>,
    signals: SignalQueue,
}

impl Process {
    pub fn new(options: ProcessOptions) -> VmResult<Self> {
        options.validate().map_err(VmError::InvalidOptions)?;
        Ok(Self {
            heap: Heap::new(HeapSettings {
                capacity: options.heap_capacity,
            }),
            pool: NativeTypesPool::new(options.pool_capacity),
            compartments: Vec::new(),
            call_stack: CallStack::new(options.max_call_depth),
            invk_ctxs: Vec::new(),
            object_stack: Vec::new(),
            halt: None,
            uncaught: None,
            output: Box::new(io::stdout()),
            gc_flags: options.gc_flags,
            sig_vectors: HashMap::new(),
            signals: SignalQueue::new(),
            options,
        })
    }

    pub fn with_capacity(heap_capacity: usize, pool_capacity: usize) -> VmResult<Self> {
        Self::new(ProcessOptions {
            heap_capacity,
            pool_capacity,
            ..ProcessOptions::default()
        })
    }

    /// Redirects `PRINT` output. Defaults to stdout.
    pub fn set_output(&mut self, output: impl Write + 'static) {
        self.output = Box::new(output);
    }

    // ── inspection ─────────────────────────────────────────────────

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn pool(&self) -> &NativeTypesPool {
        &self.pool
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn invk_depth(&self) -> usize {
        self.invk_ctxs.len()
    }

    pub fn object_stack(&self) -> &[ObjectId] {
        &self.object_stack
    }

    /// Traceback of the exception behind
    /// [`RunOutcome::UncaughtException`], taken before any frame was popped.
    pub fn uncaught_traceback(&self) -> Option<&Traceback> {
        self.uncaught.as_ref()
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    /// Pc of the top frame.
    pub fn pc(&self) -> Option<usize> {
        self.call_stack.top().ok().map(Frame::pc)
    }

    /// Native handle held by object `id`.
    pub fn handle(&self, id: ObjectId) -> VmResult<&NativeValue> {
        let key = self.handle_key(id)?;
        self.pool.at(key)
    }

    pub fn summary(&self) -> String {
        format!(
            "process: {} frame(s), {} invocation ctx(s), {} object(s) on stack, heap {}/{}, pool {}/{}",
            self.call_stack.len(),
            self.invk_ctxs.len(),
            self.object_stack.len(),
            self.heap.len(),
            self.heap.capacity(),
            self.pool.len(),
            self.pool.capacity(),
        )
    }

    // ── loading ────────────────────────────────────────────────────

    /// Moves `compartment` into the process and returns its id.
    pub fn insert_compartment(&mut self, compartment: Compartment) -> usize {
        log::debug!("loaded compartment `{}`", compartment.path());
        self.compartments.push(compartment);
        self.compartments.len() - 1
    }

    pub fn compartment(&self, id: usize) -> VmResult<&Compartment> {
        self.compartments
            .get(id)
            .ok_or(VmError::CompartmentNotFound(id))
    }

    pub fn resolve(&self, ctx: ClosureCtx) -> VmResult<&Closure> {
        self.compartment(ctx.compartment_id)?
            .get_closure_by_id(ctx.closure_id)
    }

    // ── execution ──────────────────────────────────────────────────

    /// Sets up the entry frame of compartment 0. Returns `false` when there
    /// is nothing to run.
    pub fn pre_start(&mut self) -> VmResult<bool> {
        let Some(entry) = self
            .compartments
            .first()
            .and_then(Compartment::get_starting_closure)
        else {
            return Ok(false);
        };
        let ctx = ClosureCtx::new(0, entry.id());
        let code = Arc::clone(entry.code());
        log::debug!("pre_start: entering `{}`", entry.name());

        self.call_stack.clear();
        self.invk_ctxs.clear();
        self.object_stack.clear();
        self.halt = None;
        self.uncaught = None;
        self.invk_ctxs.push(InvocationCtx::new(ctx));
        self.call_stack.push(Frame::new(ctx, code, 0, None, None))?;
        Ok(true)
    }

    /// Executes until the entry frame returns, the program halts, or a
    /// host error occurs. On error the stacks are left as they were at the
    /// faulting instruction so a traceback can be taken.
    pub fn run(&mut self) -> VmResult<RunOutcome> {
        log::debug!("run: {} frame(s)", self.call_stack.len());
        loop {
            if self.signals.is_pending() {
                for sig in self.signals.drain() {
                    self.handle_signal(sig)?;
                }
            }
            if let Some(outcome) = self.halt.take() {
                log::debug!("run: halted with {outcome:?}");
                return Ok(outcome);
            }
            let Ok(frame) = self.call_stack.top_mut() else {
                log::debug!("run: completed");
                return Ok(RunOutcome::Completed);
            };
            match frame.fetch() {
                Some(instr) => {
                    log::trace!(
                        "{} {:>4}  {}",
                        frame.closure_ctx(),
                        frame.current_index(),
                        instr
                    );
                    INSTR_TABLE[instr.op as usize](self, &instr)?;
                }
                None => {
                    if !frame.resume() {
                        self.return_from_frame()?;
                    }
                }
            }
        }
    }

    /// Pushes a frame for `ctx` running with invocation context `invk_ctx`.
    pub(crate) fn push_frame(
        &mut self,
        ctx: ClosureCtx,
        invk_ctx: usize,
        return_addr: Option<usize>,
    ) -> VmResult<()> {
        let parent = self.lexical_parent(ctx)?;
        let closure = self.resolve(ctx)?;
        let code = Arc::clone(closure.code());
        log::debug!(
            "call: `{}` {ctx} at depth {}",
            closure.name(),
            self.call_stack.len() + 1
        );
        self.call_stack
            .push(Frame::new(ctx, code, invk_ctx, return_addr, parent))
    }

    /// Call-stack index of the nearest live frame of `ctx`'s lexical
    /// ancestors, trying the direct parent first.
    fn lexical_parent(&self, ctx: ClosureCtx) -> VmResult<Option<usize>> {
        let compartment = self.compartment(ctx.compartment_id)?;
        let mut parent_id = compartment.get_closure_by_id(ctx.closure_id)?.parent_id();
        // bounded: parent ids may form a cycle
        for _ in 0..compartment.closures().len() {
            let Some(id) = parent_id else {
                break;
            };
            if let Some(index) = self.call_stack.find_parent(ctx.compartment_id, Some(id)) {
                return Ok(Some(index));
            }
            parent_id = compartment
                .get_closure_by_id(id)
                .ok()
                .and_then(Closure::parent_id);
        }
        Ok(None)
    }

    /// Pops the top frame together with its invocation context and any
    /// context it staged without invoking.
    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.call_stack.pop()?;
        self.invk_ctxs.truncate(frame.invk_ctx_index());
        Some(frame)
    }

    pub(crate) fn return_from_frame(&mut self) -> VmResult<()> {
        let frame = self.pop_frame().ok_or(VmError::FrameNotFound)?;
        if let (Some(ret), Ok(caller)) = (frame.return_addr(), self.call_stack.top_mut()) {
            caller.set_pc_unchecked(ret + 1);
        }
        log::debug!(
            "return: {} to depth {}",
            frame.closure_ctx(),
            self.call_stack.len()
        );
        self.apply_gc_rules();
        Ok(())
    }

    /// Unwinds `exc` to the nearest catch site.
    ///
    /// Only the raising frame honours `search`; once the exception leaves a
    /// frame every caller is searched. Each caller it reaches also gets it
    /// back on the object stack.
    pub(crate) fn raise(&mut self, exc: ObjectId, mut search: bool) -> VmResult<()> {
        let mut trace = None;
        loop {
            let frame = self.call_stack.top()?;
            if search && !frame.is_interrupted() {
                let index = frame.current_index();
                let dest = self
                    .resolve(frame.closure_ctx())?
                    .find_catch_site(index)
                    .map(|site| site.dest);
                if let Some(dest) = dest {
                    let frame = self.call_stack.top_mut()?;
                    frame.set_exc(exc);
                    frame.set_pc(dest)?;
                    log::debug!("exception {exc} caught at {} {dest}", frame.closure_ctx());
                    return Ok(());
                }
            }
            if trace.is_none() {
                trace = Some(self.traceback(usize::MAX));
            }
            self.pop_frame();
            match self.call_stack.top_mut() {
                Ok(caller) => {
                    caller.set_exc(exc);
                    self.object_stack.push(exc);
                    search = true;
                }
                Err(_) => {
                    log::warn!("uncaught exception {exc}");
                    self.uncaught = trace;
                    self.halt = Some(RunOutcome::UncaughtException(exc));
                    return Ok(());
                }
            }
        }
    }

    // ── garbage collection ─────────────────────────────────────────

    pub fn set_gc_flag(&mut self, flag: GcFlag) {
        self.gc_flags = self.gc_flags.with(flag);
    }

    pub fn clear_gc_flag(&mut self, flag: GcFlag) {
        self.gc_flags = self.gc_flags.without(flag);
    }

    pub fn gc_flags(&self) -> GcFlags {
        self.gc_flags
    }

    /// Stop-the-world collection; erases the handles of collected objects.
    pub fn do_gc(&mut self) -> GcStats {
        log::debug!(
            "gc: pause with {} object(s), {} handle(s)",
            self.heap.len(),
            self.pool.len()
        );
        let roots = ProcessRoots {
            object_stack: &self.object_stack,
            call_stack: &self.call_stack,
            invk_ctxs: &self.invk_ctxs,
            pool: &self.pool,
        };
        let stats = self.heap.gc(&roots);
        for &key in &stats.orphaned_keys {
            if self.pool.erase(key).is_err() {
                log::warn!("gc: handle {key} of a collected object was already erased");
            }
        }
        log::debug!(
            "gc: resume, marked {} collected {}",
            stats.marked,
            stats.collected
        );
        stats
    }

    pub(crate) fn apply_gc_rules(&mut self) {
        let flags = self.gc_flags;
        if flags.is_empty() {
            return;
        }
        let threshold = self.options.gc_threshold;
        let over = |len: usize, capacity: usize| len as f64 >= capacity as f64 * threshold;
        let due = flags.contains(GcFlag::Always)
            || (flags.contains(GcFlag::ByHeapSize) && over(self.heap.len(), self.heap.capacity()))
            || (flags.contains(GcFlag::ByNtvhndlPoolSize)
                && over(self.pool.len(), self.pool.capacity()));
        if due {
            self.do_gc();
        }
    }

    // ── signals ────────────────────────────────────────────────────

    /// A handle for raising signals from other threads.
    pub fn signal_queue(&self) -> SignalQueue {
        self.signals.clone()
    }

    pub fn set_sig_vector(&mut self, sig: Signal, code: impl Into<Arc<[Instruction]>>) {
        self.sig_vectors.insert(sig, code.into());
    }

    pub fn clear_sig_vector(&mut self, sig: Signal) {
        self.sig_vectors.remove(&sig);
    }

    pub fn handle_signal(&mut self, sig: Signal) -> VmResult<()> {
        let category = sig.category();
        if category == SignalCategory::Timer {
            log::debug!("signal: {sig} ignored");
            return Ok(());
        }
        if let Some(vector) = self.sig_vectors.get(&sig) {
            let vector = Arc::clone(vector);
            log::debug!("signal: {sig} runs its vector");
            self.call_stack.top_mut()?.interrupt(vector);
            return Ok(());
        }
        match category {
            SignalCategory::Termination => {
                log::debug!("signal: {sig} terminates the run");
                self.halt = Some(RunOutcome::Terminated(sig));
                Ok(())
            }
            _ => {
                log::warn!("signal: fatal {sig}");
                Err(VmError::FatalSignal(sig))
            }
        }
    }

    // ── diagnostics ────────────────────────────────────────────────

    /// Snapshot of the call stack, innermost first, at most `limit` frames.
    pub fn traceback(&self, limit: usize) -> Traceback {
        let mut tb = Traceback::default();
        for frame in self.call_stack.iter().rev() {
            if tb.entries.len() >= limit {
                tb.omitted += 1;
                continue;
            }
            let ctx = frame.closure_ctx();
            let index = frame.closure_index();
            let path = self
                .compartment(ctx.compartment_id)
                .map(|c| c.path().to_owned())
                .unwrap_or_default();
            let (closure, loc) = match self.resolve(ctx) {
                Ok(c) => (c.name().to_owned(), c.loc_at(index)),
                Err(_) => (ctx.to_string(), None),
            };
            tb.entries.push(TraceEntry {
                closure,
                path,
                index,
                loc,
            });
        }
        tb
    }

    /// Writes the traceback to stderr, then resets the process.
    pub fn unwind_stack(&mut self, limit: usize) {
        eprint!("{}", self.traceback(limit));
        self.reset();
    }

    /// Drops all execution state and every loaded compartment.
    pub fn reset(&mut self) {
        self.call_stack.clear();
        self.invk_ctxs.clear();
        self.object_stack.clear();
        self.compartments.clear();
        self.halt = None;
        self.uncaught = None;
        self.heap = Heap::new(HeapSettings {
            capacity: self.options.heap_capacity,
        });
        self.pool = NativeTypesPool::new(self.options.pool_capacity);
        log::debug!("process reset");
    }

    // ── handler helpers ────────────────────────────────────────────

    pub(crate) fn frame(&self) -> VmResult<&Frame> {
        self.call_stack.top()
    }

    pub(crate) fn frame_mut(&mut self) -> VmResult<&mut Frame> {
        self.call_stack.top_mut()
    }

    pub(crate) fn frame_index(&self) -> VmResult<usize> {
        self.call_stack
            .len()
            .checked_sub(1)
            .ok_or(VmError::FrameNotFound)
    }

    pub(crate) fn push_object(&mut self, id: ObjectId) {
        self.object_stack.push(id);
    }

    pub(crate) fn pop_object(&mut self) -> VmResult<ObjectId> {
        self.object_stack.pop().ok_or(VmError::ObjectStackEmpty)
    }

    pub(crate) fn top_object(&self) -> VmResult<ObjectId> {
        self.object_stack
            .last()
            .copied()
            .ok_or(VmError::ObjectStackEmpty)
    }

    pub(crate) fn push_eval(&mut self, value: NativeValue) -> VmResult<()> {
        self.frame_mut()?.push_eval(value);
        Ok(())
    }

    pub(crate) fn pop_eval(&mut self) -> VmResult<NativeValue> {
        self.frame_mut()?.pop_eval()
    }

    pub(crate) fn top_eval(&mut self) -> VmResult<&mut NativeValue> {
        self.frame_mut()?.top_eval()
    }

    pub(crate) fn current_compartment(&self) -> VmResult<&Compartment> {
        let ctx = self.frame()?.closure_ctx();
        self.compartment(ctx.compartment_id)
    }

    pub(crate) fn string_literal(&self, key: u64) -> VmResult<&str> {
        self.current_compartment()?.get_string_literal(key)
    }

    /// Display name of variable `key`, for error messages.
    pub(crate) fn name_of(&self, key: u64) -> String {
        self.string_literal(key)
            .map(str::to_owned)
            .unwrap_or_else(|_| format!("#{key}"))
    }

    pub(crate) fn object(&self, id: ObjectId) -> VmResult<&DynamicObject> {
        Ok(self.heap.get_dyobj(id)?)
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> VmResult<&mut DynamicObject> {
        Ok(self.heap.get_dyobj_mut(id)?)
    }

    pub(crate) fn new_object(&mut self) -> VmResult<ObjectId> {
        Ok(self.heap.create_dyobj()?)
    }

    pub(crate) fn new_object_with(&mut self, value: NativeValue) -> VmResult<ObjectId> {
        let id = self.new_object()?;
        self.set_handle(id, value)?;
        Ok(id)
    }

    fn handle_key(&self, id: ObjectId) -> VmResult<NativeKey> {
        self.object(id)?
            .ntvhndl_key()
            .ok_or_else(|| VmError::NativeTypeHandleNotFound(id.to_string()))
    }

    pub(crate) fn handle_mut(&mut self, id: ObjectId) -> VmResult<&mut NativeValue> {
        let key = self.handle_key(id)?;
        self.pool.at_mut(key)
    }

    /// Stores `value` in the handle of `id`, creating the handle if needed.
    pub(crate) fn set_handle(&mut self, id: ObjectId, value: NativeValue) -> VmResult<()> {
        match self.object(id)?.ntvhndl_key() {
            Some(key) => *self.pool.at_mut(key)? = value,
            None => {
                let key = self.pool.create_with(value)?;
                self.object_mut(id)?.set_ntvhndl_key(key);
            }
        }
        Ok(())
    }

    /// Context of the running frame.
    pub(crate) fn current_invk_ctx(&mut self) -> VmResult<&mut InvocationCtx> {
        let index = self.frame()?.invk_ctx_index();
        self.invk_ctxs
            .get_mut(index)
            .ok_or(VmError::InvocationCtxNotFound)
    }

    /// Stack index of the innermost context staged by `PINVK` and not yet
    /// invoked.
    pub(crate) fn staged_invk_index(&self) -> VmResult<usize> {
        let owned = self.frame()?.invk_ctx_index();
        match self.invk_ctxs.len().checked_sub(1) {
            Some(top) if top > owned => Ok(top),
            _ => Err(VmError::InvocationCtxNotFound),
        }
    }

    pub(crate) fn staged_invk_ctx(&mut self) -> VmResult<&mut InvocationCtx> {
        let index = self.staged_invk_index()?;
        Ok(&mut self.invk_ctxs[index])
    }
}

// ── GC roots ───────────────────────────────────────────────────────────

struct ProcessRoots<'a> {
    object_stack: &'a [ObjectId],
    call_stack: &'a CallStack,
    invk_ctxs: &'a [InvocationCtx],
    pool: &'a NativeTypesPool,
}

impl RootProvider for ProcessRoots<'_> {
    fn visit_roots(&self, visitor: &mut dyn FnMut(ObjectId)) {
        self.object_stack.iter().copied().for_each(&mut *visitor);
        for frame in self.call_stack.iter() {
            frame.variables().for_each(&mut *visitor);
            frame.get_exc().into_iter().for_each(&mut *visitor);
            for value in frame.eval_stack() {
                value.object_ids().for_each(&mut *visitor);
            }
        }
        for ctx in self.invk_ctxs {
            ctx.object_ids().for_each(&mut *visitor);
        }
    }

    fn visit_native_edges(&self, key: NativeKey, visitor: &mut dyn FnMut(ObjectId)) {
        if let Ok(value) = self.pool.at(key) {
            value.object_ids().for_each(visitor);
        }
    }
}
