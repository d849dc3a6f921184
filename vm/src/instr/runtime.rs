use std::io::Write;

use bytecode::Instruction;

use crate::{Process, VmResult};

pub(super) fn gc(p: &mut Process, _: &Instruction) -> VmResult<()> {
    p.do_gc();
    Ok(())
}

pub(super) fn debug(p: &mut Process, _: &Instruction) -> VmResult<()> {
    eprintln!("{}", p.summary());
    if let Ok(frame) = p.frame() {
        eprintln!("  frame {} pc {}", frame.closure_ctx(), frame.pc());
        for value in frame.eval_stack().iter().rev() {
            eprintln!("    {:<6} {value}", value.kind().name());
        }
    }
    Ok(())
}

/// Writes the repr of the popped object's handle; `oprd1 != 0` suppresses
/// the newline.
pub(super) fn print(p: &mut Process, i: &Instruction) -> VmResult<()> {
    let id = p.pop_object()?;
    let text = match p.handle(id) {
        Ok(value) => value.repr(),
        Err(_) => format!("<object {id}>"),
    };
    if i.oprd1 == 0 {
        writeln!(p.output, "{text}")?;
    } else {
        write!(p.output, "{text}")?;
        p.output.flush()?;
    }
    Ok(())
}
