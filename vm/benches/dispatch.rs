use bytecode::{CodeBuilder, Instruction, Op};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vm::{Closure, Compartment, GcFlag, MAIN_CLOSURE, Process, ProcessOptions, RunOutcome};

/// Counts `n` down to zero on the evaluation stack.
fn countdown_loop(n: u64) -> Vec<Instruction> {
    let mut b = CodeBuilder::new();
    b.op1(Op::Int64, n);
    let head = b.current_index();
    let body = b.jump_if();
    b.op(Op::Exit);
    b.bind(body);
    b.op(Op::Dec).loop_to(head);
    b.build()
}

/// Calls an empty closure `n` times.
fn call_loop(n: u64) -> Vec<Closure> {
    let mut b = CodeBuilder::new();
    b.op(Op::New).op1(Op::SetCtx, 1).op1(Op::Int64, n);
    let head = b.current_index();
    let body = b.jump_if();
    b.op(Op::Exit);
    b.bind(body);
    b.op(Op::PInvk)
        .op(Op::Invk)
        .op(Op::Dec)
        .loop_to(head);
    vec![
        Closure::new(MAIN_CLOSURE, 0, None, b.build()),
        Closure::new("noop", 1, None, vec![Instruction::from(Op::Rtrn)]),
    ]
}

fn process_for(closures: Vec<Closure>) -> Process {
    let mut compartment = Compartment::new("bench");
    compartment.set_closure_table(closures);
    let mut p = Process::new(ProcessOptions::default()).expect("default options");
    p.insert_compartment(compartment);
    p.set_gc_flag(GcFlag::ByHeapSize);
    p
}

fn run_case(c: &mut Criterion, name: &str, closures: Vec<Closure>) {
    let mut p = process_for(closures);
    c.bench_function(name, |b| {
        b.iter(|| {
            p.pre_start().expect("pre_start");
            let outcome = p.run().expect("run");
            assert_eq!(outcome, RunOutcome::Exited(0));
            black_box(outcome);
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let eval_only = vec![Closure::new(MAIN_CLOSURE, 0, None, countdown_loop(10_000))];
    run_case(c, "countdown_10k", eval_only);
    run_case(c, "invoke_1k", call_loop(1_000));
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
