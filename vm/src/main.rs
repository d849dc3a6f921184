use clap::{Parser as ClapParser, ValueEnum};
use std::{path::PathBuf, process};

use vm::loader::{self, LoadError};
use vm::{Compartment, GcFlag, GcFlags, Process, ProcessOptions, RunOutcome};

const TRACEBACK_LIMIT: usize = 32;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GcRule {
    /// Collect after every return
    Always,
    /// Collect when the heap passes the threshold
    HeapSize,
    /// Collect when the handle pool passes the threshold
    PoolSize,
}

impl From<GcRule> for GcFlag {
    fn from(rule: GcRule) -> Self {
        match rule {
            GcRule::Always => GcFlag::Always,
            GcRule::HeapSize => GcFlag::ByHeapSize,
            GcRule::PoolSize => GcFlag::ByNtvhndlPoolSize,
        }
    }
}

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bytecode container to execute
    #[arg(help = "The container to run (.json or binary)")]
    file: PathBuf,

    #[arg(long, default_value_t = ProcessOptions::default().heap_capacity)]
    heap_capacity: usize,

    #[arg(long, default_value_t = ProcessOptions::default().pool_capacity)]
    pool_capacity: usize,

    #[arg(long, default_value_t = ProcessOptions::default().max_call_depth)]
    max_call_depth: usize,

    /// Automatic collection rules, may be repeated
    #[arg(long = "gc-flag", value_enum)]
    gc_flags: Vec<GcRule>,

    /// Print the disassembly of every closure instead of executing
    #[arg(long, help = "Dump closures and literal tables")]
    dump: bool,

    /// Re-encode the container to PATH (JSON for `.json`, binary otherwise) and exit
    #[arg(long, value_name = "PATH")]
    emit: Option<PathBuf>,
}

fn dump_compartment(compartment: &Compartment) {
    println!("== {} ==", compartment.path());
    for (i, s) in compartment.string_literals().iter().enumerate() {
        println!("  str[{i}] {s:?}");
    }
    for (i, f) in compartment.fpt_literals().iter().enumerate() {
        println!("  fpt[{i}] {f}");
    }
    for closure in compartment.closures() {
        match closure.parent_id() {
            Some(parent) => println!("\n{} (id {}, parent {parent}):", closure.name(), closure.id()),
            None => println!("\n{} (id {}):", closure.name(), closure.id()),
        }
        for (i, instr) in closure.code().iter().enumerate() {
            println!("  {i:>4}  {instr}");
        }
        for site in closure.catch_sites() {
            println!("  catch {}..={} -> {}", site.from, site.to, site.dest);
        }
    }
}

fn fail(err: LoadError) -> ! {
    eprintln!("error: {err}");
    process::exit(1);
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(out) = &cli.emit {
        let container = loader::read_container(&cli.file).unwrap_or_else(|e| fail(e));
        loader::write_container(out, &container).unwrap_or_else(|e| fail(e));
        return;
    }

    let compartment = loader::load_path(&cli.file).unwrap_or_else(|e| fail(e));
    if cli.dump {
        dump_compartment(&compartment);
        return;
    }

    let options = ProcessOptions {
        heap_capacity: cli.heap_capacity,
        pool_capacity: cli.pool_capacity,
        max_call_depth: cli.max_call_depth,
        gc_flags: cli.gc_flags.iter().map(|&r| GcFlag::from(r)).collect::<GcFlags>(),
        ..ProcessOptions::default()
    };
    let mut machine = match Process::new(options) {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };
    machine.insert_compartment(compartment);

    let outcome = machine.pre_start().and_then(|started| {
        if started {
            machine.run()
        } else {
            Ok(RunOutcome::Completed)
        }
    });
    let code = match outcome {
        Ok(RunOutcome::Completed) => 0,
        Ok(RunOutcome::Exited(status)) => status,
        Ok(RunOutcome::UncaughtException(exc)) => {
            eprintln!("uncaught exception {exc}");
            if let Some(tb) = machine.uncaught_traceback() {
                eprint!("{tb}");
            }
            1
        }
        Ok(RunOutcome::Terminated(sig)) => 128 + sig.number(),
        Err(err) => {
            eprintln!("error: {err}");
            machine.unwind_stack(TRACEBACK_LIMIT);
            1
        }
    };
    process::exit(code);
}
