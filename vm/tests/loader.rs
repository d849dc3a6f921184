use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use bytecode::{CatchSiteRecord, ClosureRecord, Container, Instruction, InstructionRecord, LocRecord, Op};
use vm::loader::{self, LoadError};
use vm::{Loc, MAIN_CLOSURE, Process, ProcessOptions, RunOutcome};

#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn records(code: &[Instruction]) -> Vec<InstructionRecord> {
    code.iter().map(InstructionRecord::from).collect()
}

fn greeting() -> Container {
    let mut container = Container::new("greeting.pbvm");
    container.string_literal_table = vec!["hi".to_owned()];
    container.closures = vec![ClosureRecord {
        name: MAIN_CLOSURE.to_owned(),
        id: 0,
        parent_id: None,
        instructions: records(&[
            Instruction::new(Op::Str, 0, 0),
            Op::New.into(),
            Op::SetHndl.into(),
            Op::Print.into(),
            Instruction::new(Op::Exit, 4, 0),
        ]),
        locs: vec![LocRecord {
            index: 3,
            lineno: 1,
            col_offset: 0,
        }],
        catch_sites: vec![CatchSiteRecord {
            from: 0,
            to: 3,
            dst: 4,
        }],
    }];
    container
}

fn run(path: &std::path::Path) -> (RunOutcome, String) {
    let compartment = loader::load_path(path).unwrap();
    let mut p = Process::new(ProcessOptions::default()).unwrap();
    let out = Capture::default();
    p.set_output(out.clone());
    p.insert_compartment(compartment);
    assert!(p.pre_start().unwrap());
    let outcome = p.run().unwrap();
    let text = String::from_utf8(out.0.borrow().clone()).unwrap();
    (outcome, text)
}

#[test]
fn binary_and_json_containers_run_the_same_program() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["greeting.pbvm", "greeting.json"] {
        let path = dir.path().join(name);
        loader::write_container(&path, &greeting()).unwrap();
        assert_eq!(loader::read_container(&path).unwrap(), greeting());

        let (outcome, text) = run(&path);
        assert_eq!(outcome, RunOutcome::Exited(4), "{name}");
        assert_eq!(text, "hi\n", "{name}");
    }
}

#[test]
fn json_container_is_human_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greeting.json");
    loader::write_container(&path, &greeting()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"string_literal_table\""));
    assert!(text.contains("\"hi\""));
}

#[test]
fn compartment_keeps_locations_and_catch_sites() {
    let compartment = loader::compartment_from_container(&greeting()).unwrap();
    assert_eq!(compartment.path(), "greeting.pbvm");
    let main = compartment.get_closure_by_id(0).unwrap();
    assert_eq!(main.name(), MAIN_CLOSURE);
    assert_eq!(main.code().len(), 5);
    assert_eq!(
        main.loc_at(4),
        Some(Loc {
            lineno: 1,
            col_offset: 0
        })
    );
    assert_eq!(main.find_catch_site(2).map(|s| s.dest), Some(4));
}

#[test]
fn unknown_opcode_names_its_position() {
    let mut container = greeting();
    container.closures[0].instructions[2].code = 0xffff;
    match loader::compartment_from_container(&container) {
        Err(LoadError::UnknownOpcode {
            closure,
            index,
            code,
        }) => {
            assert_eq!(closure, MAIN_CLOSURE);
            assert_eq!(index, 2);
            assert_eq!(code, 0xffff);
        }
        other => panic!("expected an unknown opcode, got {other:?}"),
    }
}

#[test]
fn malformed_containers_are_rejected() {
    let mut twice = greeting();
    let copy = twice.closures[0].clone();
    twice.closures.push(copy);
    assert!(matches!(
        loader::compartment_from_container(&twice),
        Err(LoadError::DuplicateClosure(0))
    ));

    let mut bad_site = greeting();
    bad_site.closures[0].catch_sites[0].dst = 5;
    assert!(matches!(
        loader::compartment_from_container(&bad_site),
        Err(LoadError::InvalidCatchSite { dest: 5, .. })
    ));

    let mut future = greeting();
    future.format_version = "99".to_owned();
    assert!(matches!(
        loader::compartment_from_container(&future),
        Err(LoadError::UnsupportedFormat { .. })
    ));
}

#[test]
fn unreadable_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.pbvm");
    assert!(matches!(
        loader::load_path(&missing),
        Err(LoadError::Io { path, .. }) if path == missing
    ));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    assert!(matches!(
        loader::load_path(&garbage),
        Err(LoadError::Format(_))
    ));
}

#[test]
fn unnamed_container_takes_the_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anonymous.pbvm");
    let mut container = greeting();
    container.path.clear();
    loader::write_container(&path, &container).unwrap();

    let compartment = loader::load_path(&path).unwrap();
    assert_eq!(compartment.path(), path.display().to_string());
}
