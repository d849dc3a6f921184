mod builder;
mod container;
mod instruction;
mod op;

pub use builder::{CodeBuilder, Label};
pub use container::{
    CatchSiteRecord, ClosureRecord, Container, FormatError, InstructionRecord, LocRecord,
};
pub use instruction::Instruction;
pub use op::Op;

#[cfg(test)]
mod tests {
    use super::*;

    // ── opcodes ────────────────────────────────────────────────────

    #[test]
    fn opcodes_are_dense() {
        for (i, op) in Op::ALL.iter().enumerate() {
            assert_eq!(op.code() as usize, i, "{op} out of place");
            assert_eq!(Op::try_from(i as u16).unwrap(), *op);
        }
        assert!(Op::COUNT > 150);
    }

    #[test]
    fn unknown_opcode_rejected() {
        let err = Op::try_from(Op::COUNT as u16).unwrap_err();
        assert!(matches!(err, FormatError::UnknownOpcode(c) if c as usize == Op::COUNT));
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Op::PInvk.mnemonic(), "PINVK");
        assert_eq!(Op::StrTrmR.to_string(), "STRTRMR");
        assert_eq!(Op::from_mnemonic("aryslice"), Some(Op::ArySlice));
        assert_eq!(Op::from_mnemonic("nope"), None);
    }

    #[test]
    fn instruction_display() {
        assert_eq!(Instruction::from(Op::Rtrn).to_string(), "RTRN");
        assert_eq!(Instruction::new(Op::LdObj, 3, 0).to_string(), "LDOBJ 3");
        assert_eq!(Instruction::new(Op::StObjN, 1, 2).to_string(), "STOBJN 1 2");
        assert_eq!(Instruction::new(Op::Jmp, (-2i64) as u64, 0).to_string(), "JMP -2");
        assert_eq!(Instruction::new(Op::JmpExc, 4, 1).to_string(), "JMPEXC +4 1");
    }

    // ── builder ────────────────────────────────────────────────────

    #[test]
    fn forward_labels_resolve_relative_to_the_jump() {
        let mut b = CodeBuilder::new();
        b.op1(Op::Bool, 1);
        let skip = b.jump_if();
        b.op1(Op::Int64, 1);
        b.op(Op::EPop);
        b.bind(skip);
        b.op(Op::Rtrn);
        let code = b.build();
        assert_eq!(code[1], Instruction::new(Op::JmpIf, 3, 0));
        assert_eq!(1 + code[1].offset(), 4);
    }

    #[test]
    fn loops_use_absolute_targets() {
        let mut b = CodeBuilder::new();
        b.op(Op::New);
        let top = b.current_index();
        b.op(Op::Pop).loop_to(top);
        assert_eq!(b.as_slice()[2], Instruction::new(Op::JmpR, 1, 0));
    }

    // ── container ──────────────────────────────────────────────────

    fn sample() -> Container {
        let mut c = Container::new("sample.src");
        c.string_literal_table = vec!["x".into(), "hello".into()];
        c.fpt_literal_table = vec![1.5];
        c.closures.push(ClosureRecord {
            name: "__main__".into(),
            id: 0,
            parent_id: None,
            instructions: vec![
                InstructionRecord::from(&Instruction::new(Op::Str, 1, 0)),
                InstructionRecord::from(&Instruction::from(Op::Rtrn)),
            ],
            locs: vec![LocRecord {
                index: 0,
                lineno: 1,
                col_offset: 4,
            }],
            catch_sites: vec![CatchSiteRecord {
                from: 0,
                to: 1,
                dst: 1,
            }],
        });
        c
    }

    #[test]
    fn container_encodings_agree() {
        let c = sample();
        let from_json = Container::from_json(&c.to_json().unwrap()).unwrap();
        let from_bytes = Container::from_bytes(&c.to_bytes().unwrap()).unwrap();
        assert_eq!(from_json, c);
        assert_eq!(from_bytes, c);
    }

    #[test]
    fn json_defaults_optional_fields() {
        let text = r#"{
            "string_literal_table": ["a"],
            "closures": [
                { "name": "f", "id": 7, "instructions": [ { "code": 0 } ] }
            ]
        }"#;
        let c = Container::from_json(text).unwrap();
        assert_eq!(c.closures[0].parent_id, None);
        assert_eq!(c.closures[0].instructions[0].oprd1, 0);
        assert!(c.closures[0].catch_sites.is_empty());
        let instr = Instruction::try_from(&c.closures[0].instructions[0]).unwrap();
        assert_eq!(instr.op, Op::New);
    }

    #[test]
    fn truncated_binary_is_an_error() {
        let bytes = sample().to_bytes().unwrap();
        let err = Container::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, FormatError::Binary(_)));
    }
}
