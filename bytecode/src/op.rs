use crate::FormatError;

macro_rules! opcodes {
    ($( $(#[$doc:meta])* $name:ident => $mnemonic:literal, )*) => {
        /// Bytecode opcodes.
        ///
        /// Discriminants are dense and start at zero, so an opcode doubles as
        /// an index into the handler table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Op {
            $( $(#[$doc])* $name, )*
        }

        impl Op {
            /// Every opcode in discriminant order.
            pub const ALL: &'static [Op] = &[$( Op::$name, )*];

            pub const COUNT: usize = Self::ALL.len();

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( Op::$name => $mnemonic, )*
                }
            }
        }
    };
}

opcodes! {
    // ── objects ────────────────────────────────────────────────────
    New => "NEW",
    /// Load visible variable `oprd1`, searching lexical ancestors.
    LdObj => "LDOBJ",
    StObj => "STOBJ",
    /// Store into the `oprd2`-th lexical ancestor.
    StObjN => "STOBJN",
    GetAttr => "GETATTR",
    SetAttr => "SETATTR",
    DelAttr => "DELATTR",
    HasAttr => "HASATTR",
    GetAttr2 => "GETATTR2",
    SetAttr2 => "SETATTR2",
    DelAttr2 => "DELATTR2",
    HasAttr2 => "HASATTR2",
    Pop => "POP",
    LdObj2 => "LDOBJ2",
    StObj2 => "STOBJ2",
    DelObj => "DELOBJ",
    DelObj2 => "DELOBJ2",
    GetHndl => "GETHNDL",
    SetHndl => "SETHNDL",
    GetHndl2 => "GETHNDL2",
    SetHndl2 => "SETHNDL2",
    ClrHndl => "CLRHNDL",
    CpyHndl => "CPYHNDL",
    CpyRepr => "CPYREPR",
    IsTruthy => "ISTRUTHY",
    ObjEq => "OBJEQ",
    ObjNeq => "OBJNEQ",
    SetCtx => "SETCTX",
    CldObj => "CLDOBJ",
    SetAttrs => "SETATTRS",
    Swap => "SWAP",
    SetFlGc => "SETFLGC",
    SetFlDel => "SETFLDEL",
    SetFlCall => "SETFLCALL",
    SetFlMute => "SETFLMUTE",

    // ── control ────────────────────────────────────────────────────
    PInvk => "PINVK",
    Invk => "INVK",
    Rtrn => "RTRN",
    /// Relative to the jump's own index; `oprd1` is a signed offset.
    Jmp => "JMP",
    JmpIf => "JMPIF",
    /// Absolute index within the current closure.
    JmpR => "JMPR",
    Exc => "EXC",
    ExcObj => "EXCOBJ",
    ClrExc => "CLREXC",
    JmpExc => "JMPEXC",
    Exit => "EXIT",

    // ── arguments ──────────────────────────────────────────────────
    PutArg => "PUTARG",
    PutKwArg => "PUTKWARG",
    PutArgs => "PUTARGS",
    PutKwArgs => "PUTKWARGS",
    GetArg => "GETARG",
    GetKwArg => "GETKWARG",
    GetArgs => "GETARGS",
    GetKwArgs => "GETKWARGS",
    HasArgs => "HASARGS",

    // ── runtime ────────────────────────────────────────────────────
    Gc => "GC",
    Debug => "DEBUG",
    Print => "PRINT",

    // ── evaluation stack ───────────────────────────────────────────
    EPop => "EPOP",
    EDup => "EDUP",
    ESwap => "ESWAP",

    // ── native constructors ────────────────────────────────────────
    Int8 => "INT8",
    Int16 => "INT16",
    Int32 => "INT32",
    Int64 => "INT64",
    UInt8 => "UINT8",
    UInt16 => "UINT16",
    UInt32 => "UINT32",
    UInt64 => "UINT64",
    Bool => "BOOL",
    Dec1 => "DEC1",
    Dec2 => "DEC2",
    Str => "STR",
    Ary => "ARY",
    Map => "MAP",

    // ── conversions ────────────────────────────────────────────────
    ToInt8 => "TOINT8",
    ToInt16 => "TOINT16",
    ToInt32 => "TOINT32",
    ToInt64 => "TOINT64",
    ToUInt8 => "TOUINT8",
    ToUInt16 => "TOUINT16",
    ToUInt32 => "TOUINT32",
    ToUInt64 => "TOUINT64",
    ToBool => "TOBOOL",
    ToDec1 => "TODEC1",
    ToDec2 => "TODEC2",
    ToStr => "TOSTR",
    ToAry => "TOARY",
    ToMap => "TOMAP",

    // ── unary ──────────────────────────────────────────────────────
    Pos => "POS",
    Neg => "NEG",
    Inc => "INC",
    Dec => "DEC",
    Abs => "ABS",
    Sqrt => "SQRT",
    BNot => "BNOT",
    LNot => "LNOT",
    Truthy => "TRUTHY",
    Repr => "REPR",
    Hash => "HASH",

    // ── binary ─────────────────────────────────────────────────────
    Add => "ADD",
    Sub => "SUB",
    Mul => "MUL",
    Div => "DIV",
    Mod => "MOD",
    Pow => "POW",
    BAnd => "BAND",
    BOr => "BOR",
    BXor => "BXOR",
    BLs => "BLS",
    BRs => "BRS",
    Eq => "EQ",
    Neq => "NEQ",
    Gt => "GT",
    Lt => "LT",
    Gte => "GTE",
    Lte => "LTE",
    LAnd => "LAND",
    LOr => "LOR",
    Cmp => "CMP",

    // ── strings ────────────────────────────────────────────────────
    StrLen => "STRLEN",
    StrClr => "STRCLR",
    StrApd => "STRAPD",
    StrPsh => "STRPSH",
    StrIst => "STRIST",
    StrIst2 => "STRIST2",
    StrErs => "STRERS",
    StrErs2 => "STRERS2",
    StrRplc => "STRRPLC",
    StrSwp => "STRSWP",
    StrSub => "STRSUB",
    StrSub2 => "STRSUB2",
    StrFnd => "STRFND",
    StrFnd2 => "STRFND2",
    StrRfnd => "STRRFND",
    StrRfnd2 => "STRRFND2",
    StrCmp => "STRCMP",
    StrCmp2 => "STRCMP2",
    StrStarts => "STRSTARTS",
    StrEnds => "STRENDS",
    StrRev => "STRREV",
    StrUpper => "STRUPPER",
    StrLower => "STRLOWER",
    StrTrm => "STRTRM",
    StrTrmL => "STRTRML",
    StrTrmR => "STRTRMR",

    // ── arrays ─────────────────────────────────────────────────────
    AryLen => "ARYLEN",
    AryEmp => "ARYEMP",
    AryAt => "ARYAT",
    AryFrt => "ARYFRT",
    AryBak => "ARYBAK",
    AryPut => "ARYPUT",
    AryApnd => "ARYAPND",
    AryErs => "ARYERS",
    AryPop => "ARYPOP",
    ArySwp => "ARYSWP",
    AryClr => "ARYCLR",
    AryMrg => "ARYMRG",
    ArySlice => "ARYSLICE",
    AryStrd => "ARYSTRD",
    AryRev => "ARYREV",

    // ── maps ───────────────────────────────────────────────────────
    MapLen => "MAPLEN",
    MapEmp => "MAPEMP",
    MapFind => "MAPFIND",
    MapAt => "MAPAT",
    MapPut => "MAPPUT",
    MapErs => "MAPERS",
    MapClr => "MAPCLR",
    MapSwp => "MAPSWP",
    MapVals => "MAPVALS",
    MapMrg => "MAPMRG",
}

impl Op {
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub fn from_mnemonic(s: &str) -> Option<Op> {
        Self::ALL.iter().copied().find(|op| op.mnemonic().eq_ignore_ascii_case(s))
    }
}

impl TryFrom<u16> for Op {
    type Error = FormatError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(FormatError::UnknownOpcode(code))
    }
}

impl core::fmt::Display for Op {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
