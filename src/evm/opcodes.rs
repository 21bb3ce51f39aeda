//! # Instruction Set
//!
//! Decoded instruction forms. The byte-indexed families (PUSH, DUP, SWAP,
//! LOG) decode to a single variant carrying their index, so every handler in
//! the interpreter corresponds to exactly one variant and the dispatch match
//! stays exhaustive.

/// A decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 0x00
    Stop,
    /// 0x01
    Add,
    /// 0x02
    Mul,
    /// 0x03
    Sub,
    /// 0x04
    Div,
    /// 0x05
    SDiv,
    /// 0x06
    Mod,
    /// 0x07
    SMod,
    /// 0x08
    AddMod,
    /// 0x09
    MulMod,
    /// 0x0a
    Exp,
    /// 0x0b
    SignExtend,

    /// 0x10
    Lt,
    /// 0x11
    Gt,
    /// 0x12
    SLt,
    /// 0x13
    SGt,
    /// 0x14
    Eq,
    /// 0x15
    IsZero,
    /// 0x16
    And,
    /// 0x17
    Or,
    /// 0x18
    Xor,
    /// 0x19
    Not,
    /// 0x1a
    Byte,
    /// 0x1b
    Shl,
    /// 0x1c
    Shr,
    /// 0x1d
    Sar,

    /// 0x20
    Keccak256,

    /// 0x30
    Address,
    /// 0x31
    Balance,
    /// 0x32
    Origin,
    /// 0x33
    Caller,
    /// 0x34
    CallValue,
    /// 0x35
    CallDataLoad,
    /// 0x36
    CallDataSize,
    /// 0x37
    CallDataCopy,
    /// 0x38
    CodeSize,
    /// 0x39
    CodeCopy,
    /// 0x3a
    GasPrice,
    /// 0x3b
    ExtCodeSize,
    /// 0x3c
    ExtCodeCopy,
    /// 0x3d
    ReturnDataSize,
    /// 0x3e
    ReturnDataCopy,
    /// 0x3f
    ExtCodeHash,

    /// 0x40
    BlockHash,
    /// 0x41
    Coinbase,
    /// 0x42
    Timestamp,
    /// 0x43
    Number,
    /// 0x44
    PrevRandao,
    /// 0x45
    GasLimit,
    /// 0x46
    ChainId,
    /// 0x47
    SelfBalance,
    /// 0x48
    BaseFee,
    /// 0x49
    BlobHash,
    /// 0x4a
    BlobBaseFee,

    /// 0x50
    Pop,
    /// 0x51
    MLoad,
    /// 0x52
    MStore,
    /// 0x53
    MStore8,
    /// 0x54
    SLoad,
    /// 0x55
    SStore,
    /// 0x56
    Jump,
    /// 0x57
    JumpI,
    /// 0x58
    Pc,
    /// 0x59
    MSize,
    /// 0x5a
    Gas,
    /// 0x5b
    JumpDest,
    /// 0x5c
    TLoad,
    /// 0x5d
    TStore,
    /// 0x5e
    MCopy,

    /// 0x5f..=0x7f: PUSH0..PUSH32, carrying the immediate width 0..=32.
    Push(u8),
    /// 0x80..=0x8f: DUP1..DUP16, carrying n in 1..=16.
    Dup(u8),
    /// 0x90..=0x9f: SWAP1..SWAP16, carrying n in 1..=16.
    Swap(u8),
    /// 0xa0..=0xa4: LOG0..LOG4, carrying the topic count 0..=4.
    Log(u8),

    /// 0xf0
    Create,
    /// 0xf1
    Call,
    /// 0xf2
    CallCode,
    /// 0xf3
    Return,
    /// 0xf4
    DelegateCall,
    /// 0xf5
    Create2,
    /// 0xfa
    StaticCall,
    /// 0xfd
    Revert,
    /// 0xfe
    Invalid,
    /// 0xff
    SelfDestruct,
}

impl Instruction {
    /// Decodes a bytecode byte. `None` for unassigned bytes.
    #[must_use]
    pub fn decode(byte: u8) -> Option<Self> {
        use Instruction::*;
        Some(match byte {
            0x00 => Stop,
            0x01 => Add,
            0x02 => Mul,
            0x03 => Sub,
            0x04 => Div,
            0x05 => SDiv,
            0x06 => Mod,
            0x07 => SMod,
            0x08 => AddMod,
            0x09 => MulMod,
            0x0a => Exp,
            0x0b => SignExtend,

            0x10 => Lt,
            0x11 => Gt,
            0x12 => SLt,
            0x13 => SGt,
            0x14 => Eq,
            0x15 => IsZero,
            0x16 => And,
            0x17 => Or,
            0x18 => Xor,
            0x19 => Not,
            0x1a => Byte,
            0x1b => Shl,
            0x1c => Shr,
            0x1d => Sar,

            0x20 => Keccak256,

            0x30 => Address,
            0x31 => Balance,
            0x32 => Origin,
            0x33 => Caller,
            0x34 => CallValue,
            0x35 => CallDataLoad,
            0x36 => CallDataSize,
            0x37 => CallDataCopy,
            0x38 => CodeSize,
            0x39 => CodeCopy,
            0x3a => GasPrice,
            0x3b => ExtCodeSize,
            0x3c => ExtCodeCopy,
            0x3d => ReturnDataSize,
            0x3e => ReturnDataCopy,
            0x3f => ExtCodeHash,

            0x40 => BlockHash,
            0x41 => Coinbase,
            0x42 => Timestamp,
            0x43 => Number,
            0x44 => PrevRandao,
            0x45 => GasLimit,
            0x46 => ChainId,
            0x47 => SelfBalance,
            0x48 => BaseFee,
            0x49 => BlobHash,
            0x4a => BlobBaseFee,

            0x50 => Pop,
            0x51 => MLoad,
            0x52 => MStore,
            0x53 => MStore8,
            0x54 => SLoad,
            0x55 => SStore,
            0x56 => Jump,
            0x57 => JumpI,
            0x58 => Pc,
            0x59 => MSize,
            0x5a => Gas,
            0x5b => JumpDest,
            0x5c => TLoad,
            0x5d => TStore,
            0x5e => MCopy,

            0x5f..=0x7f => Push(byte - 0x5f),
            0x80..=0x8f => Dup(byte - 0x7f),
            0x90..=0x9f => Swap(byte - 0x8f),
            0xa0..=0xa4 => Log(byte - 0xa0),

            0xf0 => Create,
            0xf1 => Call,
            0xf2 => CallCode,
            0xf3 => Return,
            0xf4 => DelegateCall,
            0xf5 => Create2,
            0xfa => StaticCall,
            0xfd => Revert,
            0xfe => Invalid,
            0xff => SelfDestruct,

            _ => return None,
        })
    }

    /// Width of the immediate operand following the instruction in the
    /// bytecode (non-zero only for PUSH1..PUSH32).
    #[must_use]
    pub fn immediate_len(&self) -> usize {
        match self {
            Self::Push(n) => *n as usize,
            _ => 0,
        }
    }

    /// True if the instruction ends the frame.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Stop | Self::Return | Self::Revert | Self::Invalid | Self::SelfDestruct
        )
    }

    /// True if the instruction mutates state and is therefore rejected in a
    /// static context (a value-bearing CALL is checked separately).
    #[must_use]
    pub fn mutates_state(&self) -> bool {
        matches!(
            self,
            Self::SStore
                | Self::TStore
                | Self::Log(_)
                | Self::Create
                | Self::Create2
                | Self::SelfDestruct
        )
    }

    /// Instruction mnemonic, for traces and diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::Sub => "SUB",
            Self::Div => "DIV",
            Self::SDiv => "SDIV",
            Self::Mod => "MOD",
            Self::SMod => "SMOD",
            Self::AddMod => "ADDMOD",
            Self::MulMod => "MULMOD",
            Self::Exp => "EXP",
            Self::SignExtend => "SIGNEXTEND",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::SLt => "SLT",
            Self::SGt => "SGT",
            Self::Eq => "EQ",
            Self::IsZero => "ISZERO",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Byte => "BYTE",
            Self::Shl => "SHL",
            Self::Shr => "SHR",
            Self::Sar => "SAR",
            Self::Keccak256 => "KECCAK256",
            Self::Address => "ADDRESS",
            Self::Balance => "BALANCE",
            Self::Origin => "ORIGIN",
            Self::Caller => "CALLER",
            Self::CallValue => "CALLVALUE",
            Self::CallDataLoad => "CALLDATALOAD",
            Self::CallDataSize => "CALLDATASIZE",
            Self::CallDataCopy => "CALLDATACOPY",
            Self::CodeSize => "CODESIZE",
            Self::CodeCopy => "CODECOPY",
            Self::GasPrice => "GASPRICE",
            Self::ExtCodeSize => "EXTCODESIZE",
            Self::ExtCodeCopy => "EXTCODECOPY",
            Self::ReturnDataSize => "RETURNDATASIZE",
            Self::ReturnDataCopy => "RETURNDATACOPY",
            Self::ExtCodeHash => "EXTCODEHASH",
            Self::BlockHash => "BLOCKHASH",
            Self::Coinbase => "COINBASE",
            Self::Timestamp => "TIMESTAMP",
            Self::Number => "NUMBER",
            Self::PrevRandao => "PREVRANDAO",
            Self::GasLimit => "GASLIMIT",
            Self::ChainId => "CHAINID",
            Self::SelfBalance => "SELFBALANCE",
            Self::BaseFee => "BASEFEE",
            Self::BlobHash => "BLOBHASH",
            Self::BlobBaseFee => "BLOBBASEFEE",
            Self::Pop => "POP",
            Self::MLoad => "MLOAD",
            Self::MStore => "MSTORE",
            Self::MStore8 => "MSTORE8",
            Self::SLoad => "SLOAD",
            Self::SStore => "SSTORE",
            Self::Jump => "JUMP",
            Self::JumpI => "JUMPI",
            Self::Pc => "PC",
            Self::MSize => "MSIZE",
            Self::Gas => "GAS",
            Self::JumpDest => "JUMPDEST",
            Self::TLoad => "TLOAD",
            Self::TStore => "TSTORE",
            Self::MCopy => "MCOPY",
            Self::Push(0) => "PUSH0",
            Self::Push(_) => "PUSH",
            Self::Dup(_) => "DUP",
            Self::Swap(_) => "SWAP",
            Self::Log(_) => "LOG",
            Self::Create => "CREATE",
            Self::Call => "CALL",
            Self::CallCode => "CALLCODE",
            Self::Return => "RETURN",
            Self::DelegateCall => "DELEGATECALL",
            Self::Create2 => "CREATE2",
            Self::StaticCall => "STATICCALL",
            Self::Revert => "REVERT",
            Self::Invalid => "INVALID",
            Self::SelfDestruct => "SELFDESTRUCT",
        }
    }
}

/// Scans bytecode for valid JUMPDEST offsets, skipping PUSH immediates.
#[must_use]
pub fn jump_destinations(code: &[u8]) -> std::collections::HashSet<usize> {
    let mut dests = std::collections::HashSet::new();
    let mut pc = 0;
    while pc < code.len() {
        match code[pc] {
            0x5b => {
                dests.insert(pc);
            }
            op @ 0x60..=0x7f => {
                pc += (op - 0x5f) as usize;
            }
            _ => {}
        }
        pc += 1;
    }
    dests
}

// =============================================================================
// TESTS
// =============================================================================
