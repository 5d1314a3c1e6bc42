//! Error types for pool management, code encoding and container writing.

use std::io;

use dexgen_core::DescriptorError;

/// Constant pool misuse or overflow, or a value that cannot be interned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("constant pool is closed")]
    Closed,
    #[error("constant pool is not closed yet")]
    NotClosed,
    #[error(transparent)]
    MalformedDescriptor(#[from] DescriptorError),
    #[error("too many {kind}: {count} (max 65536)")]
    TooMany { kind: &'static str, count: usize },
    #[error("annotation {annotation} sets element {name} twice")]
    DuplicateElement { annotation: String, name: String },
}

/// An instruction or method body that cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("register v{register} does not fit {opcode}")]
    RegisterOutOfRange { opcode: &'static str, register: u32 },
    #[error("literal {value} does not fit {opcode}")]
    LiteralOutOfRange { opcode: &'static str, value: i64 },
    #[error("branch offset {offset} does not fit {opcode}")]
    BranchOutOfRange { opcode: &'static str, offset: i64 },
    #[error("index {index} does not fit {opcode}")]
    IndexOutOfRange { opcode: &'static str, index: u32 },
    #[error("{opcode} does not take these operands")]
    OperandMismatch { opcode: &'static str },
    #[error("unsupported opcode 0x{0:02x}")]
    UnsupportedOpcode(u8),
    #[error("label {0} is never bound")]
    UnknownLabel(u32),
    #[error("label {0} is bound twice")]
    DuplicateLabel(u32),
    #[error("sparse-switch keys are not strictly ascending")]
    UnsortedSwitchKeys,
    #[error("switch has {keys} keys but {targets} targets")]
    SwitchArity { keys: usize, targets: usize },
    #[error("fill-array-data of {len} bytes does not split into elements of width {width}")]
    BadArrayData { len: usize, width: u16 },
    #[error("try range of {0} code units exceeds 65535")]
    TryRangeTooLong(u32),
    #[error("method needs {needed} registers, frame has {declared}")]
    FrameTooSmall { needed: u32, declared: u16 },
}

/// Failure of a whole build.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("writer is already closed")]
    AlreadyClosed,
    #[error("constant pool: {0}")]
    Pool(#[from] PoolError),
    #[error("{class}->{method}: {source}")]
    Method {
        class: String,
        method: String,
        #[source]
        source: EncodeError,
    },
    #[error("class {0} is defined twice")]
    DuplicateClass(String),
    #[error("{class} declares member {name} twice")]
    DuplicateMember { class: String, name: String },
    #[error("{target} carries annotation {ty} twice")]
    DuplicateAnnotation { target: String, ty: String },
    #[error("source pool must be closed before seeding")]
    SourceNotClosed,
    #[error("checksum computation failed: {0}")]
    Checksum(#[source] io::Error),
}
