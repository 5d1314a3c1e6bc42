//! Opcode table and instruction formats.
//!
//! Only the opcodes of format version 035 are listed. Each opcode knows its
//! mnemonic, its [`Format`] (and thus its width in 16-bit code units) and the
//! kind of pool index it carries, if any.

use std::fmt;

/// Instruction format, named after the format ids of the instruction set
/// reference (`22c` = two units, two registers, one constant-pool index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    F10x,
    F12x,
    F11n,
    F11x,
    F10t,
    F20t,
    F22x,
    F21t,
    F21s,
    F21h,
    F21c,
    F23x,
    F22b,
    F22t,
    F22s,
    F22c,
    F32x,
    F30t,
    F31t,
    F31i,
    F31c,
    F35c,
    F3rc,
    F51l,
}

impl Format {
    /// Width in 16-bit code units.
    pub fn units(self) -> u32 {
        match self {
            Self::F10x | Self::F12x | Self::F11n | Self::F11x | Self::F10t => 1,
            Self::F20t
            | Self::F22x
            | Self::F21t
            | Self::F21s
            | Self::F21h
            | Self::F21c
            | Self::F23x
            | Self::F22b
            | Self::F22t
            | Self::F22s
            | Self::F22c => 2,
            Self::F32x
            | Self::F30t
            | Self::F31t
            | Self::F31i
            | Self::F31c
            | Self::F35c
            | Self::F3rc => 3,
            Self::F51l => 5,
        }
    }
}

/// Kind of pool index an instruction refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    None,
    String,
    Type,
    Field,
    Method,
}

/// Static description of an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpInfo {
    pub name: &'static str,
    pub format: Format,
    pub index: IndexKind,
}

/// One-byte opcode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Opcode(pub u8);

macro_rules! opcodes {
    ($($code:literal $ident:ident $name:literal $format:ident $index:ident;)*) => {
        impl Opcode {
            $(pub const $ident: Self = Self($code);)*

            /// Table entry, or `None` for codes unused in version 035.
            pub fn info(self) -> Option<OpInfo> {
                match self.0 {
                    $($code => Some(OpInfo {
                        name: $name,
                        format: Format::$format,
                        index: IndexKind::$index,
                    }),)*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    0x00 NOP "nop" F10x None;
    0x01 MOVE "move" F12x None;
    0x02 MOVE_FROM16 "move/from16" F22x None;
    0x03 MOVE_16 "move/16" F32x None;
    0x04 MOVE_WIDE "move-wide" F12x None;
    0x05 MOVE_WIDE_FROM16 "move-wide/from16" F22x None;
    0x06 MOVE_WIDE_16 "move-wide/16" F32x None;
    0x07 MOVE_OBJECT "move-object" F12x None;
    0x08 MOVE_OBJECT_FROM16 "move-object/from16" F22x None;
    0x09 MOVE_OBJECT_16 "move-object/16" F32x None;
    0x0a MOVE_RESULT "move-result" F11x None;
    0x0b MOVE_RESULT_WIDE "move-result-wide" F11x None;
    0x0c MOVE_RESULT_OBJECT "move-result-object" F11x None;
    0x0d MOVE_EXCEPTION "move-exception" F11x None;
    0x0e RETURN_VOID "return-void" F10x None;
    0x0f RETURN "return" F11x None;
    0x10 RETURN_WIDE "return-wide" F11x None;
    0x11 RETURN_OBJECT "return-object" F11x None;
    0x12 CONST_4 "const/4" F11n None;
    0x13 CONST_16 "const/16" F21s None;
    0x14 CONST "const" F31i None;
    0x15 CONST_HIGH16 "const/high16" F21h None;
    0x16 CONST_WIDE_16 "const-wide/16" F21s None;
    0x17 CONST_WIDE_32 "const-wide/32" F31i None;
    0x18 CONST_WIDE "const-wide" F51l None;
    0x19 CONST_WIDE_HIGH16 "const-wide/high16" F21h None;
    0x1a CONST_STRING "const-string" F21c String;
    0x1b CONST_STRING_JUMBO "const-string/jumbo" F31c String;
    0x1c CONST_CLASS "const-class" F21c Type;
    0x1d MONITOR_ENTER "monitor-enter" F11x None;
    0x1e MONITOR_EXIT "monitor-exit" F11x None;
    0x1f CHECK_CAST "check-cast" F21c Type;
    0x20 INSTANCE_OF "instance-of" F22c Type;
    0x21 ARRAY_LENGTH "array-length" F12x None;
    0x22 NEW_INSTANCE "new-instance" F21c Type;
    0x23 NEW_ARRAY "new-array" F22c Type;
    0x24 FILLED_NEW_ARRAY "filled-new-array" F35c Type;
    0x25 FILLED_NEW_ARRAY_RANGE "filled-new-array/range" F3rc Type;
    0x26 FILL_ARRAY_DATA "fill-array-data" F31t None;
    0x27 THROW "throw" F11x None;
    0x28 GOTO "goto" F10t None;
    0x29 GOTO_16 "goto/16" F20t None;
    0x2a GOTO_32 "goto/32" F30t None;
    0x2b PACKED_SWITCH "packed-switch" F31t None;
    0x2c SPARSE_SWITCH "sparse-switch" F31t None;
    0x2d CMPL_FLOAT "cmpl-float" F23x None;
    0x2e CMPG_FLOAT "cmpg-float" F23x None;
    0x2f CMPL_DOUBLE "cmpl-double" F23x None;
    0x30 CMPG_DOUBLE "cmpg-double" F23x None;
    0x31 CMP_LONG "cmp-long" F23x None;
    0x32 IF_EQ "if-eq" F22t None;
    0x33 IF_NE "if-ne" F22t None;
    0x34 IF_LT "if-lt" F22t None;
    0x35 IF_GE "if-ge" F22t None;
    0x36 IF_GT "if-gt" F22t None;
    0x37 IF_LE "if-le" F22t None;
    0x38 IF_EQZ "if-eqz" F21t None;
    0x39 IF_NEZ "if-nez" F21t None;
    0x3a IF_LTZ "if-ltz" F21t None;
    0x3b IF_GEZ "if-gez" F21t None;
    0x3c IF_GTZ "if-gtz" F21t None;
    0x3d IF_LEZ "if-lez" F21t None;
    0x44 AGET "aget" F23x None;
    0x45 AGET_WIDE "aget-wide" F23x None;
    0x46 AGET_OBJECT "aget-object" F23x None;
    0x47 AGET_BOOLEAN "aget-boolean" F23x None;
    0x48 AGET_BYTE "aget-byte" F23x None;
    0x49 AGET_CHAR "aget-char" F23x None;
    0x4a AGET_SHORT "aget-short" F23x None;
    0x4b APUT "aput" F23x None;
    0x4c APUT_WIDE "aput-wide" F23x None;
    0x4d APUT_OBJECT "aput-object" F23x None;
    0x4e APUT_BOOLEAN "aput-boolean" F23x None;
    0x4f APUT_BYTE "aput-byte" F23x None;
    0x50 APUT_CHAR "aput-char" F23x None;
    0x51 APUT_SHORT "aput-short" F23x None;
    0x52 IGET "iget" F22c Field;
    0x53 IGET_WIDE "iget-wide" F22c Field;
    0x54 IGET_OBJECT "iget-object" F22c Field;
    0x55 IGET_BOOLEAN "iget-boolean" F22c Field;
    0x56 IGET_BYTE "iget-byte" F22c Field;
    0x57 IGET_CHAR "iget-char" F22c Field;
    0x58 IGET_SHORT "iget-short" F22c Field;
    0x59 IPUT "iput" F22c Field;
    0x5a IPUT_WIDE "iput-wide" F22c Field;
    0x5b IPUT_OBJECT "iput-object" F22c Field;
    0x5c IPUT_BOOLEAN "iput-boolean" F22c Field;
    0x5d IPUT_BYTE "iput-byte" F22c Field;
    0x5e IPUT_CHAR "iput-char" F22c Field;
    0x5f IPUT_SHORT "iput-short" F22c Field;
    0x60 SGET "sget" F21c Field;
    0x61 SGET_WIDE "sget-wide" F21c Field;
    0x62 SGET_OBJECT "sget-object" F21c Field;
    0x63 SGET_BOOLEAN "sget-boolean" F21c Field;
    0x64 SGET_BYTE "sget-byte" F21c Field;
    0x65 SGET_CHAR "sget-char" F21c Field;
    0x66 SGET_SHORT "sget-short" F21c Field;
    0x67 SPUT "sput" F21c Field;
    0x68 SPUT_WIDE "sput-wide" F21c Field;
    0x69 SPUT_OBJECT "sput-object" F21c Field;
    0x6a SPUT_BOOLEAN "sput-boolean" F21c Field;
    0x6b SPUT_BYTE "sput-byte" F21c Field;
    0x6c SPUT_CHAR "sput-char" F21c Field;
    0x6d SPUT_SHORT "sput-short" F21c Field;
    0x6e INVOKE_VIRTUAL "invoke-virtual" F35c Method;
    0x6f INVOKE_SUPER "invoke-super" F35c Method;
    0x70 INVOKE_DIRECT "invoke-direct" F35c Method;
    0x71 INVOKE_STATIC "invoke-static" F35c Method;
    0x72 INVOKE_INTERFACE "invoke-interface" F35c Method;
    0x74 INVOKE_VIRTUAL_RANGE "invoke-virtual/range" F3rc Method;
    0x75 INVOKE_SUPER_RANGE "invoke-super/range" F3rc Method;
    0x76 INVOKE_DIRECT_RANGE "invoke-direct/range" F3rc Method;
    0x77 INVOKE_STATIC_RANGE "invoke-static/range" F3rc Method;
    0x78 INVOKE_INTERFACE_RANGE "invoke-interface/range" F3rc Method;
    0x7b NEG_INT "neg-int" F12x None;
    0x7c NOT_INT "not-int" F12x None;
    0x7d NEG_LONG "neg-long" F12x None;
    0x7e NOT_LONG "not-long" F12x None;
    0x7f NEG_FLOAT "neg-float" F12x None;
    0x80 NEG_DOUBLE "neg-double" F12x None;
    0x81 INT_TO_LONG "int-to-long" F12x None;
    0x82 INT_TO_FLOAT "int-to-float" F12x None;
    0x83 INT_TO_DOUBLE "int-to-double" F12x None;
    0x84 LONG_TO_INT "long-to-int" F12x None;
    0x85 LONG_TO_FLOAT "long-to-float" F12x None;
    0x86 LONG_TO_DOUBLE "long-to-double" F12x None;
    0x87 FLOAT_TO_INT "float-to-int" F12x None;
    0x88 FLOAT_TO_LONG "float-to-long" F12x None;
    0x89 FLOAT_TO_DOUBLE "float-to-double" F12x None;
    0x8a DOUBLE_TO_INT "double-to-int" F12x None;
    0x8b DOUBLE_TO_LONG "double-to-long" F12x None;
    0x8c DOUBLE_TO_FLOAT "double-to-float" F12x None;
    0x8d INT_TO_BYTE "int-to-byte" F12x None;
    0x8e INT_TO_CHAR "int-to-char" F12x None;
    0x8f INT_TO_SHORT "int-to-short" F12x None;
    0x90 ADD_INT "add-int" F23x None;
    0x91 SUB_INT "sub-int" F23x None;
    0x92 MUL_INT "mul-int" F23x None;
    0x93 DIV_INT "div-int" F23x None;
    0x94 REM_INT "rem-int" F23x None;
    0x95 AND_INT "and-int" F23x None;
    0x96 OR_INT "or-int" F23x None;
    0x97 XOR_INT "xor-int" F23x None;
    0x98 SHL_INT "shl-int" F23x None;
    0x99 SHR_INT "shr-int" F23x None;
    0x9a USHR_INT "ushr-int" F23x None;
    0x9b ADD_LONG "add-long" F23x None;
    0x9c SUB_LONG "sub-long" F23x None;
    0x9d MUL_LONG "mul-long" F23x None;
    0x9e DIV_LONG "div-long" F23x None;
    0x9f REM_LONG "rem-long" F23x None;
    0xa0 AND_LONG "and-long" F23x None;
    0xa1 OR_LONG "or-long" F23x None;
    0xa2 XOR_LONG "xor-long" F23x None;
    0xa3 SHL_LONG "shl-long" F23x None;
    0xa4 SHR_LONG "shr-long" F23x None;
    0xa5 USHR_LONG "ushr-long" F23x None;
    0xa6 ADD_FLOAT "add-float" F23x None;
    0xa7 SUB_FLOAT "sub-float" F23x None;
    0xa8 MUL_FLOAT "mul-float" F23x None;
    0xa9 DIV_FLOAT "div-float" F23x None;
    0xaa REM_FLOAT "rem-float" F23x None;
    0xab ADD_DOUBLE "add-double" F23x None;
    0xac SUB_DOUBLE "sub-double" F23x None;
    0xad MUL_DOUBLE "mul-double" F23x None;
    0xae DIV_DOUBLE "div-double" F23x None;
    0xaf REM_DOUBLE "rem-double" F23x None;
    0xb0 ADD_INT_2ADDR "add-int/2addr" F12x None;
    0xb1 SUB_INT_2ADDR "sub-int/2addr" F12x None;
    0xb2 MUL_INT_2ADDR "mul-int/2addr" F12x None;
    0xb3 DIV_INT_2ADDR "div-int/2addr" F12x None;
    0xb4 REM_INT_2ADDR "rem-int/2addr" F12x None;
    0xb5 AND_INT_2ADDR "and-int/2addr" F12x None;
    0xb6 OR_INT_2ADDR "or-int/2addr" F12x None;
    0xb7 XOR_INT_2ADDR "xor-int/2addr" F12x None;
    0xb8 SHL_INT_2ADDR "shl-int/2addr" F12x None;
    0xb9 SHR_INT_2ADDR "shr-int/2addr" F12x None;
    0xba USHR_INT_2ADDR "ushr-int/2addr" F12x None;
    0xbb ADD_LONG_2ADDR "add-long/2addr" F12x None;
    0xbc SUB_LONG_2ADDR "sub-long/2addr" F12x None;
    0xbd MUL_LONG_2ADDR "mul-long/2addr" F12x None;
    0xbe DIV_LONG_2ADDR "div-long/2addr" F12x None;
    0xbf REM_LONG_2ADDR "rem-long/2addr" F12x None;
    0xc0 AND_LONG_2ADDR "and-long/2addr" F12x None;
    0xc1 OR_LONG_2ADDR "or-long/2addr" F12x None;
    0xc2 XOR_LONG_2ADDR "xor-long/2addr" F12x None;
    0xc3 SHL_LONG_2ADDR "shl-long/2addr" F12x None;
    0xc4 SHR_LONG_2ADDR "shr-long/2addr" F12x None;
    0xc5 USHR_LONG_2ADDR "ushr-long/2addr" F12x None;
    0xc6 ADD_FLOAT_2ADDR "add-float/2addr" F12x None;
    0xc7 SUB_FLOAT_2ADDR "sub-float/2addr" F12x None;
    0xc8 MUL_FLOAT_2ADDR "mul-float/2addr" F12x None;
    0xc9 DIV_FLOAT_2ADDR "div-float/2addr" F12x None;
    0xca REM_FLOAT_2ADDR "rem-float/2addr" F12x None;
    0xcb ADD_DOUBLE_2ADDR "add-double/2addr" F12x None;
    0xcc SUB_DOUBLE_2ADDR "sub-double/2addr" F12x None;
    0xcd MUL_DOUBLE_2ADDR "mul-double/2addr" F12x None;
    0xce DIV_DOUBLE_2ADDR "div-double/2addr" F12x None;
    0xcf REM_DOUBLE_2ADDR "rem-double/2addr" F12x None;
    0xd0 ADD_INT_LIT16 "add-int/lit16" F22s None;
    0xd1 RSUB_INT "rsub-int" F22s None;
    0xd2 MUL_INT_LIT16 "mul-int/lit16" F22s None;
    0xd3 DIV_INT_LIT16 "div-int/lit16" F22s None;
    0xd4 REM_INT_LIT16 "rem-int/lit16" F22s None;
    0xd5 AND_INT_LIT16 "and-int/lit16" F22s None;
    0xd6 OR_INT_LIT16 "or-int/lit16" F22s None;
    0xd7 XOR_INT_LIT16 "xor-int/lit16" F22s None;
    0xd8 ADD_INT_LIT8 "add-int/lit8" F22b None;
    0xd9 RSUB_INT_LIT8 "rsub-int/lit8" F22b None;
    0xda MUL_INT_LIT8 "mul-int/lit8" F22b None;
    0xdb DIV_INT_LIT8 "div-int/lit8" F22b None;
    0xdc REM_INT_LIT8 "rem-int/lit8" F22b None;
    0xdd AND_INT_LIT8 "and-int/lit8" F22b None;
    0xde OR_INT_LIT8 "or-int/lit8" F22b None;
    0xdf XOR_INT_LIT8 "xor-int/lit8" F22b None;
    0xe0 SHL_INT_LIT8 "shl-int/lit8" F22b None;
    0xe1 SHR_INT_LIT8 "shr-int/lit8" F22b None;
    0xe2 USHR_INT_LIT8 "ushr-int/lit8" F22b None;
}

impl Opcode {
    pub fn name(self) -> &'static str {
        self.info().map_or("<unused>", |i| i.name)
    }

    pub fn format(self) -> Option<Format> {
        self.info().map(|i| i.format)
    }

    pub fn index_kind(self) -> IndexKind {
        self.info().map_or(IndexKind::None, |i| i.index)
    }

    pub fn is_goto(self) -> bool {
        matches!(self, Self::GOTO | Self::GOTO_16 | Self::GOTO_32)
    }

    /// Two-register conditional branch (`if-eq` .. `if-le`).
    pub fn is_if_test(self) -> bool {
        (Self::IF_EQ.0..=Self::IF_LE.0).contains(&self.0)
    }

    /// Compare-with-zero conditional branch (`if-eqz` .. `if-lez`).
    pub fn is_if_testz(self) -> bool {
        (Self::IF_EQZ.0..=Self::IF_LEZ.0).contains(&self.0)
    }

    pub fn is_switch(self) -> bool {
        matches!(self, Self::PACKED_SWITCH | Self::SPARSE_SWITCH)
    }

    pub fn is_invoke(self) -> bool {
        self.index_kind() == IndexKind::Method
            && matches!(self.format(), Some(Format::F35c | Format::F3rc))
    }

    /// Register-range variant (`/range` suffix).
    pub fn is_range(self) -> bool {
        self.format() == Some(Format::F3rc)
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opcode(0x{:02x} {})", self.0, self.name())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
