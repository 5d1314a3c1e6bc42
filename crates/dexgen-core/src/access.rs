//! Access flags for classes, fields and methods.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Access flags as stored in `class_def_item` and the encoded members of
/// `class_data_item`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct AccessFlags(pub u32);

impl AccessFlags {
    pub const NONE: Self = Self(0);
    pub const PUBLIC: Self = Self(0x1);
    pub const PRIVATE: Self = Self(0x2);
    pub const PROTECTED: Self = Self(0x4);
    pub const STATIC: Self = Self(0x8);
    pub const FINAL: Self = Self(0x10);
    pub const SYNCHRONIZED: Self = Self(0x20);
    pub const VOLATILE: Self = Self(0x40);
    pub const BRIDGE: Self = Self(0x40);
    pub const TRANSIENT: Self = Self(0x80);
    pub const VARARGS: Self = Self(0x80);
    pub const NATIVE: Self = Self(0x100);
    pub const INTERFACE: Self = Self(0x200);
    pub const ABSTRACT: Self = Self(0x400);
    pub const STRICT: Self = Self(0x800);
    pub const SYNTHETIC: Self = Self(0x1000);
    pub const ANNOTATION: Self = Self(0x2000);
    pub const ENUM: Self = Self(0x4000);
    pub const CONSTRUCTOR: Self = Self(0x10000);
    pub const DECLARED_SYNCHRONIZED: Self = Self(0x20000);

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Whether a method with these flags and this name belongs to the direct
    /// method list (static, private or constructor) rather than the virtual one.
    pub fn is_direct_method(self, name: &str) -> bool {
        self.0 & (Self::STATIC.0 | Self::PRIVATE.0 | Self::CONSTRUCTOR.0) != 0
            || name == "<init>"
            || name == "<clinit>"
    }
}

impl BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessFlags(0x{:x})", self.0)
    }
}
