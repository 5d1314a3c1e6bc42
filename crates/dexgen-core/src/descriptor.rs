//! Type and method descriptor parsing.
//!
//! Descriptors follow the `Lpkg/Name;` / `[I` / `(IJ)V` syntax. The writer
//! needs three things from them: the split of a method descriptor into its
//! parameter and return types, the "shorty" signature stored with each
//! prototype, and the number of register words each type occupies.

/// Malformed type or method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("malformed type descriptor `{0}`")]
    Type(String),
    #[error("malformed method descriptor `{0}`")]
    Method(String),
}

/// A method descriptor split into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor<'a> {
    pub params: Vec<&'a str>,
    pub ret: &'a str,
}

impl<'a> MethodDescriptor<'a> {
    /// Parse `(params)ret`.
    pub fn parse(desc: &'a str) -> Result<Self, DescriptorError> {
        let err = || DescriptorError::Method(desc.to_owned());
        let rest = desc.strip_prefix('(').ok_or_else(err)?;
        let close = rest.find(')').ok_or_else(err)?;
        let (mut params_src, ret) = (&rest[..close], &rest[close + 1..]);

        let mut params = Vec::new();
        while !params_src.is_empty() {
            let len = field_type_len(params_src).ok_or_else(err)?;
            params.push(&params_src[..len]);
            params_src = &params_src[len..];
        }

        if ret != "V" && field_type_len(ret) != Some(ret.len()) {
            return Err(err());
        }

        Ok(Self { params, ret })
    }

    /// Shorty form: return type first, then one character per parameter,
    /// with every reference type collapsed to `L`.
    pub fn shorty(&self) -> String {
        std::iter::once(self.ret)
            .chain(self.params.iter().copied())
            .map(shorty_char)
            .collect()
    }

    /// Register words needed by the parameters (longs and doubles take two).
    pub fn param_words(&self) -> u16 {
        self.params.iter().map(|p| register_words(p)).sum()
    }
}

/// Validate a single type descriptor; `V` is accepted.
pub fn validate_type(desc: &str) -> Result<(), DescriptorError> {
    if desc == "V" {
        return Ok(());
    }
    validate_field_type(desc)
}

/// Validate a type a value can have, so `V` is rejected.
pub fn validate_field_type(desc: &str) -> Result<(), DescriptorError> {
    if field_type_len(desc) == Some(desc.len()) {
        Ok(())
    } else {
        Err(DescriptorError::Type(desc.to_owned()))
    }
}

/// Number of 32-bit registers a value of this type occupies.
pub fn register_words(desc: &str) -> u16 {
    match desc.as_bytes().first() {
        Some(b'J' | b'D') => 2,
        Some(b'V') => 0,
        _ => 1,
    }
}

fn shorty_char(desc: &str) -> char {
    match desc.as_bytes()[0] {
        b'L' | b'[' => 'L',
        c => c as char,
    }
}

/// Length of the field type descriptor at the start of `s`.
fn field_type_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let dims = bytes.iter().take_while(|&&b| b == b'[').count();
    if dims > 255 {
        return None;
    }
    match bytes.get(dims)? {
        b'Z' | b'B' | b'S' | b'C' | b'I' | b'J' | b'F' | b'D' => Some(dims + 1),
        b'L' => {
            let end = s[dims..].find(';')?;
            // at least one name character between `L` and `;`
            (end > 1).then_some(dims + end + 1)
        }
        _ => None,
    }
}
