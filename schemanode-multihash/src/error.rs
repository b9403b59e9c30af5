use core::fmt;

/// Errors raised by the hash constructor [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryError {
    /// A constructor is already registered under this code.
    CodeTaken {
        /// The contested code.
        code: u64,
    },
    /// Nothing is registered under this code.
    NoSuchCode {
        /// The code that was looked up.
        code: u64,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::CodeTaken { code } => {
                write!(f, "hash code {code:#x} is already registered")
            }
            RegistryError::NoSuchCode { code } => {
                write!(f, "no hash function registered for code {code:#x}")
            }
        }
    }
}

impl core::error::Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        insta::assert_snapshot!(
            RegistryError::CodeTaken { code: 0x12 }.to_string(),
            @"hash code 0x12 is already registered"
        );
        insta::assert_snapshot!(
            RegistryError::NoSuchCode { code: 0x1015 }.to_string(),
            @"no hash function registered for code 0x1015"
        );
    }
}
