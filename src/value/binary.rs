use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Immutable byte sequence. Its text form is strict standard base64.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Binary(Arc<[u8]>);

impl Binary {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Binary(Arc::from(bytes.into()))
    }

    pub fn from_base64(text: &str) -> crate::Result<Self> {
        Ok(Binary::new(STANDARD.decode(text)?))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// A copy of the bytes. The internal buffer is never handed out mutably.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Binary::new(bytes)
    }
}

impl From<&[u8]> for Binary {
    fn from(bytes: &[u8]) -> Self {
        Binary(Arc::from(bytes))
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binary({})", self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_are_detached() {
        let b = Binary::new(vec![1u8, 2, 3]);
        let mut copy = b.to_bytes();
        copy[0] = 9;
        assert_eq!(b.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn base64_text() {
        let b = Binary::new(vec![1u8, 2, 3]);
        assert_eq!(b.to_string(), "AQID");
        assert_eq!(Binary::from_base64("AQID").unwrap(), b);
        assert!(Binary::from_base64("not base64!").is_err());
    }

    #[test]
    fn equality_by_content() {
        assert_eq!(Binary::from(&[1u8, 2][..]), Binary::new(vec![1u8, 2]));
        assert_ne!(Binary::new(vec![1u8]), Binary::new(vec![2u8]));
    }
}
