//! Block token generation
//!
//! Tokens are random lowercase alphanumeric labels. They are not derived from
//! block contents and carry no cryptographic guarantee.

use crate::types::BlockToken;
use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generator for fixed-width block tokens
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    length: usize,
}

impl TokenGenerator {
    /// Create a generator producing tokens of `length` characters
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    /// Token width
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate a fresh token
    pub fn generate(&self) -> BlockToken {
        let mut rng = rand::thread_rng();
        let token: String = (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        BlockToken::new(token)
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let generator = TokenGenerator::new(10);
        let token = generator.generate();
        assert_eq!(token.as_str().len(), 10);
        assert!(token
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn test_tokens_differ() {
        let generator = TokenGenerator::new(16);
        assert_ne!(generator.generate(), generator.generate());
    }

    #[test]
    fn test_zero_length_clamped() {
        assert_eq!(TokenGenerator::new(0).length(), 1);
    }
}
