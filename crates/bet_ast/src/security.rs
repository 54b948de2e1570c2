//! Security classification of operands.
//!
//! Every value flowing through a secure computation is represented either in
//! the clear or inside a secure container. The classification decides which
//! operator implementation the runtime dispatches to and how expensive that
//! call is.

use std::fmt;

/// Four-way security lattice of an operand's runtime representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityKind {
    /// Plain host value (ints, floats, plain tensors).
    #[default]
    Plaintext,
    /// Homomorphically encoded plaintext (CKKS plaintext tensor).
    EncryptedPlaintext,
    /// Homomorphically encrypted ciphertext (CKKS ciphertext tensor).
    EncryptedCiphertext,
    /// Additively secret-shared value.
    SecretShared,
}

impl SecurityKind {
    pub const ALL: [SecurityKind; 4] = [
        SecurityKind::Plaintext,
        SecurityKind::EncryptedPlaintext,
        SecurityKind::EncryptedCiphertext,
        SecurityKind::SecretShared,
    ];

    /// Any representation that is not plain.
    #[inline]
    pub fn is_secure_container(self) -> bool {
        !matches!(self, SecurityKind::Plaintext)
    }

    #[inline]
    pub fn is_ciphertext(self) -> bool {
        matches!(self, SecurityKind::EncryptedCiphertext)
    }

    #[inline]
    pub fn is_encrypted_plaintext(self) -> bool {
        matches!(self, SecurityKind::EncryptedPlaintext)
    }

    /// Classification of a binary operation's result.
    ///
    /// Ciphertext wins over encrypted plaintext; otherwise the left operand
    /// decides.
    pub fn realize(lhs: SecurityKind, rhs: SecurityKind) -> SecurityKind {
        if lhs.is_ciphertext() {
            lhs
        } else if rhs.is_ciphertext() {
            rhs
        } else if lhs.is_encrypted_plaintext() {
            lhs
        } else if rhs.is_encrypted_plaintext() {
            rhs
        } else {
            lhs
        }
    }

    /// Short keyword used by textual front ends.
    pub const fn keyword(self) -> &'static str {
        match self {
            SecurityKind::Plaintext => "plain",
            SecurityKind::EncryptedPlaintext => "enc_plain",
            SecurityKind::EncryptedCiphertext => "enc_cipher",
            SecurityKind::SecretShared => "shared",
        }
    }

    pub fn from_keyword(word: &str) -> Option<SecurityKind> {
        Self::ALL.into_iter().find(|k| k.keyword() == word)
    }

    /// Runtime type name reported in diagnostics.
    pub const fn type_name(self) -> &'static str {
        match self {
            SecurityKind::Plaintext => "Plaintext",
            SecurityKind::EncryptedPlaintext => "Ciphertensor[CKKSPlaintext]",
            SecurityKind::EncryptedCiphertext => "Ciphertensor[CKKSCiphertext]",
            SecurityKind::SecretShared => "Sharetensor",
        }
    }
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
