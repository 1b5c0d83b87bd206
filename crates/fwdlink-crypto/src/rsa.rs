//! # RSA Signing and Verification
//!
//! RSA key generation, PEM import/export, and PKCS#1 v1.5 / SHA-256
//! signatures for attestation payloads and certificate self-checks.
//!
//! ## Security Invariants
//!
//! - Every call to [`RsaKeyPair::generate()`] draws a fresh key from the OS
//!   CSPRNG. There is no key cache.
//! - Moduli below [`MIN_KEY_BITS`] are rejected before generation.
//! - `RsaKeyPair` does not implement `Serialize`, and its `Debug` output is
//!   redacted. The only export path is [`RsaKeyPair::to_pkcs8_pem()`], which
//!   returns `Zeroizing<String>` so the PEM is wiped when dropped.
//! - Payload signing input is `&CanonicalBytes`. Raw-byte verification
//!   exists only for DER structures that are already canonical by
//!   construction (a certificate's TBS bytes).
//!
//! ## Serde
//!
//! - Public keys serialize as SPKI PEM strings.
//! - Signatures serialize as standard base64 strings.

use ::rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use ::rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use ::rsa::signature::{SignatureEncoding, Signer, Verifier};
use ::rsa::traits::PublicKeyParts;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fwdlink_core::{CanonicalBytes, ContentDigest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Smallest accepted RSA modulus, in bits.
pub const MIN_KEY_BITS: usize = 2048;

/// Public exponent used for every generated key.
pub const PUBLIC_EXPONENT: u64 = 65537;

/// An RSA private key, owned exclusively by one issuance.
///
/// The inner key zeroizes its limbs on drop.
pub struct RsaKeyPair {
    private: ::rsa::RsaPrivateKey,
}

/// An RSA public key.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPublicKey(::rsa::RsaPublicKey);

/// A detached PKCS#1 v1.5 signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RsaSignature(Vec<u8>);

// ---------------------------------------------------------------------------
// RsaKeyPair impls
// ---------------------------------------------------------------------------

impl RsaKeyPair {
    /// Generate a fresh key with the given modulus size and exponent 65537.
    ///
    /// # Errors
    ///
    /// `CryptoError::KeyTooSmall` below [`MIN_KEY_BITS`];
    /// `CryptoError::KeyGeneration` if the RNG or prime search fails.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::KeyTooSmall {
                bits,
                min: MIN_KEY_BITS,
            });
        }
        let mut rng = rand::rngs::OsRng;
        let exponent = ::rsa::BigUint::from(PUBLIC_EXPONENT);
        let private = ::rsa::RsaPrivateKey::new_with_exp(&mut rng, bits, &exponent)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self { private })
    }

    /// Load a key from unencrypted PKCS#8 PEM.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        let private = ::rsa::RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        if private.size() * 8 < MIN_KEY_BITS {
            return Err(CryptoError::KeyTooSmall {
                bits: private.size() * 8,
                min: MIN_KEY_BITS,
            });
        }
        Ok(Self { private })
    }

    /// Export as unencrypted PKCS#8 PEM.
    ///
    /// The caller owns the returned secret; it is zeroized on drop.
    pub fn to_pkcs8_pem(&self) -> Result<Zeroizing<String>, CryptoError> {
        self.private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// The public half of this key.
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey(self.private.to_public_key())
    }

    /// Modulus size in bits.
    pub fn modulus_bits(&self) -> usize {
        self.private.size() * 8
    }

    /// Sign canonical bytes with PKCS#1 v1.5 padding over SHA-256.
    pub fn sign(&self, data: &CanonicalBytes) -> Result<RsaSignature, CryptoError> {
        let signing_key = SigningKey::<Sha256>::new(self.private.clone());
        let sig = signing_key
            .try_sign(data.as_bytes())
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(RsaSignature(sig.to_vec()))
    }
}

impl std::fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsaKeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// RsaPublicKey impls
// ---------------------------------------------------------------------------

impl RsaPublicKey {
    /// Decode from SPKI PEM (`-----BEGIN PUBLIC KEY-----`).
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        ::rsa::RsaPublicKey::from_public_key_pem(pem)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Decode from SPKI DER, as found in a certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        ::rsa::RsaPublicKey::from_public_key_der(der)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Encode as SPKI PEM.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// Encode as SPKI DER.
    pub fn to_der(&self) -> Result<Vec<u8>, CryptoError> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// SHA-256 over the SPKI DER encoding.
    pub fn fingerprint(&self) -> Result<ContentDigest, CryptoError> {
        use sha2::Digest;
        let der = self.to_der()?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(&der));
        Ok(ContentDigest::from_bytes(out))
    }

    /// Modulus size in bits.
    pub fn modulus_bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Verify a signature over canonical bytes.
    ///
    /// Returns `CryptoError::SignatureInvalid` on any mismatch.
    pub fn verify(&self, data: &CanonicalBytes, signature: &RsaSignature) -> Result<(), CryptoError> {
        self.verify_der(data.as_bytes(), signature.as_bytes())
    }

    /// Verify a signature over DER bytes, such as a certificate's TBS
    /// structure.
    pub fn verify_der(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let sig = Signature::try_from(signature)
            .map_err(|e| CryptoError::SignatureInvalid(format!("malformed signature: {e}")))?;
        VerifyingKey::<Sha256>::new(self.0.clone())
            .verify(message, &sig)
            .map_err(|e| CryptoError::SignatureInvalid(e.to_string()))
    }
}

impl std::fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fingerprint() {
            Ok(fp) => write!(f, "RsaPublicKey({}...)", &fp.to_hex()[..8]),
            Err(_) => write!(f, "RsaPublicKey(<unencodable>)"),
        }
    }
}

impl Serialize for RsaPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pem = self.to_pem().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&pem)
    }
}

impl<'de> Deserialize<'de> for RsaPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pem = String::deserialize(deserializer)?;
        Self::from_pem(&pem).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// RsaSignature impls
// ---------------------------------------------------------------------------

impl RsaSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Standard base64 encoding.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Decode from standard base64.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        BASE64
            .decode(s.trim())
            .map(Self)
            .map_err(|e| CryptoError::SignatureEncoding(e.to_string()))
    }
}

impl std::fmt::Debug for RsaSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = hex::encode(&self.0[..self.0.len().min(4)]);
        write!(f, "RsaSignature({prefix}..., {} bytes)", self.0.len())
    }
}

impl Serialize for RsaSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for RsaSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}
