//! # Certificate Issuer
//!
//! Turns a source and its verified link set into a self-signed X.509
//! certificate carrying the link-digest extension, plus a signed
//! attestation payload for the source URL.
//!
//! ## Security Invariants
//!
//! - Every issuance generates a fresh RSA key. Keys are never cached or
//!   shared between issuances.
//! - The certificate holds only the public key. The private key leaves the
//!   issuer at most once, through [`IssuedCertificate::take_private_key()`],
//!   as a `Zeroizing<String>`; with [`KeyDisclosure::Discard`] it is
//!   dropped as soon as signing is done.
//! - Nothing is written to disk here. Callers choose where output goes.
//! - Issuance is atomic: either every artifact is returned, or an error
//!   and nothing.
//! - Every certificate is re-verified by [`CertificateVerifier`] before it
//!   is returned. A certificate whose self-signature, validity window, or
//!   extension does not read back exactly is a [`CertError::SelfCheck`].

use chrono::Duration;
use fwdlink_core::{SourceIdentity, Timestamp, VerifiedLinkSet};
use fwdlink_crypto::{RsaKeyPair, RsaPublicKey, MIN_KEY_BITS};
use rand::RngCore;
use rcgen::{
    CertificateParams, CustomExtension, DistinguishedName, DnType, KeyPair, SerialNumber,
    PKCS_RSA_SHA256,
};
use zeroize::Zeroizing;

use crate::error::CertError;
use crate::extension::{LinkDigestMap, LINK_DIGEST_OID_ARCS};
use crate::payload::{AttestationPayload, SignedAttestation};
use crate::verifier::CertificateVerifier;

/// Default RSA modulus size.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Default certificate lifetime, in days.
pub const CERTIFICATE_VALIDITY_DAYS: i64 = 30;

/// Default attestation payload lifetime, in seconds.
pub const ATTESTATION_TTL_SECS: i64 = 3600;

/// What happens to the private key after signing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyDisclosure {
    /// Hand the PEM to the immediate caller, once.
    #[default]
    ReturnOnce,
    /// Drop the key as soon as the certificate and payload are signed.
    Discard,
}

/// Issuer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    pub key_bits: usize,
    pub certificate_validity: Duration,
    pub attestation_ttl: Duration,
    pub common_name: String,
    pub organization: String,
    pub key_disclosure: KeyDisclosure,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            certificate_validity: Duration::days(CERTIFICATE_VALIDITY_DAYS),
            attestation_ttl: Duration::seconds(ATTESTATION_TTL_SECS),
            common_name: "forward-link-attestation".to_string(),
            organization: "Forward Link Attestation".to_string(),
            key_disclosure: KeyDisclosure::ReturnOnce,
        }
    }
}

impl IssuerConfig {
    pub fn validate(&self) -> Result<(), CertError> {
        if self.key_bits < MIN_KEY_BITS {
            return Err(CertError::Config(format!(
                "key_bits {} is below the {MIN_KEY_BITS}-bit minimum",
                self.key_bits
            )));
        }
        if self.certificate_validity <= Duration::zero() {
            return Err(CertError::Config(
                "certificate validity must be positive".into(),
            ));
        }
        if self.attestation_ttl <= Duration::zero() {
            return Err(CertError::Config("attestation ttl must be positive".into()));
        }
        if self.common_name.trim().is_empty() {
            return Err(CertError::Config("common name must not be empty".into()));
        }
        Ok(())
    }
}

/// Everything one issuance produced.
pub struct IssuedCertificate {
    source: SourceIdentity,
    certificate_pem: String,
    public_key: RsaPublicKey,
    serial: String,
    not_before: Timestamp,
    not_after: Timestamp,
    link_digests: LinkDigestMap,
    attestation: SignedAttestation,
    private_key_pem: Option<Zeroizing<String>>,
}

impl IssuedCertificate {
    pub fn source(&self) -> &SourceIdentity {
        &self.source
    }

    /// PEM-encoded certificate.
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Serial number, lowercase hex.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn not_before(&self) -> Timestamp {
        self.not_before
    }

    pub fn not_after(&self) -> Timestamp {
        self.not_after
    }

    /// The digests embedded in the certificate extension.
    pub fn link_digests(&self) -> &LinkDigestMap {
        &self.link_digests
    }

    pub fn attestation(&self) -> &SignedAttestation {
        &self.attestation
    }

    /// Unencrypted PKCS#8 PEM of the private key.
    ///
    /// Returns `Some` at most once, and never with
    /// [`KeyDisclosure::Discard`].
    pub fn take_private_key(&mut self) -> Option<Zeroizing<String>> {
        self.private_key_pem.take()
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key_pem.is_some()
    }
}

impl std::fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCertificate")
            .field("source", &self.source)
            .field("serial", &self.serial)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .field("links", &self.link_digests.len())
            .field(
                "private_key",
                &self.private_key_pem.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Issues forward-link certificates.
#[derive(Debug, Clone)]
pub struct CertificateIssuer {
    config: IssuerConfig,
    verifier: CertificateVerifier,
}

impl CertificateIssuer {
    pub fn new(config: IssuerConfig) -> Result<Self, CertError> {
        config.validate()?;
        Ok(Self {
            config,
            verifier: CertificateVerifier::new(),
        })
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Issue at the current time.
    pub fn issue(
        &self,
        source: &SourceIdentity,
        links: &VerifiedLinkSet,
    ) -> Result<IssuedCertificate, CertError> {
        self.issue_at(source, links, Timestamp::now())
    }

    /// Issue with `now` as the start of both validity windows.
    ///
    /// An empty link set is valid and yields an empty digest map.
    pub fn issue_at(
        &self,
        source: &SourceIdentity,
        links: &VerifiedLinkSet,
        now: Timestamp,
    ) -> Result<IssuedCertificate, CertError> {
        let key = RsaKeyPair::generate(self.config.key_bits)?;
        let public_key = key.public_key();
        let private_pem = key.to_pkcs8_pem()?;
        let signer = KeyPair::from_pem_and_sign_algo(&private_pem, &PKCS_RSA_SHA256)
            .map_err(|e| CertError::Generation(format!("loading signing key: {e}")))?;

        let link_digests = LinkDigestMap::from_links(links.iter());
        let not_before = now;
        let not_after = now.plus(self.config.certificate_validity);
        let serial_bytes = random_serial();

        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, self.config.common_name.as_str());
        dn.push(DnType::OrganizationName, self.config.organization.as_str());
        params.distinguished_name = dn;
        params.serial_number = Some(SerialNumber::from(serial_bytes.to_vec()));
        params.not_before = to_offset_date_time(not_before)?;
        params.not_after = to_offset_date_time(not_after)?;
        let extension_value = link_digests
            .encode()
            .map_err(|e| CertError::Generation(e.to_string()))?;
        let mut extension = CustomExtension::from_oid_content(&LINK_DIGEST_OID_ARCS, extension_value);
        extension.set_criticality(false);
        params.custom_extensions = vec![extension];

        let certificate = params
            .self_signed(&signer)
            .map_err(|e| CertError::Generation(e.to_string()))?;
        let certificate_pem = certificate.pem();
        drop(signer);

        let payload = AttestationPayload::new(source, now, self.config.attestation_ttl);
        let attestation = SignedAttestation::sign(payload, &key)?;

        let private_key_pem = match self.config.key_disclosure {
            KeyDisclosure::ReturnOnce => Some(private_pem),
            KeyDisclosure::Discard => None,
        };
        drop(key);

        let issued = IssuedCertificate {
            source: source.clone(),
            certificate_pem,
            public_key,
            serial: hex::encode(serial_bytes),
            not_before,
            not_after,
            link_digests,
            attestation,
            private_key_pem,
        };
        self.self_check(&issued, now)?;

        tracing::info!(
            source = %source,
            serial = %issued.serial,
            links = issued.link_digests.len(),
            not_before = %not_before,
            not_after = %not_after,
            "issued forward-link certificate"
        );
        Ok(issued)
    }

    fn self_check(&self, issued: &IssuedCertificate, now: Timestamp) -> Result<(), CertError> {
        let status = self.verifier.verify_at(&issued.certificate_pem, now);
        if let Some(kind) = status.error {
            return Err(CertError::SelfCheck(format!(
                "{kind:?}: {}",
                status.detail.unwrap_or_default()
            )));
        }
        if status.link_digests.as_ref() != Some(&issued.link_digests) {
            return Err(CertError::SelfCheck(
                "extension does not match the verified link set".into(),
            ));
        }
        if status.serial.as_deref() != Some(issued.serial.as_str()) {
            return Err(CertError::SelfCheck("serial number mismatch".into()));
        }
        if status.not_before != Some(issued.not_before) || status.not_after != Some(issued.not_after)
        {
            return Err(CertError::SelfCheck("validity window mismatch".into()));
        }
        let embedded = status
            .public_key_pem
            .as_deref()
            .map(RsaPublicKey::from_pem)
            .transpose()?;
        if embedded.as_ref() != Some(&issued.public_key) {
            return Err(CertError::SelfCheck("embedded public key mismatch".into()));
        }
        issued
            .attestation
            .verify_at(&issued.public_key, now)
            .map_err(|e| CertError::SelfCheck(e.to_string()))?;
        Ok(())
    }
}

/// 16 random bytes, positive and without a leading zero byte so the DER
/// integer encoding is exactly these bytes.
fn random_serial() -> [u8; 16] {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes[0] = (bytes[0] & 0x7f).max(1);
    bytes
}

fn to_offset_date_time(ts: Timestamp) -> Result<time::OffsetDateTime, CertError> {
    time::OffsetDateTime::from_unix_timestamp(ts.epoch_secs())
        .map_err(|e| CertError::Generation(format!("validity time {ts}: {e}")))
}
