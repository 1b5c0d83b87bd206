//! # URL Identity Newtypes
//!
//! Newtype wrappers for the two URL roles in the system: the attesting
//! [`SourceIdentity`] and the [`ForwardLink`] candidates it points to.
//! You cannot pass a forward link where a source identity is expected.
//!
//! ## Invariants
//!
//! - A `SourceIdentity` is always an absolute http(s) origin: scheme, host,
//!   and an explicit port only when it is not the scheme default. Path,
//!   query, and fragment are dropped.
//! - A `ForwardLink` is always an absolute http(s) URL with no fragment.
//!   Its string form is what gets hashed into certificates, so two inputs
//!   differing only in fragment produce the same digest.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::CoreError;

/// The canonical origin of the domain issuing an attestation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    canonical: String,
    url: Url,
}

impl SourceIdentity {
    /// Parse a source identity from a bare domain or a URL.
    ///
    /// Bare domains (`example.org`) are given an `https://` scheme. Only
    /// `http` and `https` are accepted.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::invalid_url(input, "empty"));
        }
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let parsed = parse_http_url(input, &with_scheme)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| CoreError::invalid_url(input, "missing host"))?
            .to_ascii_lowercase();

        let canonical = match parsed.port() {
            Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
            None => format!("{}://{host}", parsed.scheme()),
        };
        let url = Url::parse(&canonical).map_err(|e| CoreError::invalid_url(input, e.to_string()))?;
        Ok(Self { canonical, url })
    }

    /// The canonical string form, e.g. `https://example.org`.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// The origin as a parsed URL (path `/`).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The host component.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Resolve a path against this origin, e.g. `/flm.txt`.
    pub fn join(&self, path: &str) -> Result<Url, CoreError> {
        self.url
            .join(path)
            .map_err(|e| CoreError::invalid_url(path, e.to_string()))
    }
}

impl std::fmt::Debug for SourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceIdentity({})", self.canonical)
    }
}

impl std::fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl std::str::FromStr for SourceIdentity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SourceIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical)
    }
}

impl<'de> Deserialize<'de> for SourceIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// How a forward-link candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Declared by the domain owner in a forward-link manifest.
    Declared,
    /// Returned by an external search or discovery service.
    #[serde(rename = "search")]
    SearchDiscovered,
    /// Found by crawling outward from the source domain.
    Crawled,
}

impl Provenance {
    /// The wire name of this provenance.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declared => "declared",
            Self::SearchDiscovered => "search",
            Self::Crawled => "crawled",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external page a source domain claims to forward to.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ForwardLinkRepr")]
pub struct ForwardLink {
    url: Url,
    provenance: Provenance,
}

#[derive(Deserialize)]
struct ForwardLinkRepr {
    url: String,
    provenance: Provenance,
}

impl TryFrom<ForwardLinkRepr> for ForwardLink {
    type Error = CoreError;

    fn try_from(repr: ForwardLinkRepr) -> Result<Self, Self::Error> {
        Self::new(&repr.url, repr.provenance)
    }
}

impl ForwardLink {
    /// Parse and normalize a forward-link candidate.
    pub fn new(input: &str, provenance: Provenance) -> Result<Self, CoreError> {
        let mut url = parse_http_url(input, input.trim())?;
        if url.host_str().is_none() {
            return Err(CoreError::invalid_url(input, "missing host"));
        }
        url.set_fragment(None);
        Ok(Self { url, provenance })
    }

    /// The normalized URL string. This is the value hashed into certificates.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The normalized URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// How this candidate was discovered.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// True when the link lives on the same site as `source`.
    pub fn is_same_site_as(&self, source: &SourceIdentity) -> bool {
        same_site(&self.url, source.url())
    }
}

impl std::fmt::Display for ForwardLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The host of `url` with any leading `www.` removed, lower-cased.
pub fn base_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    })
}

/// True when two URLs share a base domain or one is a subdomain of the other.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (base_domain(a), base_domain(b)) {
        (Some(d1), Some(d2)) => {
            d1 == d2 || d1.ends_with(&format!(".{d2}")) || d2.ends_with(&format!(".{d1}"))
        }
        _ => false,
    }
}

fn parse_http_url(original: &str, candidate: &str) -> Result<Url, CoreError> {
    let url = Url::parse(candidate).map_err(|e| CoreError::invalid_url(original, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CoreError::invalid_url(
            original,
            format!("unsupported scheme {other:?}"),
        )),
    }
}
