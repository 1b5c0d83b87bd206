//! # fwdlink-core: Foundational Types for Forward-Link Attestation
//!
//! This crate defines the type-system primitives shared by every other
//! crate in the workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Validated URL newtypes.** [`SourceIdentity`] and [`ForwardLink`] can
//!    only be built through normalizing constructors. No bare strings cross
//!    crate boundaries as identities.
//!
//! 2. **`CanonicalBytes` newtype.** Every signed JSON document flows through
//!    `CanonicalBytes::new()`, so a signature can be re-verified by anyone
//!    who re-serializes the same value.
//!
//! 3. **Order-preserving verified sets.** [`VerifiedLinkSet`] keeps the order
//!    in which verification completed and collapses duplicates. Certificate
//!    extension indices are positions in this set.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is seconds-precision UTC, which
//!    is what certificate validity and attestation windows are expressed in.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fwdlink-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod links;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::ContentDigest;
pub use error::{CanonicalizationError, CoreError};
pub use identity::{base_domain, same_site, ForwardLink, Provenance, SourceIdentity};
pub use links::VerifiedLinkSet;
pub use temporal::Timestamp;
