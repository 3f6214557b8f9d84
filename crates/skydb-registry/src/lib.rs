//! Registry client for SkyDB: fetching and posting signed registry entries
//! through a portal, verifying registry proof chains, and the optimistic
//! read-modify-write loop on top.
//!
//! The HTTP transport is abstracted behind the [`Portal`] trait so the client
//! logic, signature checks, and retry behavior are testable without a network.

pub mod client;
pub mod db;
pub mod portal;
pub mod proof;

pub use client::{GetEntryOptions, RegistryClient, SetEntryOptions};
pub use db::SkyDb;
pub use portal::{BlobUpload, Portal, PutEntryRequest, RawSignedEntry};
pub use proof::{
    validate_registry_proof, validate_registry_proof_response, ProofTarget, ResolvedProof,
};
