// The internals docs are built with --document-private-items, so allow
// linking to private items from module documentation.
#![allow(rustdoc::private_intra_doc_links)]

//! # Mirror policies to `registries.conf`
//!
//! This crate computes the container runtime "v2" registries
//! configuration, the schema consumed by cri-o, podman and buildah,
//! from the cluster image mirror policies (`ImageContentSourcePolicy`,
//! `ImageDigestMirrorSet`, `ImageTagMirrorSet`) together with lists of
//! insecure and blocked registry scopes.
//!
//! The two interesting problems live in [`topograph`] and
//! [`editconfig`]: merging many partially overlapping mirror preference
//! orders into one stable order per source, and projecting the merged
//! sets plus the scope lists into the flat `[[registry]]` record list,
//! including scope nesting, wildcard prefixes and the carving of
//! sub-scope records out of broader mirror rules.
//!
//! Generation is a pure, deterministic function of its inputs: no I/O,
//! no global state, identical inputs yield identical output. Reading and
//! writing the configuration file is the caller's business.

mod editconfig;
pub mod k8sapitypes;
mod mirrorset;
mod scope;
pub mod sysregistriesv2;
mod topograph;

pub use editconfig::edit_registries_config;
pub use scope::is_valid_registries_conf_scope;
