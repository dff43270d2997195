//! Minimal models of the mirror-policy custom resources.
//!
//! Only the spec fields consumed for registries.conf generation are
//! defined here; the upstream CRDs carry much more that is irrelevant
//! to this crate. Field names match the Kubernetes API (camelCase), and
//! unknown fields are ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Whether the source registry itself may still be contacted when every
/// mirror fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirrorSourcePolicy {
    /// Mirrors are preferred; the source stays the final fallback.
    #[default]
    AllowContactingSource,
    /// Never pull from the source; it is emitted as blocked.
    NeverContactSource,
}

/// Legacy policy listing digest-only mirror preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageContentSourcePolicy {
    pub spec: ImageContentSourcePolicySpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageContentSourcePolicySpec {
    pub repository_digest_mirrors: Vec<RepositoryDigestMirrors>,
}

/// One source entry in an [`ImageContentSourcePolicy`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryDigestMirrors {
    pub source: String,
    pub mirrors: Vec<String>,
    /// Lifts the digest-only restriction from this source's mirrors.
    pub allow_mirror_by_tags: bool,
}

/// Successor of [`ImageContentSourcePolicy`]; mirrors serve pulls that
/// reference an image digest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageDigestMirrorSet {
    pub spec: ImageDigestMirrorSetSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageDigestMirrorSetSpec {
    pub image_digest_mirrors: Vec<ImageDigestMirrors>,
}

/// One source entry in an [`ImageDigestMirrorSet`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageDigestMirrors {
    pub source: String,
    pub mirrors: Vec<String>,
    pub mirror_source_policy: MirrorSourcePolicy,
}

/// Sibling of [`ImageDigestMirrorSet`]; mirrors serve pulls that
/// reference an image tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageTagMirrorSet {
    pub spec: ImageTagMirrorSetSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageTagMirrorSetSpec {
    pub image_tag_mirrors: Vec<ImageTagMirrors>,
}

/// One source entry in an [`ImageTagMirrorSet`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageTagMirrors {
    pub source: String,
    pub mirrors: Vec<String>,
    pub mirror_source_policy: MirrorSourcePolicy,
}
