//! Projection of mirror policies into a registries configuration.
//!
//! [`edit_registries_config`] is the entry point: it merges the mirror
//! policies per origin kind, renders one `[[registry]]` record per
//! merged source, and then applies the `insecure`/`blocked` scope
//! lists. A scope an existing record already covers needs nothing, a
//! scope nested below a mirror rule is carved out as a sub-scope
//! record, and the rest become standalone flag records at the end.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use fn_error_context::context;

use crate::k8sapitypes::{
    ImageContentSourcePolicy, ImageDigestMirrorSet, ImageTagMirrorSet, MirrorSourcePolicy,
};
use crate::mirrorset::{merged_mirror_sets, MergedMirrorSet, MirrorRule};
use crate::scope::{is_valid_registries_conf_scope, scope_is_nested_inside_scope};
use crate::sysregistriesv2::{Endpoint, PullFromMirror, Registry, V2RegistriesConf};

/// Populate `config.registries` from the given mirror policies and
/// scope lists. On error the configuration is left unchanged.
///
/// Sources merge within one policy kind; a source carried by both
/// digest and tag policies becomes a single record whose mirrors are
/// tagged per pull type. Legacy `ImageContentSourcePolicy` rules merge
/// separately from `ImageDigestMirrorSet` rules and produce their own
/// records.
#[context("Editing registries configuration")]
pub fn edit_registries_config(
    config: &mut V2RegistriesConf,
    insecure_scopes: &[String],
    blocked_scopes: &[String],
    icsp_rules: &[ImageContentSourcePolicy],
    idms_rules: &[ImageDigestMirrorSet],
    itms_rules: &[ImageTagMirrorSet],
) -> Result<()> {
    for scope in insecure_scopes.iter().chain(blocked_scopes) {
        if !is_valid_registries_conf_scope(scope) {
            bail!("invalid entry {scope:?} in the insecure or blocked registry scopes");
        }
    }

    let icsp_merged = merged_mirror_sets(&icsp_mirror_rules(icsp_rules));
    let idms_merged = merged_mirror_sets(&idms_mirror_rules(idms_rules));
    let itms_merged = merged_mirror_sets(&itms_mirror_rules(itms_rules));
    tracing::debug!(
        "merged mirror sources: {} icsp, {} idms, {} itms",
        icsp_merged.len(),
        idms_merged.len(),
        itms_merged.len()
    );

    // Sources whose legacy entries lift the digest-only restriction
    // from their mirrors.
    let tags_allowed: BTreeSet<&str> = icsp_rules
        .iter()
        .flat_map(|policy| &policy.spec.repository_digest_mirrors)
        .filter(|mirrors| mirrors.allow_mirror_by_tags)
        .map(|mirrors| mirrors.source.as_str())
        .collect();

    let scopes = ScopeLists {
        insecure: insecure_scopes,
        blocked: blocked_scopes,
    };
    let mut registries = Vec::new();
    for set in &icsp_merged {
        let pull = if tags_allowed.contains(set.source.as_str()) {
            None
        } else {
            Some(PullFromMirror::DigestOnly)
        };
        registries.push(scopes.registry_for(set, pull));
    }
    for set in &idms_merged {
        // A source in both the digest and the tag policies becomes one
        // record, emitted by the tag loop below.
        if itms_merged.iter().any(|tag| tag.source == set.source) {
            continue;
        }
        registries.push(scopes.registry_for(set, Some(PullFromMirror::DigestOnly)));
    }
    for set in &itms_merged {
        let mut registry = scopes.registry_for(set, Some(PullFromMirror::TagOnly));
        if let Some(digest) = idms_merged.iter().find(|d| d.source == set.source) {
            let tag_mirrors = std::mem::take(&mut registry.mirrors);
            let mut mirrors =
                scopes.mirror_endpoints(&digest.mirrors, Some(PullFromMirror::DigestOnly));
            mirrors.extend(tag_mirrors);
            registry.mirrors = mirrors;
            registry.blocked |= digest.policy == MirrorSourcePolicy::NeverContactSource;
        }
        registries.push(registry);
    }

    scopes.apply(&mut registries)?;

    config.registries = registries;
    Ok(())
}

fn icsp_mirror_rules(policies: &[ImageContentSourcePolicy]) -> Vec<MirrorRule<'_>> {
    policies
        .iter()
        .flat_map(|policy| &policy.spec.repository_digest_mirrors)
        .map(|entry| MirrorRule {
            source: &entry.source,
            mirrors: &entry.mirrors,
            policy: MirrorSourcePolicy::default(),
        })
        .collect()
}

fn idms_mirror_rules(policies: &[ImageDigestMirrorSet]) -> Vec<MirrorRule<'_>> {
    policies
        .iter()
        .flat_map(|policy| &policy.spec.image_digest_mirrors)
        .map(|entry| MirrorRule {
            source: &entry.source,
            mirrors: &entry.mirrors,
            policy: entry.mirror_source_policy,
        })
        .collect()
}

fn itms_mirror_rules(policies: &[ImageTagMirrorSet]) -> Vec<MirrorRule<'_>> {
    policies
        .iter()
        .flat_map(|policy| &policy.spec.image_tag_mirrors)
        .map(|entry| MirrorRule {
            source: &entry.source,
            mirrors: &entry.mirrors,
            policy: entry.mirror_source_policy,
        })
        .collect()
}

/// The `insecure`/`blocked` scope lists, with the nested-scope lookup
/// applied to every record and mirror endpoint.
struct ScopeLists<'a> {
    insecure: &'a [String],
    blocked: &'a [String],
}

impl ScopeLists<'_> {
    fn is_insecure(&self, scope: &str) -> bool {
        self.insecure
            .iter()
            .any(|sup| scope_is_nested_inside_scope(scope, sup))
    }

    fn is_blocked(&self, scope: &str) -> bool {
        self.blocked
            .iter()
            .any(|sup| scope_is_nested_inside_scope(scope, sup))
    }

    fn mirror_endpoints(&self, mirrors: &[String], pull: Option<PullFromMirror>) -> Vec<Endpoint> {
        mirrors
            .iter()
            .map(|mirror| Endpoint {
                location: mirror.clone(),
                insecure: self.is_insecure(mirror),
                pull_from_mirror: pull,
            })
            .collect()
    }

    /// The `[[registry]]` record for one merged mirror set.
    fn registry_for(&self, set: &MergedMirrorSet, pull: Option<PullFromMirror>) -> Registry {
        Registry {
            location: set.source.clone(),
            insecure: self.is_insecure(&set.source),
            blocked: self.is_blocked(&set.source)
                || set.policy == MirrorSourcePolicy::NeverContactSource,
            mirrors: self.mirror_endpoints(&set.mirrors, pull),
            ..Default::default()
        }
    }

    /// Apply both scope lists to the record list: the blocked list
    /// first, concrete scopes before wildcards, each in input order.
    fn apply(&self, registries: &mut Vec<Registry>) -> Result<()> {
        for list in [self.blocked, self.insecure] {
            for wildcards in [false, true] {
                for scope in list.iter().filter(|s| s.starts_with("*.") == wildcards) {
                    self.apply_scope(registries, scope)?;
                }
            }
        }
        Ok(())
    }

    fn apply_scope(&self, registries: &mut Vec<Registry>, scope: &str) -> Result<()> {
        if scope.starts_with("*.") {
            // Wildcards cannot carry mirrors and cannot be carved any
            // deeper; they only ever become standalone prefix records.
            if !registries.iter().any(|r| r.prefix == scope) {
                registries.push(Registry {
                    prefix: scope.to_owned(),
                    insecure: self.is_insecure(scope),
                    blocked: self.is_blocked(scope),
                    ..Default::default()
                });
            }
            return Ok(());
        }
        if registries.iter().any(|r| r.location == scope) {
            // Already covered; its flags were computed on creation.
            return Ok(());
        }
        // Prefer the most specific enclosing record when several match.
        let parent = registries
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                !r.location.is_empty() && scope_is_nested_inside_scope(scope, &r.location)
            })
            .max_by_key(|(_, r)| r.location.len())
            .map(|(idx, _)| idx);
        if let Some(idx) = parent {
            // A narrower scope carved out of a broader mirror rule
            // keeps the rule's mirrors, redirected into the matching
            // sub-path of each mirror.
            let parent = &registries[idx];
            let record = Registry {
                location: scope.to_owned(),
                insecure: self.is_insecure(scope),
                blocked: self.is_blocked(scope),
                mirrors: mirrors_adjusted_for_nested_scope(
                    &parent.location,
                    scope,
                    &parent.mirrors,
                )?,
                ..Default::default()
            };
            registries.insert(idx + 1, record);
        } else {
            registries.push(Registry {
                location: scope.to_owned(),
                insecure: self.is_insecure(scope),
                blocked: self.is_blocked(scope),
                ..Default::default()
            });
        }
        Ok(())
    }
}

/// Mirrors for a scope nested below `parent_scope`: the relative suffix
/// is appended to each mirror location, everything else is preserved.
/// The parent must be a concrete scope containing `scope`.
fn mirrors_adjusted_for_nested_scope(
    parent_scope: &str,
    scope: &str,
    mirrors: &[Endpoint],
) -> Result<Vec<Endpoint>> {
    if parent_scope.starts_with("*.") || !scope_is_nested_inside_scope(scope, parent_scope) {
        bail!("registry scope {scope:?} is not nested below {parent_scope:?}");
    }
    let suffix = &scope[parent_scope.len()..];
    Ok(mirrors
        .iter()
        .map(|mirror| Endpoint {
            location: format!("{}{suffix}", mirror.location),
            ..mirror.clone()
        })
        .collect())
}
