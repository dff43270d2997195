//! The generated subset of the "v2" `registries.conf` schema.
//!
//! Field names follow the TOML schema consumed by cri-o, podman and
//! buildah verbatim, and zero values are omitted from the encoding, so
//! the serialized form parses cleanly with the standard
//! system-registries parser. TOML wants plain values emitted before
//! arrays of tables, hence the field ordering in [`V2RegistriesConf`]
//! and [`Registry`].

use serde::{Deserialize, Serialize};

/// The top-level registries configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct V2RegistriesConf {
    /// Registries consulted to resolve unqualified short image names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unqualified_search_registries: Vec<String>,
    /// How short-name resolution behaves; left at the parser default.
    #[serde(default)]
    pub short_name_mode: String,
    #[serde(default, rename = "registry", skip_serializing_if = "Vec::is_empty")]
    pub registries: Vec<Registry>,
}

/// One `[[registry]]` entry: a scope plus its flags and mirrors.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Registry {
    /// Wildcard pattern (`*.example.com`) this entry applies to.
    /// Exactly one of `prefix` or `location` is set in our output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    /// Concrete scope this entry applies to, and where pulls resolve
    /// when no mirror serves them.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,
    /// Pulls for this scope are rejected outright.
    #[serde(default, skip_serializing_if = "is_false")]
    pub blocked: bool,
    #[serde(default, rename = "mirror", skip_serializing_if = "Vec::is_empty")]
    pub mirrors: Vec<Endpoint>,
}

/// A mirror endpoint below a `[[registry]]` entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,
    /// Which pulls this mirror may serve; unset means all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_from_mirror: Option<PullFromMirror>,
}

/// Restriction on the pull types a mirror serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PullFromMirror {
    DigestOnly,
    TagOnly,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_toml_schema() {
        let config = V2RegistriesConf {
            unqualified_search_registries: vec!["docker.io".to_owned()],
            registries: vec![
                Registry {
                    location: "source.example.com".to_owned(),
                    blocked: true,
                    mirrors: vec![
                        Endpoint {
                            location: "mirror.example.com".to_owned(),
                            insecure: true,
                            pull_from_mirror: Some(PullFromMirror::DigestOnly),
                        },
                        Endpoint {
                            location: "tags.example.com".to_owned(),
                            pull_from_mirror: Some(PullFromMirror::TagOnly),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
                Registry {
                    prefix: "*.example.net".to_owned(),
                    insecure: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let encoded = toml::to_string(&config).unwrap();
        // The v2 schema names, verbatim.
        for line in [
            r#"unqualified-search-registries = ["docker.io"]"#,
            r#"short-name-mode = """#,
            "[[registry]]",
            r#"location = "source.example.com""#,
            "blocked = true",
            "[[registry.mirror]]",
            r#"pull-from-mirror = "digest-only""#,
            r#"pull-from-mirror = "tag-only""#,
            r#"prefix = "*.example.net""#,
            "insecure = true",
        ] {
            assert!(encoded.contains(line), "missing {line:?} in:\n{encoded}");
        }
        // Zero values stay out of the encoding.
        assert!(!encoded.contains("blocked = false"), "{encoded}");
        assert!(!encoded.contains("insecure = false"), "{encoded}");
        let decoded: V2RegistriesConf = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_decode_ignores_defaults() {
        let config: V2RegistriesConf = toml::from_str(indoc! {r#"
            unqualified-search-registries = ["registry.access.redhat.com", "docker.io"]
        "#})
        .unwrap();
        assert_eq!(
            config.unqualified_search_registries,
            ["registry.access.redhat.com", "docker.io"]
        );
        assert_eq!(config.short_name_mode, "");
        assert!(config.registries.is_empty());
    }
}
