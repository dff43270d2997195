//! Scope matching for `registries.conf` entries.
//!
//! A scope names a registry host (optionally with a port), a namespace
//! below it (`quay.io/ns1/ns2`), or a `*.example.com` wildcard covering
//! subdomain hosts.

/// Returns true if every image reference within `sub` also falls within
/// `sup`.
///
/// Wildcard superscopes (`*.example.com`) cover host names only: the
/// subscope's host, ignoring any port and namespace path, must end in
/// the wildcard's `.example.com` tail. A wildcard superscope carrying a
/// namespace path matches nothing.
///
/// Concrete superscopes require the host and port to match exactly, and
/// a namespace may only extend them at a `/` boundary; `quay.io2` and
/// `quay.io:443` are not nested inside `quay.io`.
pub(crate) fn scope_is_nested_inside_scope(sub: &str, sup: &str) -> bool {
    if let Some(tail) = sup.strip_prefix("*.") {
        if tail.contains('/') {
            return false;
        }
        let host = sub.split('/').next().unwrap_or(sub);
        let host = host.split(':').next().unwrap_or(host);
        // Suffix-match including the dot, so `*.example.com` covers
        // `foo.example.com` and `*.foo.example.com` but not
        // `example.com` itself.
        return host.ends_with(&sup[1..]);
    }
    if sub == sup {
        return true;
    }
    sub.len() > sup.len() && sub.starts_with(sup) && sub.as_bytes()[sup.len()] == b'/'
}

/// Returns true if `scope` can appear as a scope in `registries.conf`:
/// a host with optional port and namespace path, or a `*.example.com`
/// wildcard.
pub fn is_valid_registries_conf_scope(scope: &str) -> bool {
    match scope.strip_prefix("*.") {
        Some(tail) => is_valid_wildcard_tail(tail),
        None => is_valid_concrete_scope(scope),
    }
}

/// The part after `*.` must itself be a host with at least two labels;
/// further wildcards, ports and namespace paths are rejected.
fn is_valid_wildcard_tail(tail: &str) -> bool {
    tail.contains('.') && is_valid_host(tail)
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

fn is_valid_concrete_scope(scope: &str) -> bool {
    let (host_port, namespace) = match scope.split_once('/') {
        Some((h, ns)) => (h, Some(ns)),
        None => (scope, None),
    };
    let (host, port) = match host_port.split_once(':') {
        Some((h, p)) => (h, Some(p)),
        None => (host_port, None),
    };
    if !is_valid_host(host) {
        return false;
    }
    if let Some(port) = port {
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    match namespace {
        Some(ns) => ns
            .split('/')
            .all(|component| !component.is_empty() && !component.contains([':', '*'])),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_is_nested_inside_scope() {
        for (sub, sup, expected) in [
            ("quay.io", "example.com", false), // Host mismatch
            ("quay.io", "quay.io", true),      // Host match
            ("quay.io:443", "quay.io", false), // Port mismatch (although sup is a prefix of sub)
            ("quay.io:443", "quay.io:444", false), // Port mismatch
            ("quay.io.example.com", "quay.io", false), // Host mismatch (although sup is a prefix of sub)
            ("quay.io2", "quay.io", false),            // Host mismatch (although sup is a prefix of sub)
            ("quay.io/ns1", "quay.io", true),          // Valid namespace
            ("quay.io/ns1/ns2/ns3", "quay.io", true),  // Valid namespace
            ("quay.io/ns1/ns2/ns3", "not-quay.io", false), // Host mismatch
            ("bar/example.foo", "*.foo", false),       // Wildcards only match host names
            ("example/bar.foo/quay.io", "*.foo", false), // Wildcard does not match the host name
            ("example/bar.foo:400", "*.foo", false),   // Wildcard does not match the host name
            ("foo.example.com", "*.example.com", true),
            ("*.foo.example.com", "*.example.com", true),
            ("foo.example.com/bar", "*.example.com", true),
            ("foo.registry.com", "*.example.com", false),
            ("foo.example.com", "**.example.com", false),
            ("foo.example.com", "example.*.com", false),
            ("foo.example.com", "*.example.com/foo/bar", false),
            ("foo.example.com:443/bar/baz", "*.example.com", true),
            ("foo.example.com:443/bar/baz", "*.example.com/bar/baz", false),
            ("foo.example.com", "*example.com", false),
            ("foo.example.com", "*/example.com", false),
        ] {
            assert_eq!(
                scope_is_nested_inside_scope(sub, sup),
                expected,
                "{sub:?} inside {sup:?}"
            );
        }
    }

    #[test]
    fn test_is_valid_registries_conf_scope() {
        for (scope, expected) in [
            ("example.com", true),                // Valid registry
            ("example.com:5000", true),           // Valid registry with port
            ("example.com/ns1/ns2", true),        // Valid namespace
            ("", false),                          // Empty scope
            ("example.com:x", false),             // Invalid port
            ("example.com//ns", false),           // Empty namespace component
            ("*.example.com", true),              // Valid wildcard
            ("**.example.com", false),            // Invalid wildcard entry
            ("example.*.com", false),             // Invalid wildcard entry
            ("*.example.com/foo/bar", false),     // Invalid wildcard entry
            ("*.example.com:foo", false),         // Invalid wildcard entry
            ("*.example.com/foo:sha@bar", false), // Invalid wildcard entry
            ("*.example.com.*.bar.com", false),   // Invalid wildcard entry
            ("*example.com", false),
            ("*/example.com", false),
            ("*.*example.com", false),
        ] {
            assert_eq!(is_valid_registries_conf_scope(scope), expected, "{scope:?}");
        }
    }
}
