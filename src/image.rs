//! Container image references in their canonical form.
//!
//! Admission tools print image strings the way Kubernetes canonicalizes
//! them, so the harness needs the same normalization to predict what a
//! rewritten image will look like in the output: bare names gain the
//! `docker.io` registry and a `library/` namespace, missing tags become
//! `:latest`, and `@hash` pins replace the tag entirely.

use std::collections::HashMap;
use std::fmt;

/// A parsed container image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Registry hostname, `docker.io` when the reference names none.
    pub registry: Option<String>,

    /// Image path, possibly namespaced (`library/alpine`, `etcd/etcd`).
    pub image: String,

    /// Tag after the colon; inferred as `latest` when absent.
    pub tag: Option<String>,

    /// Embedded digest (`@sha256:...`). Mutually exclusive with `tag`.
    pub hash: Option<String>,
}

/// Whether the first path component of a reference names a registry host.
///
/// Follows the docker heuristic: only `localhost`, dotted hostnames, and
/// `host:port` can be registries; anything else is a namespace.
fn is_registry(token: &str) -> bool {
    token == "localhost" || token.contains('.') || token.contains(':')
}

impl ImageRef {
    /// Parse an image reference.
    ///
    /// Infallible: malformed references still produce a value, they just may
    /// not round-trip to anything a registry would accept.
    pub fn parse(s: &str) -> ImageRef {
        let (registry, mut rest) = match s.split_once('/') {
            Some((host, rest)) if is_registry(host) => (host.to_string(), rest.to_string()),
            _ => ("docker.io".to_string(), s.to_string()),
        };

        // Docker Hub implies the `library/` namespace for bare names.
        if registry == "docker.io" && !rest.contains('/') {
            rest = format!("library/{rest}");
        }

        if let Some((image, hash)) = rest.split_once('@') {
            ImageRef {
                registry: Some(registry),
                image: image.to_string(),
                tag: None,
                hash: Some(hash.to_string()),
            }
        } else {
            let (image, tag) = match rest.split_once(':') {
                Some((image, tag)) => (image.to_string(), tag.to_string()),
                None => (rest, "latest".to_string()),
            };
            ImageRef {
                registry: Some(registry),
                image,
                tag: Some(tag),
                hash: None,
            }
        }
    }

    /// Apply a repo mapping to the canonical form of this reference.
    ///
    /// Source prefixes are tried longest first so that `k8s.gcr.io` wins
    /// over `gcr.io` regardless of map order, and the result is
    /// deterministic. A prefix only matches on a path, port, or end-of-name
    /// boundary: a `quay.io` mapping covers `quay.io/...` but not
    /// `quay.io-evil.com/...`. Returns `None` when no source prefix matches.
    pub fn rewrite(&self, repos: &HashMap<String, String>) -> Option<String> {
        let canonical = self.to_string();
        let mut sources: Vec<&String> = repos.keys().collect();
        sources.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        for src in sources {
            if let Some(rest) = canonical.strip_prefix(src.as_str()) {
                let on_boundary = rest.is_empty()
                    || rest.starts_with('/')
                    || rest.starts_with(':')
                    || src.ends_with('/');
                if on_boundary {
                    return Some(canonical.replacen(src.as_str(), &repos[src], 1));
                }
            }
        }
        None
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }

        write!(f, "{}", self.image)?;

        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        } else if let Some(hash) = &self.hash {
            write!(f, "@{hash}")?;
        }

        Ok(())
    }
}
