//! Admission-request fixtures.
//!
//! A fixture is a pre-existing JSON document describing the request the
//! policy is evaluated against. It is owned externally and never mutated;
//! the harness only verifies it is readable JSON before spending a process
//! launch on it, and digs out the container images for rewrite checks.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Errors loading a fixture. Infrastructure failures, not assertion
/// failures: the tool was never invoked.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture '{path}' is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A loaded, parsed fixture.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub path: PathBuf,
    pub body: Value,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Fixture, FixtureError> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: display.clone(),
            source,
        })?;
        let body = serde_json::from_str(&raw).map_err(|source| FixtureError::Parse {
            path: display,
            source,
        })?;
        Ok(Fixture {
            path: path.to_path_buf(),
            body,
        })
    }

    /// Container images named by the embedded Kubernetes object, regular
    /// containers first, then init containers.
    ///
    /// Tools accept several request encodings, so the object is looked for
    /// at the top level, under `object`, and under `request.object`. A
    /// fixture without a pod spec yields an empty list.
    pub fn container_images(&self) -> Vec<String> {
        let object = self
            .body
            .get("object")
            .or_else(|| self.body.get("request").and_then(|r| r.get("object")))
            .unwrap_or(&self.body);

        let Some(spec) = object.get("spec") else {
            return Vec::new();
        };

        let mut images = Vec::new();
        for key in ["containers", "initContainers"] {
            if let Some(list) = spec.get(key).and_then(Value::as_array) {
                for container in list {
                    if let Some(image) = container.get("image").and_then(Value::as_str) {
                        images.push(image.to_string());
                    }
                }
            }
        }
        images
    }
}
