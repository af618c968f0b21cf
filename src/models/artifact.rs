//! Persisting fitted models.
//!
//! An artifact is a single JSON document wrapping the model with the kind and version it was
//! written with, so a file from another tool or an older layout is rejected up front instead
//! of producing a model that silently behaves differently.

use std::{fs, io, path::Path};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::utils::files::write_atomic;

/// A model that can be written to and read back from an artifact file
pub trait Artifact {
    /// Identifies the kind of model stored in the file
    const KIND: &'static str;

    /// Layout version. Bump whenever the serialized form changes.
    const VERSION: u32;

    /// Reject a deserialized model whose parts do not fit together
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, M> {
    format: &'a str,
    version: u32,
    model: &'a M,
}

#[derive(Deserialize)]
struct Header {
    format: String,
    version: u32,
}

#[derive(Deserialize)]
struct Body<M> {
    model: M,
}

/// Write the model to `path`, replacing any existing file
pub fn save<M, P>(model: &M, path: P) -> Result<(), ArtifactError>
where
    M: Artifact + Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let envelope = Envelope {
        format: M::KIND,
        version: M::VERSION,
        model,
    };

    let bytes = serde_json::to_vec(&envelope).map_err(|e| ArtifactError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    write_atomic(path, &bytes).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;

    log::info!("The model is saved to {}", path.display());

    Ok(())
}

/// Read a model previously written with [`save`]
pub fn load<M, P>(path: P) -> Result<M, ArtifactError>
where
    M: Artifact + DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let corrupt = |reason: String| ArtifactError::Corrupt {
        path: path.display().to_string(),
        reason,
    };

    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let header: Header = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;

    if header.format != M::KIND {
        return Err(corrupt(format!(
            "expected a {} artifact, found {}",
            M::KIND,
            header.format
        )));
    }

    if header.version != M::VERSION {
        return Err(corrupt(format!(
            "unsupported version {} (expected {})",
            header.version,
            M::VERSION
        )));
    }

    let body: Body<M> = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
    body.model.validate().map_err(corrupt)?;

    log::debug!("Loaded {} v{} from {}", M::KIND, M::VERSION, path.display());

    Ok(body.model)
}

/// Artifact Error
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    /// The file could not be read or written
    #[error("unable to access model artifact {path}: {source}")]
    Io {
        /// The artifact path
        path: String,
        /// The underlying error
        source: io::Error,
    },

    /// The file exists but does not hold a usable model
    #[error("corrupt model artifact {path}: {reason}")]
    Corrupt {
        /// The artifact path
        path: String,
        /// Why the file was rejected
        reason: String,
    },

    /// A reload was requested for a model that was never read from a file
    #[error("the model was not loaded from an artifact")]
    NoSource,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Weights {
        bias: f64,
        values: Vec<f64>,
    }

    impl Artifact for Weights {
        const KIND: &'static str = "test/weights";
        const VERSION: u32 = 3;
    }

    #[test]
    fn floats_survive_a_round_trip_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let weights = Weights {
            bias: -0.123_456_789_012_345_67,
            values: vec![1.0 / 3.0, std::f64::consts::PI, 1e-300, -2.5e17],
        };

        save(&weights, &path).unwrap();
        let loaded: Weights = load(&path).unwrap();

        assert_eq!(loaded, weights);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = load::<Weights, _>(dir.path().join("missing.json"));

        assert!(matches!(result, Err(ArtifactError::Io { .. })));
    }

    #[test]
    fn arbitrary_bytes_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, [0x50, 0x4b, 0x03, 0x04, 0xff, 0x00, 0x13]).unwrap();

        let result = load::<Weights, _>(&path);

        assert!(matches!(result, Err(ArtifactError::Corrupt { .. })));
    }

    #[test]
    fn other_kinds_and_versions_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");

        fs::write(&path, r#"{"format":"test/other","version":3,"model":{}}"#).unwrap();
        let err = load::<Weights, _>(&path).unwrap_err();
        assert!(err.to_string().contains("expected a test/weights artifact"));

        fs::write(
            &path,
            r#"{"format":"test/weights","version":2,"model":{"bias":0.0,"values":[]}}"#,
        )
        .unwrap();
        let err = load::<Weights, _>(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported version 2"));
    }
}
