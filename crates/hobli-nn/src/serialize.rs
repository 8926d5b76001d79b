//! Model serialization and deserialization via bincode.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::error::NnError;
use crate::network::Mlp;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized network.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Output width of every layer, input side first.
    layer_widths: Vec<usize>,
    /// The serialized network.
    network: Mlp,
}

impl ModelEnvelope {
    /// Verify that the network can run a forward pass without indexing
    /// out of bounds and ends in a single output.
    fn check(&self) -> Result<(), String> {
        let network = &self.network;
        if self.layer_widths != network.layer_widths() {
            return Err(format!(
                "header widths {:?} do not match network widths {:?}",
                self.layer_widths,
                network.layer_widths()
            ));
        }
        if network.layers.is_empty() {
            return Err("network has no layers".to_string());
        }

        let mut fan_in = network.n_inputs;
        for (i, layer) in network.layers.iter().enumerate() {
            if layer.n_inputs == 0 || layer.n_outputs == 0 {
                return Err(format!("layer {i} has a zero dimension"));
            }
            if layer.n_inputs != fan_in {
                return Err(format!(
                    "layer {i} takes {} inputs, previous width is {fan_in}",
                    layer.n_inputs
                ));
            }
            if layer.weights.len() != layer.n_inputs * layer.n_outputs {
                return Err(format!(
                    "layer {i} has {} weights, expected {}",
                    layer.weights.len(),
                    layer.n_inputs * layer.n_outputs
                ));
            }
            if layer.biases.len() != layer.n_outputs {
                return Err(format!(
                    "layer {i} has {} biases, expected {}",
                    layer.biases.len(),
                    layer.n_outputs
                ));
            }
            fan_in = layer.n_outputs;
        }

        if fan_in != 1 {
            return Err(format!("output layer has {fan_in} units, expected 1"));
        }
        Ok(())
    }
}

impl Mlp {
    /// Encode the network into a versioned byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`NnError::SerializeModel`] if bincode encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, NnError> {
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            layer_widths: self.layer_widths(),
            network: self.clone(),
        };
        bincode::serialize(&envelope).map_err(|e| NnError::SerializeModel { source: e })
    }

    /// Save the model to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NnError::SerializeModel`] | bincode encoding failed |
    /// | [`NnError::WriteModel`] | file write failed |
    ///
    /// The bytes are written to a temporary file in the same directory and
    /// renamed over `path`, so readers never observe a partial model.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), NnError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        // Stage next to the target so the final rename never crosses filesystems.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |e: std::io::Error| NnError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(write_err)?;
        staged.write_all(&bytes).map_err(write_err)?;
        staged.as_file().sync_all().map_err(write_err)?;
        staged.persist(path).map_err(|e| write_err(e.error))?;

        info!(size_bytes = bytes.len(), n_params = self.n_params(), "model saved");
        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// Checks the format version and the structure of the decoded network.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NnError::ReadModel`] | file read failed |
    /// | [`NnError::DeserializeModel`] | bincode decoding failed |
    /// | [`NnError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`NnError::InvalidModel`] | layer shapes are inconsistent |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NnError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| NnError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| NnError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(NnError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        if let Err(reason) = envelope.check() {
            return Err(NnError::InvalidModel {
                path: path.to_path_buf(),
                reason,
            });
        }

        debug!(layer_widths = ?envelope.layer_widths, "model loaded");
        Ok(envelope.network)
    }
}
