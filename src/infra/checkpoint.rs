// ============================================================
// Layer 6: Checkpoint Directory
// ============================================================
// Saves and restores models using Burn's NamedMpkGzFileRecorder.
//
// Directory layout:
//   <dir>/
//     config.json             ← BackboneConfig, needed to rebuild the
//                               module tree before loading weights
//     model.mpk.gz            ← backbone parameters
//     value_head_config.json  ← ValueHeadConfig as resolved at save time
//     v_head.mpk.gz           ← value-head parameters
//
// The first two files are the backbone's own checkpoint, so a
// directory written by the value-head wrapper can still be loaded
// as a plain backbone. The last two are optional on load.
//
// Full precision is used so a save → load round trip is bit-exact.

use std::{fs, path::PathBuf};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder, RecorderError},
};

use crate::domain::error::{ModelError, ModelResult};
use crate::ml::backbone::{BackboneConfig, CausalLm};
use crate::ml::value_head::{ValueHead, ValueHeadConfig};

const BACKBONE_CONFIG: &str = "config.json";
const BACKBONE_RECORD: &str = "model";
const VALUE_HEAD_CONFIG: &str = "value_head_config.json";
const VALUE_HEAD_RECORD: &str = "v_head";
/// Extension appended by the recorder
const RECORD_EXTENSION: &str = "mpk.gz";

type FileRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

impl From<RecorderError> for ModelError {
    fn from(err: RecorderError) -> Self {
        ModelError::Recorder(err.to_string())
    }
}

/// A directory holding one saved model.
pub struct CheckpointDir {
    dir: PathBuf,
}

impl CheckpointDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A directory counts as a checkpoint once it has a backbone config.
    pub fn exists(&self) -> bool {
        self.dir.join(BACKBONE_CONFIG).is_file()
    }

    pub fn has_value_head(&self) -> bool {
        self.record_path(VALUE_HEAD_RECORD).is_file()
    }

    pub fn save_backbone<B: Backend>(&self, model: &CausalLm<B>) -> ModelResult<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_json(BACKBONE_CONFIG, model.config())?;
        FileRecorder::new().record(model.clone().into_record(), self.dir.join(BACKBONE_RECORD))?;
        tracing::debug!("Saved backbone to '{}'", self.dir.display());
        Ok(())
    }

    /// Rebuild the module tree from config.json, then load the weights into it.
    pub fn load_backbone<B: Backend>(&self, device: &B::Device) -> ModelResult<CausalLm<B>> {
        let config = self.load_backbone_config()?;
        let template = config.init::<B>(device)?;
        let record = FileRecorder::new().load(self.dir.join(BACKBONE_RECORD), device)?;
        Ok(template.load_record(record))
    }

    pub fn load_backbone_config(&self) -> ModelResult<BackboneConfig> {
        let path = self.dir.join(BACKBONE_CONFIG);
        let json = fs::read_to_string(&path)?;
        let config: BackboneConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_value_head<B: Backend>(
        &self,
        v_head:  &ValueHead<B>,
        options: &ValueHeadConfig,
    ) -> ModelResult<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_json(VALUE_HEAD_CONFIG, options)?;
        FileRecorder::new().record(v_head.clone().into_record(), self.dir.join(VALUE_HEAD_RECORD))?;
        tracing::debug!("Saved value head to '{}'", self.dir.display());
        Ok(())
    }

    /// Load stored value-head weights into `template`; None when the
    /// directory holds a backbone only.
    pub fn load_value_head<B: Backend>(
        &self,
        template: ValueHead<B>,
        device:   &B::Device,
    ) -> ModelResult<Option<ValueHead<B>>> {
        if !self.has_value_head() {
            return Ok(None);
        }
        let record = FileRecorder::new().load(self.dir.join(VALUE_HEAD_RECORD), device)?;
        Ok(Some(template.load_record(record)))
    }

    pub fn load_value_head_config(&self) -> ModelResult<Option<ValueHeadConfig>> {
        let path = self.dir.join(VALUE_HEAD_CONFIG);
        if !path.is_file() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn record_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{RECORD_EXTENSION}"))
    }

    fn write_json<T: serde::Serialize>(&self, file: &str, value: &T) -> ModelResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), json)?;
        Ok(())
    }
}
