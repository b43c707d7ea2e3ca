use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::engine::{ProcessorConfig, DEFAULT_DECISION_THRESHOLD};
use crate::inference::DEFAULT_FEATURE_LEN;
use crate::models::{ArmSide, ExerciseVariant, JointTriplet, Thresholds};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierSettings {
    pub model_path: PathBuf,
    pub decision_threshold: f32,
    pub feature_len: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/bicep_model.json"),
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            feature_len: DEFAULT_FEATURE_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveSettings {
    pub frame_delay_ms: u64,
    /// Webcams show a selfie view; flip before detection.
    pub mirror: bool,
    /// Persist workout progress every N processed frames.
    pub heartbeat_every_frames: u32,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            frame_delay_ms: 100,
            mirror: true,
            heartbeat_every_frames: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadSettings {
    pub frame_delay_ms: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self { frame_delay_ms: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoachSettings {
    pub classifier: ClassifierSettings,
    pub live: LiveSettings,
    pub upload: UploadSettings,
    pub arm_side: ArmSide,
    pub bicep_curl: Thresholds,
    pub hammer_curl: Thresholds,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            classifier: ClassifierSettings::default(),
            live: LiveSettings::default(),
            upload: UploadSettings::default(),
            arm_side: ArmSide::default(),
            bicep_curl: ExerciseVariant::BicepCurl.default_thresholds(),
            hammer_curl: ExerciseVariant::HammerCurl.default_thresholds(),
        }
    }
}

impl CoachSettings {
    pub fn thresholds_for(&self, variant: ExerciseVariant) -> Thresholds {
        match variant {
            ExerciseVariant::BicepCurl => self.bicep_curl,
            ExerciseVariant::HammerCurl => self.hammer_curl,
        }
    }

    pub fn processor_config(&self, variant: ExerciseVariant) -> ProcessorConfig {
        ProcessorConfig {
            variant,
            thresholds: self.thresholds_for(variant),
            joints: JointTriplet::elbow(self.arm_side),
            decision_threshold: self.classifier.decision_threshold,
            feature_len: self.classifier.feature_len,
        }
    }

    /// Heartbeat interval, forced to every frame when `FORMCOACH_DEBUG` is set.
    pub fn heartbeat_every_frames(&self) -> u32 {
        self.heartbeat_interval(debug_mode())
    }

    fn heartbeat_interval(&self, debug: bool) -> u32 {
        if debug {
            1
        } else {
            self.live.heartbeat_every_frames.max(1)
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bicep_curl.validate().context("bicepCurl thresholds")?;
        self.hammer_curl.validate().context("hammerCurl thresholds")?;
        if !(0.0..=1.0).contains(&self.classifier.decision_threshold) {
            bail!(
                "decision threshold {} must lie in [0, 1]",
                self.classifier.decision_threshold
            );
        }
        if self.classifier.feature_len == 0 {
            bail!("feature length must be positive");
        }
        Ok(())
    }
}

pub fn debug_mode() -> bool {
    std::env::var("FORMCOACH_DEBUG")
        .map(|value| is_debug_flag(&value))
        .unwrap_or(false)
}

fn is_debug_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CoachSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<CoachSettings>(&contents) {
                Ok(settings) if settings.validate().is_ok() => settings,
                Ok(_) | Err(_) => {
                    log_warn!(
                        "Settings at {} are invalid, falling back to defaults",
                        path.display()
                    );
                    CoachSettings::default()
                }
            }
        } else {
            CoachSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> CoachSettings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update(&self, settings: CoachSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: CoachSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &CoachSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
