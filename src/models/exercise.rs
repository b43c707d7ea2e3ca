use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoachError;

/// Elbow-angle thresholds driving the rep state machine.
///
/// `extended` re-arms the counter (stage `down`), `contracted` completes a
/// rep (stage `up`). The two never overlap: `extended > contracted`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub extended: f64,
    pub contracted: f64,
}

impl Thresholds {
    pub fn new(extended: f64, contracted: f64) -> Result<Self, CoachError> {
        let thresholds = Self {
            extended,
            contracted,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), CoachError> {
        // NaN fails the comparison too.
        if self.extended > self.contracted {
            Ok(())
        } else {
            Err(CoachError::InvalidThresholds {
                extended: self.extended,
                contracted: self.contracted,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseVariant {
    #[default]
    BicepCurl,
    HammerCurl,
}

impl ExerciseVariant {
    pub const ALL: [ExerciseVariant; 2] = [ExerciseVariant::BicepCurl, ExerciseVariant::HammerCurl];

    /// Stable identifier used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseVariant::BicepCurl => "bicep_curl",
            ExerciseVariant::HammerCurl => "hammer_curl",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseVariant::BicepCurl => "Bicep Curls",
            ExerciseVariant::HammerCurl => "Hammer Curls",
        }
    }

    pub fn default_thresholds(&self) -> Thresholds {
        match self {
            ExerciseVariant::BicepCurl => Thresholds {
                extended: 140.0,
                contracted: 60.0,
            },
            ExerciseVariant::HammerCurl => Thresholds {
                extended: 160.0,
                contracted: 40.0,
            },
        }
    }

    pub fn form_tips(&self) -> &'static [&'static str] {
        match self {
            ExerciseVariant::BicepCurl => &[
                "Keep your upper arms stationary",
                "Curl the weights while contracting your biceps",
                "Lower the weight back down slowly",
            ],
            ExerciseVariant::HammerCurl => &[
                "Keep your palms facing each other",
                "Keep your elbows close to your torso",
                "Squeeze your biceps at the top of the movement",
            ],
        }
    }
}

impl fmt::Display for ExerciseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ExerciseVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "bicep" | "bicep_curl" | "bicep_curls" | "bicepcurl" => Ok(ExerciseVariant::BicepCurl),
            "hammer" | "hammer_curl" | "hammer_curls" | "hammercurl" => {
                Ok(ExerciseVariant::HammerCurl)
            }
            _ => Err(format!("unknown exercise '{value}' (expected bicep or hammer)")),
        }
    }
}
