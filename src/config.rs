use serde::Deserialize;
use std::path::PathBuf;

use crate::error::Result;
use crate::solver::TOLERANCE;

/// Where the report goes and how strictly solver output is checked
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(rename = "outputPath", default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("result.txt")
}

fn default_tolerance() -> f64 {
    TOLERANCE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            tolerance: default_tolerance(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
