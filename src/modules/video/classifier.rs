use std::path::Path;

use serde::Serialize;

use crate::infrastructure::media::{Dimensions, MediaProbe, ProbeError};

const PORTRAIT_RATIO: f64 = 9.0 / 16.0;
const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const RATIO_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Portrait,
    Landscape,
    Other,
}

impl AspectClass {
    pub fn from_dimensions(dimensions: Dimensions) -> Self {
        let ratio = f64::from(dimensions.width) / f64::from(dimensions.height);

        if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
            AspectClass::Portrait
        } else if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
            AspectClass::Landscape
        } else {
            AspectClass::Other
        }
    }

    /// Namespace segment used for storage keys.
    pub fn prefix(self) -> &'static str {
        match self {
            AspectClass::Portrait => "portrait/",
            AspectClass::Landscape => "landscape/",
            AspectClass::Other => "other/",
        }
    }
}

impl std::fmt::Display for AspectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AspectClass::Portrait => "portrait",
            AspectClass::Landscape => "landscape",
            AspectClass::Other => "other",
        })
    }
}

/// Probes `path` once and buckets its primary video stream. The file is only
/// read.
pub async fn classify(probe: &dyn MediaProbe, path: &Path) -> Result<AspectClass, ProbeError> {
    let dimensions = probe.dimensions(path).await?;
    Ok(AspectClass::from_dimensions(dimensions))
}
