use serde::{Deserialize, Serialize};

/// AI pre-annotation hints attached to a served clip.
///
/// The default value stands in whenever the prediction service cannot be
/// reached; clients treat it as "no hints, baseline interface".
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Enrichment {
    pub ai_classes: Vec<String>,
    /// Suggested (start, end) regions in seconds.
    pub ai_regions: Vec<(f64, f64)>,
    pub interface_variant: i64,
}

/// Wire shape of the prediction service response.
#[derive(Debug, Deserialize)]
pub(super) struct PredictionResponse {
    #[serde(rename = "aiClasses")]
    pub ai_classes: Vec<String>,
    #[serde(rename = "aiRegions")]
    pub ai_regions: Vec<(f64, f64)>,
    pub interface: i64,
}

impl From<PredictionResponse> for Enrichment {
    fn from(response: PredictionResponse) -> Enrichment {
        Enrichment {
            ai_classes: response.ai_classes,
            ai_regions: response.ai_regions,
            interface_variant: response.interface,
        }
    }
}
