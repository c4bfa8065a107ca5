use super::model::{FacetTuple, MetadataValue};

/// `point_hand` value recorded for left-hand pointing.
pub const LEFT_HAND_MARKER: &str = "_L";

/// `speech_rate` value for the normal-rate condition.
pub const NORMAL_RATE: &str = "normal";

/// Maps a session to its video file by naming convention:
/// `<root>/vp<speaker>_<Left|Right>[_fast]001.<ext>`.
///
/// The speaker is written with its `Display` form, so a float speaker
/// column gives `vp1.0_...` the same way pandas would stringify it.
/// Existence on disk is never checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolver {
    root: String,
    extension: String,
}

impl AssetResolver {
    pub fn new(root: impl Into<String>, extension: impl Into<String>) -> Self {
        let root: String = root.into();
        let root = match root.trim_end_matches('/') {
            "" if root.starts_with('/') => "/".to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            root,
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn resolve(
        &self,
        speaker: &MetadataValue,
        hand: &MetadataValue,
        rate: &MetadataValue,
    ) -> String {
        let file = format!(
            "vp{speaker}_{}{}001.{}",
            hand_label(hand),
            rate_infix(rate),
            self.extension
        );
        match self.root.as_str() {
            "" => file,
            "/" => format!("/{file}"),
            root => format!("{root}/{file}"),
        }
    }

    pub fn resolve_facets(&self, facets: &FacetTuple) -> String {
        self.resolve(&facets.speaker, &facets.point_hand, &facets.speech_rate)
    }
}

/// `"Left"` for the left-hand marker, `"Right"` for anything else.
pub fn hand_label(hand: &MetadataValue) -> &'static str {
    if hand.as_str() == Some(LEFT_HAND_MARKER) {
        "Left"
    } else {
        "Right"
    }
}

/// Empty for normal rate, `"_fast"` for anything else.
pub fn rate_infix(rate: &MetadataValue) -> &'static str {
    if rate.as_str() == Some(NORMAL_RATE) {
        ""
    } else {
        "_fast"
    }
}
