use serde::{Deserialize, Serialize};

/// Coarse narrative phase of a chapter, derived from its position in the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterType {
    Opening,
    Setup,
    Development,
    Escalation,
    Climax,
    Resolution,
}

impl ChapterType {
    pub const ALL: [ChapterType; 6] = [
        Self::Opening,
        Self::Setup,
        Self::Development,
        Self::Escalation,
        Self::Climax,
        Self::Resolution,
    ];

    /// Machine tag: "opening", "setup", ...
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Setup => "setup",
            Self::Development => "development",
            Self::Escalation => "escalation",
            Self::Climax => "climax",
            Self::Resolution => "resolution",
        }
    }

    /// Human-readable name used in prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Opening => "Opening",
            Self::Setup => "Setup",
            Self::Development => "Development",
            Self::Escalation => "Escalation",
            Self::Climax => "Climax",
            Self::Resolution => "Resolution",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ChapterType> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl std::fmt::Display for ChapterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Emotional register suggested for a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Escalation and climax chapters.
    TenseAndFierce,
    /// Opening chapter.
    Engaging,
    /// Low-intensity resolution.
    WistfulAndCalm,
    /// High-intensity resolution.
    Rousing,
    Urgent,
    Steady,
    Calm,
}

impl Tone {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TenseAndFierce => "tense and fierce",
            Self::Engaging => "engaging",
            Self::WistfulAndCalm => "wistful and calm",
            Self::Rousing => "rousing",
            Self::Urgent => "urgent and uneasy",
            Self::Steady => "steadily advancing",
            Self::Calm => "calm and unhurried",
        }
    }
}

/// Volume linkage attached to guidance when the chapter belongs to a planned volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeLink {
    pub volume_num: u32,
    #[serde(default)]
    pub volume_context: String,
}

/// Per-chapter generation guidance handed to the prompt builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotGuidance {
    pub chapter_num: u32,
    pub chapter_type: ChapterType,
    pub chapter_type_name: String,
    pub conflict_level: f64,
    pub pacing_suggestions: Vec<String>,
    pub content_focus: Vec<String>,
    pub tone: Tone,
    pub key_elements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_tag() {
        for t in ChapterType::ALL {
            assert_eq!(ChapterType::from_tag(t.tag()), Some(t));
        }
        assert_eq!(ChapterType::from_tag("interlude"), None);
    }

    #[test]
    fn chapter_type_serializes_as_snake_case() {
        let json = serde_json::to_string(&ChapterType::Climax).unwrap();
        assert_eq!(json, "\"climax\"");
        let tone = serde_json::to_string(&Tone::TenseAndFierce).unwrap();
        assert_eq!(tone, "\"tense_and_fierce\"");
    }

    #[test]
    fn guidance_omits_missing_volume() {
        let guidance = PlotGuidance {
            chapter_num: 3,
            chapter_type: ChapterType::Setup,
            chapter_type_name: "Setup".to_string(),
            conflict_level: 0.3,
            pacing_suggestions: vec![],
            content_focus: vec![],
            tone: Tone::Calm,
            key_elements: vec![],
            volume: None,
        };
        let json = serde_json::to_value(&guidance).unwrap();
        assert!(json.get("volume").is_none());
    }
}
