//! Volume plan records and their persistence boundary.
//!
//! Plans are written by the driving application and may come back through a
//! serializer that renders numbers as strings. All numeric fields go through
//! [`lenient_u32`] on the way in, so the rest of the crate only sees `u32`.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanDecodeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("inconsistent volume plan: {0}")]
    Inconsistent(String),
}

/// A contiguous block of chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(deserialize_with = "lenient_u32")]
    pub volume_num: u32,
    pub title: String,
    pub theme: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub start_chapter: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub end_chapter: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub chapter_count: u32,
}

impl Volume {
    pub fn contains(&self, chapter_num: u32) -> bool {
        (self.start_chapter..=self.end_chapter).contains(&chapter_num)
    }

    /// 1-based position of `chapter_num` inside this volume.
    pub fn local_position(&self, chapter_num: u32) -> Option<u32> {
        self.contains(chapter_num)
            .then(|| chapter_num - self.start_chapter + 1)
    }
}

/// The authoritative volume partition for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePlan {
    pub title: String,
    pub genre: String,
    pub theme: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub total_chapters: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub total_volumes: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub chapters_per_volume: u32,
    pub volumes: Vec<Volume>,
}

impl VolumePlan {
    pub fn volume(&self, volume_num: u32) -> Option<&Volume> {
        let idx = volume_num.checked_sub(1)? as usize;
        self.volumes.get(idx)
    }

    pub fn volume_for_chapter(&self, chapter_num: u32) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.contains(chapter_num))
    }

    /// Check that the volumes partition `[1, total_chapters]` without gaps or overlaps.
    pub fn validate(&self) -> Result<(), PlanDecodeError> {
        if self.volumes.len() != self.total_volumes as usize {
            return Err(PlanDecodeError::Inconsistent(format!(
                "total_volumes is {} but {} volumes are listed",
                self.total_volumes,
                self.volumes.len()
            )));
        }
        let mut next_start = 1;
        for (i, volume) in self.volumes.iter().enumerate() {
            let expected_num = i as u32 + 1;
            if volume.volume_num != expected_num {
                return Err(PlanDecodeError::Inconsistent(format!(
                    "volume #{} is numbered {}",
                    expected_num, volume.volume_num
                )));
            }
            if volume.start_chapter != next_start {
                return Err(PlanDecodeError::Inconsistent(format!(
                    "volume {} starts at chapter {}, expected {}",
                    volume.volume_num, volume.start_chapter, next_start
                )));
            }
            if volume.end_chapter < volume.start_chapter
                || volume.chapter_count != volume.end_chapter - volume.start_chapter + 1
            {
                return Err(PlanDecodeError::Inconsistent(format!(
                    "volume {} spans {}-{} but claims {} chapters",
                    volume.volume_num,
                    volume.start_chapter,
                    volume.end_chapter,
                    volume.chapter_count
                )));
            }
            next_start = volume.end_chapter.checked_add(1).ok_or_else(|| {
                PlanDecodeError::Inconsistent(format!(
                    "volume {} ends at chapter {}, past the largest chapter number",
                    volume.volume_num, volume.end_chapter
                ))
            })?;
        }
        let last_end = next_start - 1;
        if last_end != self.total_chapters {
            return Err(PlanDecodeError::Inconsistent(format!(
                "volumes end at chapter {}, book has {}",
                last_end, self.total_chapters
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PlanDecodeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a plan from JSON, tolerating numbers rendered as strings.
    pub fn from_json(input: &str) -> Result<VolumePlan, PlanDecodeError> {
        let plan: VolumePlan = serde_json::from_str(input)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<VolumePlan, PlanDecodeError> {
        let plan: VolumePlan = serde_json::from_value(value)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn to_ron(&self) -> Result<String, PlanDecodeError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn parse_ron(input: &str) -> Result<VolumePlan, PlanDecodeError> {
        let plan: VolumePlan = ron::from_str(input)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Load a plan from disk; `.ron` files are read as RON, anything else as JSON.
    pub fn load(path: &Path) -> Result<VolumePlan, PlanDecodeError> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|s| s.to_str()) {
            Some("ron") => Self::parse_ron(&contents),
            _ => Self::from_json(&contents),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PlanDecodeError> {
        let contents = match path.extension().and_then(|s| s.to_str()) {
            Some("ron") => self.to_ron()?,
            _ => self.to_json()?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Deserialize a `u32` from an integer, an integral float, or a numeric string.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientU32;

    impl<'de> Visitor<'de> for LenientU32 {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or a string containing one")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
            if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(E::custom(format!("{v} is not a chapter number")))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
            let trimmed = v.trim();
            if let Ok(n) = trimmed.parse::<u32>() {
                return Ok(n);
            }
            match trimmed.parse::<f64>() {
                Ok(f) => self.visit_f64(f),
                Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(LenientU32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_volume_plan() -> VolumePlan {
        VolumePlan {
            title: "Ember".to_string(),
            genre: "fantasy".to_string(),
            theme: "defying fate".to_string(),
            total_chapters: 30,
            total_volumes: 2,
            chapters_per_volume: 15,
            volumes: vec![
                Volume {
                    volume_num: 1,
                    title: "Ember - Volume 1: Beginning".to_string(),
                    theme: "t1".to_string(),
                    start_chapter: 1,
                    end_chapter: 15,
                    chapter_count: 15,
                },
                Volume {
                    volume_num: 2,
                    title: "Ember - Volume 2: Ending".to_string(),
                    theme: "t2".to_string(),
                    start_chapter: 16,
                    end_chapter: 30,
                    chapter_count: 15,
                },
            ],
        }
    }

    #[test]
    fn stringly_numbers_decode_to_integers() {
        let json = r#"{
            "title": "Ember", "genre": "fantasy", "theme": "defying fate",
            "total_chapters": "30", "total_volumes": 2.0, "chapters_per_volume": " 15 ",
            "volumes": [
                {"volume_num": "1", "title": "a", "theme": "t", "start_chapter": "1", "end_chapter": "15", "chapter_count": "15"},
                {"volume_num": 2, "title": "b", "theme": "t", "start_chapter": 16, "end_chapter": "30", "chapter_count": 15}
            ]
        }"#;
        let plan = VolumePlan::from_json(json).unwrap();
        assert_eq!(plan.total_chapters, 30);
        assert_eq!(plan.chapters_per_volume, 15);
        assert_eq!(plan.volumes[1].end_chapter, 30);
    }

    #[test]
    fn non_numeric_string_is_rejected() {
        let json = r#"{"volume_num": "one", "title": "", "theme": "",
            "start_chapter": 1, "end_chapter": 2, "chapter_count": 2}"#;
        assert!(serde_json::from_str::<Volume>(json).is_err());
        let negative = r#"{"volume_num": -1, "title": "", "theme": "",
            "start_chapter": 1, "end_chapter": 2, "chapter_count": 2}"#;
        assert!(serde_json::from_str::<Volume>(negative).is_err());
    }

    #[test]
    fn validate_rejects_gaps() {
        let mut plan = two_volume_plan();
        plan.volumes[1].start_chapter = 17;
        plan.volumes[1].chapter_count = 14;
        assert!(matches!(plan.validate(), Err(PlanDecodeError::Inconsistent(_))));
    }

    #[test]
    fn validate_rejects_short_coverage() {
        let mut plan = two_volume_plan();
        plan.total_chapters = 31;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn plan_ending_at_the_last_chapter_number_is_an_error() {
        let json = r#"{
            "title": "Ember", "genre": "", "theme": "",
            "total_chapters": 4294967295, "total_volumes": 1, "chapters_per_volume": 4294967295,
            "volumes": [
                {"volume_num": 1, "title": "a", "theme": "t", "start_chapter": 1,
                 "end_chapter": "4294967295", "chapter_count": 4294967295}
            ]
        }"#;
        assert!(matches!(
            VolumePlan::from_json(json),
            Err(PlanDecodeError::Inconsistent(_))
        ));
    }

    #[test]
    fn ron_round_trip() {
        let plan = two_volume_plan();
        let text = plan.to_ron().unwrap();
        assert_eq!(VolumePlan::parse_ron(&text).unwrap(), plan);
    }

    #[test]
    fn chapter_lookup() {
        let plan = two_volume_plan();
        assert_eq!(plan.volume_for_chapter(16).map(|v| v.volume_num), Some(2));
        assert_eq!(plan.volume_for_chapter(31), None);
        assert_eq!(plan.volume(0), None);
        assert_eq!(plan.volumes[1].local_position(18), Some(3));
        assert_eq!(plan.volumes[0].local_position(18), None);
    }
}
