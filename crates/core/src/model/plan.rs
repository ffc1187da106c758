use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topical weighting preference for a study plan.
///
/// A focus reorders lessons before packing; it never filters them out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    #[default]
    Balanced,
    Marketing,
    Api,
    Ai,
}

impl Focus {
    /// The fixed tag-affinity keyword set for this focus.
    ///
    /// A lesson scores one point per keyword its tags match, where a match is
    /// exact tag equality or the keyword appearing inside the tag (so a tag
    /// `ai-agent` matches the `ai` keyword). `Balanced` carries no keywords
    /// and therefore never reorders.
    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Focus::Balanced => &[],
            Focus::Marketing => &["marketing", "lead-gen", "workflow", "productivity"],
            Focus::Ai => &["ai", "ai-agent", "rag", "embeddings", "agentic"],
            Focus::Api => &["api", "http", "google", "telegram", "whatsapp"],
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Focus::Balanced => "balanced",
            Focus::Marketing => "marketing",
            Focus::Api => "api",
            Focus::Ai => "ai",
        };
        f.write_str(name)
    }
}

/// One weekly bucket of a study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBucket {
    /// 1-based, contiguous week number.
    pub week: u32,
    /// Minute budget the week was packed against.
    pub minutes: u32,
    /// Lesson ids assigned to this week, in packing order.
    pub lesson_ids: Vec<String>,
}

/// A derived, replaceable schedule partitioning the full catalog into weekly
/// time-boxed buckets. Rebuilt wholesale on every change of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub focus: Focus,
    pub hours_per_week: f64,
    pub mins_per_week: u32,
    pub weeks: Vec<WeekBucket>,
    pub created_at: DateTime<Utc>,
}

impl StudyPlan {
    /// All lesson ids in week order, flattened.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<&str> {
        self.weeks
            .iter()
            .flat_map(|w| w.lesson_ids.iter().map(String::as_str))
            .collect()
    }

    /// Number of weeks in the plan.
    #[must_use]
    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }
}
