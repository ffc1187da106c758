use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One lesson of the course dataset.
///
/// The dataset is an opaque read-only input; lessons are only ever referenced
/// by id from progress records, so a record stays valid even if the catalog
/// later drops a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLesson {
    pub id: String,
    pub module_id: String,
    pub module_title: String,
    pub title: String,
    /// Estimated duration in minutes; absent or zero means "use the default".
    #[serde(default)]
    pub est_min: Option<u32>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content_html: String,
}

/// A module grouping lessons in editorial order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lesson_ids: Vec<String>,
}

/// The full course dataset. Lesson order is the editorial default sequence
/// and is load-bearing for plan building (stable-sort ties keep it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseData {
    pub version: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modules: Vec<CourseModule>,
    #[serde(default)]
    pub lessons: Vec<CourseLesson>,
}

impl CourseData {
    /// Parse the dataset from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if the document does not
    /// match the dataset shape.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Look a lesson up by id.
    #[must_use]
    pub fn lesson(&self, id: &str) -> Option<&CourseLesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Number of lessons in the catalog.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    /// An empty catalog, useful as a placeholder in tests.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: String::new(),
            generated_at: None,
            modules: Vec::new(),
            lessons: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_dataset() {
        let raw = r#"{
            "version": "1",
            "modules": [
                { "id": "m1", "title": "Basics", "lessonIds": ["l1"] }
            ],
            "lessons": [
                {
                    "id": "l1",
                    "moduleId": "m1",
                    "moduleTitle": "Basics",
                    "title": "Intro",
                    "estMin": 15,
                    "tags": ["workflow"],
                    "contentHtml": "<p>hi</p>"
                }
            ]
        }"#;

        let data = CourseData::from_json(raw).unwrap();
        assert_eq!(data.lesson_count(), 1);
        let lesson = data.lesson("l1").unwrap();
        assert_eq!(lesson.est_min, Some(15));
        assert_eq!(lesson.module_id, "m1");
        assert!(data.lesson("missing").is_none());
    }
}
