use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of the search endpoint.
///
/// Items stay raw so that one malformed listing cannot fail the whole page;
/// see [`VacancySummary::from_item`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VacancyPage {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub found: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    /// Total number of pages the API is willing to serve for this query.
    #[serde(default)]
    pub pages: Option<u32>,
}

impl VacancyPage {
    /// Whether the API reports pages after `page`.
    pub fn has_more_after(&self, page: u32) -> bool {
        if self.items.is_empty() {
            return false;
        }
        match self.pages {
            Some(total) => page + 1 < total,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancySummary {
    pub id: String,
    pub name: String,
    pub area: Area,
    /// Public page of the listing, shown to humans.
    pub alternate_url: String,
}

impl VacancySummary {
    pub fn from_item(item: &Value) -> serde_json::Result<Self> {
        Self::deserialize(item)
    }

    /// Best-effort identifier of a raw item, for failure records.
    pub fn item_id(item: &Value) -> String {
        match item.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => "?".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VacancyDetail {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub key_skills: Vec<KeySkill>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeySkill {
    pub name: String,
}

impl VacancyDetail {
    /// Description followed by the space-joined key skill names.
    pub fn text(&self) -> String {
        let description = self.description.as_deref().unwrap_or("");
        let skills: Vec<&str> = self.key_skills.iter().map(|s| s.name.as_str()).collect();
        format!("{} {}", description, skills.join(" "))
    }
}

/// Parameters of a single search request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub area: String,
    pub page: u32,
    pub per_page: u32,
    pub experience: String,
}

impl SearchQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("text", self.text.clone()),
            ("area", self.area.clone()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("experience", self.experience.clone()),
        ]
    }
}
