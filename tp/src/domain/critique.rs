//! Critic reply schema

use serde::{Deserialize, Serialize};

use crate::repair::Schema;

/// One problem the critic found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IssueWire")]
pub struct Issue {
    /// weather, budget, pace, timing, alternative, hallucination...
    #[serde(rename = "type")]
    pub category: String,
    pub description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IssueWire {
    Full {
        #[serde(default, rename = "type")]
        category: String,
        #[serde(default)]
        description: String,
    },
    Text(String),
}

impl From<IssueWire> for Issue {
    fn from(wire: IssueWire) -> Self {
        match wire {
            IssueWire::Full { category, description } => Issue { category, description },
            IssueWire::Text(description) => Issue {
                category: "other".to_string(),
                description,
            },
        }
    }
}

impl Issue {
    /// "[category] description"
    pub fn log_line(&self) -> String {
        format!("[{}] {}", self.category, self.description)
    }
}

/// Outcome of a critique request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CritiqueResult {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl CritiqueResult {
    /// Nothing to correct
    pub fn accepts(&self) -> bool {
        self.is_valid && self.issues.is_empty()
    }
}

impl Schema for CritiqueResult {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_without_issues_accepts() {
        let c = CritiqueResult::from_value(json!({"is_valid": true})).unwrap();
        assert!(c.accepts());
        assert!(c.suggestions.is_empty());
    }

    #[test]
    fn test_missing_is_valid_means_invalid() {
        let c = CritiqueResult::from_value(json!({"issues": []})).unwrap();
        assert!(!c.accepts());
    }

    #[test]
    fn test_valid_with_issues_does_not_accept() {
        let c = CritiqueResult::from_value(json!({
            "is_valid": true,
            "issues": [{"type": "pace", "description": "too busy"}]
        }))
        .unwrap();
        assert!(!c.accepts());
    }

    #[test]
    fn test_issue_forms() {
        let c = CritiqueResult::from_value(json!({
            "is_valid": false,
            "issues": [
                {"type": "weather", "description": "Hike on a rainy day"},
                "No indoor alternative on day 2"
            ],
            "suggestions": ["Swap the hike for a museum"]
        }))
        .unwrap();
        assert_eq!(c.issues[0].log_line(), "[weather] Hike on a rainy day");
        assert_eq!(c.issues[1].category, "other");
        assert_eq!(c.issues[1].description, "No indoor alternative on day 2");
    }

    #[test]
    fn test_issue_serializes_with_type_key() {
        let issue = Issue {
            category: "budget".to_string(),
            description: "Too expensive".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({"type": "budget", "description": "Too expensive"})
        );
    }
}
