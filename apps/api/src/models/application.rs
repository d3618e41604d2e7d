use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One submitted job application, the sole persisted entity.
/// Wire keys are camelCase, matching the JSON documents stored in the
/// JSONB columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRow {
    pub id: Uuid,
    pub role: String,
    pub location: String,
    pub personal_info: Json<PersonalInfo>,
    pub employment_status: Option<String>,
    pub employment_history: Option<Json<EmploymentHistory>>,
    pub documents: Json<DocumentSet>,
    pub offer_letter: Option<Json<DocumentMeta>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub father_name: String,
    pub father_phone: String,
}

/// Prior-employment record, present only for experienced applicants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentHistory {
    pub company_name: String,
    pub location: String,
    pub experience: String,
}

/// Metadata for one stored upload. `stored_path` is the public
/// `uploads/...` path the file is served under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub original_name: String,
    pub stored_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

/// The five intake upload slots. Absent slots are omitted from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc: Option<DocumentMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter: Option<DocumentMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation: Option<DocumentMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgrad: Option<DocumentMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relieving: Option<DocumentMeta>,
}

impl DocumentSet {
    pub fn set(&mut self, category: DocumentCategory, meta: DocumentMeta) {
        let slot = match category {
            DocumentCategory::Ssc => &mut self.ssc,
            DocumentCategory::Inter => &mut self.inter,
            DocumentCategory::Graduation => &mut self.graduation,
            DocumentCategory::Postgrad => &mut self.postgrad,
            DocumentCategory::Relieving => &mut self.relieving,
        };
        *slot = Some(meta);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentMeta> {
        [
            &self.ssc,
            &self.inter,
            &self.graduation,
            &self.postgrad,
            &self.relieving,
        ]
        .into_iter()
        .flatten()
    }
}

/// The fixed set of intake document slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentCategory {
    Ssc,
    Inter,
    Graduation,
    Postgrad,
    Relieving,
}

impl DocumentCategory {
    /// Maps a multipart field name to its slot.
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "ssc" => Some(DocumentCategory::Ssc),
            "inter" => Some(DocumentCategory::Inter),
            "graduation" => Some(DocumentCategory::Graduation),
            "postgrad" => Some(DocumentCategory::Postgrad),
            "relieving" => Some(DocumentCategory::Relieving),
            _ => None,
        }
    }
}

/// Lifecycle marker of an application. Every value is reachable from
/// every other; there is no transition restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Insert payload for a validated submission.
#[derive(Debug)]
pub struct NewApplication {
    pub role: String,
    pub location: String,
    pub personal_info: PersonalInfo,
    pub employment_status: Option<String>,
    pub employment_history: Option<EmploymentHistory>,
    pub documents: DocumentSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> DocumentMeta {
        DocumentMeta {
            original_name: name.to_string(),
            stored_path: format!("uploads/x-{name}"),
            mime_type: "application/pdf".to_string(),
            size_bytes: 10,
        }
    }

    #[test]
    fn test_status_parse_accepts_the_three_values() {
        assert_eq!(ApplicationStatus::parse("pending"), Some(ApplicationStatus::Pending));
        assert_eq!(ApplicationStatus::parse("approved"), Some(ApplicationStatus::Approved));
        assert_eq!(ApplicationStatus::parse("rejected"), Some(ApplicationStatus::Rejected));
    }

    #[test]
    fn test_status_parse_rejects_anything_else() {
        assert_eq!(ApplicationStatus::parse("archived"), None);
        assert_eq!(ApplicationStatus::parse("Approved"), None);
        assert_eq!(ApplicationStatus::parse(""), None);
    }

    #[test]
    fn test_empty_document_set_serializes_to_empty_object() {
        let json = serde_json::to_value(DocumentSet::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_document_set_keeps_only_filled_slots() {
        let mut docs = DocumentSet::default();
        docs.set(DocumentCategory::Ssc, meta("ssc.pdf"));
        docs.set(DocumentCategory::Relieving, meta("relieving.pdf"));

        let json = serde_json::to_value(&docs).unwrap();
        assert!(json.get("ssc").is_some());
        assert!(json.get("relieving").is_some());
        assert!(json.get("inter").is_none());
        assert_eq!(docs.iter().count(), 2);
    }

    #[test]
    fn test_personal_info_uses_camel_case_keys() {
        let info = PersonalInfo {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555".to_string(),
            gender: "female".to_string(),
            father_name: "John Doe".to_string(),
            father_phone: "556".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["fullName"], "Jane Doe");
        assert_eq!(json["fatherPhone"], "556");
    }

    #[test]
    fn test_category_from_field_name() {
        assert_eq!(DocumentCategory::from_field_name("postgrad"), Some(DocumentCategory::Postgrad));
        assert_eq!(DocumentCategory::from_field_name("offerLetter"), None);
        assert_eq!(DocumentCategory::from_field_name("role"), None);
    }
}
