use axum::extract::multipart::Field;
use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;
use crate::models::application::{
    DocumentCategory, EmploymentHistory, NewApplication, PersonalInfo,
};

/// Per-file size cap.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field name the offer-letter endpoint expects.
pub const OFFER_LETTER_FIELD: &str = "offerLetter";

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpeg", "jpg", "png"];
const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
];

/// One upload read from the multipart stream, held in memory until
/// validation passes and the row is ready to reference it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Raw intake form as drained from the multipart stream. Uploads are
/// screened (type + size) as they are read; nothing touches disk here.
#[derive(Debug, Default)]
pub struct Submission {
    role: Option<String>,
    location: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    gender: Option<String>,
    father_name: Option<String>,
    father_phone: Option<String>,
    employment_status: Option<String>,
    company_name: Option<String>,
    company_location: Option<String>,
    experience: Option<String>,
    files: Vec<(DocumentCategory, Upload)>,
}

pub async fn parse_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(category) = DocumentCategory::from_field_name(&name) {
            if submission.files.iter().any(|(c, _)| *c == category) {
                return Err(AppError::Validation(format!(
                    "Only one file is accepted for '{name}'"
                )));
            }
            let upload = read_upload(field).await?;
            validate_upload(&upload)?;
            submission.files.push((category, upload));
        } else {
            let value = field.text().await.map_err(|e| {
                AppError::Validation(format!("Invalid value for field '{name}': {e}"))
            })?;
            submission.set_field(&name, value);
        }
    }

    Ok(submission)
}

/// Reads the single `offerLetter` file from the multipart stream.
pub async fn parse_offer_letter(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some(OFFER_LETTER_FIELD) {
            let upload = read_upload(field).await?;
            validate_upload(&upload)?;
            return Ok(upload);
        }
    }
    Err(AppError::Validation("No file uploaded".to_string()))
}

async fn next_field<'a>(
    multipart: &'a mut Multipart,
) -> Result<Option<Field<'a>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))
}

async fn read_upload(field: Field<'_>) -> Result<Upload, AppError> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(|e| {
        AppError::Validation(format!("Failed to read uploaded file: {e}"))
    })?;
    Ok(Upload {
        original_name,
        content_type,
        bytes,
    })
}

/// Screens an upload against the extension/MIME allowlist and the size
/// cap, before it ever reaches the store.
pub fn validate_upload(upload: &Upload) -> Result<(), AppError> {
    let extension = std::path::Path::new(&upload.original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let extension_ok = extension
        .as_deref()
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e));
    let mime_ok =
        ALLOWED_MIME_TYPES.contains(&upload.content_type.to_ascii_lowercase().as_str());

    if !extension_ok || !mime_ok {
        return Err(AppError::Validation(
            "Only PDF, JPG, and PNG files are allowed".to_string(),
        ));
    }

    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "File '{}' exceeds the 5MB size limit",
            upload.original_name
        )));
    }

    Ok(())
}

impl Submission {
    fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "role" => &mut self.role,
            "location" => &mut self.location,
            "fullName" => &mut self.full_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "gender" => &mut self.gender,
            "fatherName" => &mut self.father_name,
            "fatherPhone" => &mut self.father_phone,
            "employmentStatus" => &mut self.employment_status,
            "companyName" => &mut self.company_name,
            "companyLocation" => &mut self.company_location,
            "experience" => &mut self.experience,
            _ => return, // unknown text fields are ignored
        };
        *slot = Some(value);
    }

    /// Checks the eight required fields and assembles the insert payload.
    /// Employment history is kept only for experienced applicants.
    pub fn validate(self) -> Result<(NewApplication, Vec<(DocumentCategory, Upload)>), AppError> {
        let (
            Some(role),
            Some(location),
            Some(full_name),
            Some(email),
            Some(phone),
            Some(gender),
            Some(father_name),
            Some(father_phone),
        ) = (
            non_empty(self.role),
            non_empty(self.location),
            non_empty(self.full_name),
            non_empty(self.email),
            non_empty(self.phone),
            non_empty(self.gender),
            non_empty(self.father_name),
            non_empty(self.father_phone),
        )
        else {
            return Err(AppError::Validation(
                "All required fields must be provided".to_string(),
            ));
        };

        let employment_history = match self.employment_status.as_deref() {
            Some("experienced") => Some(EmploymentHistory {
                company_name: self.company_name.unwrap_or_default(),
                location: self.company_location.unwrap_or_default(),
                experience: self.experience.unwrap_or_default(),
            }),
            _ => None,
        };

        let application = NewApplication {
            role,
            location,
            personal_info: PersonalInfo {
                full_name,
                email,
                phone,
                gender,
                father_name,
                father_phone,
            },
            employment_status: self.employment_status,
            employment_history,
            documents: Default::default(),
        };

        Ok((application, self.files))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: &str, len: usize) -> Upload {
        Upload {
            original_name: name.to_string(),
            content_type: mime.to_string(),
            bytes: Bytes::from(vec![0u8; len]),
        }
    }

    fn filled_submission() -> Submission {
        let mut s = Submission::default();
        for (name, value) in [
            ("role", "Backend Engineer"),
            ("location", "Hyderabad"),
            ("fullName", "Jane Doe"),
            ("email", "jane@example.com"),
            ("phone", "9999999999"),
            ("gender", "female"),
            ("fatherName", "John Doe"),
            ("fatherPhone", "8888888888"),
        ] {
            s.set_field(name, value.to_string());
        }
        s
    }

    #[test]
    fn test_validate_upload_accepts_allowed_types() {
        assert!(validate_upload(&upload("cv.pdf", "application/pdf", 100)).is_ok());
        assert!(validate_upload(&upload("scan.PNG", "image/png", 100)).is_ok());
        assert!(validate_upload(&upload("photo.jpg", "image/jpeg", 100)).is_ok());
    }

    #[test]
    fn test_validate_upload_rejects_disallowed_extension() {
        let err = validate_upload(&upload("notes.txt", "text/plain", 10)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg)
            if msg == "Only PDF, JPG, and PNG files are allowed"));
    }

    #[test]
    fn test_validate_upload_requires_extension_and_mime_to_agree() {
        // extension says pdf, content type says text
        assert!(validate_upload(&upload("cv.pdf", "text/plain", 10)).is_err());
        // content type says pdf, extension says exe
        assert!(validate_upload(&upload("cv.exe", "application/pdf", 10)).is_err());
        // no extension at all
        assert!(validate_upload(&upload("cv", "application/pdf", 10)).is_err());
    }

    #[test]
    fn test_validate_upload_rejects_oversized_file() {
        let err = validate_upload(&upload("big.pdf", "application/pdf", MAX_UPLOAD_BYTES + 1))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("5MB")));
        assert!(validate_upload(&upload("ok.pdf", "application/pdf", MAX_UPLOAD_BYTES)).is_ok());
    }

    #[test]
    fn test_validate_passes_with_all_required_fields() {
        let (application, files) = filled_submission().validate().unwrap();
        assert_eq!(application.role, "Backend Engineer");
        assert_eq!(application.personal_info.email, "jane@example.com");
        assert!(application.employment_history.is_none());
        assert!(files.is_empty());
    }

    #[test]
    fn test_validate_rejects_missing_required_field() {
        let mut s = filled_submission();
        s.email = None;
        let err = s.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg)
            if msg == "All required fields must be provided"));
    }

    #[test]
    fn test_validate_rejects_empty_required_field() {
        let mut s = filled_submission();
        s.phone = Some(String::new());
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_employment_history_kept_for_experienced() {
        let mut s = filled_submission();
        s.set_field("employmentStatus", "experienced".to_string());
        s.set_field("companyName", "Acme".to_string());
        s.set_field("companyLocation", "Pune".to_string());
        s.set_field("experience", "3 years".to_string());

        let (application, _) = s.validate().unwrap();
        let history = application.employment_history.unwrap();
        assert_eq!(history.company_name, "Acme");
        assert_eq!(history.location, "Pune");
        assert_eq!(history.experience, "3 years");
    }

    #[test]
    fn test_employment_history_dropped_for_fresher() {
        let mut s = filled_submission();
        s.set_field("employmentStatus", "fresher".to_string());
        s.set_field("companyName", "Acme".to_string());

        let (application, _) = s.validate().unwrap();
        assert!(application.employment_history.is_none());
        assert_eq!(application.employment_status.as_deref(), Some("fresher"));
    }

    #[test]
    fn test_unknown_text_fields_are_ignored() {
        let mut s = filled_submission();
        s.set_field("unexpected", "value".to_string());
        assert!(s.validate().is_ok());
    }
}
