//! Core data model for the defect ledger
//!
//! One tracked defect is a `DefectRecord`: twelve spreadsheet-backed fields,
//! a last-updated timestamp and a list of structured comments. Attachments
//! are owned by a record but stored under their own key, so they live in
//! their own type here.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical display timestamp: two-digit month/day, four-digit year,
/// comma, 12-hour clock with seconds.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// Render a timestamp in the canonical display format.
pub fn format_timestamp(t: NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Sortable companion format kept on bulk-imported comments.
pub fn format_sort_date(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// The twelve spreadsheet-backed fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Application,
    BusinessFunction,
    IncidentId,
    Description,
    DateReported,
    Status,
    Environment,
    RootCause,
    DetailedComments,
    QaCorrectiveAction,
    CorrectiveStatus,
    CorrectiveOwner,
}

impl Field {
    /// All fields, in the order they appear as export columns.
    pub const ALL: [Field; 12] = [
        Field::Application,
        Field::BusinessFunction,
        Field::IncidentId,
        Field::Description,
        Field::DateReported,
        Field::Status,
        Field::Environment,
        Field::RootCause,
        Field::DetailedComments,
        Field::QaCorrectiveAction,
        Field::CorrectiveStatus,
        Field::CorrectiveOwner,
    ];

    /// Keyword matched case-insensitively against uploaded column headers.
    pub fn keyword(self) -> &'static str {
        match self {
            Field::Application => "application",
            Field::BusinessFunction => "business function",
            Field::IncidentId => "incident",
            Field::Description => "description",
            Field::DateReported => "date reported",
            Field::Status => "bug status",
            Field::Environment => "environment",
            Field::RootCause => "root cause",
            Field::DetailedComments => "detailed comments",
            Field::QaCorrectiveAction => "qa corrective action",
            Field::CorrectiveStatus => "corrective action status",
            Field::CorrectiveOwner => "corrective action owner",
        }
    }

    /// Stable field name, used as the configuration label key.
    pub fn name(self) -> &'static str {
        match self {
            Field::Application => "application",
            Field::BusinessFunction => "businessFunction",
            Field::IncidentId => "incidentId",
            Field::Description => "bugDescription",
            Field::DateReported => "dateReported",
            Field::Status => "bugStatus",
            Field::Environment => "environment",
            Field::RootCause => "rootCause",
            Field::DetailedComments => "detailedComments",
            Field::QaCorrectiveAction => "qaCorrectiveAction",
            Field::CorrectiveStatus => "correctiveStatus",
            Field::CorrectiveOwner => "correctiveOwner",
        }
    }

    /// Default display label, used as the export column header.
    pub fn label(self) -> &'static str {
        match self {
            Field::Application => "Application",
            Field::BusinessFunction => "Business Function",
            Field::IncidentId => "Incident/Bug ID",
            Field::Description => "Bug Description",
            Field::DateReported => "Date Reported",
            Field::Status => "Bug Status",
            Field::Environment => "Environment",
            Field::RootCause => "High Level Root Cause",
            Field::DetailedComments => "Detailed Comments",
            Field::QaCorrectiveAction => "QA Corrective Action",
            Field::CorrectiveStatus => "Corrective Action Status",
            Field::CorrectiveOwner => "Corrective Action Owner",
        }
    }

    /// Read this field's value from a record.
    pub fn value_of(self, record: &DefectRecord) -> &str {
        match self {
            Field::Application => &record.application,
            Field::BusinessFunction => &record.business_function,
            Field::IncidentId => &record.incident_id,
            Field::Description => &record.description,
            Field::DateReported => &record.date_reported,
            Field::Status => &record.status,
            Field::Environment => &record.environment,
            Field::RootCause => &record.root_cause,
            Field::DetailedComments => &record.detailed_comments,
            Field::QaCorrectiveAction => &record.qa_corrective_action,
            Field::CorrectiveStatus => &record.corrective_status,
            Field::CorrectiveOwner => &record.corrective_owner,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The six fields backed by user-extensible option lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionField {
    Application,
    BusinessFunction,
    Environment,
    RootCause,
    CorrectiveStatus,
    CorrectiveOwner,
}

impl OptionField {
    pub const ALL: [OptionField; 6] = [
        OptionField::Application,
        OptionField::BusinessFunction,
        OptionField::Environment,
        OptionField::RootCause,
        OptionField::CorrectiveStatus,
        OptionField::CorrectiveOwner,
    ];

    /// Persistence key for this field's option list.
    pub fn storage_key(self) -> &'static str {
        match self {
            OptionField::Application => "options_application",
            OptionField::BusinessFunction => "options_businessFunction",
            OptionField::Environment => "options_environment",
            OptionField::RootCause => "options_rootCause",
            OptionField::CorrectiveStatus => "options_correctiveStatus",
            OptionField::CorrectiveOwner => "options_correctiveOwner",
        }
    }

    pub fn label(self) -> &'static str {
        self.field().label()
    }

    /// The record field this option list constrains.
    pub fn field(self) -> Field {
        match self {
            OptionField::Application => Field::Application,
            OptionField::BusinessFunction => Field::BusinessFunction,
            OptionField::Environment => Field::Environment,
            OptionField::RootCause => Field::RootCause,
            OptionField::CorrectiveStatus => Field::CorrectiveStatus,
            OptionField::CorrectiveOwner => Field::CorrectiveOwner,
        }
    }

    /// Read the constrained value from a record.
    pub fn value_of(self, record: &DefectRecord) -> &str {
        self.field().value_of(record)
    }

    /// Parse a CLI-facing field name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "application" => Some(OptionField::Application),
            "business-function" | "businessfunction" => Some(OptionField::BusinessFunction),
            "environment" => Some(OptionField::Environment),
            "root-cause" | "rootcause" => Some(OptionField::RootCause),
            "corrective-status" | "correctivestatus" => Some(OptionField::CorrectiveStatus),
            "corrective-owner" | "correctiveowner" => Some(OptionField::CorrectiveOwner),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One structured comment on a defect record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Free-text body
    pub text: String,
    /// Display timestamp in the canonical format
    pub time: String,
    /// Original date string, kept only on bulk-imported comments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_date: Option<String>,
    /// Lexicographically sortable date, kept only on bulk-imported comments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_date: Option<String>,
}

impl Comment {
    /// A comment posted directly by the user at the given time.
    pub fn posted(text: &str, at: NaiveDateTime) -> Self {
        Self {
            text: text.to_string(),
            time: format_timestamp(at),
            original_date: None,
            sort_date: None,
        }
    }

    /// A comment recovered from a legacy comment blob during import.
    pub fn imported(text: &str, at: NaiveDateTime) -> Self {
        let time = format_timestamp(at);
        Self {
            text: text.to_string(),
            time: time.clone(),
            original_date: Some(time),
            sort_date: Some(format_sort_date(at)),
        }
    }
}

/// One tracked defect with its metadata and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectRecord {
    pub application: String,
    pub business_function: String,
    /// Unique key within the active record universe
    pub incident_id: String,
    #[serde(rename = "bugDescription")]
    pub description: String,
    /// Free text, original format preserved
    pub date_reported: String,
    #[serde(rename = "bugStatus")]
    pub status: String,
    pub environment: String,
    pub root_cause: String,
    /// Raw multi-line comment blob as it arrived in the spreadsheet
    pub detailed_comments: String,
    pub qa_corrective_action: String,
    #[serde(rename = "correctiveStatus")]
    pub corrective_status: String,
    #[serde(rename = "correctiveOwner")]
    pub corrective_owner: String,
    pub last_updated: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Raw field values for a record under construction.
#[derive(Debug, Clone, Default)]
pub struct NewDefect {
    pub application: String,
    pub business_function: String,
    pub incident_id: String,
    pub description: String,
    pub date_reported: String,
    pub status: String,
    pub environment: String,
    pub root_cause: String,
    pub detailed_comments: String,
    pub qa_corrective_action: String,
    pub corrective_status: String,
    pub corrective_owner: String,
    pub last_updated: String,
    pub comments: Vec<Comment>,
}

impl DefectRecord {
    /// Build a record from raw field values.
    ///
    /// Returns `None` when both the incident id and the description are
    /// empty: such a row is not a defect entry. An empty corrective-action
    /// owner becomes "Unassigned".
    pub fn new(fields: NewDefect) -> Option<Self> {
        if fields.incident_id.is_empty() && fields.description.is_empty() {
            return None;
        }

        let corrective_owner = if fields.corrective_owner.is_empty() {
            "Unassigned".to_string()
        } else {
            fields.corrective_owner
        };

        Some(Self {
            application: fields.application,
            business_function: fields.business_function,
            incident_id: fields.incident_id,
            description: fields.description,
            date_reported: fields.date_reported,
            status: fields.status,
            environment: fields.environment,
            root_cause: fields.root_cause,
            detailed_comments: fields.detailed_comments,
            qa_corrective_action: fields.qa_corrective_action,
            corrective_status: fields.corrective_status,
            corrective_owner,
            last_updated: fields.last_updated,
            comments: fields.comments,
        })
    }

    /// Whether the corrective action on this record is still open.
    pub fn is_open(&self) -> bool {
        self.corrective_status.eq_ignore_ascii_case("open")
    }
}

/// Attachments above this size are rejected.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types accepted as attachments: images, Office documents, CSV, PDF.
pub const ALLOWED_ATTACHMENT_TYPES: [&str; 11] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "text/csv",
    "application/pdf",
];

/// Why an attachment was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("file too large: {size} bytes (max {MAX_ATTACHMENT_BYTES})")]
    TooLarge { size: u64 },

    #[error("file type not supported: {mime}")]
    UnsupportedType { mime: String },

    #[error("attachment payload is not valid base64")]
    CorruptPayload,
}

/// One file attached to a defect record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub upload_date: String,
    /// Base64-encoded payload
    pub data: String,
}

impl Attachment {
    /// Validate and encode an uploaded file.
    pub fn from_bytes(
        name: &str,
        mime_type: &str,
        bytes: &[u8],
        uploaded: NaiveDateTime,
    ) -> Result<Self, AttachmentError> {
        use base64::{engine::general_purpose, Engine as _};

        if !ALLOWED_ATTACHMENT_TYPES.contains(&mime_type) {
            return Err(AttachmentError::UnsupportedType {
                mime: mime_type.to_string(),
            });
        }

        let size = bytes.len() as u64;
        if size > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge { size });
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            upload_date: format_timestamp(uploaded),
            data: general_purpose::STANDARD.encode(bytes),
        })
    }

    /// Decode the stored payload back into bytes.
    pub fn payload(&self) -> Result<Vec<u8>, AttachmentError> {
        use base64::{engine::general_purpose, Engine as _};

        general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|_| AttachmentError::CorruptPayload)
    }

    /// Guess a MIME type from a file name, for CLI uploads.
    pub fn mime_from_name(name: &str) -> Option<&'static str> {
        let ext = name.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "jpg" => Some("image/jpg"),
            "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            "xls" => Some("application/vnd.ms-excel"),
            "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            "doc" => Some("application/msword"),
            "csv" => Some("text/csv"),
            "pdf" => Some("application/pdf"),
            _ => None,
        }
    }
}
