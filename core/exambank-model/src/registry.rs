//! The entity registry: one schema, collection and key strategy per kind.
//!
//! Adding a kind here is all backup/restore needs; they discover
//! collections from the store, not from a compiled-in list.

use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::validators;
use crate::value::Value;
use std::fmt;
use std::sync::LazyLock;

/// An index declared on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    /// Top-level field the index is built from.
    pub key_path: &'static str,
    pub unique: bool,
}

/// Every kind of record the application stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Question,
    Setting,
    Examiner,
    ExaminerAssignment,
    SyllabusSection,
    ReviewPanel,
    UserActivityLog,
    Feedback,
}

const QUESTION_TYPES: &[&str] = &["multiple_choice", "true_false", "short_answer", "essay"];
const DIFFICULTIES: &[&str] = &["easy", "medium", "hard"];
const ASSIGNMENT_STATUSES: &[&str] = &["pending", "in_progress", "submitted", "approved"];
const PANEL_ROLES: &[&str] = &["chair", "reviewer", "observer"];
const FEEDBACK_STATUSES: &[&str] = &["open", "resolved"];

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        Self::Question,
        Self::Setting,
        Self::Examiner,
        Self::ExaminerAssignment,
        Self::SyllabusSection,
        Self::ReviewPanel,
        Self::UserActivityLog,
        Self::Feedback,
    ];

    /// Name of the backing collection.
    pub const fn collection_name(self) -> &'static str {
        match self {
            Self::Question => "questions",
            Self::Setting => "settings",
            Self::Examiner => "examiners",
            Self::ExaminerAssignment => "examiner_assignments",
            Self::SyllabusSection => "syllabus_sections",
            Self::ReviewPanel => "review_panels",
            Self::UserActivityLog => "user_activity_logs",
            Self::Feedback => "feedback",
        }
    }

    /// Looks up the kind stored in `collection`.
    pub fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection_name() == collection)
    }

    /// Field holding the primary key.
    pub const fn key_path(self) -> &'static str {
        match self {
            Self::Setting => "key",
            _ => "id",
        }
    }

    /// Whether the store assigns sequential keys.
    pub const fn auto_increment(self) -> bool {
        !matches!(self, Self::Setting)
    }

    pub const fn indexes(self) -> &'static [IndexDef] {
        match self {
            Self::Question => &[IndexDef {
                name: "section_id",
                key_path: "section_id",
                unique: false,
            }],
            Self::Examiner => &[IndexDef {
                name: "employee_id",
                key_path: "employee_id",
                unique: true,
            }],
            Self::ExaminerAssignment => &[IndexDef {
                name: "examiner_id",
                key_path: "examiner_id",
                unique: false,
            }],
            Self::SyllabusSection => &[IndexDef {
                name: "code",
                key_path: "code",
                unique: true,
            }],
            _ => &[],
        }
    }

    /// Soft-delete flag, for kinds that archive instead of deleting.
    pub const fn archive_flag(self) -> Option<&'static str> {
        match self {
            Self::Question | Self::Examiner | Self::SyllabusSection => Some("is_archived"),
            _ => None,
        }
    }

    /// Field stamped with the modification time on updates.
    pub const fn updated_at_field(self) -> Option<&'static str> {
        match self {
            Self::Question | Self::Setting | Self::Examiner | Self::ReviewPanel => {
                Some("updated_at")
            }
            _ => None,
        }
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            Self::Question => &*QUESTION,
            Self::Setting => &*SETTING,
            Self::Examiner => &*EXAMINER,
            Self::ExaminerAssignment => &*EXAMINER_ASSIGNMENT,
            Self::SyllabusSection => &*SYLLABUS_SECTION,
            Self::ReviewPanel => &*REVIEW_PANEL,
            Self::UserActivityLog => &*USER_ACTIVITY_LOG,
            Self::Feedback => &*FEEDBACK,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

static QUESTION: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::nullable("id"),
        FieldSpec::nullable("section_id"),
        FieldSpec::text("subject", ""),
        FieldSpec::required("question_text", FieldKind::Primitive)
            .validated(validators::non_empty_string),
        FieldSpec::enumeration("question_type", QUESTION_TYPES, "multiple_choice"),
        FieldSpec::enumeration("difficulty", DIFFICULTIES, "medium"),
        FieldSpec::with_default("marks", FieldKind::Primitive, 1)
            .validated(validators::non_negative_number),
        FieldSpec::list("options")
            .validated(validators::is_array)
            .items(Schema::new(vec![
                FieldSpec::text("text", ""),
                FieldSpec::flag("is_correct", false),
                FieldSpec::blob("image"),
            ])),
        FieldSpec::nullable("answer"),
        FieldSpec::blob("image"),
        FieldSpec::list("tags").validated(validators::is_array),
        FieldSpec::flag("is_archived", false),
        FieldSpec::timestamp("created_at"),
        FieldSpec::timestamp("updated_at"),
    ])
});

static SETTING: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::required("key", FieldKind::Primitive).validated(validators::non_empty_string),
        FieldSpec::nullable("value"),
        FieldSpec::timestamp("updated_at"),
    ])
});

static EXAMINER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::nullable("id"),
        FieldSpec::required("employee_id", FieldKind::Primitive)
            .validated(validators::identifier),
        FieldSpec::required("name", FieldKind::Primitive).validated(validators::non_empty_string),
        FieldSpec::text("email", "").validated(validators::email_or_empty),
        FieldSpec::text("phone", ""),
        FieldSpec::text("department", ""),
        FieldSpec::list("subjects").validated(validators::is_array),
        FieldSpec::blob("photo"),
        FieldSpec::flag("is_archived", false),
        FieldSpec::timestamp("created_at"),
        FieldSpec::timestamp("updated_at"),
    ])
});

static EXAMINER_ASSIGNMENT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::nullable("id"),
        FieldSpec::required("examiner_id", FieldKind::Primitive)
            .validated(validators::identifier),
        FieldSpec::nullable("section_id"),
        FieldSpec::list("question_ids").validated(validators::is_array),
        FieldSpec::enumeration("status", ASSIGNMENT_STATUSES, "pending"),
        FieldSpec::timestamp("assigned_at"),
        FieldSpec::nullable("due_at"),
        FieldSpec::text("notes", ""),
    ])
});

static SYLLABUS_SECTION: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::nullable("id"),
        FieldSpec::required("code", FieldKind::Primitive).validated(validators::non_empty_string),
        FieldSpec::required("title", FieldKind::Primitive).validated(validators::non_empty_string),
        FieldSpec::text("description", ""),
        FieldSpec::nullable("parent_id"),
        FieldSpec::with_default("position", FieldKind::Primitive, 0)
            .validated(validators::non_negative_int),
        FieldSpec::list("topics").items(Schema::new(vec![
            FieldSpec::text("name", ""),
            FieldSpec::with_default("weight", FieldKind::Primitive, 1)
                .validated(validators::non_negative_number),
        ])),
        FieldSpec::flag("is_archived", false),
    ])
});

static REVIEW_PANEL: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::nullable("id"),
        FieldSpec::required("name", FieldKind::Primitive).validated(validators::non_empty_string),
        FieldSpec::list("members").items(Schema::new(vec![
            FieldSpec::nullable("examiner_id"),
            FieldSpec::enumeration("role", PANEL_ROLES, "reviewer"),
        ])),
        FieldSpec::list("section_ids").validated(validators::is_array),
        FieldSpec::flag("is_active", true),
        FieldSpec::timestamp("created_at"),
        FieldSpec::timestamp("updated_at"),
    ])
});

static USER_ACTIVITY_LOG: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::nullable("id"),
        FieldSpec::required("action", FieldKind::Primitive).validated(validators::non_empty_string),
        FieldSpec::nullable("entity_type"),
        FieldSpec::nullable("entity_id"),
        FieldSpec::with_default("details", FieldKind::Object, Value::Object(Default::default()))
            .validated(validators::is_object),
        FieldSpec::timestamp("timestamp"),
    ])
});

static FEEDBACK: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        FieldSpec::nullable("id"),
        FieldSpec::nullable("question_id"),
        FieldSpec::nullable("rating").validated(validators::rating_or_null),
        FieldSpec::text("comment", ""),
        FieldSpec::blob("screenshot"),
        FieldSpec::enumeration("status", FEEDBACK_STATUSES, "open"),
        FieldSpec::timestamp("created_at"),
    ])
});
