use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

/// V 0
pub const AUDIO_CLIP_TABLE_V_0: Table = Table {
    name: "audio_clip",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "file_path",
            &SqlType::Text,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "annotated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_audio_clip_file_path", "file_path")],
};

pub const ANNOTATION_TABLE_V_0: Table = Table {
    name: "annotation",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true,
            is_unique = true
        ),
        sqlite_column!(
            "clip_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "audio_clip",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("annotated_by", &SqlType::Integer, non_null = true),
        sqlite_column!("payload", &SqlType::Text, non_null = true),
        sqlite_column!("ai_payload", &SqlType::Text),
        sqlite_column!("interface_variant", &SqlType::Integer),
        sqlite_column!("labeling_time_ms", &SqlType::Integer),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["clip_id", "annotated_by"]],
    indices: &[("idx_annotation_clip_id", "clip_id")],
};

pub const ANNOTATION_CLASS_TABLE_V_0: Table = Table {
    name: "annotation_class",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
    ],
    unique_constraints: &[],
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        AUDIO_CLIP_TABLE_V_0,
        ANNOTATION_TABLE_V_0,
        ANNOTATION_CLASS_TABLE_V_0,
    ],
    migration: None,
}];

/// The label taxonomy the project started with, inserted when the class
/// table is empty.
pub const SEED_ANNOTATION_CLASSES: &[&str] = &[
    "Unclear",
    "Not an option",
    "Boat Engine",
    "Boat Horn",
    "Car Engine",
    "Car Horn",
    "Children Playing",
    "Church Bell",
    "Conversation",
    "Crying",
    "Dog Bark",
    "Helicopter",
    "Lightning Strike",
    "Rain",
    "Scooter",
    "Seagull Cry",
    "Storm",
    "Tourist Chatter",
    "Wave Crash",
    "Wind",
    "Yelling",
];
