use super::models::{Annotation, AnnotationClass, AnnotationUpdate, AudioClip, NewAnnotation};
use super::schema::{
    ANNOTATION_CLASS_TABLE_V_0, ANNOTATION_TABLE_V_0, AUDIO_CLIP_TABLE_V_0,
    SEED_ANNOTATION_CLASSES, VERSIONED_SCHEMAS,
};
use super::trait_def::ClipStore;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;
use walkdir::WalkDir;

/// File extensions picked up when importing clips from the media directory.
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

pub struct SqliteClipStore {
    conn: Arc<Mutex<Connection>>,
    media_path: PathBuf,
}

fn row_to_clip(row: &Row) -> rusqlite::Result<AudioClip> {
    Ok(AudioClip {
        id: row.get(0)?,
        file_path: row.get(1)?,
        annotated: row.get(2)?,
    })
}

fn row_to_annotation(row: &Row) -> rusqlite::Result<Annotation> {
    let payload: String = row.get(3)?;
    let ai_payload: Option<String> = row.get(4)?;
    Ok(Annotation {
        id: row.get(0)?,
        clip_id: row.get(1)?,
        annotated_by: row.get::<_, i64>(2)? as usize,
        payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
        ai_payload: ai_payload.and_then(|s| serde_json::from_str(&s).ok()),
        interface_variant: row.get(5)?,
        labeling_time_ms: row.get(6)?,
        created: row.get(7)?,
    })
}

const ANNOTATION_COLUMNS: &str =
    "id, clip_id, annotated_by, payload, ai_payload, interface_variant, labeling_time_ms, created";

impl SqliteClipStore {
    pub fn new<P: AsRef<Path>>(db_path: P, media_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), VERSIONED_SCHEMAS)
            .context("Failed to open clip database")?;
        let store = SqliteClipStore {
            conn: Arc::new(Mutex::new(conn)),
            media_path: media_path.as_ref().to_path_buf(),
        };
        store.seed_classes_if_empty()?;
        Ok(store)
    }

    /// Inserts the initial label taxonomy when the class table is empty.
    fn seed_classes_if_empty(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", ANNOTATION_CLASS_TABLE_V_0.name),
            [],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Ok(());
        }
        info!(
            "Seeding {} annotation classes",
            SEED_ANNOTATION_CLASSES.len()
        );
        for name in SEED_ANNOTATION_CLASSES {
            conn.execute(
                &format!(
                    "INSERT INTO {} (name) VALUES (?1)",
                    ANNOTATION_CLASS_TABLE_V_0.name
                ),
                params![name],
            )?;
        }
        Ok(())
    }

    /// Walks the media directory and registers audio files that are not in
    /// the database yet. Returns the number of newly registered clips.
    pub fn import_clips_from_media_dir(&self) -> Result<usize> {
        let mut imported = 0;
        for entry in WalkDir::new(&self.media_path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let is_audio = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !is_audio {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.media_path)
                .expect("walked entry is under media path")
                .to_string_lossy()
                .replace('\\', "/");

            if self.register_clip(&Uuid::new_v4().to_string(), &relative)? {
                debug!("Registered clip {}", relative);
                imported += 1;
            }
        }
        if imported > 0 {
            info!("Imported {} new clips from media directory", imported);
        }
        Ok(imported)
    }
}

impl ClipStore for SqliteClipStore {
    fn register_clip(&self, id: &str, file_path: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (id, file_path) VALUES (?1, ?2)",
                AUDIO_CLIP_TABLE_V_0.name
            ),
            params![id, file_path],
        )?;
        Ok(inserted > 0)
    }

    fn all_clips(&self) -> Result<Vec<AudioClip>> {
        self.clips_filtered(None)
    }

    fn clips_filtered(&self, annotated: Option<bool>) -> Result<Vec<AudioClip>> {
        let conn = self.conn.lock().unwrap();
        let where_clause = match annotated {
            None => "",
            Some(true) => " WHERE annotated > 0",
            Some(false) => " WHERE annotated = 0",
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT id, file_path, annotated FROM {}{}",
            AUDIO_CLIP_TABLE_V_0.name, where_clause
        ))?;
        let clips = stmt
            .query_map([], row_to_clip)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clips)
    }

    fn get_clip(&self, id: &str) -> Result<Option<AudioClip>> {
        let conn = self.conn.lock().unwrap();
        let clip = conn
            .query_row(
                &format!(
                    "SELECT id, file_path, annotated FROM {} WHERE id = ?1",
                    AUDIO_CLIP_TABLE_V_0.name
                ),
                params![id],
                row_to_clip,
            )
            .optional()?;
        Ok(clip)
    }

    fn find_by_path(&self, file_path: &str) -> Result<Option<AudioClip>> {
        let conn = self.conn.lock().unwrap();
        let clip = conn
            .query_row(
                &format!(
                    "SELECT id, file_path, annotated FROM {} WHERE file_path = ?1",
                    AUDIO_CLIP_TABLE_V_0.name
                ),
                params![file_path],
                row_to_clip,
            )
            .optional()?;
        Ok(clip)
    }

    fn find_eligible_candidates(
        &self,
        exclude_annotator: usize,
        quota: i64,
    ) -> Result<Vec<AudioClip>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT c.id, c.file_path, c.annotated FROM {clips} c \
             WHERE c.annotated < ?1 \
             AND NOT EXISTS (SELECT 1 FROM {annotations} a \
                             WHERE a.clip_id = c.id AND a.annotated_by = ?2)",
            clips = AUDIO_CLIP_TABLE_V_0.name,
            annotations = ANNOTATION_TABLE_V_0.name,
        ))?;
        let clips = stmt
            .query_map(params![quota, exclude_annotator as i64], row_to_clip)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clips)
    }

    fn annotation_exists(&self, clip_id: &str, annotator_id: usize) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE clip_id = ?1 AND annotated_by = ?2",
                ANNOTATION_TABLE_V_0.name
            ),
            params![clip_id, annotator_id as i64],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn clip_audio_path(&self, clip: &AudioClip) -> PathBuf {
        self.media_path.join(&clip.file_path)
    }

    fn insert_annotation(&self, new: NewAnnotation) -> Result<Option<Annotation>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let already: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE clip_id = ?1 AND annotated_by = ?2",
                ANNOTATION_TABLE_V_0.name
            ),
            params![new.clip_id, new.annotated_by as i64],
            |row| row.get(0),
        )?;
        if already > 0 {
            return Ok(None);
        }

        let id = Uuid::new_v4().to_string();
        tx.execute(
            &format!(
                "INSERT INTO {} (id, clip_id, annotated_by, payload, ai_payload, \
                 interface_variant, labeling_time_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                ANNOTATION_TABLE_V_0.name
            ),
            params![
                id,
                new.clip_id,
                new.annotated_by as i64,
                new.payload.to_string(),
                new.ai_payload.as_ref().map(|v| v.to_string()),
                new.interface_variant,
                new.labeling_time_ms,
            ],
        )
        .context("Could not insert annotation")?;

        tx.execute(
            &format!(
                "UPDATE {} SET annotated = annotated + 1 WHERE id = ?1",
                AUDIO_CLIP_TABLE_V_0.name
            ),
            params![new.clip_id],
        )?;

        let annotation = tx.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                ANNOTATION_COLUMNS, ANNOTATION_TABLE_V_0.name
            ),
            params![id],
            row_to_annotation,
        )?;

        tx.commit()?;
        Ok(Some(annotation))
    }

    fn get_annotation(&self, id: &str) -> Result<Option<Annotation>> {
        let conn = self.conn.lock().unwrap();
        let annotation = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    ANNOTATION_COLUMNS, ANNOTATION_TABLE_V_0.name
                ),
                params![id],
                row_to_annotation,
            )
            .optional()?;
        Ok(annotation)
    }

    fn update_annotation(
        &self,
        id: &str,
        annotator_id: usize,
        update: AnnotationUpdate,
    ) -> Result<Option<Annotation>> {
        let conn = self.conn.lock().unwrap();

        let mut assignments: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(payload) = &update.payload {
            assignments.push(format!("payload = ?{}", assignments.len() + 1));
            values.push(Box::new(payload.to_string()));
        }
        if let Some(ai_payload) = &update.ai_payload {
            assignments.push(format!("ai_payload = ?{}", assignments.len() + 1));
            values.push(Box::new(ai_payload.to_string()));
        }
        if let Some(interface_variant) = update.interface_variant {
            assignments.push(format!("interface_variant = ?{}", assignments.len() + 1));
            values.push(Box::new(interface_variant));
        }
        if let Some(labeling_time_ms) = update.labeling_time_ms {
            assignments.push(format!("labeling_time_ms = ?{}", assignments.len() + 1));
            values.push(Box::new(labeling_time_ms));
        }

        if !assignments.is_empty() {
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?{} AND annotated_by = ?{}",
                ANNOTATION_TABLE_V_0.name,
                assignments.join(", "),
                values.len() + 1,
                values.len() + 2,
            );
            values.push(Box::new(id.to_string()));
            values.push(Box::new(annotator_id as i64));
            let updated =
                conn.execute(&sql, rusqlite::params_from_iter(values.iter().map(|v| &**v)))?;
            if updated == 0 {
                return Ok(None);
            }
        }

        let annotation = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1 AND annotated_by = ?2",
                    ANNOTATION_COLUMNS, ANNOTATION_TABLE_V_0.name
                ),
                params![id, annotator_id as i64],
                row_to_annotation,
            )
            .optional()?;
        Ok(annotation)
    }

    fn annotations_for_clip(&self, clip_id: &str) -> Result<Vec<Annotation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE clip_id = ?1",
            ANNOTATION_COLUMNS, ANNOTATION_TABLE_V_0.name
        ))?;
        let annotations = stmt
            .query_map(params![clip_id], row_to_annotation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(annotations)
    }

    fn all_annotations(&self) -> Result<Vec<Annotation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM {annotations} a \
             JOIN {clips} c ON c.id = a.clip_id WHERE c.annotated > 0",
            cols = "a.id, a.clip_id, a.annotated_by, a.payload, a.ai_payload, \
                    a.interface_variant, a.labeling_time_ms, a.created",
            annotations = ANNOTATION_TABLE_V_0.name,
            clips = AUDIO_CLIP_TABLE_V_0.name,
        ))?;
        let annotations = stmt
            .query_map([], row_to_annotation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(annotations)
    }

    fn all_classes(&self) -> Result<Vec<AnnotationClass>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name FROM {} ORDER BY id",
            ANNOTATION_CLASS_TABLE_V_0.name
        ))?;
        let classes = stmt
            .query_map([], |row| {
                Ok(AnnotationClass {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(classes)
    }

    fn class_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT name FROM {} ORDER BY id",
            ANNOTATION_CLASS_TABLE_V_0.name
        ))?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn add_class(&self, name: &str) -> Result<Option<AnnotationClass>> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (name) VALUES (?1)",
                ANNOTATION_CLASS_TABLE_V_0.name
            ),
            params![name],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        let class = conn.query_row(
            &format!(
                "SELECT id, name FROM {} WHERE name = ?1",
                ANNOTATION_CLASS_TABLE_V_0.name
            ),
            params![name],
            |row| {
                Ok(AnnotationClass {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;
        Ok(Some(class))
    }
}
