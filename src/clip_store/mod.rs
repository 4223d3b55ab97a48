mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{Annotation, AnnotationClass, AnnotationUpdate, AudioClip, NewAnnotation};
pub use store::SqliteClipStore;
pub use trait_def::ClipStore;
