use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::models::{PhotoKind, PhotoRecord};
use crate::services::local_store::{LocalStore, StoreKey};

#[derive(Debug, Clone, Deserialize)]
pub struct NewPhoto {
    #[serde(rename = "type")]
    pub kind: PhotoKind,
    pub image: String,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn add(
    store: &LocalStore,
    booking_id: &str,
    photo: NewPhoto,
    now: NaiveDateTime,
) -> AppResult<PhotoRecord> {
    if photo.image.trim().is_empty() {
        return Err(AppError::Validation("image is required".to_string()));
    }

    let record = PhotoRecord {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id: booking_id.to_string(),
        kind: photo.kind,
        image: photo.image,
        timestamp: now,
        notes: photo.notes,
    };

    let mut photos: Vec<PhotoRecord> = store.read_all(StoreKey::JobPhotos);
    photos.push(record.clone());
    store.write_all(StoreKey::JobPhotos, &photos)?;
    Ok(record)
}

pub fn for_booking(store: &LocalStore, booking_id: &str, kind: Option<PhotoKind>) -> Vec<PhotoRecord> {
    store
        .read_all::<PhotoRecord>(StoreKey::JobPhotos)
        .into_iter()
        .filter(|p| p.booking_id == booking_id && kind.map_or(true, |k| p.kind == k))
        .collect()
}

pub fn delete(store: &LocalStore, photo_id: &str) -> AppResult<()> {
    let mut photos: Vec<PhotoRecord> = store.read_all(StoreKey::JobPhotos);
    let before = photos.len();
    photos.retain(|p| p.id != photo_id);
    if photos.len() == before {
        return Err(AppError::NotFound(format!("photo {photo_id}")));
    }
    store.write_all(StoreKey::JobPhotos, &photos)
}
