use uuid::Uuid;

use crate::domain::value_objects::orders::{InterviewPatch, QuizData};

pub const MAX_REFERENCE_PHOTOS: usize = 10;
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// A binary part lifted out of the multipart stream before the usecase runs.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: &'static str,
}

/// Maps an accepted photo content type to the stored file extension.
pub fn photo_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

pub fn audio_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "audio/mpeg" => Some("mp3"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/webm" => Some("webm"),
        "audio/mp4" | "audio/x-m4a" => Some("m4a"),
        _ => None,
    }
}

/// Everything one intake POST can carry. Either `order_id` or
/// `checkout_session_id` must identify the order.
#[derive(Debug, Clone, Default)]
pub struct IntakeSubmission {
    pub order_id: Option<Uuid>,
    pub checkout_session_id: Option<String>,
    pub quiz_data: Option<QuizData>,
    pub interview_data: Option<InterviewPatch>,
    pub reference_photos: Vec<UploadedFile>,
    pub audio_note: Option<UploadedFile>,
}
