use crate::models::ConsultationError;

/// Image formats accepted as payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
        }
    }
}

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Identifies the format from leading bytes. Client-declared types are
/// never consulted.
pub fn sniff_image(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(JPEG_MAGIC) {
        return Some(ImageKind::Jpeg);
    }
    if bytes.starts_with(PNG_MAGIC) {
        return Some(ImageKind::Png);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageKind::Webp);
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

impl Attachment {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

pub fn intake(bytes: Vec<u8>, max_bytes: usize) -> Result<Attachment, ConsultationError> {
    if bytes.is_empty() {
        return Err(ConsultationError::InvalidFileType(
            "payment proof is empty".to_string(),
        ));
    }
    if bytes.len() > max_bytes {
        return Err(ConsultationError::FileTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let kind = sniff_image(&bytes).ok_or_else(|| {
        ConsultationError::InvalidFileType("only JPEG, PNG and WEBP images are accepted".to_string())
    })?;

    Ok(Attachment { bytes, kind })
}
