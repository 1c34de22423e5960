use std::path::{Path, PathBuf};

use actix_multipart::{Field, Multipart};
use actix_web::{post, web, HttpResponse, Responder};
use common::{
    data::CandidateFile,
    payloads::{ErrorBody, UploadReceipt},
    validate::{oversize_message, validate, ValidationOutcome, MAX_FILE_SIZE},
};
use futures_util::TryStreamExt;
use log::{error, info, warn};
use tokio::{
    fs::{remove_file, File},
    io::AsyncWriteExt,
};

pub struct UploadCtx {
    pub data_dir: PathBuf,
}

/// A video part that has been streamed to disk under a fresh id.
struct StoredVideo {
    id: String,
    path: PathBuf,
    written: u64,
    part_filename: Option<String>,
    mime_type: Option<String>,
}

enum UploadFailure {
    TooLarge(u64),
    Rejected(String),
    Malformed(String),
    Io,
}

impl UploadFailure {
    fn into_response(self) -> HttpResponse {
        match self {
            Self::TooLarge(size) => {
                HttpResponse::PayloadTooLarge().json(ErrorBody::new(oversize_message(size)))
            }
            Self::Rejected(reason) => HttpResponse::BadRequest().json(ErrorBody::new(reason)),
            Self::Malformed(detail) => HttpResponse::BadRequest().json(ErrorBody::new(detail)),
            Self::Io => HttpResponse::InternalServerError().json(ErrorBody::new("I/O error")),
        }
    }
}

#[post("/api/upload")]
pub async fn upload(ctx: web::Data<UploadCtx>, payload: Multipart) -> impl Responder {
    match receive(&ctx, payload).await {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(failure) => failure.into_response(),
    }
}

async fn receive(ctx: &UploadCtx, mut payload: Multipart) -> Result<UploadReceipt, UploadFailure> {
    let mut stored: Option<StoredVideo> = None;
    let mut declared_name: Option<String> = None;
    let mut declared_size: Option<u64> = None;

    loop {
        let field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard(&mut stored).await;
                return Err(malformed(e));
            }
        };
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();
        match field_name.as_str() {
            "video" => {
                if stored.is_some() {
                    discard(&mut stored).await;
                    return Err(UploadFailure::Malformed("Duplicate video field".to_string()));
                }
                match store_video(ctx, field).await {
                    Ok(video) => stored = Some(video),
                    Err(failure) => return Err(failure),
                }
            }
            "filename" => match read_text(field).await {
                Ok(text) => declared_name = Some(text),
                Err(failure) => {
                    discard(&mut stored).await;
                    return Err(failure);
                }
            },
            "filesize" => match read_text(field).await {
                Ok(text) => declared_size = text.trim().parse().ok(),
                Err(failure) => {
                    discard(&mut stored).await;
                    return Err(failure);
                }
            },
            _ => {
                if let Err(failure) = drain(field).await {
                    discard(&mut stored).await;
                    return Err(failure);
                }
            }
        }
    }

    let Some(video) = stored else {
        return Err(UploadFailure::Malformed("Missing video field".to_string()));
    };

    let filename = declared_name
        .or_else(|| video.part_filename.clone())
        .unwrap_or_else(|| "upload".to_string());
    // Clients control this string; keep only the bare file name.
    let filename = Path::new(&filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = video
        .mime_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    if let Some(declared) = declared_size {
        if declared != video.written {
            warn!(
                "declared filesize {declared} does not match the {} bytes received",
                video.written
            );
        }
    }

    let candidate = CandidateFile::from_parts(filename, video.written, mime_type);
    if let ValidationOutcome::Rejected(reason) = validate(&candidate) {
        let _ = remove_file(&video.path).await;
        return Err(UploadFailure::Rejected(reason));
    }

    info!(
        "stored {} as {} ({} bytes)",
        candidate.name, video.id, video.written
    );
    Ok(UploadReceipt {
        id: video.id,
        filename: candidate.name,
        size: video.written,
    })
}

async fn store_video(ctx: &UploadCtx, mut field: Field) -> Result<StoredVideo, UploadFailure> {
    let part_filename = field
        .content_disposition()
        .get_filename()
        .map(|s| s.to_string());
    let mime_type = field.content_type().map(|m| m.to_string());
    let id = uuidv7::create();
    let path = ctx.data_dir.join(&id);
    let mut file = match File::create(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!("failed to create {}: {e}", path.display());
            return Err(UploadFailure::Io);
        }
    };

    let mut written: u64 = 0;
    loop {
        let chunk = match field.try_next().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                let _ = remove_file(&path).await;
                return Err(malformed(e));
            }
        };
        written += chunk.len() as u64;
        if written > MAX_FILE_SIZE {
            let _ = remove_file(&path).await;
            return Err(UploadFailure::TooLarge(written));
        }
        if let Err(e) = file.write_all(&chunk).await {
            error!("write failed for {}: {e}", path.display());
            let _ = remove_file(&path).await;
            return Err(UploadFailure::Io);
        }
    }
    if file.flush().await.is_err() {
        let _ = remove_file(&path).await;
        return Err(UploadFailure::Io);
    }

    Ok(StoredVideo {
        id,
        path,
        written,
        part_filename,
        mime_type,
    })
}

async fn read_text(mut field: Field) -> Result<String, UploadFailure> {
    let mut buf = Vec::new();
    loop {
        match field.try_next().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => return Err(malformed(e)),
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn drain(mut field: Field) -> Result<(), UploadFailure> {
    loop {
        match field.try_next().await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(()),
            Err(e) => return Err(malformed(e)),
        }
    }
}

async fn discard(stored: &mut Option<StoredVideo>) {
    if let Some(video) = stored.take() {
        let _ = remove_file(&video.path).await;
    }
}

fn malformed(e: actix_multipart::MultipartError) -> UploadFailure {
    UploadFailure::Malformed(format!("Malformed upload request: {e}"))
}
