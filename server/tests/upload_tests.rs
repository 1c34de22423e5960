use actix_web::{test, web, App};
use common::payloads::{ErrorBody, UploadReceipt};
use common::validate::TYPE_MESSAGE;
use tempfile::TempDir;
use vidsend_server::upload::{upload, UploadCtx};

const BOUNDARY: &str = "----VidsendTestBoundary";

fn write_text_field(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn multipart_body(filename: &str, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"video\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    write_text_field(&mut body, "filename", filename);
    write_text_field(&mut body, "filesize", &data.len().to_string());
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> actix_web::test::TestRequest {
    test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

fn stored_files(dir: &TempDir) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[actix_web::test]
async fn accepts_a_valid_video() {
    let data_dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(UploadCtx {
                data_dir: data_dir.path().to_path_buf(),
            }))
            .service(upload),
    )
    .await;

    let payload = b"fake mp4 payload".to_vec();
    let req = upload_request(multipart_body("clip.mp4", "video/mp4", &payload)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let receipt: UploadReceipt = test::read_body_json(resp).await;
    assert_eq!(receipt.filename, "clip.mp4");
    assert_eq!(receipt.size, payload.len() as u64);

    let files = stored_files(&data_dir);
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read(&files[0]).unwrap(), payload);
}

#[actix_web::test]
async fn rejects_a_non_video_mime_type() {
    let data_dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(UploadCtx {
                data_dir: data_dir.path().to_path_buf(),
            }))
            .service(upload),
    )
    .await;

    let req = upload_request(multipart_body("notes.txt", "text/plain", b"hello")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.user_message(), Some(TYPE_MESSAGE));
    // The rejected payload must not linger on disk.
    assert!(stored_files(&data_dir).is_empty());
}

#[actix_web::test]
async fn rejects_a_request_without_a_video_field() {
    let data_dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(UploadCtx {
                data_dir: data_dir.path().to_path_buf(),
            }))
            .service(upload),
    )
    .await;

    let mut body = Vec::new();
    write_text_field(&mut body, "filename", "clip.mp4");
    write_text_field(&mut body, "filesize", "16");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let req = upload_request(body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.user_message(), Some("Missing video field"));
}

#[actix_web::test]
async fn strips_directories_from_the_client_filename() {
    let data_dir = TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(UploadCtx {
                data_dir: data_dir.path().to_path_buf(),
            }))
            .service(upload),
    )
    .await;

    let req =
        upload_request(multipart_body("../../evil.mp4", "video/mp4", b"payload")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let receipt: UploadReceipt = test::read_body_json(resp).await;
    assert_eq!(receipt.filename, "evil.mp4");
}
