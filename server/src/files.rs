use std::{
    ffi::OsString,
    path::{Component, Path, PathBuf},
};

use actix_web::{web, HttpRequest, HttpResponse};
use tokio::fs;

pub struct StaticCtx {
    pub root: PathBuf,
}

const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Normalises a request path into a path relative to the asset root.
/// Anything that could climb out of the root is rejected.
fn sanitize(request_path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(clean)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn html_response(content: Vec<u8>) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.content_type("text/html");
    for (name, value) in NO_CACHE_HEADERS {
        builder.insert_header((name, value));
    }
    builder.body(content)
}

/// Serves a file from the asset root. `/` maps to `index.html`, a path with
/// no matching file but a matching `{path}.html` serves that, and anything
/// else falls back to `index.html` so client-side routes resolve.
pub async fn serve_asset(req: HttpRequest, ctx: web::Data<StaticCtx>) -> HttpResponse {
    let request_path = req.path();
    let rel = if request_path == "/" || request_path.is_empty() {
        PathBuf::from("index.html")
    } else {
        match sanitize(request_path) {
            Some(rel) => rel,
            None => return HttpResponse::NotFound().body("Not found"),
        }
    };

    let mut target = ctx.root.join(&rel);
    if !is_file(&target).await {
        // serve.js-style convenience: /about resolves to about.html.
        let mut with_html = OsString::from(target.as_os_str());
        with_html.push(".html");
        let with_html = PathBuf::from(with_html);
        if is_file(&with_html).await {
            target = with_html;
        } else {
            // SPA fallback: unknown path serves the root document.
            return match fs::read(ctx.root.join("index.html")).await {
                Ok(content) => html_response(content),
                Err(_) => HttpResponse::InternalServerError().body("Server error"),
            };
        }
    }

    match fs::read(&target).await {
        Ok(content) => {
            let content_type = content_type_for(&target);
            if content_type == "text/html" {
                html_response(content)
            } else {
                HttpResponse::Ok().content_type(content_type).body(content)
            }
        }
        Err(_) => HttpResponse::InternalServerError().body("Server error"),
    }
}
