// Demo service
// Lists and downloads files from `demo.download_dir` and echoes writes

use std::path::PathBuf;

use hyper::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use restbase::http::mime::content_type_for;
use restbase::service::{Exchange, FileDownload, HandlerResult, RestService};

const FILES: &str = "files";
const ECHO: &str = "echo";

#[derive(Debug, Serialize)]
struct FileEntry {
    name: String,
    size: u64,
    url: String,
}

/// Read-only file browser with an echo endpoint
pub struct FilesService {
    download_dir: PathBuf,
}

impl FilesService {
    pub const fn new(download_dir: PathBuf) -> Self {
        Self { download_dir }
    }

    fn list_files(&self, ex: &mut Exchange<'_>) -> HandlerResult {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.download_dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(FileEntry {
                url: ex.resource_url(&[FILES, name.as_str()]),
                size: metadata.len(),
                name,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        ex.send_json(&files)
    }

    fn download(&self, ex: &mut Exchange<'_>, name: &str) -> HandlerResult {
        if name.is_empty() || name.starts_with('.') || name.contains('\\') {
            return ex.send_error(format!("invalid file name: {name}"));
        }
        let download = FileDownload::new(self.download_dir.join(name), name)
            .mime_type(content_type_for(name));
        ex.send_file(download)
    }
}

/// Body of a write request: JSON when sent as JSON, else the merged params
fn payload(ex: &Exchange<'_>) -> Result<Value, restbase::ServiceError> {
    let request = ex.request();
    if request.read_request_body().is_empty() || !request.params().is_empty() {
        return Ok(json!(request.params()));
    }
    request.read_json()
}

impl RestService for FilesService {
    fn get(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
        match ex.resources() {
            [] => {
                let index = json!({
                    "files": ex.resource_url(&[FILES]),
                    "echo": ex.resource_url(&[ECHO]),
                });
                ex.send_json(&index)
            }
            [first] if first == FILES => self.list_files(ex),
            [first, name] if first == FILES => self.download(ex, name),
            [first, rest @ ..] if first == ECHO => {
                let echo = json!({ "resources": rest, "params": ex.request().params() });
                ex.send_json(&echo)
            }
            _ => ex.send_error_status("unknown resource", StatusCode::NOT_FOUND),
        }
    }

    fn post(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
        let body = payload(ex)?;
        ex.send_json_status(&json!({ "created": body }), StatusCode::CREATED)
    }

    fn put(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
        let body = payload(ex)?;
        ex.send_json(&json!({ "updated": body }))
    }

    fn delete(&mut self, ex: &mut Exchange<'_>) -> HandlerResult {
        ex.send_error_status("downloads are read-only", StatusCode::METHOD_NOT_ALLOWED)
    }
}
