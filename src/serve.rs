//! HTTP server for the transcript viewer
//!
//! `chatview serve <archive>` → loads and linearizes the archive once, then
//! serves the viewer page and a small JSON API.

use crate::archive::load_archive;
use crate::export::{find_transcript, transcript_to_markdown, MarkdownConfig};
use crate::linearize::{linearize_archive, Transcript};
use crate::render::{format_display_date, render_to_string, RenderOptions};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Sidebar entry for `/api/conversations`
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub date: String,
    pub turn_count: usize,
}

impl ConversationSummary {
    pub fn new(t: &Transcript, untitled_placeholder: &str) -> Self {
        Self {
            id: t.id.clone(),
            title: t.display_title(untitled_placeholder).to_string(),
            date: format_display_date(t.display_date()),
            turn_count: t.turns.len(),
        }
    }
}

/// Everything the request handler needs, computed once at start-up
pub struct ViewerState {
    transcripts: Vec<Transcript>,
    page: String,
    untitled_placeholder: String,
}

impl ViewerState {
    pub fn new(transcripts: Vec<Transcript>, options: &RenderOptions) -> std::io::Result<Self> {
        let page = render_to_string(&transcripts, options)?;
        Ok(Self {
            transcripts,
            page,
            untitled_placeholder: options.untitled_placeholder.clone(),
        })
    }
}

/// A routed response, independent of the tiny_http request it answers
#[derive(Debug)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    fn json<T: Serialize>(status: u16, payload: &ApiResponse<T>) -> std::io::Result<Self> {
        Ok(Self::new(
            status,
            "application/json",
            serde_json::to_string(payload)?,
        ))
    }
}

/// Start the viewer server for an archive file
pub fn start_viewer_server(
    port: u16,
    archive_path: &Path,
    options: &RenderOptions,
) -> std::io::Result<()> {
    let conversations = load_archive(archive_path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    let state = ViewerState::new(linearize_archive(&conversations), options)?;

    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);

    eprintln!("\n{}", "chatview".green().bold());
    eprintln!("   Archive: {}", archive_path.display());
    eprintln!("   Conversations: {}", state.transcripts.len());
    eprintln!("   Viewer: {}", url);
    eprintln!("   Press Ctrl+C to stop\n");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &state) {
            tracing::error!(error = %e, "failed to answer request");
        }
    }

    Ok(())
}

fn handle_request(request: Request, state: &ViewerState) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();

    let reply = route(&method, path, state)?;
    tracing::info!(method = %method, path, status = reply.status, "request");

    let content_type = format!("{}; charset=utf-8", reply.content_type);
    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        response = response.with_header(header);
    }
    request.respond(response)
}

fn route(method: &Method, path: &str, state: &ViewerState) -> std::io::Result<Reply> {
    if method != &Method::Get {
        return Ok(Reply::new(404, "text/plain", "Not found".to_string()));
    }

    match path {
        // Serve viewer UI
        "/" | "/index.html" => Ok(Reply::new(200, "text/html", state.page.clone())),

        // API: list conversations
        "/api/conversations" | "/api/conversations/" => {
            let summaries: Vec<ConversationSummary> = state
                .transcripts
                .iter()
                .map(|t| ConversationSummary::new(t, &state.untitled_placeholder))
                .collect();
            Reply::json(200, &ApiResponse::success(summaries))
        }

        // API: one conversation, as JSON or Markdown
        _ => match path.strip_prefix("/api/conversations/") {
            Some(rest) => {
                let (raw_id, as_markdown) = match rest.strip_suffix("/markdown") {
                    Some(id) => (id, true),
                    None => (rest, false),
                };
                let id = percent_decode(raw_id);

                match find_transcript(&state.transcripts, &id) {
                    Some(t) if as_markdown => {
                        let config = MarkdownConfig {
                            untitled_placeholder: state.untitled_placeholder.clone(),
                            ..Default::default()
                        };
                        Ok(Reply::new(
                            200,
                            "text/markdown",
                            transcript_to_markdown(t, &config),
                        ))
                    }
                    Some(t) => Reply::json(200, &ApiResponse::success(t)),
                    None => Reply::json(
                        404,
                        &ApiResponse::failure(format!("Conversation not found: {}", id)),
                    ),
                }
            }
            None => Ok(Reply::new(404, "text/plain", "Not found".to_string())),
        },
    }
}

/// Decode `%XX` escapes in a path segment. Malformed escapes are kept as-is.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
