//! Static file serving module
//!
//! Resolves GET/HEAD requests against the served directory: files,
//! directory redirects, index files and generated listings.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, listing, path};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;

const FILE_NOT_FOUND: &str = "File not found";

/// Serve a GET or HEAD request from the served directory
pub async fn serve(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let translated = path::translate_path(&state.root, &ctx.path);
    let mut file_path = translated.fs_path;

    if is_dir(&file_path).await {
        if !translated.trailing_slash {
            return http::build_directory_redirect(&ctx.path, ctx.query.as_deref());
        }
        match find_index_file(&file_path, &state.config.http.index_files).await {
            Some(index_path) => file_path = index_path,
            None => return serve_listing(ctx, state, &file_path).await,
        }
    } else if translated.trailing_slash {
        // "/app.wasm/" names a directory that does not exist
        return http::build_404_response(FILE_NOT_FOUND, ctx.is_head);
    }

    serve_file(ctx, state, &file_path).await
}

/// Serve a single regular file
async fn serve_file(
    ctx: &RequestContext,
    state: &AppState,
    file_path: &Path,
) -> Response<Full<Bytes>> {
    let content_type = state.mime.guess_type(&file_path.to_string_lossy());

    // Missing and unreadable files are both reported as 404
    let mut file = match File::open(file_path).await {
        Ok(f) => f,
        Err(e) => {
            logger::log_debug(&format!("Cannot open '{}': {e}", file_path.display()));
            return http::build_404_response(FILE_NOT_FOUND, ctx.is_head);
        }
    };

    let metadata = match file.metadata().await {
        Ok(m) => m,
        Err(e) => {
            logger::log_error(&format!("Failed to stat '{}': {e}", file_path.display()));
            return http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, None, ctx.is_head);
        }
    };

    let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    let last_modified = cache::format_http_date(modified);

    if cache::is_not_modified(
        ctx.if_modified_since.as_deref(),
        ctx.has_if_none_match,
        modified,
    ) {
        return http::build_304_response(&last_modified);
    }

    if ctx.is_head {
        return http::build_file_response(Bytes::new(), metadata.len(), content_type, &last_modified);
    }

    let mut content = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or(0));
    if let Err(e) = file.read_to_end(&mut content).await {
        logger::log_error(&format!("Failed to read '{}': {e}", file_path.display()));
        return http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, None, false);
    }

    let content_length = content.len() as u64;
    http::build_file_response(Bytes::from(content), content_length, content_type, &last_modified)
}

/// Render a listing for a directory with no index file
async fn serve_listing(
    ctx: &RequestContext,
    state: &AppState,
    dir: &Path,
) -> Response<Full<Bytes>> {
    if !state.config.http.directory_listing {
        return http::build_error_response(
            StatusCode::FORBIDDEN,
            Some("Directory listing is disabled"),
            ctx.is_head,
        );
    }

    match read_listing_entries(dir).await {
        Ok(entries) => {
            let display_path = percent_decode_str(&ctx.path).decode_utf8_lossy();
            let html = listing::render_listing(&display_path, entries);
            http::build_listing_response(html, ctx.is_head)
        }
        Err(e) => {
            logger::log_warning(&format!("Cannot list '{}': {e}", dir.display()));
            http::build_404_response("No permission to list directory", ctx.is_head)
        }
    }
}

/// Collect directory entries, following symlinks to classify directories
async fn read_listing_entries(dir: &Path) -> std::io::Result<Vec<listing::ListingEntry>> {
    let mut read_dir = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let file_type = entry.file_type().await?;
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            is_dir(&entry.path()).await
        } else {
            file_type.is_dir()
        };

        entries.push(listing::ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    Ok(entries)
}

/// First configured index file that exists as a regular file
async fn find_index_file(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    for name in index_files {
        let candidate = dir.join(name);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}
