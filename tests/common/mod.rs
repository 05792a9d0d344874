//! Shared helpers for the integration tests

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

/// Build a PDF with `pages` pages. Page N shows the text `<label>-<N>`.
pub fn make_pdf(label: &str, pages: u32) -> Vec<u8> {
    build_pdf(pages, |n| format!("BT /F1 24 Tf 72 720 Td ({}-{}) Tj ET", label, n))
}

/// A PDF whose pages draw a rectangle and no text
pub fn make_blank_pdf(pages: u32) -> Vec<u8> {
    build_pdf(pages, |_| "72 72 200 200 re S".to_string())
}

fn build_pdf(pages: u32, content_for: impl Fn(u32) -> String) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = content_for(n);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to serialize test PDF");
    buffer
}

/// Write a generated PDF to `dir/name`
pub fn write_pdf(dir: &Path, name: &str, label: &str, pages: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, make_pdf(label, pages)).expect("Failed to write test PDF");
    path
}

/// The `<label>-<N>` marker shown on each page, in page order
pub fn page_markers(data: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(data).expect("Failed to parse PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).expect("Failed to read page content");
            let text = String::from_utf8_lossy(&content);
            let start = text.find('(').map(|i| i + 1).unwrap_or(0);
            let end = text[start..].find(')').map(|i| start + i).unwrap_or(start);
            text[start..end].to_string()
        })
        .collect()
}

/// Whether `dir` holds any file other than the listed ones
pub fn has_extra_files(dir: &Path, expected: &[&str]) -> bool {
    std::fs::read_dir(dir)
        .expect("Failed to read dir")
        .filter_map(|e| e.ok())
        .any(|e| !expected.contains(&e.file_name().to_string_lossy().as_ref()))
}

/// Serve a single HTTP request with a canned JSON response.
///
/// Returns the API root (`http://127.0.0.1:<port>/v1`) and a handle that
/// yields the raw request once it has been answered.
pub fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
    let addr = listener.local_addr().expect("No local address");
    let body = body.to_string();

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("Failed to accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut buf).expect("Failed to read request");
            if n == 0 {
                break request.len();
            }
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut buf).expect("Failed to read body");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream
            .write_all(response.as_bytes())
            .expect("Failed to write response");
        stream.flush().ok();

        String::from_utf8_lossy(&request).to_string()
    });

    (format!("http://{}/v1", addr), handle)
}

/// Chat Completions response body with one assistant message
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// Write an executable shell script `name` into `dir`
#[cfg(unix)]
pub fn shell_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path
}

/// Stands in for ocrmypdf: copies its input (second to last argument) to
/// its output (last argument)
#[cfg(unix)]
pub const COPY_INPUT_TO_OUTPUT: &str = r#"for arg; do prev=$last; last=$arg; done
cp "$prev" "$last""#;
