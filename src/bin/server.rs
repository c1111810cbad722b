#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
#[cfg(not(target_arch = "wasm32"))]
use tiny_http::{Header, Response, Server, StatusCode};

/// Development server for the game pages: serves the wasm bundle and HTML
/// out of the web root.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
struct Opts {
    /// Address to serve on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,
    /// Directory holding index.html, scores.html and the pkg/ bundle
    #[arg(long, default_value = "web")]
    root: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    anyhow::ensure!(
        opts.root.is_dir(),
        "web root {} not found",
        opts.root.display()
    );
    let root = opts.root.canonicalize()?;

    println!("Serving {} on http://{}", root.display(), opts.listen);
    let server = Server::http(&opts.listen).map_err(|err| anyhow::anyhow!(err))?;
    for request in server.incoming_requests() {
        let url = request.url().to_string();
        let method = request.method().to_string();
        let path = resolve(&root, url.split('?').next().unwrap_or("/"));
        let status = match path.and_then(|p| std::fs::File::open(&p).ok().map(|f| (p, f))) {
            Some((path, file)) => {
                let mut response = Response::from_file(file);
                if let Ok(header) =
                    Header::from_bytes("Content-Type", content_type_for(&path).as_bytes())
                {
                    response.add_header(header);
                }
                let _ = request.respond(response);
                200
            }
            None => {
                let _ = request
                    .respond(Response::from_string("Not Found").with_status_code(StatusCode(404)));
                404
            }
        };
        println!("{method} {url} -> {status}");
    }
    Ok(())
}

/// Maps a request path to a file under the root, defaulting directories to
/// their index.html and refusing anything that escapes the root.
#[cfg(not(target_arch = "wasm32"))]
fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let rel = if url == "/" {
        "index.html"
    } else {
        url.trim_start_matches('/')
    };
    let mut path = root.join(rel);
    if path.is_dir() {
        path = path.join("index.html");
    }
    let path = path.canonicalize().ok()?;
    path.starts_with(root).then_some(path)
}

#[cfg(not(target_arch = "wasm32"))]
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript",
        "css" => "text/css",
        "wasm" => "application/wasm",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
