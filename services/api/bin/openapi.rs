//! Writes the REST API's OpenAPI document.
//!
//! Usage: `openapi [PATH]`. Without a path the document goes to stdout, so it
//! can be piped straight into client generators.

use anyhow::Context;
use utoipa::OpenApi;
use voicebridge_api::router::ApiDoc;

fn main() -> anyhow::Result<()> {
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize the OpenAPI document")?;

    match std::env::args().nth(1) {
        Some(path) => std::fs::write(&path, document)
            .with_context(|| format!("Failed to write OpenAPI document to {}", path))?,
        None => println!("{}", document),
    }
    Ok(())
}
