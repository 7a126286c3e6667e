//! Generate OpenAPI specification files
//!
//! Writes the API description in JSON and YAML, by default into `docs/`.

use std::fs;
use std::path::PathBuf;
use sai_web::openapi::{get_openapi_json, get_openapi_yaml};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let docs_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("docs"));
    fs::create_dir_all(&docs_dir)?;

    let json_path = docs_dir.join("openapi.json");
    fs::write(&json_path, get_openapi_json()?)?;
    println!("Generated: {}", json_path.display());

    let yaml_path = docs_dir.join("openapi.yaml");
    fs::write(&yaml_path, get_openapi_yaml()?)?;
    println!("Generated: {}", yaml_path.display());

    Ok(())
}
