use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

/// Read a parameter or tables file. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let file = locate(path)?;
    let contents = fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
    let parsed = match Format::of(&file) {
        Format::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| format!("Failed to parse '{}': {}", file.display(), e).into())
}

/// Relative paths are taken from the working directory.
fn locate(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file = std::env::current_dir()?.join(path);
    if !file.is_file() {
        let problem = if file.exists() { "Not a file" } else { "File not found" };
        return Err(format!("{}: {}", problem, file.display()).into());
    }
    Ok(file)
}
