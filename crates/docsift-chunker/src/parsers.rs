//! Process-wide registry of tree-sitter languages.
//!
//! Grammar construction is not free, so languages are memoized in a shared
//! map keyed by normalized language id. The map lock is held across
//! construction, which makes concurrent first requests for the same language
//! single-flight: one caller builds, the rest get the memoized copy.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use docsift_core::ChunkError;
use tree_sitter::Language;

static LANGUAGES: OnceLock<Mutex<HashMap<String, Language>>> = OnceLock::new();

/// Resolve a language id (e.g. `"rust"`, `"ts"`, `"Python"`) to a tree-sitter
/// language, building and memoizing it on first use. Unknown ids surface as
/// [`ChunkError::Parser`].
pub fn language_for(id: &str) -> Result<Language, ChunkError> {
    let key = normalize_id(id);
    let map = LANGUAGES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = map
        .lock()
        .map_err(|_| ChunkError::Parser("language registry lock poisoned".to_string()))?;
    if let Some(language) = guard.get(&key) {
        return Ok(language.clone());
    }
    let language = build_language(&key)?;
    guard.insert(key, language.clone());
    Ok(language)
}

/// Lowercase and fold common aliases onto canonical grammar names.
fn normalize_id(id: &str) -> String {
    let id = id.trim().to_lowercase();
    match id.as_str() {
        "rs" => "rust".to_string(),
        "py" => "python".to_string(),
        "js" | "jsx" | "mjs" | "cjs" => "javascript".to_string(),
        "ts" => "typescript".to_string(),
        _ => id,
    }
}

fn build_language(key: &str) -> Result<Language, ChunkError> {
    let language = match key {
        "rust" => tree_sitter_rust::LANGUAGE,
        "python" => tree_sitter_python::LANGUAGE,
        "javascript" => tree_sitter_javascript::LANGUAGE,
        "typescript" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        "tsx" => tree_sitter_typescript::LANGUAGE_TSX,
        "go" => tree_sitter_go::LANGUAGE,
        "java" => tree_sitter_java::LANGUAGE,
        other => {
            return Err(ChunkError::Parser(format!("unsupported language: {other}")));
        }
    };
    Ok(language.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_resolve() {
        for id in ["rust", "python", "javascript", "typescript", "go", "java"] {
            language_for(id).unwrap();
        }
    }

    #[test]
    fn aliases_and_case_fold() {
        language_for("rs").unwrap();
        language_for("Py").unwrap();
        language_for("  TS ").unwrap();
        language_for("jsx").unwrap();
    }

    #[test]
    fn repeated_lookups_hit_the_memo() {
        let first = language_for("rust").unwrap();
        let second = language_for("rust").unwrap();
        // Same grammar either way; the registry never rebuilds.
        assert_eq!(first.abi_version(), second.abi_version());
    }

    #[test]
    fn unknown_language_is_a_parser_error() {
        let err = language_for("cobol").unwrap_err();
        assert!(matches!(err, ChunkError::Parser(_)));
        assert!(err.to_string().contains("cobol"));
    }
}
