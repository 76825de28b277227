//! Supported language table.
//!
//! One entry per language the execution service can run. `value` is the wire
//! tag used for execution dispatch and editor syntax selection; `version` is
//! the runtime version pinned for that language.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Language {
    pub label: &'static str,
    pub value: &'static str,
    pub version: &'static str,
}

pub const DEFAULT_LANGUAGE: &str = "javascript";

pub const LANGUAGES: &[Language] = &[
    Language { label: "JavaScript", value: "javascript", version: "18.15.0" },
    Language { label: "Python", value: "python", version: "3.10.0" },
    Language { label: "Java", value: "java", version: "15.0.2" },
    Language { label: "C++", value: "cpp", version: "10.2.0" },
    Language { label: "C#", value: "csharp", version: "6.12.0" },
    Language { label: "Go", value: "go", version: "1.20.2" },
    Language { label: "Ruby", value: "ruby", version: "3.0.0" },
    Language { label: "PHP", value: "php", version: "8.2.3" },
    Language { label: "Rust", value: "rust", version: "1.68.2" },
    Language { label: "TypeScript", value: "typescript", version: "5.0.3" },
];

pub fn find(value: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.value == value)
}

/// Runtime version for a language tag, or empty if the tag is unknown.
pub fn version_for(value: &str) -> &'static str {
    find(value).map(|l| l.version).unwrap_or("")
}

/// Source file name submitted to the execution service.
pub fn file_name(value: &str) -> String {
    format!("Main.{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_language() {
        let lang = find("python").unwrap();
        assert_eq!(lang.label, "Python");
        assert_eq!(lang.version, "3.10.0");
    }

    #[test]
    fn test_find_unknown_language() {
        assert!(find("cobol").is_none());
        assert_eq!(version_for("cobol"), "");
    }

    #[test]
    fn test_default_language_is_listed() {
        assert!(find(DEFAULT_LANGUAGE).is_some());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("rust"), "Main.rust");
    }
}
