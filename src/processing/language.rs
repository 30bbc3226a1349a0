//! Programming language identifiers and extension-based detection.
//!
//! Detection is a static lookup on the file extension. Anything not in the
//! table is `Language::Unknown`; there is no other failure case.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Languages known to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    // Structural chunking (grammar adapters available)
    Python,
    JavaScript,
    TypeScript,
    Tsx,

    // Recognized, routed to size-based fallback
    Go,
    Rust,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Kotlin,
    Swift,
    Scala,
    Shell,
    Sql,
    Markdown,
    Json,
    Yaml,
    Toml,
    Html,
    Css,

    Unknown,
}

impl Language {
    /// Languages with a grammar adapter for structural chunking.
    pub const STRUCTURAL: [Language; 4] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
    ];

    /// Check if structural (syntax-tree) chunking is available.
    pub fn supports_structural(&self) -> bool {
        Self::STRUCTURAL.contains(self)
    }

    /// Get a string representation of the language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Scala => "scala",
            Language::Shell => "shell",
            Language::Sql => "sql",
            Language::Markdown => "markdown",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Html => "html",
            Language::Css => "css",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = match s.to_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "java" => Language::Java,
            "c" => Language::C,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "ruby" | "rb" => Language::Ruby,
            "php" => Language::Php,
            "kotlin" | "kt" => Language::Kotlin,
            "swift" => Language::Swift,
            "scala" => Language::Scala,
            "shell" | "bash" | "sh" | "zsh" => Language::Shell,
            "sql" => Language::Sql,
            "markdown" | "md" => Language::Markdown,
            "json" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            "html" | "htm" => Language::Html,
            "css" | "scss" | "less" => Language::Css,
            _ => Language::Unknown,
        };
        Ok(language)
    }
}

lazy_static! {
    static ref EXTENSION_MAP: HashMap<&'static str, Language> = {
        let mut map = HashMap::new();

        for ext in ["py", "pyi", "pyw"] {
            map.insert(ext, Language::Python);
        }
        for ext in ["js", "mjs", "cjs", "jsx"] {
            map.insert(ext, Language::JavaScript);
        }
        for ext in ["ts", "mts", "cts"] {
            map.insert(ext, Language::TypeScript);
        }
        map.insert("tsx", Language::Tsx);

        map.insert("go", Language::Go);
        map.insert("rs", Language::Rust);
        map.insert("java", Language::Java);
        map.insert("c", Language::C);
        map.insert("h", Language::C);
        for ext in ["cpp", "cc", "cxx", "hpp", "hxx", "hh"] {
            map.insert(ext, Language::Cpp);
        }
        map.insert("cs", Language::CSharp);
        map.insert("rb", Language::Ruby);
        map.insert("rake", Language::Ruby);
        map.insert("php", Language::Php);
        map.insert("kt", Language::Kotlin);
        map.insert("kts", Language::Kotlin);
        map.insert("swift", Language::Swift);
        map.insert("scala", Language::Scala);
        for ext in ["sh", "bash", "zsh"] {
            map.insert(ext, Language::Shell);
        }
        map.insert("sql", Language::Sql);
        map.insert("md", Language::Markdown);
        map.insert("markdown", Language::Markdown);
        map.insert("json", Language::Json);
        map.insert("yaml", Language::Yaml);
        map.insert("yml", Language::Yaml);
        map.insert("toml", Language::Toml);
        map.insert("html", Language::Html);
        map.insert("htm", Language::Html);
        map.insert("css", Language::Css);
        map.insert("scss", Language::Css);
        map.insert("less", Language::Css);

        map
    };
}

/// Detect language from a file path's extension.
pub fn detect_language(path: impl AsRef<Path>) -> Language {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| EXTENSION_MAP.get(ext.to_lowercase().as_str()).copied())
        .unwrap_or(Language::Unknown)
}
