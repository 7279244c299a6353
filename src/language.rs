//! Static extension → language table and per-language split separators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SummariserError};

/// Separators every code language falls back to once its keyword
/// boundaries are exhausted.
const LINE_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A source language the splitter knows how to chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// SAS programs (`.sas`).
    Sas,
    /// R scripts (`.R`).
    R,
    /// SQL scripts (`.sql`).
    Sql,
    /// Python (`.py`).
    Python,
    /// C++ (`.cpp`).
    Cpp,
    /// Go (`.go`).
    Go,
    /// Java (`.java`).
    Java,
    /// JavaScript (`.js`).
    JavaScript,
    /// PHP (`.php`).
    Php,
    /// Ruby (`.rb`).
    Ruby,
    /// Scala (`.scala`).
    Scala,
    /// Markdown (`.md`).
    Markdown,
    /// Swift (`.swift`).
    Swift,
    /// HTML (`.html`).
    Html,
    /// Rust (`.rs`).
    Rust,
}

/// Extension table. Extensions are matched case-sensitively, so `.R` maps
/// to R while `.r` does not.
const EXTENSIONS: [(&str, Language); 15] = [
    (".sas", Language::Sas),
    (".R", Language::R),
    (".sql", Language::Sql),
    (".py", Language::Python),
    (".cpp", Language::Cpp),
    (".go", Language::Go),
    (".java", Language::Java),
    (".js", Language::JavaScript),
    (".php", Language::Php),
    (".rb", Language::Ruby),
    (".scala", Language::Scala),
    (".md", Language::Markdown),
    (".swift", Language::Swift),
    (".html", Language::Html),
    (".rs", Language::Rust),
];

impl Language {
    /// Looks up the language for a file extension.
    ///
    /// The leading dot is optional: `"sas"` and `".sas"` both resolve.
    ///
    /// # Errors
    ///
    /// Returns [`SummariserError::UnknownExtension`] if the extension has no mapping.
    pub fn from_extension(ext: &str) -> Result<Self> {
        let dotted = normalize_extension(ext);
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == dotted)
            .map(|(_, lang)| *lang)
            .ok_or(SummariserError::UnknownExtension(dotted))
    }

    /// Every supported language, in table order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        EXTENSIONS.iter().map(|(_, lang)| *lang).collect()
    }

    /// The extension this language is discovered by, including the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        EXTENSIONS
            .iter()
            .find(|(_, lang)| *lang == self)
            .map_or("", |(ext, _)| *ext)
    }

    /// Name used when prompting the model ("You are an expert {name} programmer").
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sas => "sas",
            Self::R => "R",
            Self::Sql => "sql",
            Self::Python => "python",
            Self::Cpp => "cpp",
            Self::Go => "go",
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Scala => "scala",
            Self::Markdown => "markdown",
            Self::Swift => "swift",
            Self::Html => "html",
            Self::Rust => "rust",
        }
    }

    /// Ordered separators tried by the recursive splitter, coarsest first.
    #[must_use]
    pub fn separators(self) -> Vec<&'static str> {
        let keywords: &[&'static str] = match self {
            Self::Sas => &["\ndata ", "\nproc ", "\nrun ", "\nquit ", "\nif ", "\ndo "],
            Self::R => &["\nfunction ", "\nif ", "\nfor ", "\nwhile "],
            Self::Sql => &[
                ";",
                "\ncreate ",
                "\nselect ",
                "\nfrom ",
                "\nwhere ",
                "\ngroup by ",
                "\nhaving ",
                "\norder by ",
            ],
            Self::Python => &["\nclass ", "\ndef ", "\n\tdef "],
            Self::Cpp => &[
                "\nclass ", "\nvoid ", "\nint ", "\nfloat ", "\ndouble ", "\nif ", "\nfor ",
                "\nwhile ", "\nswitch ", "\ncase ",
            ],
            Self::Go => &[
                "\nfunc ", "\nvar ", "\nconst ", "\ntype ", "\nif ", "\nfor ", "\nswitch ",
                "\ncase ",
            ],
            Self::Java => &[
                "\nclass ",
                "\npublic ",
                "\nprotected ",
                "\nprivate ",
                "\nstatic ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
            ],
            Self::JavaScript => &[
                "\nfunction ",
                "\nconst ",
                "\nlet ",
                "\nvar ",
                "\nclass ",
                "\nif ",
                "\nfor ",
                "\nwhile ",
                "\nswitch ",
                "\ncase ",
                "\ndefault ",
            ],
            Self::Php => &[
                "\nfunction ", "\nclass ", "\nif ", "\nforeach ", "\nwhile ", "\ndo ",
                "\nswitch ", "\ncase ",
            ],
            Self::Ruby => &[
                "\ndef ", "\nclass ", "\nif ", "\nunless ", "\nwhile ", "\nfor ", "\ndo ",
                "\nbegin ", "\nrescue ",
            ],
            Self::Scala => &[
                "\nclass ", "\nobject ", "\ndef ", "\nval ", "\nvar ", "\nif ", "\nfor ",
                "\nwhile ", "\nmatch ", "\ncase ",
            ],
            Self::Markdown => &[
                "\n# ", "\n## ", "\n### ", "\n#### ", "\n##### ", "\n###### ", "```\n",
                "\n***\n", "\n---\n", "\n___\n",
            ],
            Self::Swift => &[
                "\nfunc ", "\nclass ", "\nstruct ", "\nenum ", "\nif ", "\nfor ", "\nwhile ",
                "\ndo ", "\nswitch ", "\ncase ",
            ],
            Self::Rust => &[
                "\nfn ", "\nconst ", "\nlet ", "\nif ", "\nwhile ", "\nfor ", "\nloop ",
                "\nmatch ",
            ],
            Self::Html => {
                return vec![
                    "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5",
                    "<h6", "<span", "<table", "<tr", "<td", "<th", "<ul", "<ol", "<header",
                    "<footer", "<nav", "<head", "<style", "<script", "<meta", "<title", "",
                ];
            }
        };
        keywords.iter().copied().chain(LINE_SEPARATORS).collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the extension with exactly one leading dot.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    format!(".{}", ext.trim_start_matches('.'))
}
