//! Code page resolution for `.cpg` sidecar files.
//!
//! A `.cpg` file holds a free-form code page identifier such as `1252`,
//! `8859-1`, `UTF-8` or `ANSI 1251`. [`resolve`] turns that text into a
//! charset name that `encoding_rs` recognizes, falling back to
//! [`DEFAULT_CHARSET`] for anything it cannot use. Resolution never fails.

use std::borrow::Cow;
use std::sync::OnceLock;

use encoding_rs::Encoding;
use regex::Regex;
use tracing::warn;

/// Charset used when a code page is missing, malformed or unsupported.
pub const DEFAULT_CHARSET: &str = "UTF-8";

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\D*(\d{3,})(.*)$").expect("code page pattern is valid"))
}

/// Map a raw code page string to a charset name.
///
/// Returns [`DEFAULT_CHARSET`] when the mapped name is not a known charset.
///
/// ```
/// use shpkit_dbf::codepage::resolve;
///
/// assert_eq!(resolve("8859-1"), "ISO-8859-1");
/// assert_eq!(resolve("1252"), "windows-1252");
/// assert_eq!(resolve("936"), "GBK");
/// assert_eq!(resolve("no such thing"), "UTF-8");
/// ```
pub fn resolve(raw: &str) -> String {
    let candidate = map_code_page(raw.trim());
    if is_supported(&candidate) {
        candidate
    } else {
        warn!(code_page = raw, candidate = %candidate, "unsupported code page, using {}", DEFAULT_CHARSET);
        DEFAULT_CHARSET.to_string()
    }
}

/// Check whether `name` is a charset label `encoding_rs` understands.
pub fn is_supported(name: &str) -> bool {
    !name.is_empty() && Encoding::for_label(name.as_bytes()).is_some()
}

fn map_code_page(raw: &str) -> String {
    let Some(caps) = code_pattern().captures(raw) else {
        return raw.replace(' ', "-");
    };
    let digits = &caps[1];
    let rest = &caps[2];

    if let Some(suffix) = digits.strip_prefix("8859") {
        let suffix = format!("{suffix}{rest}");
        let suffix = suffix.trim_start_matches(['-', '_', ' ']);
        return format!("ISO-8859-{suffix}");
    }

    match digits.len() {
        3 => match digits {
            "708" => "ISO-8859-6".to_string(),
            "932" => "Shift_JIS".to_string(),
            "936" => "GBK".to_string(),
            code => format!("IBM{code}"),
        },
        4 => format!("windows-{digits}"),
        _ => raw.replace(' ', "-"),
    }
}

/// A resolved character set: its name plus the `encoding_rs` codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    name: String,
    encoding: &'static Encoding,
}

impl Charset {
    /// Resolve a raw code page string (typically `.cpg` contents).
    pub fn resolve(raw: &str) -> Self {
        Self::for_name(&resolve(raw))
    }

    /// Resolve the raw bytes of a `.cpg` file.
    pub fn from_cpg_bytes(bytes: &[u8]) -> Self {
        Self::resolve(&String::from_utf8_lossy(bytes))
    }

    /// Look up a charset by name, falling back to the default charset.
    pub fn for_name(name: &str) -> Self {
        match Encoding::for_label(name.as_bytes()) {
            Some(encoding) => Self {
                name: name.to_string(),
                encoding,
            },
            None => {
                warn!(charset = name, "unknown charset, using {}", DEFAULT_CHARSET);
                Self::default()
            }
        }
    }

    /// The charset name as resolved.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying codec.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode bytes into text. Malformed sequences become U+FFFD.
    #[inline]
    pub fn decode<'b>(&self, bytes: &'b [u8]) -> Cow<'b, str> {
        self.encoding.decode_without_bom_handling(bytes).0
    }

    /// Encode text into this charset. Unmappable characters become numeric
    /// character references.
    #[inline]
    pub fn encode<'s>(&self, text: &'s str) -> Cow<'s, [u8]> {
        self.encoding.encode(text).0
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            name: DEFAULT_CHARSET.to_string(),
            encoding: encoding_rs::UTF_8,
        }
    }
}
