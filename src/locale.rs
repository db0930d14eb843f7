//! Default separators for front-ends, guessed from the platform locale.
//!
//! The merge pipeline never calls this; a front-end uses it once to
//! preselect [`FormatOptions`] before the user (or a flag) overrides them.

use crate::output::{FormatOptions, FormatPreset};

/// Languages whose locales write `1,5` and separate fields with `;`.
const EUROPEAN_LANGUAGES: &[&str] = &[
    "de", "fr", "it", "es", "pt", "nl", "pl", "cs", "sk", "hu", "ro", "bg", "hr", "sl", "lt", "lv",
    "et", "fi", "sv", "da", "no",
];

const NORTH_AMERICAN_LOCALES: &[&str] = &["en_US", "en_CA", "fr_CA"];

/// What the front-end knows about the machine it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlatformInfo {
    /// Locale name such as `de_DE` or `en_US.UTF-8`; `None` if unknown.
    pub locale: Option<String>,
    /// Operating system, as in `std::env::consts::OS`.
    pub os: String,
}

impl PlatformInfo {
    /// Read `LC_ALL`, `LC_NUMERIC` and `LANG` (first non-empty wins).
    pub fn from_env() -> Self {
        let locale = ["LC_ALL", "LC_NUMERIC", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty() && v != "C" && v != "POSIX");
        Self {
            locale,
            os: std::env::consts::OS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleDefaults {
    pub format: FormatOptions,
    /// Human-readable name of the detected region.
    pub region: &'static str,
}

/// Pick default separators for a platform.
pub fn detect_defaults(platform: &PlatformInfo) -> LocaleDefaults {
    // Strip encoding / modifier: "en_US.UTF-8@euro" -> "en_US".
    let locale = platform
        .locale
        .as_deref()
        .map(|l| l.split(['.', '@']).next().unwrap_or(l));
    let language = locale.map_or("en", |l| l.get(..2).unwrap_or(l));
    let desktop = matches!(platform.os.as_str(), "windows" | "macos");

    let (preset, region) = if locale.is_some_and(|l| NORTH_AMERICAN_LOCALES.contains(&l))
        || (language == "en" && desktop)
    {
        (FormatPreset::Us, "North America")
    } else if EUROPEAN_LANGUAGES.contains(&language) {
        (FormatPreset::European, "Europe")
    } else if language == "en" {
        (FormatPreset::Us, "UK/International")
    } else {
        (FormatPreset::European, "International (European format)")
    };

    LocaleDefaults {
        format: preset.options(),
        region,
    }
}
