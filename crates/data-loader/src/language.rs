//! Language inference from the script a title is written in.
//!
//! Regional titles often carry no language code, but a title written in
//! Tamil script is a strong signal for `ta`. Each script block below maps to
//! exactly one language code. The blocks are disjoint, so the priority order
//! only affects how early the scan can stop.

/// A contiguous Unicode block and the language it signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptRange {
    pub script: &'static str,
    pub start: char,
    pub end: char,
    pub code: &'static str,
}

impl ScriptRange {
    pub fn contains(&self, c: char) -> bool {
        (self.start..=self.end).contains(&c)
    }
}

/// Script blocks in priority order.
///
/// Devanagari is shared by Hindi and Marathi; it is attributed to Hindi.
pub const SCRIPT_RANGES: [ScriptRange; 10] = [
    ScriptRange { script: "Devanagari", start: '\u{0900}', end: '\u{097F}', code: "hi" },
    ScriptRange { script: "Gurmukhi", start: '\u{0A00}', end: '\u{0A7F}', code: "pa" },
    ScriptRange { script: "Gujarati", start: '\u{0A80}', end: '\u{0AFF}', code: "gu" },
    ScriptRange { script: "Oriya", start: '\u{0B00}', end: '\u{0B7F}', code: "or" },
    ScriptRange { script: "Tamil", start: '\u{0B80}', end: '\u{0BFF}', code: "ta" },
    ScriptRange { script: "Telugu", start: '\u{0C00}', end: '\u{0C7F}', code: "te" },
    ScriptRange { script: "Kannada", start: '\u{0C80}', end: '\u{0CFF}', code: "kn" },
    ScriptRange { script: "Malayalam", start: '\u{0D00}', end: '\u{0D7F}', code: "ml" },
    ScriptRange { script: "Bengali", start: '\u{0980}', end: '\u{09FF}', code: "bn" },
    ScriptRange { script: "Arabic", start: '\u{0600}', end: '\u{06FF}', code: "ur" },
];

/// Detect a language code from the script of `text`.
///
/// Returns the code of the first range (in priority order) that any
/// character of `text` falls into, or `None` for empty text or text with no
/// character in any range.
pub fn detect_language(text: &str) -> Option<&'static str> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    SCRIPT_RANGES
        .iter()
        .find(|range| text.chars().any(|c| range.contains(c)))
        .map(|range| range.code)
}

/// Stateless detector handle for callers that prefer a value over a free function
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLanguageDetector;

impl ScriptLanguageDetector {
    /// Detect from an optional cell; null cells detect as `None`
    pub fn detect(&self, text: Option<&str>) -> Option<&'static str> {
        text.and_then(detect_language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_each_script() {
        assert_eq!(detect_language("शोले"), Some("hi"));
        assert_eq!(detect_language("ਪੰਜਾਬ"), Some("pa"));
        assert_eq!(detect_language("ગુજરાત"), Some("gu"));
        assert_eq!(detect_language("ଓଡ଼ିଆ"), Some("or"));
        assert_eq!(detect_language("ரோஜா"), Some("ta"));
        assert_eq!(detect_language("బాహుబలి"), Some("te"));
        assert_eq!(detect_language("ಕನ್ನಡ"), Some("kn"));
        assert_eq!(detect_language("മലയാളം"), Some("ml"));
        assert_eq!(detect_language("পথের পাঁচালী"), Some("bn"));
        assert_eq!(detect_language("مغلِ اعظم"), Some("ur"));
    }

    #[test]
    fn test_latin_and_empty_text() {
        assert_eq!(detect_language("Sholay"), None);
        assert_eq!(detect_language(""), None);
        assert_eq!(detect_language("   "), None);
        assert_eq!(ScriptLanguageDetector.detect(None), None);
    }

    #[test]
    fn test_mixed_text_uses_script_characters() {
        assert_eq!(detect_language("Roja (ரோஜா) 1992"), Some("ta"));
    }

    #[test]
    fn test_ranges_are_disjoint() {
        for (i, a) in SCRIPT_RANGES.iter().enumerate() {
            assert!(a.start <= a.end);
            for b in &SCRIPT_RANGES[i + 1..] {
                assert!(a.end < b.start || b.end < a.start, "{} overlaps {}", a.script, b.script);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Kabhi ख़ुशी कभी ग़म";
        assert_eq!(detect_language(text), detect_language(text));
    }
}
