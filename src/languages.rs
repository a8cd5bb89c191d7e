use std::fmt;

/// Base size used when the selected code has no entry of its own.
pub const DEFAULT_BASE_FONT_SIZE: u32 = 85;

/// Card languages with a dedicated background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageCode {
    Ar,
    En,
    Fr,
    Bn,
    In,
    Ur,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 6] = [
        LanguageCode::Ar,
        LanguageCode::En,
        LanguageCode::Fr,
        LanguageCode::Bn,
        LanguageCode::In,
        LanguageCode::Ur,
    ];

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "ar" => Some(LanguageCode::Ar),
            "en" => Some(LanguageCode::En),
            "fr" => Some(LanguageCode::Fr),
            "bn" => Some(LanguageCode::Bn),
            "in" => Some(LanguageCode::In),
            "ur" => Some(LanguageCode::Ur),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageCode::Ar => "ar",
            LanguageCode::En => "en",
            LanguageCode::Fr => "fr",
            LanguageCode::Bn => "bn",
            LanguageCode::In => "in",
            LanguageCode::Ur => "ur",
        }
    }

    /// File name of the background asset inside the assets directory.
    pub fn background_file(self) -> String {
        format!("card-{}.png", self.as_str())
    }

    /// Base font size in pixels before auto-fit shrinking.
    pub fn base_font_size(self) -> u32 {
        match self {
            LanguageCode::Ar | LanguageCode::Ur => 95,
            _ => DEFAULT_BASE_FONT_SIZE,
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected card language: the code resolved from user input plus the
/// base font size chosen for it. Unknown codes keep the Arabic
/// background but take the default size rather than the Arabic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    code: LanguageCode,
    base_font_size: u32,
}

impl Language {
    pub fn from_code(code: &str) -> Self {
        match LanguageCode::parse(code) {
            Some(code) => Language {
                code,
                base_font_size: code.base_font_size(),
            },
            None => Language {
                code: LanguageCode::Ar,
                base_font_size: DEFAULT_BASE_FONT_SIZE,
            },
        }
    }

    pub fn code(self) -> LanguageCode {
        self.code
    }

    pub fn background_file(self) -> String {
        self.code.background_file()
    }

    pub fn base_font_size(self) -> u32 {
        self.base_font_size
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::from_code("ar")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.code.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_parse_case_insensitively() {
        assert_eq!(LanguageCode::parse("  EN "), Some(LanguageCode::En));
        assert_eq!(LanguageCode::parse("de"), None);
        assert_eq!(LanguageCode::parse(""), None);
    }

    #[test]
    fn unknown_codes_fall_back_to_the_arabic_background_at_default_size() {
        let unknown = Language::from_code("de");
        assert_eq!(unknown.code(), LanguageCode::Ar);
        assert_eq!(unknown.background_file(), "card-ar.png");
        assert_eq!(unknown.base_font_size(), DEFAULT_BASE_FONT_SIZE);

        let arabic = Language::from_code("ar");
        assert_eq!(arabic.base_font_size(), 95);
    }

    #[test]
    fn background_files_follow_language_code() {
        assert_eq!(LanguageCode::En.background_file(), "card-en.png");
        assert_eq!(LanguageCode::Ur.background_file(), "card-ur.png");
    }

    #[test]
    fn arabic_script_languages_use_larger_base_size() {
        assert_eq!(LanguageCode::Ar.base_font_size(), 95);
        assert_eq!(LanguageCode::Ur.base_font_size(), 95);
        assert_eq!(LanguageCode::Bn.base_font_size(), 85);
    }
}
