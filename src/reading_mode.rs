//! Reading mode selection and its mapping onto Tesseract page segmentation

/// Expected text layout, chosen by the user per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingMode {
    /// Block of text, full page layout analysis
    #[default]
    AutoBlock,
    /// Exactly one line, no layout analysis
    SingleLine,
    /// One word or character, no layout analysis
    SingleToken,
}

impl ReadingMode {
    /// Parse from a request form field
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "block" => Some(Self::AutoBlock),
            "line" => Some(Self::SingleLine),
            "word" => Some(Self::SingleToken),
            _ => None,
        }
    }

    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoBlock => "block",
            Self::SingleLine => "line",
            Self::SingleToken => "word",
        }
    }

    /// Tesseract page segmentation mode (`tessedit_pageseg_mode`) for this
    /// layout. Exhaustive: a new mode cannot compile without extending it.
    pub fn psm(&self) -> &'static str {
        match self {
            Self::AutoBlock => "3",
            Self::SingleLine => "7",
            Self::SingleToken => "10",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_auto_block() {
        assert_eq!(ReadingMode::default(), ReadingMode::AutoBlock);
    }

    #[test]
    fn test_psm_mapping_is_stable() {
        assert_eq!(ReadingMode::AutoBlock.psm(), "3");
        assert_eq!(ReadingMode::SingleLine.psm(), "7");
        assert_eq!(ReadingMode::SingleToken.psm(), "10");
    }

    #[test]
    fn test_from_str_roundtrip() {
        for mode in [
            ReadingMode::AutoBlock,
            ReadingMode::SingleLine,
            ReadingMode::SingleToken,
        ] {
            assert_eq!(ReadingMode::from_str(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert_eq!(ReadingMode::from_str("sparse"), None);
        assert_eq!(ReadingMode::from_str(""), None);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(ReadingMode::from_str("Block"), Some(ReadingMode::AutoBlock));
        assert_eq!(ReadingMode::from_str("LINE"), Some(ReadingMode::SingleLine));
    }
}
