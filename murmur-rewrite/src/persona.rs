//! The persona catalog and style selection.

use crate::error::RewriteError;

/// Maximum length of a free-text custom style description.
pub const MAX_CUSTOM_STYLE_CHARS: usize = 200;

/// A named rewriting persona from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    ExtremelySerious,
    ExtremelyPolite,
    Casual,
    Poetic,
    Corporate,
}

impl Persona {
    /// Every catalog persona, in display order.
    pub const ALL: [Self; 5] = [
        Self::ExtremelySerious,
        Self::ExtremelyPolite,
        Self::Casual,
        Self::Poetic,
        Self::Corporate,
    ];

    /// The catalog name callers select by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExtremelySerious => "extremely-serious",
            Self::ExtremelyPolite => "extremely-polite",
            Self::Casual => "casual",
            Self::Poetic => "poetic",
            Self::Corporate => "corporate",
        }
    }

    /// The style directive handed to the completion upstream.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::ExtremelySerious => {
                "a gravely serious, formal register, as if delivering news of great consequence"
            }
            Self::ExtremelyPolite => {
                "an excessively courteous, deferential tone full of pleasantries"
            }
            Self::Casual => "a relaxed, conversational tone, like a text between friends",
            Self::Poetic => "a lyrical, imagery-rich voice with gentle rhythm",
            Self::Corporate => "bland corporate communications speak, heavy on buzzwords",
        }
    }

    /// Look up a persona by its catalog name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|persona| persona.name() == name)
    }
}

/// How the caller asked for the rewrite to sound: a catalog persona, or
/// bounded free-text guidance. Exists only for the duration of one
/// transformation call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSelector {
    Persona(Persona),
    Custom(String),
}

impl StyleSelector {
    /// Select a catalog persona by name.
    ///
    /// Unknown names are rejected, not silently ignored.
    pub fn named(name: &str) -> Result<Self, RewriteError> {
        Persona::from_name(name)
            .map(Self::Persona)
            .ok_or_else(|| RewriteError::UnknownPersona(name.to_string()))
    }

    /// Use free-text style guidance, bounded in length.
    pub fn custom(description: &str) -> Result<Self, RewriteError> {
        let description = description.trim();
        let length = description.chars().count();
        if length > MAX_CUSTOM_STYLE_CHARS {
            return Err(RewriteError::StyleTooLong {
                length,
                max: MAX_CUSTOM_STYLE_CHARS,
            });
        }
        Ok(Self::Custom(description.to_string()))
    }

    /// The style directive for the upstream instruction.
    #[must_use]
    pub fn directive(&self) -> &str {
        match self {
            Self::Persona(persona) => persona.directive(),
            Self::Custom(description) => description,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_round_trip() {
        for persona in Persona::ALL {
            assert_eq!(Persona::from_name(persona.name()), Some(persona));
            assert!(!persona.directive().is_empty());
        }
    }

    #[test]
    fn test_unknown_persona_is_rejected() {
        let err = StyleSelector::named("pirate").unwrap_err();
        assert!(matches!(err, RewriteError::UnknownPersona(name) if name == "pirate"));
    }

    #[test]
    fn test_named_selection() {
        let selector = StyleSelector::named("extremely-serious").unwrap();
        assert_eq!(
            selector,
            StyleSelector::Persona(Persona::ExtremelySerious)
        );
    }

    #[test]
    fn test_custom_style_is_bounded() {
        let ok = StyleSelector::custom("like a 1920s radio announcer").unwrap();
        assert_eq!(ok.directive(), "like a 1920s radio announcer");

        let too_long = "x".repeat(MAX_CUSTOM_STYLE_CHARS + 1);
        let err = StyleSelector::custom(&too_long).unwrap_err();
        assert!(matches!(
            err,
            RewriteError::StyleTooLong { length, max }
                if length == MAX_CUSTOM_STYLE_CHARS + 1 && max == MAX_CUSTOM_STYLE_CHARS
        ));
    }

    #[test]
    fn test_custom_style_is_trimmed() {
        let selector = StyleSelector::custom("  breathless sports commentary  ").unwrap();
        assert_eq!(selector.directive(), "breathless sports commentary");
    }
}
