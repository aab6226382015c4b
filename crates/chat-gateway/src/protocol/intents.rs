//! Gateway intents
//!
//! Intents select which groups of dispatch events the server sends to this
//! session. They travel in Identify as a plain integer.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Gateway intent flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        const GUILDS                        = 1 << 0;
        /// Privileged
        const GUILD_MEMBERS                 = 1 << 1;
        const GUILD_MODERATION              = 1 << 2;
        const GUILD_EMOJIS_AND_STICKERS     = 1 << 3;
        const GUILD_INTEGRATIONS            = 1 << 4;
        const GUILD_WEBHOOKS                = 1 << 5;
        const GUILD_INVITES                 = 1 << 6;
        const GUILD_VOICE_STATES            = 1 << 7;
        /// Privileged
        const GUILD_PRESENCES               = 1 << 8;
        const GUILD_MESSAGES                = 1 << 9;
        const GUILD_MESSAGE_REACTIONS       = 1 << 10;
        const GUILD_MESSAGE_TYPING          = 1 << 11;
        const DIRECT_MESSAGES               = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS      = 1 << 13;
        const DIRECT_MESSAGE_TYPING         = 1 << 14;
        /// Privileged
        const MESSAGE_CONTENT               = 1 << 15;
        const GUILD_SCHEDULED_EVENTS        = 1 << 16;
        const AUTO_MODERATION_CONFIGURATION = 1 << 20;
        const AUTO_MODERATION_EXECUTION     = 1 << 21;
    }
}

impl Intents {
    /// OR together a list of intents
    pub fn combine<I>(intents: I) -> Self
    where
        I: IntoIterator<Item = Intents>,
    {
        intents.into_iter().fold(Self::empty(), |acc, i| acc | i)
    }

    /// Parse flag names (`GUILDS`, `guild_messages`, ...) or decimal masks
    ///
    /// Every entry must be either a known flag name or a number whose bits
    /// are all known flags.
    pub fn from_names<I, S>(names: I) -> Result<Self, InvalidIntent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut intents = Self::empty();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }

            let flag = if let Ok(bits) = name.parse::<u64>() {
                Self::from_bits(bits)
            } else {
                Self::from_name(&name.to_uppercase())
            };
            intents |= flag.ok_or_else(|| InvalidIntent(name.to_string()))?;
        }
        Ok(intents)
    }

    /// Intents that must be enabled in the application settings first
    #[must_use]
    pub fn privileged() -> Self {
        Self::GUILD_MEMBERS | Self::GUILD_PRESENCES | Self::MESSAGE_CONTENT
    }
}

impl Default for Intents {
    fn default() -> Self {
        Self::GUILDS
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{} ({})", names.join(" | "), self.bits())
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

/// An intent name or mask that does not match any known flag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown gateway intent: {0}")]
pub struct InvalidIntent(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_values() {
        assert_eq!(Intents::GUILDS.bits(), 1);
        assert_eq!(Intents::GUILD_MESSAGES.bits(), 512);
        assert_eq!(Intents::MESSAGE_CONTENT.bits(), 32768);
        assert_eq!(Intents::AUTO_MODERATION_EXECUTION.bits(), 1 << 21);
    }

    #[test]
    fn test_combine() {
        let intents = Intents::combine([
            Intents::GUILDS,
            Intents::GUILD_MESSAGES,
            Intents::MESSAGE_CONTENT,
        ]);
        assert_eq!(intents.bits(), 1 | 512 | 32768);
        assert_eq!(Intents::combine([]), Intents::empty());
    }

    #[test]
    fn test_from_names() {
        let intents = Intents::from_names(["GUILDS", "guild_messages", " DIRECT_MESSAGES "]).unwrap();
        assert_eq!(
            intents,
            Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::DIRECT_MESSAGES
        );
    }

    #[test]
    fn test_from_decimal_mask() {
        let intents = Intents::from_names(["33281"]).unwrap();
        assert_eq!(
            intents,
            Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT
        );

        // bit 17 is not a known intent
        assert!(Intents::from_names(["131072"]).is_err());
    }

    #[test]
    fn test_unknown_name() {
        let err = Intents::from_names(["GUILDS", "GUILD_PARTIES"]).unwrap_err();
        assert_eq!(err, InvalidIntent("GUILD_PARTIES".to_string()));
    }

    #[test]
    fn test_serialize_as_integer() {
        let json = serde_json::to_string(&(Intents::GUILDS | Intents::GUILD_MEMBERS)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn test_privileged() {
        assert!(Intents::privileged().contains(Intents::MESSAGE_CONTENT));
        assert!(!Intents::privileged().contains(Intents::GUILDS));
    }
}
