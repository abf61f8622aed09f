use crate::assistant::AssistantError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = AssistantError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(AssistantError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Sender {
    User => "user",
    Bot => "bot",
});

// How a reply was triggered; selects the typing delay.
str_enum!(ReplySource {
    FreeText => "free_text",
    QuickReply => "quick_reply",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sender_round_trip() {
        for (variant, s) in [(Sender::User, "user"), (Sender::Bot, "bot")] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Sender::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn reply_source_round_trip() {
        for (variant, s) in [
            (ReplySource::FreeText, "free_text"),
            (ReplySource::QuickReply, "quick_reply"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ReplySource::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_sender_rejected() {
        let err = Sender::from_str("assistant").unwrap_err();
        assert!(matches!(
            err,
            AssistantError::InvalidEnum { ref field, ref value }
                if field == "Sender" && value == "assistant"
        ));
    }

    #[test]
    fn serde_uses_string_forms() {
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
        assert_eq!(
            serde_json::from_str::<ReplySource>("\"quick_reply\"").unwrap(),
            ReplySource::QuickReply
        );
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(Sender::User.to_string(), "user");
    }
}
