// src/models/enums.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raised when a TEXT column holds a value that is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Declares an enum stored as upper-case TEXT.
/// Rows decode it with `#[sqlx(try_from = "String")]`, writes bind `as_str()`.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum!(
    /// Account role. Teachers author content, students consume it.
    UserRole {
        Student => "STUDENT",
        Teacher => "TEACHER",
        Admin => "ADMIN",
    }
);

text_enum!(Gender {
    Male => "MALE",
    Female => "FEMALE",
    Other => "OTHER",
});

text_enum!(
    /// Kind of content a learning item carries.
    LearningItemType {
        Video => "VIDEO",
        Document => "DOCUMENT",
        Exercise => "EXERCISE",
        Quiz => "QUIZ",
    }
);

text_enum!(QuestionType {
    MultipleChoice => "MULTIPLE_CHOICE",
    TrueFalse => "TRUE_FALSE",
    ShortAnswer => "SHORT_ANSWER",
});

text_enum!(
    /// `InProgress` is the only state that accepts answers; `Completed` is terminal.
    QuizAttemptStatus {
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
    }
);

impl UserRole {
    pub fn can_author(&self) -> bool {
        matches!(self, UserRole::Teacher | UserRole::Admin)
    }
}
