use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ─── Server-Assigned Identifiers ───────────────────────────────────────────────

// The backend hands out opaque string ids; the client never parses them.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a quiz.
    QuizId
);

opaque_id!(
    /// Identifier of a question within a quiz.
    QuestionId
);

opaque_id!(
    /// Identifier of a backend participation record (one attempt by one user).
    ParticipationId
);

// ─── Local Identifiers ─────────────────────────────────────────────────────────

/// Client-side identifier for one session attempt, used to correlate logs.
///
/// Every load (including a retake) gets a fresh value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptId({})", self.0)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_id_displays_raw_value() {
        let id = QuestionId::new("q-42");
        assert_eq!(id.to_string(), "q-42");
        assert_eq!(format!("{id:?}"), "QuestionId(q-42)");
    }

    #[test]
    fn opaque_id_serializes_as_plain_string() {
        let id = QuizId::from("quiz-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"quiz-7\"");

        let parsed: ParticipationId = serde_json::from_str("\"p-1\"").unwrap();
        assert_eq!(parsed, ParticipationId::new("p-1"));
    }

    #[test]
    fn attempt_ids_are_unique() {
        assert_ne!(AttemptId::generate(), AttemptId::generate());
    }
}
