//! Session types for chatapps-bridge
//!
//! A session record maps a (possibly hashed) user/session pair back to the
//! clear 8x8 identifiers needed to address a reply.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a session record: the working ids handed to the AI platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.session_id)
    }
}

/// Persisted clear-identifier mapping plus last-activity clock.
///
/// `clear_user_id` and `clear_session_id` are write-once; see [`SessionRecord::bind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Clear msisdn (E.164)
    pub clear_user_id: Option<String>,
    /// Clear 8x8 channel id
    pub clear_session_id: Option<String>,
    /// Epoch millis of the last refresh
    pub timestamp: Option<i64>,
}

/// Result of [`SessionRecord::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Identifiers were stored for the first time.
    New,
    /// Identifiers were already stored with the same values.
    Unchanged,
    /// A different value was offered and ignored.
    Conflict,
}

/// Result of [`SessionRecord::touch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    /// No timestamp existed; it was set.
    Started,
    /// The timeout had elapsed; the timestamp was bumped.
    Refreshed,
    /// Within the timeout (or timeout disabled); left alone.
    Active,
}

impl SessionRecord {
    /// Store the clear identifiers unless they are already set.
    pub fn bind(&mut self, clear_user_id: &str, clear_session_id: &str) -> Binding {
        let mut binding = Binding::Unchanged;
        for (slot, value) in [
            (&mut self.clear_user_id, clear_user_id),
            (&mut self.clear_session_id, clear_session_id),
        ] {
            match slot {
                None => {
                    *slot = Some(value.to_string());
                    if binding == Binding::Unchanged {
                        binding = Binding::New;
                    }
                }
                Some(existing) if existing != value => binding = Binding::Conflict,
                Some(_) => {}
            }
        }
        binding
    }

    /// Update the activity clock.
    ///
    /// The timestamp is only moved forward once `timeout_secs` have passed since
    /// it was last set. A timeout of 0 disables refreshing.
    pub fn touch(&mut self, now_ms: i64, timeout_secs: u64) -> Touch {
        match self.timestamp {
            None => {
                self.timestamp = Some(now_ms);
                Touch::Started
            }
            Some(ts) => {
                let timeout_ms = i64::try_from(timeout_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
                if timeout_secs > 0 && now_ms.saturating_sub(ts) > timeout_ms {
                    self.timestamp = Some(now_ms);
                    Touch::Refreshed
                } else {
                    Touch::Active
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(SessionKey::new("u", "s").to_string(), "u:s");
    }

    #[test]
    fn test_bind_new_record() {
        let mut record = SessionRecord::default();
        assert_eq!(record.bind("+6512345678", "chan-1"), Binding::New);
        assert_eq!(record.clear_user_id.as_deref(), Some("+6512345678"));
        assert_eq!(record.clear_session_id.as_deref(), Some("chan-1"));
    }

    #[test]
    fn test_bind_same_values_unchanged() {
        let mut record = SessionRecord::default();
        record.bind("+1", "c");
        assert_eq!(record.bind("+1", "c"), Binding::Unchanged);
    }

    #[test]
    fn test_bind_is_write_once() {
        let mut record = SessionRecord::default();
        record.bind("+1", "c");
        assert_eq!(record.bind("+2", "c"), Binding::Conflict);
        assert_eq!(record.clear_user_id.as_deref(), Some("+1"));
    }

    #[test]
    fn test_bind_fills_missing_half() {
        let mut record = SessionRecord {
            clear_user_id: Some("+1".to_string()),
            ..Default::default()
        };
        assert_eq!(record.bind("+1", "c"), Binding::New);
        assert_eq!(record.clear_session_id.as_deref(), Some("c"));
    }

    #[test]
    fn test_touch_starts_clock() {
        let mut record = SessionRecord::default();
        assert_eq!(record.touch(1_000, 1800), Touch::Started);
        assert_eq!(record.timestamp, Some(1_000));
    }

    #[test]
    fn test_touch_within_timeout_is_active() {
        let mut record = SessionRecord {
            timestamp: Some(1_000),
            ..Default::default()
        };
        assert_eq!(record.touch(1_000 + 1_800_000, 1800), Touch::Active);
        assert_eq!(record.timestamp, Some(1_000));
    }

    #[test]
    fn test_touch_after_timeout_refreshes() {
        let mut record = SessionRecord {
            timestamp: Some(1_000),
            ..Default::default()
        };
        assert_eq!(record.touch(1_000 + 1_800_001, 1800), Touch::Refreshed);
        assert_eq!(record.timestamp, Some(1_800_001 + 1_000));
    }

    #[test]
    fn test_touch_zero_timeout_disabled() {
        let mut record = SessionRecord {
            timestamp: Some(0),
            ..Default::default()
        };
        assert_eq!(record.touch(i64::MAX, 0), Touch::Active);
        assert_eq!(record.timestamp, Some(0));
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = SessionRecord {
            clear_user_id: Some("+1".to_string()),
            clear_session_id: Some("c".to_string()),
            timestamp: Some(42),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
