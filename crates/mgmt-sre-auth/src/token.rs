//! Cached bearer token and its lifetime bookkeeping.

/// Lifetime assigned to every issued token (24 hours).
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Fraction of the lifetime, counted back from expiry, at which a refresh is due.
pub const REFRESH_FRACTION: f64 = 0.2;

/// A bearer token and the timestamps that govern its reuse.
///
/// Replaced as a whole; the value and its timestamps always belong to
/// the same fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRecord {
    pub value: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub refresh_at: i64,
}

impl TokenRecord {
    /// Record for a token issued at `issued_at` that lives for `lifetime_secs`.
    pub fn issue(value: impl Into<String>, issued_at: i64, lifetime_secs: i64) -> Self {
        let expires_at = issued_at + lifetime_secs;
        Self {
            value: value.into(),
            issued_at,
            expires_at,
            refresh_at: refresh_threshold(issued_at, expires_at),
        }
    }

    /// True until the first successful fetch.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Strictly past expiry; `now == expires_at` is still valid.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Non-empty and not expired.
    pub fn is_usable(&self, now: i64) -> bool {
        !self.is_empty() && !self.is_expired(now)
    }

    /// Strictly past the refresh threshold.
    pub fn refresh_due(&self, now: i64) -> bool {
        self.refresh_at >= 0 && now > self.refresh_at
    }

    /// Snapshot for display.
    pub fn info(&self, now: i64) -> TokenInfo {
        TokenInfo {
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            refresh_at: self.refresh_at,
            expires_in_secs: (self.expires_at - now).max(0) as u64,
            is_expired: self.is_expired(now),
            refresh_due: self.refresh_due(now),
        }
    }
}

/// `expires_at - 0.2 * (expires_at - issued_at)`, truncated to whole seconds.
pub fn refresh_threshold(issued_at: i64, expires_at: i64) -> i64 {
    (expires_at as f64 - (expires_at - issued_at) as f64 * REFRESH_FRACTION) as i64
}

// ============================================================================
// TokenInfo
// ============================================================================

/// Information about a cached token for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub issued_at: i64,
    pub expires_at: i64,
    pub refresh_at: i64,
    pub expires_in_secs: u64,
    pub is_expired: bool,
    pub refresh_due: bool,
}

impl TokenInfo {
    pub fn expires_in_display(&self) -> String {
        if self.is_expired {
            "Expired (will refresh on next use)".to_string()
        } else {
            let hours = self.expires_in_secs / 3600;
            let minutes = (self.expires_in_secs % 3600) / 60;
            format!("{}h {}m", hours, minutes)
        }
    }

    /// RFC 3339 rendering of an epoch-seconds timestamp.
    pub fn format_timestamp(secs: i64) -> String {
        chrono::DateTime::from_timestamp(secs, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| secs.to_string())
    }
}
