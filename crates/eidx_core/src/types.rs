//! Core record types for the registry.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Separator between EID segments.
pub const EID_SEPARATOR: char = '.';

/// Metadata describing a single EID.
///
/// One record exists per EID. The `eid` string is the primary key; the
/// remaining identity fields place it in the namespace → radset → rad
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EidMetadata {
    /// The dotted identifier, e.g. `pandc.vnext.recommendations.view`.
    pub eid: String,
    /// First segment.
    pub namespace: String,
    /// Second segment.
    pub radset: String,
    /// Third segment.
    pub rad_id: String,
    /// Optional sub-action below the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subaction: Option<String>,
    /// Optional action segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Last time this EID was seen or used (Unix ms).
    #[serde(default)]
    pub last_seen: u64,
    /// Usage counter.
    #[serde(default)]
    pub frequency: u64,
    /// Mean response time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_response_time: Option<f64>,
    /// Error rate in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl EidMetadata {
    /// Builds a fresh record by splitting a dotted EID.
    ///
    /// The EID needs at least `namespace.radset.rad`. A fourth segment
    /// becomes the action and anything after it the subaction.
    pub fn from_eid(eid: &str, now_ms: u64) -> CoreResult<Self> {
        validate_eid(eid)?;

        let mut segments = eid.splitn(5, EID_SEPARATOR);
        let mut next = || segments.next().map(str::to_string);
        let (Some(namespace), Some(radset), Some(rad_id)) = (next(), next(), next()) else {
            return Err(CoreError::invalid_record(
                eid,
                "expected at least namespace.radset.rad",
            ));
        };
        let action = next();
        let subaction = next();

        Ok(Self {
            eid: eid.to_string(),
            namespace,
            radset,
            rad_id,
            subaction,
            action,
            last_seen: now_ms,
            frequency: 0,
            avg_response_time: None,
            error_rate: None,
            description: None,
            tags: BTreeSet::new(),
        })
    }

    /// Checks that the record is well formed.
    pub fn validate(&self) -> CoreResult<()> {
        validate_eid(&self.eid)?;

        for (field, value) in [
            ("namespace", &self.namespace),
            ("radset", &self.radset),
            ("radId", &self.rad_id),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::invalid_record(
                    &self.eid,
                    format!("{field} is empty"),
                ));
            }
        }

        if let Some(rate) = self.error_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(CoreError::invalid_record(
                    &self.eid,
                    format!("errorRate {rate} outside [0, 1]"),
                ));
            }
        }

        if let Some(avg) = self.avg_response_time {
            if !avg.is_finite() || avg < 0.0 {
                return Err(CoreError::invalid_record(
                    &self.eid,
                    format!("avgResponseTime {avg} is not a non-negative number"),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for EidMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.eid)
    }
}

/// Checks the shape of a dotted EID string.
fn validate_eid(eid: &str) -> CoreResult<()> {
    if eid.is_empty() {
        return Err(CoreError::invalid_record(eid, "eid is empty"));
    }
    if eid.chars().any(char::is_whitespace) {
        return Err(CoreError::invalid_record(eid, "eid contains whitespace"));
    }
    if eid.split(EID_SEPARATOR).any(str::is_empty) {
        return Err(CoreError::invalid_record(eid, "eid has an empty segment"));
    }
    Ok(())
}

/// A batch update to an existing record's observed metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EidUpdate {
    /// Target EID.
    pub eid: String,
    /// New last-seen time. Older values than the current one are ignored.
    #[serde(default)]
    pub last_seen: Option<u64>,
    /// Replacement mean response time.
    #[serde(default)]
    pub avg_response_time: Option<f64>,
    /// Replacement error rate.
    #[serde(default)]
    pub error_rate: Option<f64>,
    /// Amount added to the usage counter.
    #[serde(default)]
    pub frequency_delta: u64,
}

impl EidUpdate {
    /// Creates an empty update for `eid`.
    pub fn new(eid: impl Into<String>) -> Self {
        Self {
            eid: eid.into(),
            ..Self::default()
        }
    }

    /// Applies the update, leaving `meta` untouched if the result would
    /// not validate.
    pub(crate) fn apply_to(&self, meta: &mut EidMetadata) -> CoreResult<()> {
        let mut next = meta.clone();
        if let Some(seen) = self.last_seen {
            next.last_seen = next.last_seen.max(seen);
        }
        if self.avg_response_time.is_some() {
            next.avg_response_time = self.avg_response_time;
        }
        if self.error_rate.is_some() {
            next.error_rate = self.error_rate;
        }
        next.frequency = next.frequency.saturating_add(self.frequency_delta);
        next.validate()?;
        *meta = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_eid_splits_segments() {
        let meta = EidMetadata::from_eid("pandc.vnext.recommendations.view", 5).unwrap();
        assert_eq!(meta.namespace, "pandc");
        assert_eq!(meta.radset, "vnext");
        assert_eq!(meta.rad_id, "recommendations");
        assert_eq!(meta.action.as_deref(), Some("view"));
        assert_eq!(meta.subaction, None);
        assert_eq!(meta.last_seen, 5);
        assert_eq!(meta.frequency, 0);
    }

    #[test]
    fn from_eid_keeps_tail_as_subaction() {
        let meta = EidMetadata::from_eid("a.b.c.click.primary.left", 0).unwrap();
        assert_eq!(meta.action.as_deref(), Some("click"));
        assert_eq!(meta.subaction.as_deref(), Some("primary.left"));
    }

    #[test]
    fn from_eid_rejects_short_or_broken_ids() {
        assert!(EidMetadata::from_eid("", 0).is_err());
        assert!(EidMetadata::from_eid("a.b", 0).is_err());
        assert!(EidMetadata::from_eid("a..c", 0).is_err());
        assert!(EidMetadata::from_eid("a.b c.d", 0).is_err());
    }

    #[test]
    fn validate_metric_ranges() {
        let mut meta = EidMetadata::from_eid("a.b.c", 0).unwrap();
        assert!(meta.validate().is_ok());

        meta.error_rate = Some(1.5);
        assert!(meta.validate().is_err());

        meta.error_rate = Some(0.2);
        meta.avg_response_time = Some(f64::NAN);
        assert!(meta.validate().is_err());

        meta.avg_response_time = Some(12.5);
        meta.radset = " ".into();
        assert!(meta.validate().is_err());
    }

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let meta: EidMetadata = serde_json::from_str(
            r#"{"eid":"a.b.c","namespace":"a","radset":"b","radId":"c","errorRate":0.1}"#,
        )
        .unwrap();
        assert_eq!(meta.frequency, 0);
        assert_eq!(meta.error_rate, Some(0.1));
        assert!(meta.tags.is_empty());

        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"radId\":\"c\""));
        assert!(json.contains("\"lastSeen\":0"));
        assert!(!json.contains("description"));
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut meta = EidMetadata::from_eid("a.b.c", 100).unwrap();

        let mut update = EidUpdate::new("a.b.c");
        update.last_seen = Some(50);
        update.frequency_delta = 3;
        update.avg_response_time = Some(20.0);
        update.apply_to(&mut meta).unwrap();
        assert_eq!(meta.last_seen, 100);
        assert_eq!(meta.frequency, 3);
        assert_eq!(meta.avg_response_time, Some(20.0));

        let mut bad = EidUpdate::new("a.b.c");
        bad.frequency_delta = 1;
        bad.error_rate = Some(-1.0);
        assert!(bad.apply_to(&mut meta).is_err());
        assert_eq!(meta.frequency, 3);
        assert_eq!(meta.error_rate, None);
    }
}
