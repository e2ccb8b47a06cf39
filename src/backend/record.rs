//! Appointment records as stored on every node.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

/// Length of a record identifier.
pub const APPTID_LEN: usize = 32;

const APPTID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A single appointment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub apptid: String,
    pub status: String,
    #[serde(rename = "TimeQueued")]
    pub time_queued: DateTime<Utc>,
    #[serde(rename = "QueueDate", default)]
    pub queue_date: Option<DateTime<Utc>>,
    #[serde(rename = "StartTime", default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "EndTime", default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "isVirtual")]
    pub is_virtual: bool,
    #[serde(rename = "RegionName")]
    pub region_name: String,
}

/// Payload of a create request. The identifier is optional and generated
/// by the router when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentDraft {
    #[serde(default)]
    pub apptid: Option<String>,
    pub status: String,
    #[serde(rename = "TimeQueued")]
    pub time_queued: DateTime<Utc>,
    #[serde(rename = "QueueDate", default)]
    pub queue_date: Option<DateTime<Utc>>,
    #[serde(rename = "StartTime", default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "EndTime", default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "isVirtual", default)]
    pub is_virtual: bool,
    #[serde(rename = "RegionName")]
    pub region_name: String,
}

impl AppointmentDraft {
    /// Turn the draft into a record carrying `apptid`. The region is stored
    /// trimmed.
    pub fn into_record(self, apptid: String) -> AppointmentRecord {
        AppointmentRecord {
            apptid,
            status: self.status,
            time_queued: self.time_queued,
            queue_date: self.queue_date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_virtual: self.is_virtual,
            region_name: canonical_region(&self.region_name),
        }
    }
}

/// Partial update. Absent fields keep their stored value. The optional
/// timestamps take `Some(None)` from an explicit `null`, which clears them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentPatch {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "TimeQueued", default)]
    pub time_queued: Option<DateTime<Utc>>,
    #[serde(rename = "QueueDate", default, deserialize_with = "present")]
    pub queue_date: Option<Option<DateTime<Utc>>>,
    #[serde(rename = "StartTime", default, deserialize_with = "present")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(rename = "EndTime", default, deserialize_with = "present")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    #[serde(rename = "isVirtual", default)]
    pub is_virtual: Option<bool>,
    #[serde(rename = "RegionName", default)]
    pub region_name: Option<String>,
}

impl AppointmentPatch {
    /// Apply the patch on top of `record`, returning the updated copy.
    pub fn apply(self, record: &AppointmentRecord) -> AppointmentRecord {
        AppointmentRecord {
            apptid: record.apptid.clone(),
            status: self.status.unwrap_or_else(|| record.status.clone()),
            time_queued: self.time_queued.unwrap_or(record.time_queued),
            queue_date: self.queue_date.unwrap_or(record.queue_date),
            start_time: self.start_time.unwrap_or(record.start_time),
            end_time: self.end_time.unwrap_or(record.end_time),
            is_virtual: self.is_virtual.unwrap_or(record.is_virtual),
            region_name: self
                .region_name
                .map(|r| canonical_region(&r))
                .unwrap_or_else(|| record.region_name.clone()),
        }
    }
}

/// A field that is present in the payload, `null` included.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Region text as stored: surrounding whitespace removed, case kept.
pub fn canonical_region(region: &str) -> String {
    region.trim().to_string()
}

/// Generate a fresh identifier: 32 characters from `[A-Z0-9]`.
pub fn generate_apptid() -> String {
    let mut rng = rand::thread_rng();
    (0..APPTID_LEN)
        .map(|_| APPTID_ALPHABET[rng.gen_range(0..APPTID_ALPHABET.len())] as char)
        .collect()
}

/// Check that a caller-supplied identifier has the generated shape.
pub fn is_valid_apptid(id: &str) -> bool {
    id.len() == APPTID_LEN && id.bytes().all(|b| APPTID_ALPHABET.contains(&b))
}
