use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot used for every target this crate creates
pub const DEFAULT_SLOT: u32 = 0;

/// Metadata category cached for a connection
///
/// Purely informational for scheduling; the HTTP fetcher uses it to pick the
/// upstream endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKind {
    #[default]
    Image,
    Spec,
}

impl MetadataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::Image => "image",
            MetadataKind::Spec => "spec",
        }
    }

    /// Detect the kind from a `mini:<marker>:<provider>:<region>` connection name
    pub fn from_connection_name(name: &str) -> Option<Self> {
        match name.split(':').nth(1)? {
            "imageinfo" => Some(MetadataKind::Image),
            "specinfo" => Some(MetadataKind::Spec),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry key for a connection slot
pub fn target_name(connection_id: &str, slot: u32) -> String {
    format!("{}#{}", connection_id, slot)
}

/// One schedulable unit of refresh work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub connection_id: String,
    pub kind: MetadataKind,
    pub occupied: bool,
    pub occupied_count: u64,
    pub first_occupied_time: Option<DateTime<Utc>>,
}

impl Target {
    pub(crate) fn new(name: String, connection_id: String, kind: MetadataKind) -> Self {
        Self {
            name,
            connection_id,
            kind,
            occupied: false,
            occupied_count: 0,
            first_occupied_time: None,
        }
    }

    pub(crate) fn occupy(&mut self) {
        if self.occupied_count == 0 {
            self.first_occupied_time = Some(Utc::now());
        }
        self.occupied = true;
        self.occupied_count += 1;
    }
}
