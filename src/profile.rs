//! Profile data model.
//!
//! A profile is a fixed, ordered set of six sections. Each section carries a
//! completion status and an opaque, section-specific `data` payload. The
//! aggregate completion percentage is always derived from the section
//! statuses, never stored independently.

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity of a profile section. The set is closed: sections are created
/// once at store initialization and never added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Photo,
    Contact,
    Socials,
    Brokerage,
    Branding,
    Bio,
}

impl SectionId {
    /// All section ids, in profile order.
    pub const ALL: [SectionId; 6] = [
        SectionId::Photo,
        SectionId::Contact,
        SectionId::Socials,
        SectionId::Brokerage,
        SectionId::Branding,
        SectionId::Bio,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Contact => "contact",
            Self::Socials => "socials",
            Self::Brokerage => "brokerage",
            Self::Branding => "branding",
            Self::Bio => "bio",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = UnknownSectionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(Self::Photo),
            "contact" => Ok(Self::Contact),
            "socials" => Ok(Self::Socials),
            "brokerage" => Ok(Self::Brokerage),
            "branding" => Ok(Self::Branding),
            "bio" => Ok(Self::Bio),
            _ => Err(UnknownSectionId(s.to_string())),
        }
    }
}

/// Error for a section id outside the fixed set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Section \"{0}\" not found")]
pub struct UnknownSectionId(pub String);

/// Completion status of a single section. The only transitions are
/// todo→complete and complete→todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Todo,
    Complete,
}

/// One named unit of profile data.
///
/// `data` is an opaque section-specific payload; updates replace it
/// wholesale, never deep-merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSection {
    pub id: SectionId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub status: SectionStatus,
    pub icon_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// Full profile view: the ordered section sequence plus derived completion.
///
/// `updated_at` is stamped on every read and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub sections: Vec<ProfileSection>,
    pub completion_percentage: u8,
    pub updated_at: String,
}

impl Profile {
    /// An empty profile, used as the cache's pre-hydration state.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
            completion_percentage: 0,
            updated_at: now_rfc3339(),
        }
    }
}

/// Lightweight progress summary, cheaper than a full profile read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub completion_percentage: u8,
    pub updated_at: String,
}

/// Derived completion: round(100 × complete / total).
#[must_use]
pub fn completion_percentage(sections: &[ProfileSection]) -> u8 {
    if sections.is_empty() {
        return 0;
    }
    let complete = sections
        .iter()
        .filter(|s| s.status == SectionStatus::Complete)
        .count();
    ((complete as f64 / sections.len() as f64) * 100.0).round() as u8
}

/// Current wall-clock time as an RFC-3339 string with millisecond precision.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The six seed sections, in profile order. The photo section starts
/// complete with a placeholder photo; everything else starts todo.
#[must_use]
pub fn seed_sections() -> Vec<ProfileSection> {
    vec![
        ProfileSection {
            id: SectionId::Photo,
            title: "Your photo".to_string(),
            subtitle: None,
            status: SectionStatus::Complete,
            icon_name: "camera".to_string(),
            photo_uri: Some("https://picsum.photos/80".to_string()),
            data: None,
        },
        ProfileSection {
            id: SectionId::Contact,
            title: "Contact Details".to_string(),
            subtitle: None,
            status: SectionStatus::Todo,
            icon_name: "account-outline".to_string(),
            photo_uri: None,
            data: None,
        },
        ProfileSection {
            id: SectionId::Socials,
            title: "Socials & Links".to_string(),
            subtitle: Some("Includes your personal & team sites".to_string()),
            status: SectionStatus::Todo,
            icon_name: "link".to_string(),
            photo_uri: None,
            data: None,
        },
        ProfileSection {
            id: SectionId::Brokerage,
            title: "Brokerage".to_string(),
            subtitle: None,
            status: SectionStatus::Todo,
            icon_name: "account-group-outline".to_string(),
            photo_uri: None,
            data: None,
        },
        ProfileSection {
            id: SectionId::Branding,
            title: "Team & Branding".to_string(),
            subtitle: None,
            status: SectionStatus::Todo,
            icon_name: "brush".to_string(),
            photo_uri: None,
            data: None,
        },
        ProfileSection {
            id: SectionId::Bio,
            title: "Your Bio Page".to_string(),
            subtitle: None,
            status: SectionStatus::Todo,
            icon_name: "file-document-outline".to_string(),
            photo_uri: None,
            data: None,
        },
    ]
}
