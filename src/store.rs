// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Authoritative in-memory profile store.
//!
//! One store instance owns the single section sequence. The sequence is
//! mutated only by [`ProfileStore::update_section`] and
//! [`ProfileStore::update_photo`], each an atomic lookup-and-replace under
//! one exclusive lock. Reads hand out defensive copies with a freshly
//! computed completion percentage and timestamp.
//!
//! The store is lifecycle-scoped: construct one per process (or per test)
//! rather than sharing process-wide state.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::profile::{
    completion_percentage, now_rfc3339, seed_sections, Profile, ProfileSection, ProgressSummary,
    SectionId, SectionStatus,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Section \"{0}\" not found")]
    NotFound(String),
}

/// In-memory profile state.
pub struct ProfileStore {
    sections: RwLock<Vec<ProfileSection>>,
}

impl ProfileStore {
    /// Create a store seeded with the six fixed sections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: RwLock::new(seed_sections()),
        }
    }

    /// Full profile snapshot: defensive copy of the section sequence plus
    /// fresh completion and timestamp. Never fails.
    #[must_use]
    pub fn profile(&self) -> Profile {
        let sections = self.sections.read().clone();
        Profile {
            completion_percentage: completion_percentage(&sections),
            sections,
            updated_at: now_rfc3339(),
        }
    }

    /// Completion percentage and timestamp only; cheaper than a full read.
    /// Never fails.
    #[must_use]
    pub fn progress(&self) -> ProgressSummary {
        let sections = self.sections.read();
        ProgressSummary {
            completion_percentage: completion_percentage(&sections),
            updated_at: now_rfc3339(),
        }
    }

    /// Replace a section's status and, when `data` is supplied, its payload
    /// (wholesale — omitting `data` leaves the previous value untouched).
    ///
    /// Fails with [`StoreError::NotFound`] when no section has `id`.
    pub fn update_section(
        &self,
        id: &str,
        status: SectionStatus,
        data: Option<Map<String, Value>>,
    ) -> Result<ProfileSection, StoreError> {
        let section_id: SectionId = id.parse().map_err(|_| StoreError::NotFound(id.to_string()))?;

        let mut sections = self.sections.write();
        let section = sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        section.status = status;
        if let Some(data) = data {
            section.data = Some(data);
        }
        debug!(id = %section_id, status = ?status, "Section updated");
        Ok(section.clone())
    }

    /// Set the photo section's URI and force its status to complete.
    ///
    /// The photo section is seeded at construction and never removed, so the
    /// error arm is unreachable in practice.
    pub fn update_photo(&self, photo_uri: &str) -> Result<ProfileSection, StoreError> {
        let mut sections = self.sections.write();
        let section = sections
            .iter_mut()
            .find(|s| s.id == SectionId::Photo)
            .ok_or_else(|| StoreError::NotFound(SectionId::Photo.to_string()))?;

        section.photo_uri = Some(photo_uri.to_string());
        section.status = SectionStatus::Complete;
        debug!(photo_uri = %photo_uri, "Photo updated");
        Ok(section.clone())
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}
