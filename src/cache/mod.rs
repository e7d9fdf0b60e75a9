// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Optimistic mutation cache.
//!
//! The [`ProfileCache`] owns the client's view of the profile: the last
//! known server snapshot plus pending optimistic patches. A mutation
//! applies its speculative patch immediately, then reconciles with the
//! authoritative server response — committing it, rolling back on failure,
//! or discarding it entirely when a newer operation has superseded it.
//!
//! # Consistency rules
//!
//! - One live operation per slot ("section", "photo"). Beginning a new one
//!   cancels the previous token and bumps the slot generation atomically;
//!   a superseded operation's resolution never touches the cache.
//! - Staleness is re-checked at the response-application boundary, under
//!   the same lock that guards the snapshot.
//! - Every cache write bumps a write sequence, broadcast over a `watch`
//!   channel. Poll merges and background resyncs record the sequence as
//!   their basis and are discarded if it has moved.
//! - Rollback restores the exact section captured immediately before the
//!   speculative patch, and completes before the mutating call returns.

mod slot;

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::profile::{
    completion_percentage, Profile, ProfileSection, ProgressSummary, SectionId, SectionStatus,
};
use crate::transport::retry::{retry, RetryConfig};
use crate::transport::{ProfileTransport, TransportError};

use slot::MutationSlot;

/// Resolution of a section mutation, as seen by the caller.
#[derive(Debug)]
pub enum MutationOutcome {
    /// The server committed the mutation; the cache holds the authoritative
    /// section (which may differ from the optimistic guess).
    Committed(ProfileSection),
    /// Cancelled or superseded by a newer operation. Silent: no cache
    /// change, no user-visible notice.
    Cancelled,
    /// 409: rolled back and a background resync has been scheduled.
    /// Non-fatal; `message` is the server's conflict notice.
    Conflict { message: String },
    /// Terminal failure after bounded retries; rolled back.
    Failed(TransportError),
}

/// Resolution of a photo upload.
#[derive(Debug)]
pub enum UploadOutcome {
    Committed { photo_uri: String },
    Cancelled,
    Failed(TransportError),
}

struct CacheInner {
    profile: Profile,
    /// Bumped on every write; the staleness basis for poll merges.
    seq: u64,
}

impl CacheInner {
    /// Apply a speculative patch, returning the exact pre-patch section.
    /// `None` when the cache holds no section with `id` (not yet hydrated).
    fn patch_section(
        &mut self,
        id: SectionId,
        status: SectionStatus,
        data: Option<Map<String, Value>>,
    ) -> Option<ProfileSection> {
        let section = self.profile.sections.iter_mut().find(|s| s.id == id)?;
        let previous = section.clone();
        section.status = status;
        if let Some(data) = data {
            section.data = Some(data);
        }
        self.recompute();
        Some(previous)
    }

    /// Replace a section wholesale (authoritative commit or rollback).
    fn replace_section(&mut self, section: ProfileSection) {
        if let Some(existing) = self.profile.sections.iter_mut().find(|s| s.id == section.id) {
            *existing = section;
            self.recompute();
        }
    }

    fn patch_photo(&mut self, photo_uri: &str) {
        if let Some(section) = self
            .profile
            .sections
            .iter_mut()
            .find(|s| s.id == SectionId::Photo)
        {
            section.photo_uri = Some(photo_uri.to_string());
            section.status = SectionStatus::Complete;
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        self.profile.completion_percentage = completion_percentage(&self.profile.sections);
        self.seq += 1;
    }
}

/// Client-side cached profile view with optimistic updates.
pub struct ProfileCache {
    transport: Arc<dyn ProfileTransport>,
    inner: Mutex<CacheInner>,
    section_slot: MutationSlot,
    photo_slot: MutationSlot,
    changed: watch::Sender<u64>,
    mutation_retry: RetryConfig,
    read_retry: RetryConfig,
    /// Self-handle for spawning the background resync after a conflict.
    weak_self: Weak<ProfileCache>,
}

impl ProfileCache {
    /// Create an unhydrated cache; call [`refresh`](Self::refresh) to load
    /// the first snapshot.
    #[must_use]
    pub fn new(transport: Arc<dyn ProfileTransport>, config: &SyncConfig) -> Arc<Self> {
        let (changed, _) = watch::channel(0);
        Arc::new_cyclic(|weak| Self {
            transport,
            inner: Mutex::new(CacheInner { profile: Profile::empty(), seq: 0 }),
            section_slot: MutationSlot::default(),
            photo_slot: MutationSlot::default(),
            changed,
            mutation_retry: RetryConfig::with_retries(config.mutation_retries),
            read_retry: RetryConfig::with_retries(config.read_retries),
            weak_self: weak.clone(),
        })
    }

    /// Current snapshot: section list plus derived completion. Synchronous
    /// and non-blocking.
    #[must_use]
    pub fn read(&self) -> Profile {
        self.inner.lock().profile.clone()
    }

    /// Current write sequence.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.inner.lock().seq
    }

    /// Subscribe to cache-changed notifications (the write sequence).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    /// Fetch the full profile and replace the snapshot. The result is
    /// discarded if any write landed while the fetch was in flight.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), TransportError> {
        let basis = self.sequence();
        let token = CancellationToken::new();
        let profile = retry("fetch_profile", &self.read_retry, &token, || {
            self.transport.fetch_profile(&token)
        })
        .await?;

        let seq = {
            let mut inner = self.inner.lock();
            if inner.seq != basis {
                debug!(basis, current = inner.seq, "Refresh discarded: snapshot moved");
                return Ok(());
            }
            inner.profile = profile;
            inner.seq += 1;
            inner.seq
        };
        let _ = self.changed.send(seq);
        Ok(())
    }

    /// Optimistically update one section.
    ///
    /// Cancels any in-flight section mutation, applies the speculative
    /// patch, then reconciles with the server response. See the module docs
    /// for the exact resolution rules.
    pub async fn mutate_section(
        &self,
        id: SectionId,
        status: SectionStatus,
        data: Option<Map<String, Value>>,
    ) -> MutationOutcome {
        // begin() and the speculative patch share one lock acquisition so a
        // competing operation cannot interleave between them.
        let (token, generation, previous) = {
            let mut inner = self.inner.lock();
            let (token, generation) = self.section_slot.begin();
            let previous = inner.patch_section(id, status, data.clone());
            (token, generation, previous)
        };
        self.notify();

        let result = retry("update_section", &self.mutation_retry, &token, || {
            self.transport.update_section(id, status, data.clone(), &token)
        })
        .await;

        match result {
            Ok(section) => {
                {
                    let mut inner = self.inner.lock();
                    if token.is_cancelled() || !self.section_slot.is_current(generation) {
                        crate::metrics::record_mutation("section", "superseded");
                        return MutationOutcome::Cancelled;
                    }
                    inner.replace_section(section.clone());
                }
                self.section_slot.finish(generation);
                self.notify();
                crate::metrics::record_mutation("section", "committed");
                MutationOutcome::Committed(section)
            }
            Err(TransportError::Cancelled) => {
                crate::metrics::record_mutation("section", "cancelled");
                MutationOutcome::Cancelled
            }
            Err(err) => {
                {
                    let mut inner = self.inner.lock();
                    if token.is_cancelled() || !self.section_slot.is_current(generation) {
                        crate::metrics::record_mutation("section", "superseded");
                        return MutationOutcome::Cancelled;
                    }
                    if let Some(previous) = previous {
                        inner.replace_section(previous);
                    }
                }
                self.section_slot.finish(generation);
                self.notify();

                if err.is_conflict() {
                    let message = match &err {
                        TransportError::Http { message, .. } => message.clone(),
                        _ => err.to_string(),
                    };
                    warn!(section = %id, "Conflict: rolled back, scheduling resync");
                    crate::metrics::record_mutation("section", "conflict");
                    self.spawn_resync();
                    MutationOutcome::Conflict { message }
                } else {
                    warn!(section = %id, error = %err, "Mutation failed: rolled back");
                    crate::metrics::record_mutation("section", "failed");
                    MutationOutcome::Failed(err)
                }
            }
        }
    }

    /// Upload a photo through the dedicated photo slot.
    ///
    /// No speculative patch: the photo section is committed only on
    /// success, so cancellation leaves the cache untouched by construction.
    #[tracing::instrument(skip(self, photo_uri))]
    pub async fn upload_photo(&self, photo_uri: &str) -> UploadOutcome {
        let (token, generation) = {
            let _inner = self.inner.lock();
            self.photo_slot.begin()
        };

        let result = retry("upload_photo", &self.mutation_retry, &token, || {
            self.transport.upload_photo(photo_uri, &token)
        })
        .await;

        match result {
            Ok(upload) => {
                {
                    let mut inner = self.inner.lock();
                    if token.is_cancelled() || !self.photo_slot.is_current(generation) {
                        crate::metrics::record_mutation("photo", "superseded");
                        return UploadOutcome::Cancelled;
                    }
                    inner.patch_photo(&upload.photo_uri);
                }
                self.photo_slot.finish(generation);
                self.notify();
                crate::metrics::record_mutation("photo", "committed");
                UploadOutcome::Committed { photo_uri: upload.photo_uri }
            }
            Err(TransportError::Cancelled) => {
                crate::metrics::record_mutation("photo", "cancelled");
                UploadOutcome::Cancelled
            }
            Err(err) => {
                if token.is_cancelled() || !self.photo_slot.is_current(generation) {
                    crate::metrics::record_mutation("photo", "superseded");
                    return UploadOutcome::Cancelled;
                }
                self.photo_slot.finish(generation);
                warn!(error = %err, "Photo upload failed");
                crate::metrics::record_mutation("photo", "failed");
                UploadOutcome::Failed(err)
            }
        }
    }

    /// Cancel any in-flight photo upload. Idempotent; an in-flight response
    /// will not patch the cache, and no notice is produced.
    pub fn cancel_upload(&self) {
        self.photo_slot.cancel();
    }

    /// One poll tick: fetch the progress summary and merge only the
    /// completion percentage, last-write-safe.
    pub(crate) async fn poll_progress(&self, cancel: &CancellationToken) {
        let basis = self.sequence();
        match self.transport.fetch_progress(cancel).await {
            Ok(summary) => self.merge_progress(basis, &summary),
            Err(TransportError::Cancelled) => {}
            Err(err) => {
                // Next tick covers transient failures; no retry within a tick.
                debug!(error = %err, "Progress poll failed");
            }
        }
    }

    /// Merge a polled completion percentage whose basis is `basis`.
    /// Discarded when any write landed after the basis was recorded.
    pub(crate) fn merge_progress(&self, basis: u64, summary: &ProgressSummary) {
        let seq = {
            let mut inner = self.inner.lock();
            if inner.seq != basis {
                debug!(basis, current = inner.seq, "Poll merge discarded: basis is stale");
                crate::metrics::record_poll_merge("stale");
                return;
            }
            if inner.profile.completion_percentage == summary.completion_percentage {
                crate::metrics::record_poll_merge("unchanged");
                return;
            }
            inner.profile.completion_percentage = summary.completion_percentage;
            inner.seq += 1;
            crate::metrics::record_poll_merge("applied");
            inner.seq
        };
        let _ = self.changed.send(seq);
    }

    fn spawn_resync(&self) {
        let Some(cache) = self.weak_self.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = cache.refresh().await {
                debug!(error = %err, "Background resync failed");
            }
        });
    }

    fn notify(&self) {
        let (seq, completion) = {
            let inner = self.inner.lock();
            (inner.seq, inner.profile.completion_percentage)
        };
        crate::metrics::set_completion(completion);
        let _ = self.changed.send(seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{now_rfc3339, seed_sections};
    use crate::transport::PhotoUpload;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::time::sleep;

    /// Scripted transport: queued results per call, optional pre-resolution
    /// delay so tests can observe in-flight state.
    struct StubTransport {
        profile: SyncMutex<Profile>,
        section_results: SyncMutex<VecDeque<Result<ProfileSection, TransportError>>>,
        photo_results: SyncMutex<VecDeque<Result<PhotoUpload, TransportError>>>,
        delay: Duration,
    }

    impl StubTransport {
        fn new() -> Self {
            let sections = seed_sections();
            Self {
                profile: SyncMutex::new(Profile {
                    completion_percentage: completion_percentage(&sections),
                    sections,
                    updated_at: now_rfc3339(),
                }),
                section_results: SyncMutex::new(VecDeque::new()),
                photo_results: SyncMutex::new(VecDeque::new()),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn queue_section(&self, result: Result<ProfileSection, TransportError>) {
            self.section_results.lock().push_back(result);
        }

        fn queue_photo(&self, result: Result<PhotoUpload, TransportError>) {
            self.photo_results.lock().push_back(result);
        }
    }

    #[async_trait]
    impl ProfileTransport for StubTransport {
        async fn fetch_profile(
            &self,
            cancel: &CancellationToken,
        ) -> Result<Profile, TransportError> {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            Ok(self.profile.lock().clone())
        }

        async fn fetch_progress(
            &self,
            cancel: &CancellationToken,
        ) -> Result<ProgressSummary, TransportError> {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            let profile = self.profile.lock();
            Ok(ProgressSummary {
                completion_percentage: profile.completion_percentage,
                updated_at: now_rfc3339(),
            })
        }

        async fn update_section(
            &self,
            _id: SectionId,
            _status: SectionStatus,
            _data: Option<Map<String, Value>>,
            cancel: &CancellationToken,
        ) -> Result<ProfileSection, TransportError> {
            tokio::select! {
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                _ = sleep(self.delay) => {}
            }
            self.section_results
                .lock()
                .pop_front()
                .unwrap_or(Err(TransportError::Network("no scripted result".into())))
        }

        async fn upload_photo(
            &self,
            photo_uri: &str,
            cancel: &CancellationToken,
        ) -> Result<PhotoUpload, TransportError> {
            tokio::select! {
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                _ = sleep(self.delay) => {}
            }
            self.photo_results
                .lock()
                .pop_front()
                .unwrap_or(Ok(PhotoUpload { photo_uri: photo_uri.to_string() }))
        }
    }

    fn test_config() -> SyncConfig {
        SyncConfig { mutation_retries: 0, read_retries: 0, ..Default::default() }
    }

    async fn hydrated_cache(transport: Arc<StubTransport>) -> Arc<ProfileCache> {
        let cache = ProfileCache::new(transport, &test_config());
        cache.refresh().await.unwrap();
        cache
    }

    fn bio_section(status: SectionStatus, data: Option<Map<String, Value>>) -> ProfileSection {
        let mut section = seed_sections().pop().unwrap();
        section.status = status;
        section.data = data;
        section
    }

    #[tokio::test]
    async fn test_refresh_hydrates() {
        let transport = Arc::new(StubTransport::new());
        let cache = hydrated_cache(transport).await;

        let snapshot = cache.read();
        assert_eq!(snapshot.sections.len(), 6);
        assert_eq!(snapshot.completion_percentage, 17);
    }

    #[tokio::test]
    async fn test_speculative_patch_applies_before_response() {
        let transport = Arc::new(StubTransport::new().with_delay(Duration::from_millis(150)));
        transport.queue_section(Ok(bio_section(SectionStatus::Complete, None)));
        let cache = hydrated_cache(transport).await;

        let worker = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.mutate_section(SectionId::Bio, SectionStatus::Complete, None).await
            })
        };

        sleep(Duration::from_millis(30)).await;
        // Speculative state visible while the request is in flight
        let snapshot = cache.read();
        let bio = snapshot.sections.iter().find(|s| s.id == SectionId::Bio).unwrap();
        assert_eq!(bio.status, SectionStatus::Complete);
        assert_eq!(snapshot.completion_percentage, 33);

        let outcome = worker.await.unwrap();
        assert!(matches!(outcome, MutationOutcome::Committed(_)));
    }

    #[tokio::test]
    async fn test_commit_replaces_with_authoritative_section() {
        let transport = Arc::new(StubTransport::new());
        // Server stores trimmed data, different from the optimistic guess
        let mut server_data = Map::new();
        server_data.insert("bio".to_string(), json!("hi"));
        transport.queue_section(Ok(bio_section(SectionStatus::Complete, Some(server_data))));
        let cache = hydrated_cache(transport).await;

        let mut guess = Map::new();
        guess.insert("bio".to_string(), json!("  hi  "));
        let outcome = cache
            .mutate_section(SectionId::Bio, SectionStatus::Complete, Some(guess))
            .await;

        let MutationOutcome::Committed(section) = outcome else {
            panic!("expected commit");
        };
        assert_eq!(section.data.as_ref().unwrap()["bio"], "hi");

        let cached = cache.read();
        let bio = cached.sections.iter().find(|s| s.id == SectionId::Bio).unwrap();
        assert_eq!(bio.data.as_ref().unwrap()["bio"], "hi");
        assert_eq!(cached.completion_percentage, 33);
    }

    #[tokio::test]
    async fn test_rollback_on_server_error_restores_exact_section() {
        let transport = Arc::new(StubTransport::new());
        transport.queue_section(Err(TransportError::Http {
            status: 500,
            message: "Internal server error".into(),
        }));
        let cache = hydrated_cache(transport).await;

        let before = cache.read();
        let bio_before = before.sections.iter().find(|s| s.id == SectionId::Bio).unwrap().clone();

        let mut data = Map::new();
        data.insert("bio".to_string(), json!("hi"));
        let outcome = cache
            .mutate_section(SectionId::Bio, SectionStatus::Complete, Some(data))
            .await;

        assert!(matches!(outcome, MutationOutcome::Failed(_)));
        let after = cache.read();
        let bio_after = after.sections.iter().find(|s| s.id == SectionId::Bio).unwrap();
        // Exact pre-patch section restored, completion recomputed
        assert_eq!(*bio_after, bio_before);
        assert_eq!(after.completion_percentage, before.completion_percentage);
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_and_resyncs() {
        let transport = Arc::new(StubTransport::new());
        transport.queue_section(Err(TransportError::Http {
            status: 409,
            message: "Conflict: profile was updated by another session. Please refresh.".into(),
        }));
        let cache = hydrated_cache(transport.clone()).await;
        let before = cache.read();

        let outcome = cache.mutate_section(SectionId::Bio, SectionStatus::Complete, None).await;

        let MutationOutcome::Conflict { message } = outcome else {
            panic!("expected conflict");
        };
        assert!(message.contains("Conflict"));
        // Rollback is complete before the call returns
        assert_eq!(cache.read().sections, before.sections);

        // The background resync lands shortly after
        sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.read().completion_percentage, 17);
    }

    #[tokio::test]
    async fn test_second_mutation_supersedes_first() {
        let transport = Arc::new(StubTransport::new().with_delay(Duration::from_millis(100)));
        let mut contact = seed_sections().remove(1);
        contact.status = SectionStatus::Complete;
        transport.queue_section(Ok(contact.clone()));
        transport.queue_section(Ok(contact));
        let cache = hydrated_cache(transport).await;

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.mutate_section(SectionId::Contact, SectionStatus::Complete, None).await
            })
        };
        sleep(Duration::from_millis(20)).await;

        let second = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.mutate_section(SectionId::Contact, SectionStatus::Todo, None).await
            })
        };

        let first_outcome = first.await.unwrap();
        let second_outcome = second.await.unwrap();

        // The superseded operation resolves silently
        assert!(matches!(first_outcome, MutationOutcome::Cancelled));
        assert!(matches!(second_outcome, MutationOutcome::Committed(_)));
    }

    #[tokio::test]
    async fn test_upload_commits_photo_on_success() {
        let transport = Arc::new(StubTransport::new());
        let cache = hydrated_cache(transport).await;

        let outcome = cache.upload_photo("file:///new.jpg").await;

        let UploadOutcome::Committed { photo_uri } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(photo_uri, "file:///new.jpg");

        let photo = cache.read().sections[0].clone();
        assert_eq!(photo.photo_uri.as_deref(), Some("file:///new.jpg"));
        assert_eq!(photo.status, SectionStatus::Complete);
    }

    #[tokio::test]
    async fn test_cancel_upload_leaves_cache_unchanged() {
        let transport = Arc::new(StubTransport::new().with_delay(Duration::from_millis(200)));
        let cache = hydrated_cache(transport).await;
        let before = cache.read();

        let worker = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.upload_photo("file:///new.jpg").await })
        };
        sleep(Duration::from_millis(20)).await;
        cache.cancel_upload();

        let outcome = worker.await.unwrap();
        assert!(matches!(outcome, UploadOutcome::Cancelled));
        assert_eq!(cache.read().sections, before.sections);

        // Cancelling again is a no-op
        cache.cancel_upload();
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_cache_unchanged() {
        let transport = Arc::new(StubTransport::new());
        transport.queue_photo(Err(TransportError::Http {
            status: 500,
            message: "Upload failed. Please try again.".into(),
        }));
        let cache = hydrated_cache(transport).await;
        let before = cache.read();

        let outcome = cache.upload_photo("file:///new.jpg").await;

        assert!(matches!(outcome, UploadOutcome::Failed(_)));
        assert_eq!(cache.read().sections, before.sections);
    }

    #[tokio::test]
    async fn test_merge_progress_applies_on_current_basis() {
        let transport = Arc::new(StubTransport::new());
        let cache = hydrated_cache(transport).await;

        let basis = cache.sequence();
        cache.merge_progress(
            basis,
            &ProgressSummary { completion_percentage: 50, updated_at: now_rfc3339() },
        );

        assert_eq!(cache.read().completion_percentage, 50);
    }

    #[tokio::test]
    async fn test_merge_progress_discards_stale_basis() {
        let transport = Arc::new(StubTransport::new());
        transport.queue_section(Ok(bio_section(SectionStatus::Complete, None)));
        let cache = hydrated_cache(transport).await;

        // Poll records its basis, then a mutation commits
        let basis = cache.sequence();
        let outcome = cache.mutate_section(SectionId::Bio, SectionStatus::Complete, None).await;
        assert!(matches!(outcome, MutationOutcome::Committed(_)));
        assert_eq!(cache.read().completion_percentage, 33);

        // The stale poll result must not clobber the mutation's completion
        cache.merge_progress(
            basis,
            &ProgressSummary { completion_percentage: 17, updated_at: now_rfc3339() },
        );
        assert_eq!(cache.read().completion_percentage, 33);
    }

    #[tokio::test]
    async fn test_merge_progress_unchanged_percentage_no_write() {
        let transport = Arc::new(StubTransport::new());
        let cache = hydrated_cache(transport).await;

        let seq = cache.sequence();
        cache.merge_progress(
            seq,
            &ProgressSummary { completion_percentage: 17, updated_at: now_rfc3339() },
        );
        // Identical percentage: no write, sequence unmoved
        assert_eq!(cache.sequence(), seq);
    }

    #[tokio::test]
    async fn test_subscriber_notified_on_write() {
        let transport = Arc::new(StubTransport::new());
        transport.queue_section(Ok(bio_section(SectionStatus::Complete, None)));
        let cache = hydrated_cache(transport).await;

        let mut rx = cache.subscribe();
        let seen = *rx.borrow_and_update();

        cache.mutate_section(SectionId::Bio, SectionStatus::Complete, None).await;

        rx.changed().await.unwrap();
        assert!(*rx.borrow() > seen);
    }

    #[tokio::test]
    async fn test_completion_consistent_in_every_snapshot() {
        let transport = Arc::new(StubTransport::new());
        transport.queue_section(Ok(bio_section(SectionStatus::Complete, None)));
        transport.queue_section(Err(TransportError::Http {
            status: 500,
            message: "Internal server error".into(),
        }));
        let cache = hydrated_cache(transport).await;

        for (status, _) in [(SectionStatus::Complete, true), (SectionStatus::Todo, false)] {
            cache.mutate_section(SectionId::Bio, status, None).await;
            let snapshot = cache.read();
            assert_eq!(
                snapshot.completion_percentage,
                completion_percentage(&snapshot.sections)
            );
        }
    }
}
