//! Document save-state machine.
//!
//! `DocumentWorkspace` owns the editing buffers for one document at a time:
//! the mutable editor content, the content of the last loaded or saved
//! version, and the save state derived from their difference. Saves create
//! immutable, server-numbered versions; restoring an old version appends a
//! copy rather than rewriting history.
//!
//! Two races are handled explicitly: at most one save round-trip may be in
//! flight per document, and a save completing after the workspace moved to
//! another document (or was reset) discards its result instead of writing
//! into the wrong document's state.

use chrono::Utc;
use inklet_client::{
    ApiGateway, DocumentsApi, SessionContext, VersionCreate, VersionListParams, VersionsApi,
};
use inklet_core::{
    auto_save_eligible, Document, InkletError, Result, SaveSettings, SaveSettingsPatch, SaveState,
    SaveType, Version, VersionListItem,
};
use inklet_infrastructure::SettingsStorage;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct WorkspaceState {
    current_document: Option<Document>,
    current_version: Option<Version>,
    versions: Vec<VersionListItem>,
    editor_content: String,
    original_content: String,
    save_state: SaveState,
    /// Bumped whenever the document context changes; in-flight operations
    /// re-check it before applying their results.
    epoch: u64,
}

/// The save-state machine for the active editing session.
pub struct DocumentWorkspace {
    documents: DocumentsApi,
    versions: VersionsApi,
    session: SessionContext,
    settings_storage: SettingsStorage,
    state: RwLock<WorkspaceState>,
    save_settings: RwLock<SaveSettings>,
}

impl DocumentWorkspace {
    pub fn new(gateway: Arc<ApiGateway>, settings_storage: SettingsStorage) -> Self {
        Self {
            documents: DocumentsApi::new(Arc::clone(&gateway)),
            versions: VersionsApi::new(Arc::clone(&gateway)),
            session: gateway.session().clone(),
            settings_storage,
            state: RwLock::new(WorkspaceState::default()),
            save_settings: RwLock::new(SaveSettings::default()),
        }
    }

    // ============================================================================
    // Loading
    // ============================================================================

    /// Loads a document: metadata, then the version list (newest first),
    /// then the newest version's content into both buffers.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the document does not exist
    /// - `Consistency` when the document exists but has no versions; the
    ///   history is supposed to be non-empty from creation, so this is not
    ///   silently defaulted
    pub async fn load_document(&self, document_id: &str) -> Result<()> {
        let document = self.documents.get(document_id).await?;
        let versions = self
            .versions
            .list(document_id, &VersionListParams::newest_page())
            .await?;
        let Some(newest) = versions.first() else {
            return Err(InkletError::consistency(format!(
                "document '{document_id}' exists but has no versions"
            )));
        };
        let version = self.versions.get(document_id, &newest.id).await?;

        let auto_save_interval = self.save_settings.read().unwrap().auto_save_interval_ms();
        let mut state = self.state.write().unwrap();
        state.epoch += 1;
        state.current_document = Some(document);
        state.versions = versions;
        state.editor_content = version.content.clone();
        state.original_content = version.content.clone();
        state.current_version = Some(version);
        state.save_state = SaveState {
            auto_save_interval,
            ..SaveState::default()
        };
        Ok(())
    }

    /// Loads one specific version into both buffers.
    ///
    /// A read operation: it never creates a version, it only moves the
    /// editing session onto an existing snapshot.
    pub async fn load_version(&self, document_id: &str, version_id: &str) -> Result<()> {
        let version = self.versions.get(document_id, version_id).await?;

        let mut state = self.state.write().unwrap();
        state.editor_content = version.content.clone();
        state.original_content = version.content.clone();
        state.save_state.is_dirty = false;
        state.current_version = Some(version);
        Ok(())
    }

    /// Refreshes the version list for the current document, optionally
    /// filtered by save type.
    pub async fn load_versions(&self, save_type: Option<SaveType>) -> Result<()> {
        let (document_id, epoch) = self.current_context()?;
        let params = VersionListParams {
            save_type,
            ..VersionListParams::newest_page()
        };
        let versions = self.versions.list(&document_id, &params).await?;

        let mut state = self.state.write().unwrap();
        if state.epoch == epoch {
            state.versions = versions;
        }
        Ok(())
    }

    // ============================================================================
    // Editing and saving
    // ============================================================================

    /// Replaces the editor buffer and recomputes dirtiness.
    ///
    /// Purely local; called on every keystroke batch. Debouncing, if
    /// wanted, belongs to the editor widget.
    pub fn update_content(&self, content: &str) {
        let mut state = self.state.write().unwrap();
        state.editor_content = content.to_string();
        state.save_state.is_dirty = state.editor_content != state.original_content;
    }

    /// Persists the editor buffer as a new version.
    ///
    /// A clean buffer is a no-op that returns the current version without
    /// touching the network. While a save is in flight further saves are
    /// rejected with `SaveInProgress`, never interleaved. On success the
    /// new version becomes current, the baseline is reset to what was
    /// actually saved, and the version list is refreshed (best-effort).
    /// On failure the buffer and the dirty flag are untouched, so the user
    /// can retry without losing anything.
    pub async fn save_version(
        &self,
        commit_message: Option<String>,
        kind: SaveType,
    ) -> Result<Version> {
        let (document_id, epoch, content) = {
            let mut state = self.state.write().unwrap();
            let document_id = state
                .current_document
                .as_ref()
                .ok_or_else(|| InkletError::internal("no document loaded"))?
                .id
                .clone();

            if !state.save_state.is_dirty {
                return state
                    .current_version
                    .clone()
                    .ok_or_else(|| InkletError::internal("no version loaded"));
            }
            if state.save_state.is_saving {
                return Err(InkletError::SaveInProgress);
            }
            state.save_state.is_saving = true;
            (document_id, state.epoch, state.editor_content.clone())
        };

        let request = VersionCreate {
            content,
            commit_message: Some(
                commit_message.unwrap_or_else(|| kind.default_commit_message().to_string()),
            ),
            save_type: Some(kind),
            author: Some(self.author()),
        };

        let result = self.versions.create(&document_id, &request).await;

        let version = {
            let mut state = self.state.write().unwrap();
            state.save_state.is_saving = false;
            match result {
                Err(err) => return Err(err),
                Ok(version) => {
                    if !Self::still_current(&state, &document_id, epoch) {
                        tracing::warn!(
                            %document_id,
                            "discarding save result for a document no longer loaded"
                        );
                        return Ok(version);
                    }
                    // Baseline becomes what the server persisted; edits typed
                    // during the round-trip stay dirty.
                    state.original_content = version.content.clone();
                    state.save_state.is_dirty = state.editor_content != state.original_content;
                    state.save_state.last_saved = Some(Utc::now());
                    state.current_version = Some(version.clone());
                    version
                }
            }
        };

        if let Err(err) = self.load_versions(None).await {
            tracing::warn!("failed to refresh version list after save: {err}");
        }
        Ok(version)
    }

    /// Restores an old version by asking the server to append a copy of it.
    ///
    /// History is immutable: the target version is untouched, a new version
    /// with its content becomes current and reseeds both buffers. Takes the
    /// same one-in-flight guard as a save, since it creates a version.
    pub async fn restore_version(&self, version_id: &str) -> Result<Version> {
        let (document_id, epoch) = {
            let mut state = self.state.write().unwrap();
            let document_id = state
                .current_document
                .as_ref()
                .ok_or_else(|| InkletError::internal("no document loaded"))?
                .id
                .clone();
            if state.save_state.is_saving {
                return Err(InkletError::SaveInProgress);
            }
            state.save_state.is_saving = true;
            (document_id, state.epoch)
        };

        let result = self.versions.restore(&document_id, version_id).await;

        let version = {
            let mut state = self.state.write().unwrap();
            state.save_state.is_saving = false;
            match result {
                Err(err) => return Err(err),
                Ok(version) => {
                    if !Self::still_current(&state, &document_id, epoch) {
                        tracing::warn!(
                            %document_id,
                            "discarding restore result for a document no longer loaded"
                        );
                        return Ok(version);
                    }
                    state.editor_content = version.content.clone();
                    state.original_content = version.content.clone();
                    state.save_state.is_dirty = false;
                    state.current_version = Some(version.clone());
                    version
                }
            }
        };

        if let Err(err) = self.load_versions(None).await {
            tracing::warn!("failed to refresh version list after restore: {err}");
        }
        Ok(version)
    }

    // ============================================================================
    // Save settings
    // ============================================================================

    /// Merge-patches the save settings and persists them.
    ///
    /// A changed interval reflects immediately into the active save state
    /// (seconds to milliseconds).
    pub fn update_save_settings(&self, patch: &SaveSettingsPatch) -> Result<()> {
        let updated = {
            let mut settings = self.save_settings.write().unwrap();
            settings.apply(patch);
            settings.clone()
        };
        if patch.auto_save_interval.is_some() {
            self.state.write().unwrap().save_state.auto_save_interval =
                updated.auto_save_interval_ms();
        }
        self.settings_storage.save_save_settings(&updated)
    }

    /// Loads persisted save settings, keeping defaults when nothing (or
    /// nothing readable) is stored.
    pub fn load_save_settings(&self) {
        match self.settings_storage.load_save_settings() {
            Ok(Some(loaded)) => {
                let interval_ms = loaded.auto_save_interval_ms();
                *self.save_settings.write().unwrap() = loaded;
                self.state.write().unwrap().save_state.auto_save_interval = interval_ms;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!("failed to load save settings: {err}");
            }
        }
    }

    // ============================================================================
    // Lifecycle and observable state
    // ============================================================================

    /// Clears all document-scoped state; used on navigation away from an
    /// editing context. In-flight operations for the old document will find
    /// the epoch changed and discard their results.
    pub fn reset(&self) {
        let auto_save_interval = self.save_settings.read().unwrap().auto_save_interval_ms();
        let mut state = self.state.write().unwrap();
        let epoch = state.epoch + 1;
        *state = WorkspaceState {
            epoch,
            save_state: SaveState {
                auto_save_interval,
                ..SaveState::default()
            },
            ..WorkspaceState::default()
        };
    }

    pub fn editor_content(&self) -> String {
        self.state.read().unwrap().editor_content.clone()
    }

    /// Derived: editor buffer differs from the last loaded/saved content.
    pub fn is_dirty(&self) -> bool {
        self.state.read().unwrap().save_state.is_dirty
    }

    pub fn is_saving(&self) -> bool {
        self.state.read().unwrap().save_state.is_saving
    }

    pub fn current_document(&self) -> Option<Document> {
        self.state.read().unwrap().current_document.clone()
    }

    pub fn current_version(&self) -> Option<Version> {
        self.state.read().unwrap().current_version.clone()
    }

    pub fn version_list(&self) -> Vec<VersionListItem> {
        self.state.read().unwrap().versions.clone()
    }

    pub fn save_state(&self) -> SaveState {
        self.state.read().unwrap().save_state.clone()
    }

    pub fn save_settings(&self) -> SaveSettings {
        self.save_settings.read().unwrap().clone()
    }

    /// Enables or pauses auto-save for this editing session only.
    pub fn set_auto_save_enabled(&self, enabled: bool) {
        self.state.write().unwrap().save_state.auto_save_enabled = enabled;
    }

    /// Whether the auto-save timer should fire. The timer itself lives in
    /// the view layer and calls `save_version(None, SaveType::Auto)` on its
    /// own cadence.
    pub fn is_auto_save_eligible(&self) -> bool {
        let settings = self.save_settings.read().unwrap();
        let state = self.state.read().unwrap();
        auto_save_eligible(&settings, &state.save_state)
    }

    fn current_context(&self) -> Result<(String, u64)> {
        let state = self.state.read().unwrap();
        let document = state
            .current_document
            .as_ref()
            .ok_or_else(|| InkletError::internal("no document loaded"))?;
        Ok((document.id.clone(), state.epoch))
    }

    fn still_current(state: &WorkspaceState, document_id: &str, epoch: u64) -> bool {
        state.epoch == epoch
            && state
                .current_document
                .as_ref()
                .is_some_and(|document| document.id == document_id)
    }

    /// Versions are attributed to the signed-in user.
    fn author(&self) -> String {
        self.session
            .current_user()
            .map(|user| user.username)
            .unwrap_or_else(|| "anonymous".to_string())
    }
}
