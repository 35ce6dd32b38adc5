//! Desktop file system: folders and documents on a canvas.
//!
//! Records live in the `folders` and `documents` tables. Moves triggered by
//! drag-and-drop are applied optimistically and rolled back if the write is
//! rejected; other mutations are written first and applied on success.

use crate::drag::{DragEvent, ItemKind, TargetKind};
use crate::error::{FluxError, FluxResult};
use crate::optimistic::{Optimistic, PendingId};
use crate::storage::{from_record, LocalDb, Record, StorageError};
use kurbo::Point;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

pub const FOLDERS_TABLE: &str = "folders";
pub const DOCUMENTS_TABLE: &str = "documents";

/// Editor a document opens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Spreadsheet,
}

impl DocumentKind {
    /// Content blob of a new, empty document.
    pub fn empty_content(self) -> Value {
        match self {
            DocumentKind::Text => json!({ "body": "" }),
            DocumentKind::Spreadsheet => json!({ "rows": 50, "columns": 26, "cells": {} }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub position: Option<Point>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    pub title: String,
    pub kind: DocumentKind,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub position: Option<Point>,
    pub created_at: String,
    pub updated_at: String,
}

/// Reference to a desktop item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Folder(String),
    Document(String),
}

impl ItemRef {
    pub fn id(&self) -> &str {
        match self {
            ItemRef::Folder(id) | ItemRef::Document(id) => id,
        }
    }
}

/// Changes to a document; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<Value>,
}

/// Every folder and document of one owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesktopState {
    pub folders: BTreeMap<String, FolderRecord>,
    pub documents: BTreeMap<String, DocumentRecord>,
}

impl DesktopState {
    /// True if `ancestor` is `folder` or one of its parents.
    ///
    /// Stored data is not guaranteed acyclic, so the walk stops on a repeat.
    pub fn is_ancestor_or_self(&self, ancestor: &str, folder: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(folder.to_string());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id.clone()) {
                return false;
            }
            current = self.folders.get(&id).and_then(|f| f.parent_id.clone());
        }
        false
    }

    fn contains(&self, item: &ItemRef) -> bool {
        match item {
            ItemRef::Folder(id) => self.folders.contains_key(id),
            ItemRef::Document(id) => self.documents.contains_key(id),
        }
    }

    fn parent_of(&self, item: &ItemRef) -> Option<&str> {
        match item {
            ItemRef::Folder(id) => self.folders.get(id)?.parent_id.as_deref(),
            ItemRef::Document(id) => self.documents.get(id)?.folder_id.as_deref(),
        }
    }

    fn set_parent(&mut self, item: &ItemRef, parent: Option<String>) {
        match item {
            ItemRef::Folder(id) => {
                if let Some(folder) = self.folders.get_mut(id) {
                    folder.parent_id = parent;
                }
            }
            ItemRef::Document(id) => {
                if let Some(doc) = self.documents.get_mut(id) {
                    doc.folder_id = parent;
                }
            }
        }
    }

    fn set_position(&mut self, item: &ItemRef, position: Point) {
        match item {
            ItemRef::Folder(id) => {
                if let Some(folder) = self.folders.get_mut(id) {
                    folder.position = Some(position);
                }
            }
            ItemRef::Document(id) => {
                if let Some(doc) = self.documents.get_mut(id) {
                    doc.position = Some(position);
                }
            }
        }
    }
}

fn row(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn inserted<T: DeserializeOwned>(rows: Vec<Record>) -> FluxResult<T> {
    let record = rows
        .into_iter()
        .next()
        .ok_or_else(|| StorageError::Other("Insert returned no rows".to_string()))?;
    Ok(from_record(record)?)
}

/// The row written by an update on `id`; missing if it vanished from storage.
fn updated<T: DeserializeOwned>(rows: Vec<Record>, kind: &'static str, id: &str) -> FluxResult<T> {
    let record = rows.into_iter().next().ok_or_else(|| FluxError::NotFound {
        kind,
        id: id.to_string(),
    })?;
    Ok(from_record(record)?)
}

fn table_for(item: &ItemRef) -> (&'static str, &'static str) {
    match item {
        ItemRef::Folder(_) => (FOLDERS_TABLE, "parent_id"),
        ItemRef::Document(_) => (DOCUMENTS_TABLE, "folder_id"),
    }
}

/// A move shown in the desktop state but not yet written.
///
/// Holds its own table handle, so persisting it does not borrow the
/// [`Desktop`].
#[must_use]
pub struct PendingMove {
    id: PendingId,
    db: LocalDb,
    item: ItemRef,
    patch: Record,
}

impl PendingMove {
    pub fn item(&self) -> &ItemRef {
        &self.item
    }

    /// Write the change. Pass the result to [`Desktop::settle`].
    pub async fn persist(&self) -> FluxResult<Vec<Record>> {
        let (table, _) = table_for(&self.item);
        Ok(self
            .db
            .from(table)
            .update(self.patch.clone())
            .eq("id", self.item.id())
            .execute()
            .await?)
    }
}

impl std::fmt::Debug for PendingMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMove")
            .field("id", &self.id)
            .field("item", &self.item)
            .field("patch", &self.patch)
            .finish()
    }
}

/// The folders and documents of one owner, backed by the local tables.
pub struct Desktop {
    owner: String,
    db: LocalDb,
    state: Optimistic<DesktopState>,
}

impl Desktop {
    /// Load every folder and document belonging to `owner`.
    pub async fn load(db: LocalDb, owner: &str) -> FluxResult<Self> {
        let mut state = DesktopState::default();

        let folders = db.from(FOLDERS_TABLE).select().eq("owner_id", owner).execute().await?;
        for record in folders {
            let folder: FolderRecord = from_record(record)?;
            state.folders.insert(folder.id.clone(), folder);
        }

        let documents = db.from(DOCUMENTS_TABLE).select().eq("owner_id", owner).execute().await?;
        for record in documents {
            let doc: DocumentRecord = from_record(record)?;
            state.documents.insert(doc.id.clone(), doc);
        }

        log::info!(
            "Loaded desktop for {}: {} folders, {} documents",
            owner,
            state.folders.len(),
            state.documents.len()
        );
        Ok(Self {
            owner: owner.to_string(),
            db,
            state: Optimistic::new(state),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Visible state, including moves still awaiting persistence.
    pub fn state(&self) -> &DesktopState {
        self.state.state()
    }

    pub fn folder(&self, id: &str) -> Option<&FolderRecord> {
        self.state().folders.get(id)
    }

    pub fn document(&self, id: &str) -> Option<&DocumentRecord> {
        self.state().documents.get(id)
    }

    /// Direct children of `folder` (`None` = desktop root), sorted by title.
    pub fn children(&self, folder: Option<&str>) -> (Vec<&FolderRecord>, Vec<&DocumentRecord>) {
        let state = self.state();
        let mut folders: Vec<_> = state
            .folders
            .values()
            .filter(|f| f.parent_id.as_deref() == folder)
            .collect();
        let mut documents: Vec<_> = state
            .documents
            .values()
            .filter(|d| d.folder_id.as_deref() == folder)
            .collect();
        folders.sort_by(|a, b| a.title.cmp(&b.title));
        documents.sort_by(|a, b| a.title.cmp(&b.title));
        (folders, documents)
    }

    fn require_folder(&self, id: &str) -> FluxResult<()> {
        if self.state().folders.contains_key(id) {
            Ok(())
        } else {
            Err(FluxError::NotFound {
                kind: "folder",
                id: id.to_string(),
            })
        }
    }

    fn require_document(&self, id: &str) -> FluxResult<()> {
        if self.state().documents.contains_key(id) {
            Ok(())
        } else {
            Err(FluxError::NotFound {
                kind: "document",
                id: id.to_string(),
            })
        }
    }

    /// Apply a change that is already durable.
    fn commit(&mut self, change: impl Fn(&mut DesktopState) + 'static) {
        let id = self.state.apply(change);
        self.state.confirm(id);
    }

    pub async fn create_folder(
        &mut self,
        title: &str,
        parent: Option<&str>,
        position: Option<Point>,
    ) -> FluxResult<FolderRecord> {
        if let Some(parent) = parent {
            self.require_folder(parent)?;
        }
        let rows = self
            .db
            .from(FOLDERS_TABLE)
            .insert(vec![row(json!({
                "owner_id": self.owner,
                "parent_id": parent,
                "title": title,
                "position": position,
            }))])
            .execute()
            .await?;
        let folder: FolderRecord = inserted(rows)?;

        let stored = folder.clone();
        self.commit(move |s| {
            s.folders.insert(stored.id.clone(), stored.clone());
        });
        Ok(folder)
    }

    pub async fn rename_folder(&mut self, id: &str, title: &str) -> FluxResult<()> {
        self.require_folder(id)?;
        let rows = self
            .db
            .from(FOLDERS_TABLE)
            .update(row(json!({ "title": title })))
            .eq("id", id)
            .execute()
            .await?;
        let folder: FolderRecord = updated(rows, "folder", id)?;
        self.commit(move |s| {
            s.folders.insert(folder.id.clone(), folder.clone());
        });
        Ok(())
    }

    /// Delete a folder. Its children move up to the folder's parent.
    ///
    /// This takes three writes. If one fails, children already re-parented
    /// are moved back, and local state is synced to whatever storage ends up
    /// holding.
    pub async fn delete_folder(&mut self, id: &str) -> FluxResult<()> {
        self.require_folder(id)?;
        let parent = self.state().folders.get(id).and_then(|f| f.parent_id.clone());

        let mut written = Vec::new();
        if let Err(e) = self.reparent_and_delete(id, parent, &mut written).await {
            log::warn!("Deleting folder {} failed: {}", id, e);
            let mut restored = Vec::new();
            if let Err(undo) = self.restore_children(id, &written, &mut restored).await {
                log::warn!("Could not restore children of {}: {}", id, undo);
            }
            // Rows restored later supersede the re-parented versions.
            written.extend(restored);
            self.refresh(written)?;
            return Err(e);
        }

        let id = id.to_string();
        self.commit(move |s| {
            s.folders.remove(&id);
        });
        self.refresh(written)
    }

    async fn reparent_and_delete(
        &self,
        id: &str,
        parent: Option<String>,
        written: &mut Vec<Record>,
    ) -> FluxResult<()> {
        written.extend(
            self.db
                .from(FOLDERS_TABLE)
                .update(row(json!({ "parent_id": parent })))
                .eq("parent_id", id)
                .execute()
                .await?,
        );
        written.extend(
            self.db
                .from(DOCUMENTS_TABLE)
                .update(row(json!({ "folder_id": parent })))
                .eq("folder_id", id)
                .execute()
                .await?,
        );
        self.db.from(FOLDERS_TABLE).delete().eq("id", id).execute().await?;
        Ok(())
    }

    /// Point re-parented rows back at `folder`, collecting the rows as stored.
    async fn restore_children(
        &self,
        folder: &str,
        moved: &[Record],
        restored: &mut Vec<Record>,
    ) -> FluxResult<()> {
        for record in moved {
            let Some(child) = record.get("id").and_then(Value::as_str) else {
                continue;
            };
            let (table, column) = if record.contains_key("kind") {
                (DOCUMENTS_TABLE, "folder_id")
            } else {
                (FOLDERS_TABLE, "parent_id")
            };
            let mut patch = Record::new();
            patch.insert(column.to_string(), Value::String(folder.to_string()));
            restored.extend(self.db.from(table).update(patch).eq("id", child).execute().await?);
        }
        Ok(())
    }

    pub async fn create_document(
        &mut self,
        title: &str,
        kind: DocumentKind,
        folder: Option<&str>,
        position: Option<Point>,
    ) -> FluxResult<DocumentRecord> {
        if let Some(folder) = folder {
            self.require_folder(folder)?;
        }
        let rows = self
            .db
            .from(DOCUMENTS_TABLE)
            .insert(vec![row(json!({
                "owner_id": self.owner,
                "folder_id": folder,
                "title": title,
                "kind": kind,
                "content": kind.empty_content(),
                "position": position,
            }))])
            .execute()
            .await?;
        let doc: DocumentRecord = inserted(rows)?;

        let stored = doc.clone();
        self.commit(move |s| {
            s.documents.insert(stored.id.clone(), stored.clone());
        });
        Ok(doc)
    }

    pub async fn update_document(&mut self, id: &str, patch: DocumentPatch) -> FluxResult<()> {
        self.require_document(id)?;
        let mut fields = Record::new();
        if let Some(title) = patch.title {
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(content) = patch.content {
            fields.insert("content".to_string(), content);
        }
        if fields.is_empty() {
            return Ok(());
        }

        let rows = self
            .db
            .from(DOCUMENTS_TABLE)
            .update(fields)
            .eq("id", id)
            .execute()
            .await?;
        let doc: DocumentRecord = updated(rows, "document", id)?;
        self.commit(move |s| {
            s.documents.insert(doc.id.clone(), doc.clone());
        });
        Ok(())
    }

    pub async fn delete_document(&mut self, id: &str) -> FluxResult<()> {
        self.require_document(id)?;
        self.db.from(DOCUMENTS_TABLE).delete().eq("id", id).execute().await?;
        let id = id.to_string();
        self.commit(move |s| {
            s.documents.remove(&id);
        });
        Ok(())
    }

    /// Move an item's icon on the canvas.
    pub async fn set_position(&mut self, item: &ItemRef, position: Point) -> FluxResult<()> {
        let pending = self.begin_position(item, position)?;
        let result = pending.persist().await;
        self.settle(pending, result)
    }

    /// Move `item` into `target` folder, persisting before returning.
    ///
    /// If persisting fails the move is rolled back and the error returned.
    /// Nothing is retried.
    pub async fn move_item(&mut self, item: &ItemRef, target: &str) -> FluxResult<()> {
        let Some(pending) = self.begin_move(item, target)? else {
            return Ok(());
        };
        let result = pending.persist().await;
        self.settle(pending, result)
    }

    /// Validate a move and show it in [`Desktop::state`] right away.
    ///
    /// Returns `None` if `item` is already in `target`. The caller persists
    /// the returned move and hands the outcome to [`Desktop::settle`]; other
    /// moves may begin and settle in the meantime.
    pub fn begin_move(
        &mut self,
        item: &ItemRef,
        target: &str,
    ) -> FluxResult<Option<PendingMove>> {
        if item.id() == target && matches!(item, ItemRef::Folder(_)) {
            return Err(FluxError::InvalidDrop(format!(
                "Folder {} cannot be dropped onto itself",
                target
            )));
        }
        if !self.state().contains(item) {
            return Err(not_found(item));
        }
        self.require_folder(target)?;
        if let ItemRef::Folder(folder) = item {
            if self.state().is_ancestor_or_self(folder, target) {
                return Err(FluxError::FolderCycle {
                    folder: folder.clone(),
                    target: target.to_string(),
                });
            }
        }
        if self.state().parent_of(item) == Some(target) {
            return Ok(None);
        }

        let (_, column) = table_for(item);
        let change_item = item.clone();
        let change_target = target.to_string();
        let id = self
            .state
            .apply(move |s| s.set_parent(&change_item, Some(change_target.clone())));
        log::debug!("Moving {} into {} (pending)", item.id(), target);

        let mut patch = Record::new();
        patch.insert(column.to_string(), Value::String(target.to_string()));
        Ok(Some(self.pending(id, item, patch)))
    }

    /// Show a new canvas position right away; see [`Desktop::begin_move`].
    pub fn begin_position(&mut self, item: &ItemRef, position: Point) -> FluxResult<PendingMove> {
        if !self.state().contains(item) {
            return Err(not_found(item));
        }
        let change_item = item.clone();
        let id = self
            .state
            .apply(move |s| s.set_position(&change_item, position));
        Ok(self.pending(id, item, row(json!({ "position": position }))))
    }

    fn pending(&self, id: PendingId, item: &ItemRef, patch: Record) -> PendingMove {
        PendingMove {
            id,
            db: self.db.clone(),
            item: item.clone(),
            patch,
        }
    }

    /// Confirm a pending move, or roll it back if `result` is an error.
    ///
    /// Rolling back keeps every other pending move visible.
    pub fn settle(
        &mut self,
        pending: PendingMove,
        result: FluxResult<Vec<Record>>,
    ) -> FluxResult<()> {
        match result {
            Ok(rows) => {
                self.state.confirm(pending.id);
                self.refresh(rows)
            }
            Err(e) => {
                log::warn!(
                    "Persisting change to {} failed, rolling back: {}",
                    pending.item.id(),
                    e
                );
                self.state.rollback(pending.id);
                Err(e)
            }
        }
    }

    /// Number of moves shown but not yet settled.
    pub fn pending_count(&self) -> usize {
        self.state.pending_count()
    }

    /// Replace local records with rows written back by the table.
    fn refresh(&mut self, rows: Vec<Record>) -> FluxResult<()> {
        let mut folders = Vec::new();
        let mut documents = Vec::new();
        for record in rows {
            if record.contains_key("kind") {
                documents.push(from_record::<DocumentRecord>(record)?);
            } else {
                folders.push(from_record::<FolderRecord>(record)?);
            }
        }
        if folders.is_empty() && documents.is_empty() {
            return Ok(());
        }
        self.commit(move |s| {
            for folder in &folders {
                s.folders.insert(folder.id.clone(), folder.clone());
            }
            for doc in &documents {
                s.documents.insert(doc.id.clone(), doc.clone());
            }
        });
        Ok(())
    }

    /// React to the terminal event of a desktop drag.
    ///
    /// Returns `Ok(true)` if a move was persisted. Clicks, cancellations and
    /// releases over empty space leave the desktop untouched.
    pub async fn handle_drag_event(&mut self, event: &DragEvent) -> FluxResult<bool> {
        let DragEvent::Drop { item, target, .. } = event else {
            return Ok(false);
        };
        if target.kind != TargetKind::Folder {
            return Ok(false);
        }
        let item = match item.kind {
            ItemKind::Folder => ItemRef::Folder(item.id.clone()),
            ItemKind::Document => ItemRef::Document(item.id.clone()),
            ItemKind::Widget | ItemKind::Segment => return Ok(false),
        };
        self.move_item(&item, &target.id).await?;
        Ok(true)
    }
}

fn not_found(item: &ItemRef) -> FluxError {
    FluxError::NotFound {
        kind: match item {
            ItemRef::Folder(_) => "folder",
            ItemRef::Document(_) => "document",
        },
        id: item.id().to_string(),
    }
}
