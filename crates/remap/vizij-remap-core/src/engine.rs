//! RemapEngine: captured snapshot, current preview and the one-slot checkpoint.
//!
//! Lifecycle per snapshot:
//!   load -> Clean
//!   Clean --apply--> Dirty
//!   Dirty --apply--> Dirty (checkpoint advances; data is moved from where it lives now)
//!   Dirty --discard--> Clean (every renamed key goes back to its captured original)
//!
//! The store is borrowed per call. Relocation reads every source before it touches
//! the store, so a missing source or a collision leaves the store unchanged.
//!
//! A key that currently holds captured data is never a valid target unless its data
//! moves away in the same batch. `CollisionPolicy::Overwrite` only replaces data
//! outside the captured set, and the replaced values are kept in the checkpoint so
//! discard can write them back.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{CollisionPolicy, Config, ReloadPolicy};
use crate::error::{MissingSource, RemapError};
use crate::key::{BindingKey, CapturedSet};
use crate::rewrite::{RemapRequest, RewriteMode};
use crate::store::CurveStore;

/// One matched binding and the key it would be renamed to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEntry {
    /// Position of `source` in the captured set.
    pub index: usize,
    pub source: BindingKey,
    pub target: BindingKey,
}

/// Result of the last `preview` call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub request: RemapRequest,
    pub entries: Vec<PreviewEntry>,
    /// Size of the captured set the preview was computed against.
    pub captured: usize,
}

impl Preview {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Human-readable match count, e.g. "3 of 5 bindings match".
    pub fn summary(&self) -> String {
        format!(
            "{} of {} bindings match",
            self.entries.len(),
            self.captured
        )
    }
}

/// Where one captured binding currently lives after an apply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    pub index: usize,
    pub live: BindingKey,
}

/// Keys resident in the store as a result of applied renames, sorted by captured index,
/// plus the values that applies overwrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint<V> {
    entries: Vec<CheckpointEntry>,
    displaced: Vec<(BindingKey, V)>,
}

impl<V> Default for Checkpoint<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            displaced: Vec::new(),
        }
    }
}

impl<V> Checkpoint<V> {
    pub fn entries(&self) -> &[CheckpointEntry] {
        &self.entries
    }

    /// Pre-apply contents of keys outside the captured set that were overwritten.
    pub fn displaced(&self) -> &[(BindingKey, V)] {
        &self.displaced
    }

    /// Number of renamed bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.displaced.is_empty()
    }

    /// Live key for a captured index, if that binding has been renamed.
    pub fn live_key(&self, index: usize) -> Option<&BindingKey> {
        self.entries
            .binary_search_by_key(&index, |e| e.index)
            .ok()
            .map(|i| &self.entries[i].live)
    }

    /// Record that `index` now lives at `live`. Entries that point back at the
    /// captured original are dropped.
    fn record(&mut self, index: usize, live: BindingKey, original: &BindingKey) {
        match self.entries.binary_search_by_key(&index, |e| e.index) {
            Ok(i) if live == *original => {
                self.entries.remove(i);
            }
            Ok(i) => self.entries[i].live = live,
            Err(_) if live == *original => {}
            Err(i) => self.entries.insert(i, CheckpointEntry { index, live }),
        }
    }

    /// Remember the value `key` held before the first apply that overwrote it.
    fn displace(&mut self, key: BindingKey, value: V) {
        if !self.displaced.iter().any(|(k, _)| *k == key) {
            self.displaced.push((key, value));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Number of preview entries committed.
    pub applied: usize,
    /// True when data was relocated from a previous apply's keys.
    pub chained: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardReport {
    Reverted(usize),
    NothingToRevert,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport<V> {
    pub captured: usize,
    /// Checkpoint from the previous snapshot that was dropped without a discard.
    pub abandoned: Option<Checkpoint<V>>,
}

/// A single planned key move.
#[derive(Clone, Debug)]
struct Move {
    index: usize,
    from: BindingKey,
    to: BindingKey,
}

/// Engine state for one editing session. `V` is the value type of the stores it edits.
#[derive(Debug)]
pub struct RemapEngine<V> {
    cfg: Config,
    captured: CapturedSet,
    preview: Option<Preview>,
    checkpoint: Option<Checkpoint<V>>,
}

impl<V: Clone> Default for RemapEngine<V> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<V: Clone> RemapEngine<V> {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            captured: CapturedSet::default(),
            preview: None,
            checkpoint: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn captured(&self) -> &CapturedSet {
        &self.captured
    }

    pub fn current_preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint<V>> {
        self.checkpoint.as_ref()
    }

    /// True while an applied rename has not been discarded.
    pub fn is_dirty(&self) -> bool {
        self.checkpoint.is_some()
    }

    /// `DirtyReload` when a reload would abandon applied renames under
    /// `ReloadPolicy::Reject`.
    pub fn check_reload(&self) -> Result<(), RemapError> {
        match &self.checkpoint {
            Some(cp) if self.cfg.reload == ReloadPolicy::Reject => {
                Err(RemapError::DirtyReload { pending: cp.len() })
            }
            _ => Ok(()),
        }
    }

    /// Replace the captured snapshot. Clears the preview and the checkpoint.
    pub fn load(&mut self, captured: CapturedSet) -> Result<LoadReport<V>, RemapError> {
        self.check_reload()?;
        if let Some(cp) = &self.checkpoint {
            warn!(
                "reload abandons {} applied rename(s); they can no longer be discarded",
                cp.len()
            );
        }
        let abandoned = self.checkpoint.take();
        self.preview = None;
        self.captured = captured;
        debug!("captured {} bindings", self.captured.len());
        Ok(LoadReport {
            captured: self.captured.len(),
            abandoned,
        })
    }

    /// Compute the rename preview for the captured set. Does not touch any store.
    pub fn preview(&mut self, text: &str, search: &str, mode: RewriteMode) -> &Preview {
        let request = RemapRequest::new(text, search, mode);
        let entries = self
            .captured
            .iter()
            .enumerate()
            .filter(|(_, key)| request.matches(&key.path))
            .map(|(index, key)| PreviewEntry {
                index,
                source: key.clone(),
                target: key.with_path(request.rewrite(&key.path)),
            })
            .collect();
        let preview = Preview {
            request,
            entries,
            captured: self.captured.len(),
        };
        debug!("{} preview: {}", mode, preview.summary());
        self.preview.insert(preview)
    }

    /// Commit the current preview against `store`.
    ///
    /// Each entry's data is read from its checkpointed live key when one exists,
    /// otherwise from the captured original.
    pub fn apply<S>(&mut self, store: &mut S) -> Result<ApplyReport, RemapError>
    where
        S: CurveStore<Value = V>,
    {
        let preview = match &self.preview {
            Some(p) if !p.is_empty() => p,
            Some(p) => {
                return Err(RemapError::EmptyMatchSet {
                    search: p.request.search.clone(),
                })
            }
            None => {
                return Err(RemapError::EmptyMatchSet {
                    search: String::new(),
                })
            }
        };
        preview.request.validate()?;

        let chained = self.checkpoint.is_some();
        let moves: Vec<Move> = preview
            .entries
            .iter()
            .map(|e| {
                let from = self
                    .checkpoint
                    .as_ref()
                    .and_then(|cp| cp.live_key(e.index))
                    .unwrap_or(&e.source)
                    .clone();
                Move {
                    index: e.index,
                    from,
                    to: e.target.clone(),
                }
            })
            .collect();

        let displaced = {
            let owned = self.owned_keys();
            relocate(store, &moves, &owned, self.cfg.collisions, Vec::new())?
        };

        let mut cp = self.checkpoint.take().unwrap_or_default();
        for (key, value) in displaced {
            cp.displace(key, value);
        }
        for m in moves {
            if let Some(original) = self.captured.get(m.index) {
                cp.record(m.index, m.to, original);
            }
        }
        self.checkpoint = (!cp.is_empty()).then_some(cp);

        let applied = preview.entries.len();
        info!("applied {applied} binding rename(s) (chained: {chained})");
        Ok(ApplyReport { applied, chained })
    }

    /// Move every renamed binding back to its captured original and clear the checkpoint.
    ///
    /// On failure the checkpoint is kept so the discard can be retried.
    pub fn discard<S>(&mut self, store: &mut S) -> Result<DiscardReport, RemapError>
    where
        S: CurveStore<Value = V>,
    {
        let Some(cp) = &self.checkpoint else {
            debug!("discard: nothing to revert");
            return Ok(DiscardReport::NothingToRevert);
        };
        let moves: Vec<Move> = cp
            .entries
            .iter()
            .filter_map(|e| {
                self.captured.get(e.index).map(|original| Move {
                    index: e.index,
                    from: e.live.clone(),
                    to: original.clone(),
                })
            })
            .collect();

        relocate(
            store,
            &moves,
            &self.owned_keys(),
            self.cfg.collisions,
            cp.displaced.clone(),
        )?;

        self.checkpoint = None;
        info!("reverted {} binding rename(s)", moves.len());
        Ok(DiscardReport::Reverted(moves.len()))
    }

    /// Keys that currently hold captured data: the live key of each renamed entry and
    /// the original key of every other entry.
    fn owned_keys(&self) -> HashSet<&BindingKey> {
        self.captured
            .iter()
            .enumerate()
            .map(|(index, original)| {
                self.checkpoint
                    .as_ref()
                    .and_then(|cp| cp.live_key(index))
                    .unwrap_or(original)
            })
            .collect()
    }
}

/// Move values from `from` to `to` for every move as one unit, then write `restore`.
///
/// 1. read every source and the prior contents of every touched key
/// 2. reject duplicate targets, owned targets, and (under `Reject`) occupied targets
/// 3. delete sources, write targets, write `restore`; on a store error put back step 1's snapshot
///
/// `owned` holds the keys where captured data currently lives. Returns the values that
/// were overwritten under `CollisionPolicy::Overwrite`.
fn relocate<S: CurveStore>(
    store: &mut S,
    moves: &[Move],
    owned: &HashSet<&BindingKey>,
    collisions: CollisionPolicy,
    restore: Vec<(BindingKey, S::Value)>,
) -> Result<Vec<(BindingKey, S::Value)>, RemapError> {
    let moves: Vec<&Move> = moves.iter().filter(|m| m.from != m.to).collect();
    if moves.is_empty() && restore.is_empty() {
        return Ok(Vec::new());
    }

    // A key read twice would hand the same data to two entries; the second read
    // counts as missing.
    let mut sources: HashSet<&BindingKey> = HashSet::with_capacity(moves.len());
    let mut values = Vec::with_capacity(moves.len());
    let mut missing = Vec::new();
    for m in &moves {
        let value = if sources.insert(&m.from) {
            store.get(&m.from)
        } else {
            None
        };
        match value {
            Some(v) => values.push(v),
            None => missing.push(MissingSource {
                index: m.index,
                key: m.from.clone(),
            }),
        }
    }
    if !missing.is_empty() {
        for m in &missing {
            error!("source binding {} (entry {}) is missing from the store", m.key, m.index);
        }
        return Err(RemapError::MissingSourceValue { missing });
    }

    let mut targets: HashSet<&BindingKey> = HashSet::with_capacity(moves.len() + restore.len());
    let mut displaced = Vec::new();
    for m in &moves {
        let vacated = sources.contains(&m.to);
        let current = if vacated { None } else { store.get(&m.to) };
        let collides = !targets.insert(&m.to)
            || (!vacated && owned.contains(&m.to))
            || (current.is_some() && collisions == CollisionPolicy::Reject);
        if collides {
            warn!("rename target {} collides", m.to);
            return Err(RemapError::TargetCollision { key: m.to.clone() });
        }
        if let Some(v) = current {
            displaced.push((m.to.clone(), v));
        }
    }
    for (key, _) in &restore {
        if !targets.insert(key) {
            warn!("restored binding {key} collides with a rename target");
            return Err(RemapError::TargetCollision { key: key.clone() });
        }
    }

    let mut seen: HashSet<&BindingKey> = HashSet::new();
    let before: Vec<(BindingKey, Option<S::Value>)> = moves
        .iter()
        .flat_map(|m| [&m.from, &m.to])
        .chain(restore.iter().map(|(k, _)| k))
        .filter(|k| seen.insert(*k))
        .map(|k| (k.clone(), store.get(k)))
        .collect();

    let result = moves
        .iter()
        .try_for_each(|m| store.delete(&m.from))
        .and_then(|_| {
            moves.iter().zip(values).try_for_each(|(m, v)| {
                debug!("move {} -> {}", m.from, m.to);
                store.set(&m.to, Some(v))
            })
        })
        .and_then(|_| {
            restore.into_iter().try_for_each(|(key, v)| {
                debug!("restore overwritten binding {key}");
                store.set(&key, Some(v))
            })
        });

    if let Err(source) = result {
        let mut rolled_back = true;
        for (key, value) in before {
            if value.is_none() && !store.contains(&key) {
                continue;
            }
            if let Err(e) = store.set(&key, value) {
                error!("rollback failed for {key}: {e}");
                rolled_back = false;
            }
        }
        return Err(RemapError::Store {
            source,
            rolled_back,
        });
    }
    if !displaced.is_empty() {
        warn!("overwrote {} binding(s) outside the captured set", displaced.len());
    }
    Ok(displaced)
}
