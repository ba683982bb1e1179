//! Session layer: binds an engine to whatever clip the host currently has open.
//!
//! Hosts implement SessionAdapter; RemapSession drives the engine against it and
//! keeps the status line the presentation layer displays.

use log::debug;

use crate::clip::{Clip, Curve};
use crate::config::Config;
use crate::engine::{ApplyReport, DiscardReport, LoadReport, PreviewEntry, RemapEngine};
use crate::error::RemapError;
use crate::key::CapturedSet;
use crate::rewrite::{search_term, RewriteMode};
use crate::status::Status;
use crate::store::CurveStore;

/// Value type of an adapter's store.
pub type StoreValue<A> = <<A as SessionAdapter>::Store as CurveStore>::Value;

/// Host-provided access to the active clip.
pub trait SessionAdapter {
    type Store: CurveStore;

    /// Snapshot the active clip's binding keys, or `None` when nothing is open.
    fn load_snapshot(&mut self) -> Option<CapturedSet>;

    /// The live store for the active clip, or `None` when nothing is open.
    fn store(&mut self) -> Option<&mut Self::Store>;
}

/// Adapter over a single in-memory clip.
#[derive(Debug, Default)]
pub struct ClipSession {
    clip: Option<Clip>,
}

impl ClipSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(clip: Clip) -> Self {
        Self { clip: Some(clip) }
    }

    /// Make `clip` the active clip, returning the previously open one.
    pub fn open(&mut self, clip: Clip) -> Option<Clip> {
        self.clip.replace(clip)
    }

    pub fn close(&mut self) -> Option<Clip> {
        self.clip.take()
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }
}

impl SessionAdapter for ClipSession {
    type Store = Clip;

    fn load_snapshot(&mut self) -> Option<CapturedSet> {
        self.clip.as_ref().map(Clip::bindings)
    }

    fn store(&mut self) -> Option<&mut Clip> {
        self.clip.as_mut()
    }
}

#[derive(Debug)]
pub struct RemapSession<A: SessionAdapter> {
    adapter: A,
    engine: RemapEngine<StoreValue<A>>,
    loaded: bool,
    status: Status,
}

impl<A: SessionAdapter> RemapSession<A> {
    pub fn new(adapter: A, cfg: Config) -> Self {
        Self {
            adapter,
            engine: RemapEngine::new(cfg),
            loaded: false,
            status: Status::default(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn engine(&self) -> &RemapEngine<StoreValue<A>> {
        &self.engine
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Capture the active clip's keys. Resets preview and checkpoint.
    pub fn load(&mut self) -> Result<LoadReport<StoreValue<A>>, RemapError> {
        let result = match self.adapter.load_snapshot() {
            Some(captured) => self.engine.load(captured),
            None => Err(RemapError::NoActiveSession),
        };
        if result.is_ok() {
            self.loaded = true;
        }
        self.report(result, |r| match &r.abandoned {
            Some(cp) => Status::warning(format!(
                "Loaded {} bindings; {} applied rename(s) can no longer be discarded",
                r.captured,
                cp.len()
            )),
            None => Status::info(format!("Loaded {} bindings", r.captured)),
        })
    }

    /// Recompute the preview. The search box accepts `{term}` as well as a bare term.
    ///
    /// Loads the active clip first when nothing has been captured yet.
    pub fn preview(&mut self, text: &str, search: &str, mode: RewriteMode) -> &[PreviewEntry] {
        if !self.loaded && self.load().is_err() {
            return &[];
        }
        let term = search_term(search);
        debug!("preview search '{search}' -> term '{term}'");
        let preview = self.engine.preview(text, term, mode);
        self.status = if preview.is_empty() {
            Status::warning(format!("No bindings match '{term}'"))
        } else {
            Status::info(preview.summary())
        };
        self.engine
            .current_preview()
            .map(|p| p.entries.as_slice())
            .unwrap_or(&[])
    }

    /// Commit the current preview to the active clip.
    pub fn apply(&mut self) -> Result<ApplyReport, RemapError> {
        let result = match self.adapter.store() {
            Some(store) => self.engine.apply(store),
            None => Err(RemapError::NoActiveSession),
        };
        self.report(result, |r| {
            Status::info(format!("Renamed {} binding(s) in the active clip", r.applied))
        })
    }

    /// Restore every renamed binding to its captured original.
    pub fn discard(&mut self) -> Result<DiscardReport, RemapError> {
        let result = match self.adapter.store() {
            Some(store) => self.engine.discard(store),
            None => Err(RemapError::NoActiveSession),
        };
        self.report(result, |r| match r {
            DiscardReport::Reverted(n) => Status::info(format!("Reverted {n} binding(s)")),
            DiscardReport::NothingToRevert => Status::info("Nothing to revert"),
        })
    }

    fn report<T>(
        &mut self,
        result: Result<T, RemapError>,
        ok: impl FnOnce(&T) -> Status,
    ) -> Result<T, RemapError> {
        self.status = match &result {
            Ok(v) => ok(v),
            Err(e) => Status::from(e),
        };
        result
    }
}

impl RemapSession<ClipSession> {
    /// Make `clip` the active clip and capture its bindings.
    ///
    /// Under `ReloadPolicy::Reject` a pending apply keeps the current clip open.
    pub fn open_clip(&mut self, clip: Clip) -> Result<LoadReport<Curve>, RemapError> {
        if let Err(e) = self.engine.check_reload() {
            self.status = Status::from(&e);
            return Err(e);
        }
        self.adapter.open(clip);
        self.load()
    }
}
