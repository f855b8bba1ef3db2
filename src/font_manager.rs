//! A registry of glyph geometry for one font.
//!
//! `FontManager` builds the geometry of every glyph in a font, either before returning from
//! `load` or in the background, one task per glyph. Background tasks report to the manager
//! through a channel, and the manager is the only owner of the registry: completed glyphs are
//! placed when the caller queries the manager, polls it or waits on it.
//!
//! ```
//! use trueglyph::font_manager::{FontManager, LoadMode, Lookup};
//!
//! // Not a font, so the manager holds no glyphs.
//! let mut manager = FontManager::load(vec![0u8; 4], LoadMode::Synchronous);
//! assert!(manager.is_empty());
//! assert_eq!(manager.get(0), Lookup::Absent);
//! assert_eq!(manager.by_code_point('A'), None);
//! ```

use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use log::{debug, error, warn};
use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::font::{Font, Geometry};
use crate::tables::cmap::CmapFormat4;

/// How glyph geometry is built.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Build every glyph before `load` returns.
    Synchronous,
    /// Build each glyph in its own task on the rayon thread pool. Without the `concurrent`
    /// feature this is the same as `Synchronous`.
    #[default]
    Concurrent,
}

/// Result of looking up a glyph.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Ready(Geometry),
    /// The glyph is still being built.
    Pending,
    /// No such glyph, or it failed to build.
    Absent,
}

/// Outcome of building one glyph.
#[derive(Debug)]
struct Completion {
    glyph_index: u16,
    result: Result<Geometry, ParseError>,
}

/// Glyph geometry of a font, keyed by glyph index.
#[derive(Debug, Default)]
pub struct FontManager {
    units_per_em: u16,
    num_glyphs: usize,
    cmap: Option<CmapFormat4>,
    registry: FxHashMap<u16, Geometry>,
    failures: FxHashMap<u16, ParseError>,
    completed: usize,
    receiver: Option<Receiver<Completion>>,
}

impl FontManager {
    /// A manager without any glyphs.
    pub fn empty() -> Self {
        FontManager::default()
    }

    /// Read and load the font file at `path`.
    ///
    /// If the file can't be read or parsed the error is logged and an empty manager returned.
    pub fn open<P: AsRef<Path>>(path: P, mode: LoadMode) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(data) => FontManager::load(data, mode),
            Err(err) => {
                warn!("unable to read font {}: {}", path.display(), err);
                FontManager::empty()
            }
        }
    }

    /// Load the font in `data`.
    ///
    /// If the font can't be parsed the error is logged and an empty manager returned.
    pub fn load(data: impl Into<Arc<[u8]>>, mode: LoadMode) -> Self {
        match FontManager::try_load(data, mode) {
            Ok(manager) => manager,
            Err(err) => {
                error!("unable to load font: {}", err);
                FontManager::empty()
            }
        }
    }

    /// Load the font in `data`, returning fatal parse errors.
    ///
    /// Failures to build individual glyphs are not fatal, those glyphs are left absent.
    pub fn try_load(data: impl Into<Arc<[u8]>>, mode: LoadMode) -> Result<Self, ParseError> {
        let font = Font::load(data)?;
        let mut manager = FontManager {
            units_per_em: font.units_per_em(),
            num_glyphs: font.num_glyphs(),
            cmap: font.cmap().cloned(),
            ..FontManager::default()
        };
        debug!("building {} glyphs ({:?})", manager.num_glyphs, mode);

        match mode {
            LoadMode::Synchronous => manager.build_synchronous(&font),
            LoadMode::Concurrent => manager.build_concurrent(Arc::new(font)),
        }
        Ok(manager)
    }

    fn build_synchronous(&mut self, font: &Font) {
        for (insertion_index, glyph_index) in font.index_space().glyph_indices().enumerate() {
            let result = font.build_glyph(insertion_index);
            self.place(Completion {
                glyph_index,
                result,
            });
        }
    }

    #[cfg(feature = "concurrent")]
    fn build_concurrent(&mut self, font: Arc<Font>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        for (insertion_index, glyph_index) in font.index_space().glyph_indices().enumerate() {
            let font = Arc::clone(&font);
            let sender = sender.clone();
            rayon::spawn(move || {
                let result = font.build_glyph(insertion_index);
                // The manager may have been dropped, in which case nobody wants the result.
                let _ = sender.send(Completion {
                    glyph_index,
                    result,
                });
            });
        }
        if self.num_glyphs > 0 {
            self.receiver = Some(receiver);
        }
    }

    #[cfg(not(feature = "concurrent"))]
    fn build_concurrent(&mut self, font: Arc<Font>) {
        debug!("built without the concurrent feature, building synchronously");
        self.build_synchronous(&font)
    }

    fn place(&mut self, completion: Completion) {
        let Completion {
            glyph_index,
            result,
        } = completion;
        match result {
            Ok(geometry) => {
                self.registry.insert(glyph_index, geometry);
            }
            Err(err) => {
                warn!("unable to build glyph {}: {}", glyph_index, err);
                self.failures.insert(glyph_index, err);
            }
        }
        self.completed += 1;
        if self.completed == self.num_glyphs {
            self.receiver = None;
        }
    }

    /// Place the glyphs that have finished building since the last call.
    ///
    /// Returns the indices of the glyphs added to the registry, in the order they finished.
    pub fn poll(&mut self) -> Vec<u16> {
        let mut placed = Vec::new();
        while let Some(receiver) = &self.receiver {
            match receiver.try_recv() {
                Ok(completion) => {
                    if completion.result.is_ok() {
                        placed.push(completion.glyph_index);
                    }
                    self.place(completion);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.disconnected(),
            }
        }
        placed
    }

    /// Block until every glyph has been built.
    pub fn wait(&mut self) {
        while let Some(receiver) = &self.receiver {
            match receiver.recv() {
                Ok(completion) => self.place(completion),
                Err(_) => self.disconnected(),
            }
        }
    }

    fn disconnected(&mut self) {
        // Only happens if a task panicked. Its glyph will never arrive.
        error!(
            "glyph tasks stopped with {} of {} glyphs built",
            self.completed, self.num_glyphs
        );
        self.receiver = None;
    }

    /// Returns `true` once every glyph has been built or has failed.
    pub fn is_ready(&self) -> bool {
        self.completed == self.num_glyphs
    }

    /// Look up the geometry of `glyph_index` without blocking.
    pub fn get(&mut self, glyph_index: u16) -> Lookup {
        self.poll();
        match self.registry.get(&glyph_index) {
            Some(geometry) => Lookup::Ready(geometry.clone()),
            None if self.receiver.is_some()
                && usize::from(glyph_index) < self.num_glyphs
                && !self.failures.contains_key(&glyph_index) =>
            {
                Lookup::Pending
            }
            None => Lookup::Absent,
        }
    }

    /// The geometry of `glyph_index`, if it has been built.
    pub fn glyph(&mut self, glyph_index: u16) -> Option<Geometry> {
        match self.get(glyph_index) {
            Lookup::Ready(geometry) => Some(geometry),
            Lookup::Pending | Lookup::Absent => None,
        }
    }

    /// Map `code_point` to a glyph index through the font's `cmap`.
    ///
    /// Code points the font does not cover map to glyph 0. Returns `None` when the font has no
    /// usable `cmap` or the mapping data is invalid.
    pub fn glyph_index(&self, code_point: impl Into<u32>) -> Option<u16> {
        let code_point = code_point.into();
        let cmap = self.cmap.as_ref()?;
        match cmap.resolve(code_point) {
            Ok(glyph_index) => Some(glyph_index),
            Err(err) => {
                warn!("unable to map U+{:04X}: {}", code_point, err);
                None
            }
        }
    }

    /// The geometry of the glyph for `code_point`, if it has been built.
    pub fn by_code_point(&mut self, code_point: impl Into<u32>) -> Option<Geometry> {
        let glyph_index = self.glyph_index(code_point)?;
        self.glyph(glyph_index)
    }

    /// The error that prevented `glyph_index` from being built, if any.
    pub fn failure(&self, glyph_index: u16) -> Option<&ParseError> {
        self.failures.get(&glyph_index)
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// The number of glyphs in the font.
    pub fn num_glyphs(&self) -> usize {
        self.num_glyphs
    }

    /// The number of glyphs in the registry.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}
