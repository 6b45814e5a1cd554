/*!
 * Completion ledger.
 *
 * Persistent per-file record of processing state that makes a batch run
 * resumable. The ledger lives in the run root as a JSON document and is
 * rewritten with write-temp-then-rename after every state transition, so a
 * killed run leaves either the previous or the new ledger on disk.
 *
 * Entries are keyed by the media path relative to the run root, using `/` as
 * separator on every platform.
 */

pub mod models;

use log::{debug, warn};
use std::path::{Component, Path, PathBuf};

use crate::errors::LedgerError;
use crate::file_utils::FileManager;

pub use models::{LedgerCounts, LedgerDocument, LedgerEntry, LedgerStatus, LEDGER_VERSION};

/// Ledger store for one run root
#[derive(Debug)]
pub struct CompletionLedger {
    /// Ledger file
    path: PathBuf,

    /// Directory that entry keys are relative to
    root: PathBuf,

    document: LedgerDocument,
}

impl CompletionLedger {
    /// Load the ledger at `path`, or start an empty one if the file does not exist
    pub fn load<P1: AsRef<Path>, P2: AsRef<Path>>(path: P1, root: P2) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let root = root.as_ref().to_path_buf();

        if !path.exists() {
            debug!("No ledger at {:?}, starting empty", path);
            return Ok(Self {
                path,
                root,
                document: LedgerDocument::default(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| LedgerError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let document = Self::parse(&path, &content)?;
        debug!("Loaded ledger {:?} with {} entries", path, document.entries.len());

        Ok(Self { path, root, document })
    }

    /// Load `<root>/<file_name>`
    pub fn open_in<P: AsRef<Path>>(root: P, file_name: &str) -> Result<Self, LedgerError> {
        let root = root.as_ref();
        Self::load(root.join(file_name), root)
    }

    fn parse(path: &Path, content: &str) -> Result<LedgerDocument, LedgerError> {
        let corrupt = |message: String| LedgerError::Corrupt {
            path: path.to_path_buf(),
            message,
        };

        let value: serde_json::Value = serde_json::from_str(content).map_err(|e| corrupt(e.to_string()))?;

        let version = value
            .get("version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| corrupt("missing version field".to_string()))?;
        if version != u64::from(LEDGER_VERSION) {
            return Err(LedgerError::UnsupportedVersion {
                found: u32::try_from(version).unwrap_or(u32::MAX),
                expected: LEDGER_VERSION,
            });
        }

        serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))
    }

    /// Write the ledger atomically
    pub fn save(&self) -> Result<(), LedgerError> {
        let write_error = |message: String| LedgerError::Write {
            path: self.path.clone(),
            message,
        };

        let mut json = serde_json::to_string_pretty(&self.document).map_err(|e| write_error(e.to_string()))?;
        json.push('\n');

        FileManager::write_atomically(&self.path, json.as_bytes()).map_err(|e| write_error(e.to_string()))
    }

    /// Ledger file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key for a media file: its path relative to the root, `/`-separated
    pub fn key_for<P: AsRef<Path>>(&self, media: P) -> String {
        let media = media.as_ref();
        let relative = media.strip_prefix(&self.root).unwrap_or(media);

        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn get<P: AsRef<Path>>(&self, media: P) -> Option<&LedgerEntry> {
        self.document.entries.get(&self.key_for(media))
    }

    pub fn status<P: AsRef<Path>>(&self, media: P) -> Option<LedgerStatus> {
        self.get(media).map(|entry| entry.status)
    }

    /// Record that processing of `media` started
    pub fn mark_pending<P1: AsRef<Path>, P2: AsRef<Path>>(&mut self, media: P1, subtitle: P2) -> Result<(), LedgerError> {
        let entry = self.entry_mut(media.as_ref(), subtitle.as_ref());
        entry.attempts += 1;
        entry.error = None;
        entry.transition(LedgerStatus::Pending);
        self.save()
    }

    /// Record that the subtitle for `media` is in place
    pub fn mark_done<P1: AsRef<Path>, P2: AsRef<Path>>(&mut self, media: P1, subtitle: P2) -> Result<(), LedgerError> {
        let entry = self.entry_mut(media.as_ref(), subtitle.as_ref());
        entry.error = None;
        entry.transition(LedgerStatus::Done);
        self.save()
    }

    /// Record a per-file failure for `media`
    pub fn mark_failed<P1: AsRef<Path>, P2: AsRef<Path>>(
        &mut self,
        media: P1,
        subtitle: P2,
        message: &str,
    ) -> Result<(), LedgerError> {
        let entry = self.entry_mut(media.as_ref(), subtitle.as_ref());
        entry.error = Some(message.to_string());
        entry.transition(LedgerStatus::Failed);
        self.save()
    }

    fn entry_mut(&mut self, media: &Path, subtitle: &Path) -> &mut LedgerEntry {
        let key = self.key_for(media);
        let subtitle = self.key_for(subtitle);

        let entry = self
            .document
            .entries
            .entry(key)
            .or_insert_with(|| LedgerEntry::new(LedgerStatus::Pending, subtitle.clone()));
        if entry.subtitle != subtitle {
            warn!("Subtitle path for ledger entry changed to {}", subtitle);
            entry.subtitle = subtitle;
        }
        entry
    }

    pub fn len(&self) -> usize {
        self.document.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.entries.is_empty()
    }

    pub fn counts(&self) -> LedgerCounts {
        let mut counts = LedgerCounts::default();
        for entry in self.document.entries.values() {
            match entry.status {
                LedgerStatus::Pending => counts.pending += 1,
                LedgerStatus::Done => counts.done += 1,
                LedgerStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
