//! Instrument presets.
//!
//! A [`Preset`] is a snapshot of every setting, keyed by the setting's short
//! name. It serializes as a flat JSON object (or any other serde format);
//! where it is stored is up to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use msalib_core::{ByteStream, Result};

use crate::session::Session;
use crate::settings::Setting;

/// Setting name to value, as read from or written to the instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preset {
    values: BTreeMap<String, String>,
}

impl Preset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, setting: Setting, value: impl Into<String>) {
        self.values.insert(setting.name().to_string(), value.into());
    }

    pub fn get(&self, setting: Setting) -> Option<&str> {
        self.entries().find(|(s, _)| *s == setting).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in schema order. Names match settings ignoring case, as in
    /// `"SPAN".parse::<Setting>()`; names that are not settings are skipped.
    /// If one setting appears under several spellings, the first key in map
    /// order wins.
    pub fn entries(&self) -> impl Iterator<Item = (Setting, &str)> + '_ {
        let mut entries: Vec<(Setting, &str)> = self
            .values
            .iter()
            .filter_map(|(k, v)| k.parse::<Setting>().ok().map(|s| (s, v.as_str())))
            .collect();
        entries.sort_by_key(|(s, _)| *s);
        entries.dedup_by_key(|(s, _)| *s);
        entries.into_iter()
    }

    /// Names that do not belong to any setting.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values
            .keys()
            .filter(|k| k.parse::<Setting>().is_err())
            .map(String::as_str)
    }
}

impl<S: ByteStream> Session<S> {
    /// Read every setting once.
    pub fn preset(&mut self) -> Result<Preset> {
        let mut preset = Preset::new();
        for setting in Setting::ALL {
            let value = self.get(setting)?;
            preset.insert(setting, value);
        }
        debug!(entries = preset.len(), "preset captured");
        Ok(preset)
    }

    /// Write every known entry of `preset`, in schema order.
    ///
    /// All values are validated before the first write, so a bad entry
    /// leaves the instrument untouched. Unknown names are ignored.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<()> {
        for key in preset.unknown_keys() {
            warn!(key, "ignoring unknown preset entry");
        }
        for (setting, value) in preset.entries() {
            setting.descriptor().validator.validate(value)?;
        }
        for (setting, value) in preset.entries() {
            self.set(setting, value)?;
        }
        debug!(entries = preset.len(), "preset applied");
        Ok(())
    }
}
