//! Platform boundary traits.
//!
//! The core never talks to a device API directly. Key-value persistence,
//! speech synthesis and haptic feedback are injected through these traits
//! so the same logic runs under the GUI shell, the CLI and the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StorageError;

/// Persistent string key-value store (the shape of the mobile storage API).
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// Shared handles delegate, so one database can back several stores.
impl<K: KvStore + ?Sized> KvStore for std::rc::Rc<K> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<K: KvStore + ?Sized> KvStore for std::sync::Arc<K> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Voice parameters for spoken read-back.
#[derive(Debug, Clone)]
pub struct VoiceParams {
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            language: "ja-JP".into(),
            pitch: 1.0,
            rate: 0.9,
        }
    }
}

/// Text-to-speech service.
pub trait Speech {
    fn speak(&self, text: &str, params: &VoiceParams);
    fn stop(&self);
}

/// Discrete haptic feedback pulses.
pub trait Haptics {
    /// The heavy repeated pattern used when an alarm fires.
    fn alarm_pattern(&self);
    /// A single light pulse for button-style feedback.
    fn light(&self);
}

/// In-memory key-value store for tests and embedding.
#[derive(Default)]
pub struct MemoryKv {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.map.lock().map_err(|e| StorageError::ReadFailed {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().map_err(|e| StorageError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().map_err(|e| StorageError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        map.remove(key);
        Ok(())
    }
}

/// No-op speech synthesizer for headless environments.
#[derive(Default)]
pub struct NullSpeech;

impl Speech for NullSpeech {
    fn speak(&self, _text: &str, _params: &VoiceParams) {}
    fn stop(&self) {}
}

/// No-op haptic engine for headless environments.
#[derive(Default)]
pub struct NullHaptics;

impl Haptics for NullHaptics {
    fn alarm_pattern(&self) {}
    fn light(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_kv_roundtrip() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("missing").unwrap(), None);
        kv.set("k", "v").unwrap();
        assert_eq!(kv.get("k").unwrap().as_deref(), Some("v"));
        kv.remove("k").unwrap();
        assert_eq!(kv.get("k").unwrap(), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let kv = MemoryKv::new();
        kv.remove("never_set").unwrap();
        kv.remove("never_set").unwrap();
    }
}
