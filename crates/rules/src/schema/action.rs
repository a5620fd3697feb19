//! Action payloads routed from triggered rules to the device.
//!
//! The engine never interprets an [`Action`]; it only forwards it to the
//! configured sink. Sinks use [`Action::kind`] to get a typed view keyed by
//! the `type` field, with [`ActionKind::Other`] as the forward-compatible
//! fallback for types this crate does not know about.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` token for setting a device parameter.
pub const SET_PARAMETER: &str = "set_parameter";
/// `type` token for launching a clip slot.
pub const FIRE_CLIP: &str = "fire_clip";
/// `type` token for stopping a clip (or every clip on a track).
pub const STOP_CLIP: &str = "stop_clip";
/// `type` token for changing the song tempo.
pub const SET_TEMPO: &str = "set_tempo";

/// Action types with a fixed payload shape.
pub const KNOWN_ACTION_TYPES: &[&str] = &[SET_PARAMETER, FIRE_CLIP, STOP_CLIP, SET_TEMPO];

/// A side effect to apply to the controlled device.
///
/// This is the wire form: every field except `type` is optional and only
/// populated fields are serialized, so `to_value` / `from_value` round-trip
/// exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// Typed view of an [`Action`], keyed by its `type`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionKind<'a> {
    SetParameter {
        track_index: u32,
        device_index: u32,
        parameter_index: u32,
        value: f64,
    },
    FireClip {
        track_index: u32,
        clip_index: u32,
    },
    /// Stops one clip, or every clip on the track when `clip_index` is absent.
    StopClip {
        track_index: u32,
        clip_index: Option<u32>,
    },
    SetTempo {
        bpm: f64,
    },
    /// A known type with one of its required fields missing.
    Incomplete {
        action_type: &'a str,
        missing: &'static str,
    },
    /// Any type without a fixed shape; payload lives in `data`.
    Other {
        action_type: &'a str,
        data: Option<&'a Map<String, Value>>,
    },
}

impl Action {
    /// A bare action of the given type with no payload fields.
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            track_index: None,
            device_index: None,
            parameter_index: None,
            clip_index: None,
            target_value: None,
            data: None,
        }
    }

    pub fn set_parameter(
        track_index: u32,
        device_index: u32,
        parameter_index: u32,
        value: f64,
    ) -> Self {
        Self {
            track_index: Some(track_index),
            device_index: Some(device_index),
            parameter_index: Some(parameter_index),
            target_value: Some(value),
            ..Self::new(SET_PARAMETER)
        }
    }

    pub fn fire_clip(track_index: u32, clip_index: u32) -> Self {
        Self {
            track_index: Some(track_index),
            clip_index: Some(clip_index),
            ..Self::new(FIRE_CLIP)
        }
    }

    pub fn stop_clip(track_index: u32, clip_index: Option<u32>) -> Self {
        Self {
            track_index: Some(track_index),
            clip_index,
            ..Self::new(STOP_CLIP)
        }
    }

    pub fn set_tempo(bpm: f64) -> Self {
        Self {
            target_value: Some(bpm),
            ..Self::new(SET_TEMPO)
        }
    }

    /// Attach a free-form `data` entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Typed view of this action.
    pub fn kind(&self) -> ActionKind<'_> {
        if let Some(&missing) = self.missing_fields().first() {
            return ActionKind::Incomplete {
                action_type: &self.action_type,
                missing,
            };
        }

        match (
            self.action_type.as_str(),
            self.track_index,
            self.device_index,
            self.parameter_index,
            self.clip_index,
            self.target_value,
        ) {
            (SET_PARAMETER, Some(track_index), Some(device_index), Some(parameter_index), _, Some(value)) => {
                ActionKind::SetParameter {
                    track_index,
                    device_index,
                    parameter_index,
                    value,
                }
            }
            (FIRE_CLIP, Some(track_index), _, _, Some(clip_index), _) => ActionKind::FireClip {
                track_index,
                clip_index,
            },
            (STOP_CLIP, Some(track_index), _, _, clip_index, _) => ActionKind::StopClip {
                track_index,
                clip_index,
            },
            (SET_TEMPO, _, _, _, _, Some(bpm)) => ActionKind::SetTempo { bpm },
            _ => ActionKind::Other {
                action_type: &self.action_type,
                data: self.data.as_ref(),
            },
        }
    }

    /// Required fields of a known action type that are not populated.
    ///
    /// Always empty for types without a fixed shape.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let mut require = |present: bool, field: &'static str| {
            if !present {
                missing.push(field);
            }
        };

        match self.action_type.as_str() {
            SET_PARAMETER => {
                require(self.track_index.is_some(), "track_index");
                require(self.device_index.is_some(), "device_index");
                require(self.parameter_index.is_some(), "parameter_index");
                require(self.target_value.is_some(), "target_value");
            }
            FIRE_CLIP => {
                require(self.track_index.is_some(), "track_index");
                require(self.clip_index.is_some(), "clip_index");
            }
            STOP_CLIP => {
                require(self.track_index.is_some(), "track_index");
            }
            SET_TEMPO => {
                require(self.target_value.is_some(), "target_value");
            }
            _ => {}
        }

        missing
    }

    /// Serialize to a JSON value containing only populated fields.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Rebuild an action from a JSON value produced by [`to_value`](Self::to_value).
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
