//! In-process stand-in for the controlled device.
//!
//! [`SimulatedDevice`] exposes one track/device pair with a fixed number of
//! parameters and implements both [`ParameterSource`] and [`ActionSink`], so
//! the controller runs end-to-end without a transport. Parameter values are
//! normalized to `0..=1`; each slot also has a device-native range reported
//! through [`Snapshot::raw_values`].

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use liverule_rules::engine::{ActionSink, DispatchError};
use liverule_rules::model::Snapshot;
use liverule_rules::schema::{Action, ActionKind};
use tracing::{debug, info};

use crate::error::ControllerError;
use crate::source::{ParameterSource, SamplerError};

/// Tempo range accepted by `set_tempo`, in BPM.
pub const TEMPO_RANGE: std::ops::RangeInclusive<f64> = 20.0..=999.0;
const DEFAULT_TEMPO: f64 = 120.0;

#[derive(Debug, Clone, Copy)]
struct Slot {
    value: f64,
    min: f64,
    max: f64,
}

impl Slot {
    fn raw(&self) -> f64 {
        self.min + self.value * (self.max - self.min)
    }
}

#[derive(Debug)]
struct DeviceState {
    slots: Vec<Slot>,
    /// Parameter index → sine period.
    modulation: HashMap<u32, Duration>,
    tempo: f64,
    playing_clip: Option<u32>,
    applied: u64,
    connected: bool,
}

/// Simulated track/device with `param_count` parameters.
#[derive(Debug)]
pub struct SimulatedDevice {
    track: u32,
    device: u32,
    started: Instant,
    state: Mutex<DeviceState>,
}

impl SimulatedDevice {
    /// Connect to `device` on `track`, exposing `param_count` parameters
    /// all starting at zero with a native range of `0..=1`.
    pub fn connect(track: u32, device: u32, param_count: u32) -> Result<Self, ControllerError> {
        if param_count == 0 {
            return Err(ControllerError::Init(format!(
                "device {device} on track {track} exposes no parameters"
            )));
        }
        info!(track, device, params = param_count, "connected to simulated device");
        Ok(Self {
            track,
            device,
            started: Instant::now(),
            state: Mutex::new(DeviceState {
                slots: vec![
                    Slot {
                        value: 0.0,
                        min: 0.0,
                        max: 1.0,
                    };
                    param_count as usize
                ],
                modulation: HashMap::new(),
                tempo: DEFAULT_TEMPO,
                playing_clip: None,
                applied: 0,
                connected: true,
            }),
        })
    }

    /// Set the device-native range of a parameter. Out-of-range indices are ignored.
    pub fn with_native_range(self, index: u32, min: f64, max: f64) -> Self {
        if let Some(slot) = self.lock().slots.get_mut(index as usize) {
            slot.min = min;
            slot.max = max;
        }
        self
    }

    /// Sweep a parameter through a sine wave with the given period. The
    /// sweep overrides `set_parameter` writes on the next poll.
    pub fn with_modulation(self, index: u32, period: Duration) -> Self {
        if !period.is_zero() {
            self.lock().modulation.insert(index, period);
        }
        self
    }

    /// Set a normalized parameter value directly, bypassing action checks.
    pub fn set_value(&self, index: u32, value: f64) {
        if let Some(slot) = self.lock().slots.get_mut(index as usize) {
            slot.value = value.clamp(0.0, 1.0);
        }
    }

    /// Make every following poll fail, as if the connection dropped.
    pub fn disconnect(&self) {
        self.lock().connected = false;
    }

    pub fn value(&self, index: u32) -> Option<f64> {
        self.lock().slots.get(index as usize).map(|s| s.value)
    }

    pub fn tempo(&self) -> f64 {
        self.lock().tempo
    }

    pub fn playing_clip(&self) -> Option<u32> {
        self.lock().playing_clip
    }

    /// Actions applied successfully so far.
    pub fn applied(&self) -> u64 {
        self.lock().applied
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().expect("device state lock poisoned")
    }

    fn check_target(&self, track_index: u32, device_index: Option<u32>) -> Result<(), DispatchError> {
        if track_index != self.track {
            return Err(DispatchError::Rejected(format!(
                "track {track_index} is not controlled (controlling track {})",
                self.track
            )));
        }
        if let Some(device_index) = device_index {
            if device_index != self.device {
                return Err(DispatchError::Rejected(format!(
                    "device {device_index} is not controlled (controlling device {})",
                    self.device
                )));
            }
        }
        Ok(())
    }

    fn apply(&self, action: &Action) -> Result<(), DispatchError> {
        match action.kind() {
            ActionKind::SetParameter {
                track_index,
                device_index,
                parameter_index,
                value,
            } => {
                self.check_target(track_index, Some(device_index))?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(DispatchError::Rejected(format!(
                        "value {value} is outside the normalized range 0..=1"
                    )));
                }
                let mut state = self.lock();
                let slot = state.slots.get_mut(parameter_index as usize).ok_or_else(|| {
                    DispatchError::Rejected(format!("parameter {parameter_index} does not exist"))
                })?;
                slot.value = value;
            }
            ActionKind::FireClip {
                track_index,
                clip_index,
            } => {
                self.check_target(track_index, None)?;
                self.lock().playing_clip = Some(clip_index);
            }
            ActionKind::StopClip {
                track_index,
                clip_index,
            } => {
                self.check_target(track_index, None)?;
                let mut state = self.lock();
                if clip_index.is_none() || clip_index == state.playing_clip {
                    state.playing_clip = None;
                }
            }
            ActionKind::SetTempo { bpm } => {
                if !TEMPO_RANGE.contains(&bpm) {
                    return Err(DispatchError::Rejected(format!(
                        "tempo {bpm} BPM is outside {}..={}",
                        TEMPO_RANGE.start(),
                        TEMPO_RANGE.end()
                    )));
                }
                self.lock().tempo = bpm;
            }
            ActionKind::Incomplete {
                action_type,
                missing,
            } => {
                return Err(DispatchError::Rejected(format!(
                    "'{action_type}' action is missing '{missing}'"
                )));
            }
            ActionKind::Other { action_type, .. } => {
                return Err(DispatchError::Unsupported(action_type.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ParameterSource for SimulatedDevice {
    async fn poll(&self) -> Result<Snapshot, SamplerError> {
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut state = self.lock();
        if !state.connected {
            return Err(SamplerError::Unavailable(format!(
                "device {} on track {} disconnected",
                self.device, self.track
            )));
        }

        let DeviceState {
            slots, modulation, ..
        } = &mut *state;
        for (index, period) in modulation.iter() {
            if let Some(slot) = slots.get_mut(*index as usize) {
                slot.value = 0.5 + 0.5 * (TAU * elapsed / period.as_secs_f64()).sin();
            }
        }

        let snapshot = slots
            .iter()
            .enumerate()
            .fold(Snapshot::new(Utc::now()), |snap, (i, slot)| {
                snap.with_value(i as u32, slot.value, slot.raw())
            });
        Ok(snapshot)
    }
}

#[async_trait]
impl ActionSink for SimulatedDevice {
    async fn dispatch(&self, action: &Action) -> Result<(), DispatchError> {
        self.apply(action)?;
        let mut state = self.lock();
        state.applied += 1;
        debug!(action_type = %action.action_type, applied = state.applied, "applied action");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> SimulatedDevice {
        SimulatedDevice::connect(1, 0, 4).unwrap()
    }

    #[test]
    fn zero_parameters_is_an_init_error() {
        let err = SimulatedDevice::connect(0, 0, 0).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn poll_reports_normalized_and_raw() {
        let device = device().with_native_range(2, 0.0, 127.0);
        device.set_value(2, 0.5);

        let snapshot = device.poll().await.unwrap();
        assert_eq!(snapshot.values.len(), 4);
        assert_eq!(snapshot.value(2), Some(0.5));
        assert_eq!(snapshot.raw_values[&2], 63.5);
    }

    #[tokio::test]
    async fn modulation_stays_normalized() {
        let device = device().with_modulation(0, Duration::from_millis(50));
        for _ in 0..5 {
            let value = device.poll().await.unwrap().value(0).unwrap();
            assert!((0.0..=1.0).contains(&value));
            tokio::time::sleep(Duration::from_millis(7)).await;
        }
    }

    #[tokio::test]
    async fn disconnected_poll_fails() {
        let device = device();
        device.disconnect();
        assert!(matches!(device.poll().await, Err(SamplerError::Unavailable(_))));
    }

    #[tokio::test]
    async fn applies_known_actions() {
        let device = device();

        device.dispatch(&Action::set_parameter(1, 0, 3, 0.25)).await.unwrap();
        device.dispatch(&Action::fire_clip(1, 2)).await.unwrap();
        device.dispatch(&Action::set_tempo(128.0)).await.unwrap();

        assert_eq!(device.value(3), Some(0.25));
        assert_eq!(device.playing_clip(), Some(2));
        assert_eq!(device.tempo(), 128.0);

        device.dispatch(&Action::stop_clip(1, Some(5))).await.unwrap();
        assert_eq!(device.playing_clip(), Some(2));
        device.dispatch(&Action::stop_clip(1, None)).await.unwrap();
        assert_eq!(device.playing_clip(), None);

        assert_eq!(device.applied(), 5);
    }

    #[tokio::test]
    async fn rejects_foreign_targets_and_bad_values() {
        let device = device();

        let wrong_track = device.dispatch(&Action::set_parameter(2, 0, 0, 0.5)).await;
        assert!(matches!(wrong_track, Err(DispatchError::Rejected(_))));

        let wrong_device = device.dispatch(&Action::set_parameter(1, 3, 0, 0.5)).await;
        assert!(matches!(wrong_device, Err(DispatchError::Rejected(_))));

        let no_such_param = device.dispatch(&Action::set_parameter(1, 0, 9, 0.5)).await;
        assert!(matches!(no_such_param, Err(DispatchError::Rejected(_))));

        let out_of_range = device.dispatch(&Action::set_parameter(1, 0, 0, 1.5)).await;
        assert!(matches!(out_of_range, Err(DispatchError::Rejected(_))));

        let too_slow = device.dispatch(&Action::set_tempo(5.0)).await;
        assert!(matches!(too_slow, Err(DispatchError::Rejected(_))));

        assert_eq!(device.applied(), 0);
        assert_eq!(device.tempo(), 120.0);
    }

    #[tokio::test]
    async fn unknown_action_type_is_unsupported() {
        let device = device();
        let result = device.dispatch(&Action::new("send_osc").with_data("address", "/x")).await;
        assert_eq!(result, Err(DispatchError::Unsupported("send_osc".to_string())));
    }
}
