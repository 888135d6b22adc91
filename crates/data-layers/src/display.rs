//! Caller-held display state: which frame of a layer is on screen.

use serde::{Deserialize, Serialize};
use solar_common::{LayerError, LayerId};

use crate::resolve::{HOURS, MONTHS};

/// Month, day and hour the viewer is looking at, plus the animation clock.
///
/// Rendering never reads this; it only decides which of the rendered frames
/// to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    /// 0 = January
    pub month: usize,
    /// Day of month, 1-31
    pub day: u32,
    pub hour: usize,
    pub tick: u64,
    pub playing: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            month: 0,
            day: 14,
            hour: 0,
            tick: 0,
            playing: true,
        }
    }
}

impl DisplayState {
    /// Advance the animation by one step for `kind`.
    ///
    /// No-op when paused or when `kind` has a single frame.
    pub fn tick(&mut self, kind: LayerId) {
        if !self.playing || !kind.is_time_varying() {
            return;
        }
        self.tick = self.tick.wrapping_add(1);
        match kind {
            LayerId::MonthlyFlux => self.month = (self.tick % MONTHS as u64) as usize,
            LayerId::HourlyShade => self.hour = (self.tick % HOURS as u64) as usize,
            _ => {}
        }
    }

    /// Move the slider of `kind` to `value` (month or hour) and sync the clock.
    pub fn set_slider(&mut self, kind: LayerId, value: usize) -> Result<(), LayerError> {
        match kind {
            LayerId::MonthlyFlux => {
                check_range("month", value, MONTHS)?;
                self.month = value;
            }
            LayerId::HourlyShade => {
                check_range("hour", value, HOURS)?;
                self.hour = value;
            }
            _ => {
                return Err(LayerError::invalid_parameter(
                    "layer",
                    format!("{} has no time slider", kind),
                ))
            }
        }
        self.tick = value as u64;
        Ok(())
    }

    /// Pick the month and day shown for hourly shade.
    pub fn set_date(&mut self, month: usize, day: u32) -> Result<(), LayerError> {
        check_range("month", month, MONTHS)?;
        if !(1..=31).contains(&day) {
            return Err(LayerError::invalid_parameter("day", format!("{} is not in 1-31", day)));
        }
        self.month = month;
        self.day = day;
        Ok(())
    }

    pub fn toggle_playing(&mut self) {
        self.playing = !self.playing;
    }

    /// Index of the frame the overlay should show for `kind`.
    pub fn frame_index(&self, kind: LayerId) -> usize {
        match kind {
            LayerId::MonthlyFlux => self.month,
            LayerId::HourlyShade => self.hour,
            LayerId::Mask | LayerId::Dsm | LayerId::Rgb | LayerId::AnnualFlux => 0,
        }
    }
}

fn check_range(param: &str, value: usize, len: usize) -> Result<(), LayerError> {
    if value >= len {
        return Err(LayerError::invalid_parameter(param, format!("{} is not in 0-{}", value, len - 1)));
    }
    Ok(())
}

/// One entry of the layer picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerOption {
    /// `None` for "no layer"
    pub id: Option<LayerId>,
    pub title: &'static str,
}

/// Picker entries: "no layer" first, then every kind.
pub fn layer_options() -> Vec<LayerOption> {
    std::iter::once(LayerOption {
        id: None,
        title: LayerId::none_title(),
    })
    .chain(LayerId::ALL.iter().map(|&id| LayerOption {
        id: Some(id),
        title: id.title(),
    }))
    .collect()
}
