//! Pure per-group presentation: identity colors, region label and status color.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::group::Group;
use crate::region::RegionIndex;

/// Region color used when a group has no region label.
pub const NEUTRAL_REGION_COLOR: &str = "#6c757d";

/// Saturation/lightness pair applied to a hashed hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub saturation: u8,
    pub lightness: u8,
}

pub const GROUP_STROKE: Tone = Tone { saturation: 70, lightness: 45 };
pub const GROUP_FILL: Tone = Tone { saturation: 90, lightness: 85 };
pub const REGION_TONE: Tone = Tone { saturation: 65, lightness: 40 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u16,
    pub tone: Tone,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.tone.saturation, self.tone.lightness
        )
    }
}

/// `hash = hash * 31 + unit` over UTF-16 code units with i32 wraparound.
#[must_use]
pub fn identity_hash(input: &str) -> i32 {
    input
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

#[must_use]
pub fn identity_hue(input: &str) -> u16 {
    // < 360, always fits
    #[allow(clippy::cast_possible_truncation)]
    let hue = (identity_hash(input).unsigned_abs() % 360) as u16;
    hue
}

/// Single hashing primitive behind both group and region colors.
#[must_use]
pub fn identity_color(input: &str, tone: Tone) -> Hsl {
    Hsl {
        hue: identity_hue(input),
        tone,
    }
}

/// Colors keyed on the first space-delimited token of a region label, so
/// every district of a city shares the city's color.
#[must_use]
pub fn region_color(label: &str) -> String {
    if label.is_empty() {
        return NEUTRAL_REGION_COLOR.to_string();
    }
    let city = label.split(' ').next().unwrap_or_default();
    identity_color(city, REGION_TONE).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerColor {
    pub stroke: String,
    pub fill: String,
}

impl MarkerColor {
    #[must_use]
    pub fn for_id(group_id: &str) -> Self {
        Self {
            stroke: identity_color(group_id, GROUP_STROKE).to_string(),
            fill: identity_color(group_id, GROUP_FILL).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPresentation {
    pub marker_color: MarkerColor,
    pub region_label: String,
    pub region_color: String,
    pub status_color: String,
}

/// Stateless; borrows the region index for label resolution.
#[derive(Debug, Clone, Copy)]
pub struct GroupPresenter<'a> {
    regions: &'a RegionIndex,
}

impl<'a> GroupPresenter<'a> {
    #[must_use]
    pub const fn new(regions: &'a RegionIndex) -> Self {
        Self { regions }
    }

    #[must_use]
    pub fn present(&self, group: &Group) -> GroupPresentation {
        let region_label = group
            .location
            .map(|loc| self.regions.resolve(loc.lat(), loc.lng()))
            .unwrap_or_default();

        GroupPresentation {
            marker_color: MarkerColor::for_id(group.group_id.as_str()),
            region_color: region_color(&region_label),
            region_label,
            status_color: group.status.color().to_string(),
        }
    }
}
