//! Two-level place hierarchy and nearest-region labelling.
//!
//! The hierarchy is small and fixed (provinces/cities with their districts),
//! so resolution is a linear argmin over the roots followed by one over the
//! winning root's children. No spatial index, no per-query cache.

use serde::{Deserialize, Serialize};

use crate::geo::haversine_km;
use crate::{DEFAULT_REGION_LEVEL, SUB_REGION_THRESHOLD_KM};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Map level to use when navigating to this place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default)]
    pub children: Vec<Place>,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            level: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Place>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn focus_level(&self) -> u8 {
        self.level.unwrap_or(DEFAULT_REGION_LEVEL)
    }

    fn distance_km(&self, lat: f64, lng: f64) -> f64 {
        haversine_km(lat, lng, self.lat, self.lng)
    }
}

/// Index and distance of the closest place. Ties keep the earliest entry.
fn nearest(places: &[Place], lat: f64, lng: f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, place) in places.iter().enumerate() {
        let dist = place.distance_km(lat, lng);
        let closer = match best {
            Some((_, best_dist)) => dist < best_dist,
            None => dist < f64::INFINITY,
        };
        if closer {
            best = Some((idx, dist));
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMatch<'a> {
    pub root_index: usize,
    pub root: &'a Place,
    pub root_distance_km: f64,
    /// Present only when the nearest child is strictly inside the threshold.
    pub child: Option<ChildMatch<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildMatch<'a> {
    pub index: usize,
    pub place: &'a Place,
    pub distance_km: f64,
}

impl RegionMatch<'_> {
    #[must_use]
    pub fn label(&self) -> String {
        match self.child {
            Some(child) => format!("{} {}", self.root.name, child.place.name),
            None => self.root.name.clone(),
        }
    }
}

/// Immutable snapshot of the place hierarchy, built once per data load.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionIndex {
    roots: Vec<Place>,
    threshold_km: f64,
}

impl Default for RegionIndex {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RegionIndex {
    #[must_use]
    pub fn new(roots: Vec<Place>) -> Self {
        Self::with_threshold(roots, SUB_REGION_THRESHOLD_KM)
    }

    #[must_use]
    pub fn with_threshold(roots: Vec<Place>, threshold_km: f64) -> Self {
        Self {
            roots,
            threshold_km,
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[Place] {
        &self.roots
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    #[must_use]
    pub const fn threshold_km(&self) -> f64 {
        self.threshold_km
    }

    /// Root by index, or one of its direct children.
    #[must_use]
    pub fn place(&self, root: usize, child: Option<usize>) -> Option<&Place> {
        let root = self.roots.get(root)?;
        match child {
            Some(idx) => root.children.get(idx),
            None => Some(root),
        }
    }

    /// Nearest root, refined by its nearest child when that child is closer
    /// than the threshold. Only two levels are ever inspected.
    #[must_use]
    pub fn nearest(&self, lat: f64, lng: f64) -> Option<RegionMatch<'_>> {
        let (root_index, root_distance_km) = nearest(&self.roots, lat, lng)?;
        let root = &self.roots[root_index];

        let child = nearest(&root.children, lat, lng)
            .filter(|&(_, dist)| dist < self.threshold_km)
            .map(|(index, distance_km)| ChildMatch {
                index,
                place: &root.children[index],
                distance_km,
            });

        Some(RegionMatch {
            root_index,
            root,
            root_distance_km,
            child,
        })
    }

    /// Human-readable label such as `"춘천시 효자동"`; empty when the
    /// hierarchy has no roots.
    #[must_use]
    pub fn resolve(&self, lat: f64, lng: f64) -> String {
        self.nearest(lat, lng)
            .map(|m| m.label())
            .unwrap_or_default()
    }
}
