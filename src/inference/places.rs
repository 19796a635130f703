use std::{collections::BTreeMap, sync::Arc};

use super::geo::Coordinate;

pub const DEFAULT_CAPTURE_RADIUS_M: f64 = 100.;
pub const DEFAULT_EVENT_LABEL: &str = "stay";

/// A named point of interest. A sample within `capture_radius_m` of it is considered to be at
/// the place.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub coordinate: Coordinate,
    pub capture_radius_m: f64,
    /// Activities usually happening at the place. The first one is used when recording a stay.
    pub events: Vec<Arc<str>>,
}

impl Place {
    pub fn new(id: impl Into<Arc<str>>, name: impl Into<Arc<str>>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
            capture_radius_m: DEFAULT_CAPTURE_RADIUS_M,
            events: vec![],
        }
    }

    pub fn with_events<I, S>(self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_capture_radius(self, capture_radius_m: f64) -> Self {
        Self {
            capture_radius_m,
            ..self
        }
    }

    pub fn default_label(&self) -> Arc<str> {
        self.events
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_EVENT_LABEL.into())
    }
}

/// Read-only set of places for a tracking session, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PlaceCatalog {
    places: BTreeMap<Arc<str>, Arc<Place>>,
}

impl PlaceCatalog {
    pub fn new(places: impl IntoIterator<Item = Place>) -> Self {
        Self {
            places: places
                .into_iter()
                .map(|place| (place.id.clone(), Arc::new(place)))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Place>> {
        self.places.get(id)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Place>> {
        self.places.values()
    }

    /// Finds the closest place to `point` together with the distance to it, if the point is
    /// inside that place's capture radius.
    ///
    /// This is a linear scan. Places are visited in ascending id order and only a strictly
    /// closer place replaces the current best, so on a tie the smallest id wins.
    pub fn nearest(&self, point: &Coordinate) -> Option<(&Arc<Place>, f64)> {
        let mut best: Option<(&Arc<Place>, f64)> = None;
        for place in self.places.values() {
            let distance = point.distance_to(&place.coordinate);
            match best {
                Some((_, best_distance)) if best_distance <= distance => {}
                _ => best = Some((place, distance)),
            }
        }

        best.filter(|(place, distance)| *distance <= place.capture_radius_m)
    }
}
