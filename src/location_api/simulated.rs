use anyhow::Result;

use crate::inference::{geo::Coordinate, places::PlaceCatalog, sample::RawFix};

use super::LocationProvider;

/// Roughly 2 m of latitude.
const DWELL_JITTER_DEG: f64 = 0.00002;
const WANDER_RADIUS_DEG: f64 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct SimulationPlan {
    /// Ticks spent at every place.
    pub dwell_ticks: u32,
    /// Ticks spent moving between consecutive places.
    pub travel_ticks: u32,
    pub travel_speed: f64,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            dwell_ticks: 12,
            travel_ticks: 3,
            travel_speed: 4.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Leg {
    Dwell {
        at: Coordinate,
        ticks: u32,
    },
    Travel {
        from: Coordinate,
        to: Coordinate,
        ticks: u32,
    },
}

impl Leg {
    fn ticks(&self) -> u32 {
        match self {
            Leg::Dwell { ticks, .. } | Leg::Travel { ticks, .. } => *ticks,
        }
    }
}

/// Deterministic stand-in for a GPS receiver. Walks an endless loop over the configured places:
/// lingers at each one, then runs to the next. Without places it wanders around
/// `center` at varying speed.
pub struct SimulatedLocationProvider {
    legs: Vec<Leg>,
    center: Coordinate,
    plan: SimulationPlan,
    tick: u64,
}

impl SimulatedLocationProvider {
    pub fn new(stops: Vec<Coordinate>, center: Coordinate, plan: SimulationPlan) -> Self {
        let mut legs = vec![];
        for (i, stop) in stops.iter().enumerate() {
            legs.push(Leg::Dwell {
                at: *stop,
                ticks: plan.dwell_ticks.max(1),
            });
            let next = stops[(i + 1) % stops.len()];
            if stops.len() > 1 && plan.travel_ticks > 0 {
                legs.push(Leg::Travel {
                    from: *stop,
                    to: next,
                    ticks: plan.travel_ticks,
                });
            }
        }
        Self {
            legs,
            center,
            plan,
            tick: 0,
        }
    }

    /// Visits every place of the catalog in id order.
    pub fn through_catalog(catalog: &PlaceCatalog, center: Coordinate, plan: SimulationPlan) -> Self {
        Self::new(
            catalog.iter().map(|place| place.coordinate).collect(),
            center,
            plan,
        )
    }

    fn wander(&self) -> RawFix {
        let t = self.tick as f64;
        RawFix::new(
            self.center.latitude + WANDER_RADIUS_DEG * (t * 0.37).sin(),
            self.center.longitude + WANDER_RADIUS_DEG * (t * 0.53).cos(),
            4. + 4. * (t * 0.71).sin(),
        )
    }

    fn fix_for(&self, leg: Leg, step: u32) -> RawFix {
        let t = self.tick as f64;
        match leg {
            Leg::Dwell { at, .. } => RawFix::new(
                at.latitude + DWELL_JITTER_DEG * (t * 1.7).sin(),
                at.longitude + DWELL_JITTER_DEG * (t * 2.3).cos(),
                0.2 + 0.3 * (t * 0.9).sin().abs(),
            ),
            Leg::Travel { from, to, ticks } => {
                let progress = (step + 1) as f64 / (ticks + 1) as f64;
                RawFix::new(
                    from.latitude + (to.latitude - from.latitude) * progress,
                    from.longitude + (to.longitude - from.longitude) * progress,
                    self.plan.travel_speed + 0.5 * (t * 1.3).sin(),
                )
            }
        }
    }

    fn current_fix(&self) -> RawFix {
        let cycle = self.legs.iter().map(|v| v.ticks() as u64).sum::<u64>();
        if cycle == 0 {
            return self.wander();
        }
        let mut offset = self.tick % cycle;
        for leg in self.legs.iter() {
            let ticks = leg.ticks() as u64;
            if offset < ticks {
                return self.fix_for(*leg, offset as u32);
            }
            offset -= ticks;
        }
        self.wander()
    }
}

impl LocationProvider for SimulatedLocationProvider {
    fn get_fix(&mut self) -> Result<RawFix> {
        let fix = self.current_fix();
        self.tick += 1;
        Ok(fix)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{
        inference::{
            events::DerivedEvent,
            geo::Coordinate,
            pipeline::{IngestionPipeline, Thresholds},
            places::{Place, PlaceCatalog},
        },
        location_api::LocationProvider,
    };

    use super::{SimulatedLocationProvider, SimulationPlan};

    fn catalog() -> PlaceCatalog {
        PlaceCatalog::new([
            Place::new("home", "Home", Coordinate::new(31.0258, 121.4376)),
            Place::new("sports", "Sports Field", Coordinate::new(31.0268, 121.4390)),
        ])
    }

    #[test]
    fn test_dwell_stays_inside_capture_radius() -> Result<()> {
        let catalog = catalog();
        let mut provider = SimulatedLocationProvider::through_catalog(
            &catalog,
            Coordinate::new(31.0258, 121.4376),
            SimulationPlan::default(),
        );
        for _ in 0..12 {
            let fix = provider.get_fix()?;
            let point = Coordinate::new(fix.latitude.unwrap(), fix.longitude.unwrap());
            let (place, _) = catalog.nearest(&point).expect("should be at a place");
            assert_eq!(&*place.id, "home");
            assert!(fix.speed.unwrap() < 3.);
        }
        // First tick of the run to the sports field.
        assert!(provider.get_fix()?.speed.unwrap() > 3.);
        Ok(())
    }

    #[test]
    fn test_itinerary_produces_stays_and_runs() -> Result<()> {
        let catalog = catalog();
        let mut provider = SimulatedLocationProvider::through_catalog(
            &catalog,
            Coordinate::new(31.0258, 121.4376),
            SimulationPlan::default(),
        );
        let mut pipeline = IngestionPipeline::new(catalog, Thresholds::default());

        let mut events = vec![];
        for tick in 0..60 {
            events.extend(pipeline.ingest_fix(provider.get_fix()?, tick as f64 * 10.)?);
        }

        assert!(events
            .iter()
            .any(|v| matches!(v, DerivedEvent::StayRecorded { .. })));
        assert!(events
            .iter()
            .any(|v| matches!(v, DerivedEvent::RunEnded { .. })));
        Ok(())
    }

    #[test]
    fn test_empty_catalog_wanders() -> Result<()> {
        let center = Coordinate::new(31.0258, 121.4376);
        let mut provider = SimulatedLocationProvider::through_catalog(
            &PlaceCatalog::default(),
            center,
            SimulationPlan::default(),
        );
        for _ in 0..50 {
            let fix = provider.get_fix()?;
            let point = Coordinate::new(fix.latitude.unwrap(), fix.longitude.unwrap());
            assert!(point.distance_to(&center) < 200.);
            assert!((0. ..=8.).contains(&fix.speed.unwrap()));
        }
        Ok(())
    }
}
