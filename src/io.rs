use crate::structs::*;

use geo::{point, HaversineDistance};
use std::{error::Error, fs::File, io::Read, path::Path};

//////////////////////////////////////////////////////////
// Stop store
//////////////////////////////////////////////////////////

/// Read-only stop reference data, loaded once from the JSON file the
/// GTFS import writes. Proximity queries are answered from memory.
#[derive(Clone, Debug, Default)]
pub struct StopStore {
    stops: Vec<Stop>,
}

impl StopStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut file_data = String::new();
        let mut file = File::open(path.as_ref())?;
        file.read_to_string(&mut file_data)?;

        let records: Vec<StopRecord> = serde_json::from_str(&file_data)?;
        log::info!("Loaded {} stops from {:?}", records.len(), path.as_ref());

        Ok(Self::from_stops(records.into_iter().map(Stop::from).collect()))
    }

    pub fn from_stops(stops: Vec<Stop>) -> Self {
        StopStore { stops }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// All stops within `radius_m` of the point, ascending by distance.
    /// The sort is stable, so equally distant stops keep file order.
    pub fn query_nearby(&self, lat: f64, long: f64, radius_m: f64) -> Vec<StopCandidate> {
        let here = point!(x: long, y: lat);

        let mut candidates: Vec<StopCandidate> = self
            .stops
            .iter()
            .filter_map(|stop| {
                let there = point!(x: stop.long, y: stop.lat);
                let distance_m = here.haversine_distance(&there);
                if distance_m <= radius_m {
                    Some(StopCandidate {
                        stop: stop.clone(),
                        distance_m,
                    })
                } else {
                    None
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.distance_m
                .partial_cmp(&b.distance_m)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
    }
}
