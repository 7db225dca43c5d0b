use serde::{Deserialize, Serialize};

/// Which upstream real-time API serves an agency's stops.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "grt-custom")]
    GrtCustom,
    #[serde(rename = "nextbus-rest")]
    NextBusRest,
    #[serde(rename = "none")]
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgencyRef {
    pub name: String,
    pub kind: ProviderKind,
    /// Opaque agency identifier used in upstream URLs.
    pub provider_agency_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Store-assigned identifier.
    pub id: String,
    /// Identifier the agency's provider knows this stop by.
    pub localid: String,
    pub name: String,
    pub lat: f64,
    pub long: f64,
    pub agency: AgencyRef,
}

/// Flat record shape of the stop store file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StopRecord {
    pub id: String,
    pub localid: String,
    pub name: String,
    pub lat: f64,
    pub long: f64,
    #[serde(rename = "agencyName")]
    pub agency_name: String,
    #[serde(rename = "providerAgencyId")]
    pub provider_agency_id: String,
    #[serde(rename = "providerKind")]
    pub provider_kind: ProviderKind,
}

impl From<StopRecord> for Stop {
    fn from(rec: StopRecord) -> Self {
        Stop {
            id: rec.id,
            localid: rec.localid,
            name: rec.name,
            lat: rec.lat,
            long: rec.long,
            agency: AgencyRef {
                name: rec.agency_name,
                kind: rec.provider_kind,
                provider_agency_id: rec.provider_agency_id,
            },
        }
    }
}

/// A stop paired with its distance from the query point. Transient,
/// produced by the store query and consumed by the locator.
#[derive(Clone, Debug)]
pub struct StopCandidate {
    pub stop: Stop,
    pub distance_m: f64,
}

/// One selectable option shown to the rider. May cover several physical
/// stop records that share a name prefix (e.g. both sides of a street).
#[derive(Clone, Debug)]
pub struct MergedStopChoice {
    pub name: String,
    pub distance_m: f64,
    pub stops: Vec<Stop>,
}

impl MergedStopChoice {
    pub fn stop_ids(&self) -> Vec<&str> {
        self.stops.iter().map(|s| s.id.as_str()).collect()
    }
}

/// Arrivals for one route at one stop, already rendered for display.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrivalBatch {
    pub route: String,
    pub arrivals: Vec<String>,
    pub has_real_time: bool,
}

/// Some NextBus member agencies store stop ids in a shape their upstream
/// does not accept; the adapter rewrites the id before building the URL.
#[derive(Clone, Debug, Default)]
pub struct StopIdRewrite {
    pub strip_prefix: Option<String>,
    pub add_prefix: Option<String>,
}

impl StopIdRewrite {
    pub fn apply(&self, stop_id: &str) -> String {
        let mut id = stop_id.to_string();
        if let Some(prefix) = &self.strip_prefix {
            if let Some(rest) = id.strip_prefix(prefix.as_str()) {
                id = rest.to_string();
            }
        }
        if let Some(prefix) = &self.add_prefix {
            id = format!("{}{}", prefix, id);
        }
        id
    }
}
