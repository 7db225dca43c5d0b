use std::env;
use std::time::Duration;

use crate::structs::StopIdRewrite;

//////////////////////////////////////////////////////////
// Policy constants
//////////////////////////////////////////////////////////

/// Radius of the nearby-stop search.
pub const SEARCH_RADIUS_METERS: f64 = 1000.0;

/// Stops whose names share this many leading characters are shown as one
/// choice (the same platform usually exists under two stop records).
pub const NAME_MERGE_PREFIX_LEN: usize = 16;

/// Chat platforms cap how many quick-reply options they display.
pub const MAX_STOP_CHOICES: usize = 10;

/// Gap between paced messages so the platform keeps them in order.
pub const DELIVERY_PACE: Duration = Duration::from_secs(2);

pub const STOPS_DATA_PATH: &str = "stops.json";

const GRT_BASE_URL: &str = "http://nwoodthorpe.com/grt/V2/livetime.php";
const NEXTBUS_BASE_URL: &str = "http://restbus.info/api";

//////////////////////////////////////////////////////////
// Environment
//////////////////////////////////////////////////////////

pub fn stops_data_path() -> String {
    env::var("STOPS_DATA_PATH").unwrap_or_else(|_| STOPS_DATA_PATH.to_string())
}

pub fn grt_base_url() -> String {
    env::var("GRT_BASE_URL").unwrap_or_else(|_| GRT_BASE_URL.to_string())
}

pub fn nextbus_base_url() -> String {
    env::var("NEXTBUS_BASE_URL").unwrap_or_else(|_| NEXTBUS_BASE_URL.to_string())
}

/// Per-agency stop-id fixups for NextBus-compatible members. The store
/// keeps ids as the GTFS feed publishes them; a few upstreams disagree.
pub fn nextbus_id_rewrite(provider_agency_id: &str) -> StopIdRewrite {
    match provider_agency_id {
        // TTC feed ids carry an agency prefix the predictions API rejects.
        "ttc" => StopIdRewrite {
            strip_prefix: Some("ttc_".to_string()),
            add_prefix: None,
        },
        _ => StopIdRewrite::default(),
    }
}
