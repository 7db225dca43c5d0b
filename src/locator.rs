use crate::config;
use crate::io::StopStore;
use crate::structs::*;

//////////////////////////////////////////////////////////
// Stop resolution
//////////////////////////////////////////////////////////

/// Resolve a rider's location to at most `MAX_STOP_CHOICES` selectable
/// stop choices. Candidates whose names share the merge prefix collapse
/// into one choice; an empty result means no stops nearby (the caller
/// messages that, it is not a failure).
pub fn locate(store: &StopStore, lat: f64, long: f64, radius_m: f64) -> Vec<MergedStopChoice> {
    let candidates = store.query_nearby(lat, long, radius_m);
    log::debug!(
        "{} candidates within {} m of ({}, {})",
        candidates.len(),
        radius_m,
        lat,
        long
    );

    // Keys kept beside the choices so the identity of a choice is the
    // key it was created under, never recomputed from its display name.
    let mut keys: Vec<String> = Vec::new();
    let mut choices: Vec<MergedStopChoice> = Vec::new();

    for candidate in candidates {
        let key = merge_key(&candidate.stop);
        match keys.iter().position(|k| *k == key) {
            // First-encountered candidate named the choice; later members
            // only contribute their stop id.
            Some(i) => choices[i].stops.push(candidate.stop),
            None => {
                keys.push(key);
                choices.push(MergedStopChoice {
                    name: candidate.stop.name.clone(),
                    distance_m: candidate.distance_m,
                    stops: vec![candidate.stop],
                });
            }
        }
    }

    choices.truncate(config::MAX_STOP_CHOICES);
    choices
}

/// Merge key of a stop: the first `NAME_MERGE_PREFIX_LEN` characters of
/// its name. A stop without a usable name never merges with anything, so
/// its store id stands in as the key.
fn merge_key(stop: &Stop) -> String {
    if stop.name.trim().is_empty() {
        return format!("\u{0}{}", stop.id);
    }
    stop.name
        .chars()
        .take(config::NAME_MERGE_PREFIX_LEN)
        .collect()
}
