use thiserror::Error;

/// Failure taxonomy of the arrival pipeline. Provider errors stop at the
/// aggregator boundary; only `user_message` text ever reaches the rider.
#[derive(Debug, Error)]
pub enum TransitError {
    #[error("no transit stops within {radius_m} m")]
    NoStopsNearby { radius_m: u32 },

    #[error("agency '{agency}' has no real-time provider configured")]
    UnknownProvider { agency: String },

    #[error("real-time service for '{agency}' is unavailable")]
    ProviderUnavailable {
        agency: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("no real-time data for stop {stop_id}")]
    NoRealTimeData { stop_id: String },

    #[error("all {count} stop queries failed")]
    AllProvidersFailed {
        count: usize,
        #[source]
        source: Box<TransitError>,
    },
}

impl TransitError {
    /// Short apologetic line shown to the rider. Never a raw error.
    pub fn user_message(&self) -> String {
        match self {
            TransitError::NoStopsNearby { .. } => {
                "Sorry, I couldn't find any stops near you.".to_string()
            }
            TransitError::UnknownProvider { agency } => format!(
                "Sorry, I don't have live arrival times for {} yet.",
                agency
            ),
            TransitError::ProviderUnavailable { agency, .. } => format!(
                "Sorry, {}'s real-time system seems to be down or the buses aren't running.",
                agency
            ),
            TransitError::NoRealTimeData { .. } => {
                "Sorry, no buses are being tracked at that stop right now.".to_string()
            }
            TransitError::AllProvidersFailed { .. } => {
                "Sorry, I couldn't get arrival times for that stop.".to_string()
            }
        }
    }
}
