use crate::error::TransitError;
use crate::structs::*;
use crate::time;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

//////////////////////////////////////////////////////////
// Provider adapters
//////////////////////////////////////////////////////////

/// One upstream real-time API, queried for a single stop per call.
/// No retries: every failure is terminal for that call.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn fetch_arrivals(&self, provider_stop_id: &str)
        -> Result<Vec<ArrivalBatch>, TransitError>;
}

//////////////////////////////////////////////////////////
// GRT
//////////////////////////////////////////////////////////

// GRT folds the per-stop real-time fields directly onto each bus object
// these days (the nested stopDetails list is gone), so a bus entry is
// its own sole arrival record.
#[derive(Debug, Deserialize)]
struct GrtResponse {
    #[serde(default)]
    data: Option<Vec<GrtBus>>,
}

#[derive(Debug, Deserialize)]
struct GrtBus {
    #[serde(default)]
    name: String,
    #[serde(rename = "hasRealTime", default)]
    has_real_time: bool,
    /// Seconds since midnight.
    #[serde(default)]
    departure: Option<u32>,
}

pub struct GrtAdapter {
    client: reqwest::Client,
    base_url: String,
    agency: String,
}

impl GrtAdapter {
    pub fn new(client: reqwest::Client, base_url: String, agency: String) -> Self {
        GrtAdapter {
            client,
            base_url,
            agency,
        }
    }

    fn unavailable(&self, source: Option<reqwest::Error>) -> TransitError {
        TransitError::ProviderUnavailable {
            agency: self.agency.clone(),
            source,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GrtAdapter {
    async fn fetch_arrivals(
        &self,
        provider_stop_id: &str,
    ) -> Result<Vec<ArrivalBatch>, TransitError> {
        let url = format!("{}?stop={}", self.base_url, provider_stop_id);
        log::debug!("GRT request: {}", url);

        let body = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.unavailable(Some(e)))?
            .text()
            .await
            .map_err(|e| self.unavailable(Some(e)))?;

        // A missing or non-array `data` field means the agency's
        // real-time system is down, not that no buses are due.
        let response: GrtResponse =
            serde_json::from_str(&body).map_err(|_| self.unavailable(None))?;
        let buses = match response.data {
            Some(buses) => buses,
            None => return Err(self.unavailable(None)),
        };

        let mut batches = Vec::new();
        for bus in buses {
            // Schedule-only entries are dropped silently.
            let departure = match (bus.has_real_time, bus.departure) {
                (true, Some(departure)) => departure,
                _ => continue,
            };
            batches.push(ArrivalBatch {
                route: bus.name,
                arrivals: vec![time::clock_from_daily_seconds(departure)],
                has_real_time: true,
            });
        }

        if batches.is_empty() {
            return Err(TransitError::NoRealTimeData {
                stop_id: provider_stop_id.to_string(),
            });
        }
        Ok(batches)
    }
}

//////////////////////////////////////////////////////////
// NextBus-compatible REST
//////////////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
struct NextBusPrediction {
    route: NextBusRoute,
    #[serde(default)]
    values: Vec<NextBusValue>,
}

#[derive(Debug, Deserialize)]
struct NextBusRoute {
    title: String,
}

#[derive(Debug, Deserialize)]
struct NextBusValue {
    /// Seconds until arrival.
    seconds: u32,
}

pub struct NextBusAdapter {
    client: reqwest::Client,
    base_url: String,
    agency: String,
    provider_agency_id: String,
    rewrite: StopIdRewrite,
}

impl NextBusAdapter {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        agency: String,
        provider_agency_id: String,
        rewrite: StopIdRewrite,
    ) -> Self {
        NextBusAdapter {
            client,
            base_url,
            agency,
            provider_agency_id,
            rewrite,
        }
    }

    fn unavailable(&self, source: Option<reqwest::Error>) -> TransitError {
        TransitError::ProviderUnavailable {
            agency: self.agency.clone(),
            source,
        }
    }
}

#[async_trait]
impl ProviderAdapter for NextBusAdapter {
    async fn fetch_arrivals(
        &self,
        provider_stop_id: &str,
    ) -> Result<Vec<ArrivalBatch>, TransitError> {
        let stop_id = self.rewrite.apply(provider_stop_id);
        let url = format!(
            "{}/agencies/{}/stops/{}/predictions",
            self.base_url, self.provider_agency_id, stop_id
        );
        log::debug!("NextBus request: {}", url);

        let body = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.unavailable(Some(e)))?
            .text()
            .await
            .map_err(|e| self.unavailable(Some(e)))?;

        let predictions: Vec<NextBusPrediction> =
            serde_json::from_str(&body).map_err(|_| self.unavailable(None))?;

        let batches: Vec<ArrivalBatch> = predictions
            .into_iter()
            .filter(|p| !p.values.is_empty())
            .map(|p| ArrivalBatch {
                route: p.route.title,
                arrivals: p
                    .values
                    .iter()
                    .map(|v| time::countdown_phrase(v.seconds))
                    .collect(),
                has_real_time: true,
            })
            .collect();

        if batches.is_empty() {
            return Err(TransitError::NoRealTimeData {
                stop_id: provider_stop_id.to_string(),
            });
        }
        Ok(batches)
    }
}

//////////////////////////////////////////////////////////
// Router
//////////////////////////////////////////////////////////

/// Maps a stop's agency to the adapter that can query it. Pure: holds
/// endpoint config and a shared HTTP client, nothing else.
#[derive(Clone, Debug)]
pub struct ProviderRouter {
    client: reqwest::Client,
    grt_base_url: String,
    nextbus_base_url: String,
}

impl ProviderRouter {
    pub fn new(grt_base_url: String, nextbus_base_url: String) -> Self {
        ProviderRouter {
            client: reqwest::Client::new(),
            grt_base_url,
            nextbus_base_url,
        }
    }

    pub fn resolve(&self, agency: &AgencyRef) -> Result<Box<dyn ProviderAdapter>, TransitError> {
        match agency.kind {
            ProviderKind::GrtCustom => Ok(Box::new(GrtAdapter::new(
                self.client.clone(),
                self.grt_base_url.clone(),
                agency.name.clone(),
            ))),
            ProviderKind::NextBusRest => Ok(Box::new(NextBusAdapter::new(
                self.client.clone(),
                self.nextbus_base_url.clone(),
                agency.name.clone(),
                agency.provider_agency_id.clone(),
                crate::config::nextbus_id_rewrite(&agency.provider_agency_id),
            ))),
            ProviderKind::None => Err(TransitError::UnknownProvider {
                agency: agency.name.clone(),
            }),
        }
    }
}

//////////////////////////////////////////////////////////
// Aggregation
//////////////////////////////////////////////////////////

/// Query every stop of a merged choice and flatten the results into
/// display lines, one block per route. Stops are queried concurrently
/// but the output keeps the input stop order. A single stop failing is
/// only an error when no sibling succeeded.
pub async fn aggregate_arrivals(
    router: &ProviderRouter,
    stops: &[Stop],
) -> Result<Vec<String>, TransitError> {
    let results = join_all(stops.iter().map(|stop| fetch_for_stop(router, stop))).await;

    let mut lines = Vec::new();
    let mut failures = Vec::new();
    for (stop, result) in stops.iter().zip(results) {
        match result {
            Ok(batches) => {
                for batch in &batches {
                    lines.push(render_batch(batch));
                }
            }
            Err(e) => {
                log::warn!("Arrival query for stop {} failed: {}", stop.id, e);
                failures.push(e);
            }
        }
    }

    if lines.is_empty() {
        if let Some(first) = failures.into_iter().next() {
            return Err(TransitError::AllProvidersFailed {
                count: stops.len(),
                source: Box::new(first),
            });
        }
    }
    Ok(lines)
}

async fn fetch_for_stop(
    router: &ProviderRouter,
    stop: &Stop,
) -> Result<Vec<ArrivalBatch>, TransitError> {
    let adapter = router.resolve(&stop.agency)?;
    adapter.fetch_arrivals(&stop.localid).await
}

/// Route label on its own line, then its arrivals.
fn render_batch(batch: &ArrivalBatch) -> String {
    format!("{}\n{}", batch.route, batch.arrivals.join("\n"))
}
