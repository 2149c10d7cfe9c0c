//! Merge per-location data from the independent keyspaces.
//!
//! Keyspaces are read independently of one another; an `all` response may
//! combine a METAR and a TAF from different ingestion cycles.

use serde::Serialize;
use std::slice;

use storage::{ReportKind, WeatherStore};
use wx_common::{LocationRecord, LocationView, WxError, WxResult};

use crate::dispatch::{ApiRequest, Endpoint, Selector};

/// Response body of a data request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Aggregated {
    Single(LocationView),
    Batch(Vec<LocationView>),
}

/// Resolve a request into location views.
///
/// A single location with no data is reported as not found only when the
/// location is unknown; a known location without current reports yields a
/// view with just the code. Batch requests silently drop locations without
/// data and keep the request order.
pub async fn aggregate(store: &dyn WeatherStore, request: &ApiRequest) -> WxResult<Aggregated> {
    match &request.selector {
        Selector::Single(code) => {
            let views = fetch_views(store, request.endpoint, slice::from_ref(code)).await?;
            if let Some(view) = views.into_iter().flatten().next() {
                return Ok(Aggregated::Single(view));
            }
            if store.exists(code).await? {
                Ok(Aggregated::Single(LocationView::code_only(code.clone())))
            } else {
                Err(WxError::LocationNotFound(code.clone()))
            }
        }
        Selector::Batch(codes) => {
            let views = fetch_views(store, request.endpoint, codes).await?;
            Ok(Aggregated::Batch(views.into_iter().flatten().collect()))
        }
    }
}

/// One entry per code, `None` where the endpoint has no data for it.
async fn fetch_views(
    store: &dyn WeatherStore,
    endpoint: Endpoint,
    codes: &[String],
) -> WxResult<Vec<Option<LocationView>>> {
    match endpoint {
        Endpoint::Metar => report_views(store, ReportKind::Metar, codes).await,
        Endpoint::Taf => report_views(store, ReportKind::Taf, codes).await,
        Endpoint::Location => {
            let records = store.batch_get_locations(codes).await?;
            check_aligned(codes, records.len())?;
            Ok(records.iter().map(|r| r.as_ref().map(LocationView::from)).collect())
        }
        Endpoint::All => {
            let (records, metars, tafs) = tokio::try_join!(
                store.batch_get_locations(codes),
                store.batch_get(ReportKind::Metar, codes),
                store.batch_get(ReportKind::Taf, codes),
            )?;
            check_aligned(codes, records.len())?;
            check_aligned(codes, metars.len())?;
            check_aligned(codes, tafs.len())?;

            Ok(codes
                .iter()
                .zip(records)
                .zip(metars.into_iter().zip(tafs))
                .map(|((code, record), (metar, taf))| merge(code, record, metar, taf))
                .collect())
        }
    }
}

async fn report_views(
    store: &dyn WeatherStore,
    kind: ReportKind,
    codes: &[String],
) -> WxResult<Vec<Option<LocationView>>> {
    let values = store.batch_get(kind, codes).await?;
    check_aligned(codes, values.len())?;

    Ok(codes
        .iter()
        .zip(values)
        .map(|(code, text)| {
            if text.is_empty() {
                return None;
            }
            let mut view = LocationView::code_only(code.clone());
            match kind {
                ReportKind::Metar => view.metar = text,
                ReportKind::Taf => view.taf = text,
            }
            Some(view)
        })
        .collect())
}

fn merge(
    code: &str,
    record: Option<LocationRecord>,
    metar: String,
    taf: String,
) -> Option<LocationView> {
    if record.is_none() && metar.is_empty() && taf.is_empty() {
        return None;
    }
    let mut view = match &record {
        Some(record) => LocationView::from(record),
        None => LocationView::code_only(code),
    };
    view.metar = metar;
    view.taf = taf;
    Some(view)
}

fn check_aligned(codes: &[String], got: usize) -> WxResult<()> {
    if got == codes.len() {
        Ok(())
    } else {
        Err(WxError::InternalError(format!(
            "Inconsistent data for locations {:?}: {} values returned",
            codes, got
        )))
    }
}
