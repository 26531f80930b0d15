use pipeline_domain::services::flatten;
use pipeline_domain::{EventPayload, GeoInfo, IncomingEvent, PayloadValue, ProcessedEvent};

use crate::AppState;

pub const SOURCE_URL_KEY: &str = "source_url";
pub const SOURCE_NAME_KEY: &str = "source_name";

/// Builds the flat analytic record for one event.
///
/// The only suspension point is the source attribution lookup; geo lookup
/// and flattening are synchronous. Missing geo data becomes null fields.
pub async fn transform_event(state: &AppState, event: IncomingEvent) -> ProcessedEvent {
    let geo = resolve_geo(state, event.ip_address.as_deref());
    let geo_country = geo
        .country_code
        .as_deref()
        .and_then(|code| state.country_directory.country_name(code));

    let mut payload = event.data;
    if let Some(payload) = payload.as_mut() {
        attach_source_name(state, payload).await;
    }

    ProcessedEvent {
        timestamp: event.timestamp,
        client_timestamp: event.client_timestamp,
        status_code: event.status_code,
        event_type: event.event_type,
        duration_ms: event.duration_ms,
        client_version: event.client_version,
        os_family: event.os_family,
        os_version: event.os_version,
        runtime_version: event.runtime_version,
        geo_coordinates: geo.coordinates().map(|coordinates| coordinates.to_string()),
        geo_country_code: geo.country_code,
        geo_country,
        geo_region: geo.region,
        event_data: flatten(payload.as_ref()),
    }
}

fn resolve_geo(state: &AppState, ip_address: Option<&str>) -> GeoInfo {
    ip_address
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .and_then(|ip| state.geo_resolver.resolve(ip))
        .unwrap_or_default()
}

/// A client-sent `source_name` is replaced in place by the resolved one, so
/// the record never carries two entries for the key.
async fn attach_source_name(state: &AppState, payload: &mut EventPayload) {
    let Some(source_url) = payload.get(SOURCE_URL_KEY) else {
        return;
    };
    let source_name = match source_url.to_flat_string() {
        Some(url) if !url.trim().is_empty() => state.source_names.resolve(url.trim()).await,
        _ => None,
    };
    let value = source_name
        .map(PayloadValue::String)
        .unwrap_or(PayloadValue::Null);
    payload.insert(SOURCE_NAME_KEY, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{state_with, FakeFetcher, RecordingSink};
    use pipeline_domain::EventDataEntry;

    fn event(json: &str) -> IncomingEvent {
        serde_json::from_str(json).expect("event")
    }

    #[tokio::test]
    async fn example_event_is_enriched_and_flattened() {
        let state = state_with(FakeFetcher::named("Foo Foundry"), RecordingSink::accepting());
        let processed = transform_event(
            &state,
            event(
                r#"{"ip_address":"8.8.8.8","timestamp":"2024-05-01T10:00:00Z","event_type":"export",
                    "status_code":200,"data":{"a":1,"source_url":"http://x/y"}}"#,
            ),
        )
        .await;

        assert_eq!(processed.geo_country_code.as_deref(), Some("US"));
        assert_eq!(processed.geo_country.as_deref(), Some("United States"));
        assert_eq!(processed.geo_region.as_deref(), Some("CA"));
        assert_eq!(processed.geo_coordinates.as_deref(), Some("37.751,-97.822"));
        assert_eq!(
            processed.event_data,
            vec![
                EventDataEntry::new("a", Some("1".to_string())),
                EventDataEntry::new("source_url", Some("http://x/y".to_string())),
                EventDataEntry::new("source_name", Some("Foo Foundry".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_address_leaves_geo_fields_null() {
        let state = state_with(FakeFetcher::named("unused"), RecordingSink::accepting());
        let processed = transform_event(
            &state,
            event(
                r#"{"ip_address":"10.0.0.1","timestamp":"2024-05-01T10:00:00Z","event_type":"open"}"#,
            ),
        )
        .await;

        assert!(processed.geo_country_code.is_none());
        assert!(processed.geo_country.is_none());
        assert!(processed.geo_region.is_none());
        assert!(processed.geo_coordinates.is_none());
        assert!(processed.event_data.is_empty());
    }

    #[tokio::test]
    async fn country_code_without_table_entry_has_null_name() {
        let state = state_with(FakeFetcher::named("unused"), RecordingSink::accepting());
        let processed = transform_event(
            &state,
            event(r#"{"ip_address":"1.1.1.1","timestamp":"2024-05-01T10:00:00Z","event_type":"open"}"#),
        )
        .await;

        assert_eq!(processed.geo_country_code.as_deref(), Some("ZZ"));
        assert!(processed.geo_country.is_none());
    }

    #[tokio::test]
    async fn payload_without_source_url_skips_attribution() {
        let fetcher = FakeFetcher::named("Foo Foundry");
        let state = state_with(fetcher.clone(), RecordingSink::accepting());
        let processed = transform_event(
            &state,
            event(
                r#"{"timestamp":"2024-05-01T10:00:00Z","event_type":"open","data":{"b":"x","a":null}}"#,
            ),
        )
        .await;

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(
            processed.event_data,
            vec![
                EventDataEntry::new("b", Some("x".to_string())),
                EventDataEntry::new("a", None),
            ]
        );
    }

    #[tokio::test]
    async fn failed_attribution_yields_null_source_name() {
        let state = state_with(FakeFetcher::failing(), RecordingSink::accepting());
        let processed = transform_event(
            &state,
            event(
                r#"{"timestamp":"2024-05-01T10:00:00Z","event_type":"open","data":{"source_url":"http://x/y"}}"#,
            ),
        )
        .await;

        let entry = processed.data_value("source_name").expect("source_name entry");
        assert_eq!(entry.value, None);
    }

    #[tokio::test]
    async fn resolved_name_replaces_client_source_name_in_place() {
        let state = state_with(FakeFetcher::named("Foo Foundry"), RecordingSink::accepting());
        let processed = transform_event(
            &state,
            event(concat!(
                r#"{"timestamp":"2024-05-01T10:00:00Z","event_type":"open","#,
                r#""data":{"source_name":"spoofed","source_url":"http://x/y","a":1}}"#
            )),
        )
        .await;

        assert_eq!(
            processed.event_data,
            vec![
                EventDataEntry::new("source_name", Some("Foo Foundry".to_string())),
                EventDataEntry::new("source_url", Some("http://x/y".to_string())),
                EventDataEntry::new("a", Some("1".to_string())),
            ]
        );
    }
}
