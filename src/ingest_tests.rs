use super::{ingest_places, normalize_place, GridZone, IngestOptions, RawPlace, Rejection};
use crate::store::{GeoBounds, RecordStore};
use serde_json::json;

fn options() -> IngestOptions {
    IngestOptions {
        source_type: "park".to_string(),
        fallback_city: None,
        grid: GridZone::Central121,
        bounds: GeoBounds::TAIWAN,
    }
}

fn place(value: serde_json::Value) -> RawPlace {
    serde_json::from_value(value).expect("deserialize raw place")
}

#[test]
fn splits_address_and_parses_text_coordinates() {
    let raw = place(json!({
        "name": " 北投公園 ",
        "address": "台北市北投區中山路1號",
        "latitude": "25.1365",
        "longitude": " 121.5066 "
    }));
    let (record, projected) = normalize_place(raw, &options()).expect("normalized");

    assert!(!projected);
    assert_eq!(record.name, "北投公園");
    assert_eq!(record.city.as_deref(), Some("臺北市"));
    assert_eq!(record.district.as_deref(), Some("北投區"));
    assert_eq!(record.address, "中山路1號");
    assert_eq!(record.latitude, Some(25.1365));
    assert_eq!(record.longitude, Some(121.5066));
    assert_eq!(
        record.metadata.get("originalAddress"),
        Some(&json!("台北市北投區中山路1號"))
    );
    assert_eq!(record.source_id, "park_北投公園_台北市北投區中山路1號");
}

#[test]
fn projects_grid_coordinates() {
    let raw = place(json!({"name": "Grid", "X坐標": "304000", "Y坐標": 2770000}));
    let (record, projected) = normalize_place(raw, &options()).expect("normalized");

    assert!(projected);
    let coordinates = record.coordinates().expect("projected coordinates");
    assert!((coordinates.latitude - 25.037_158_140_978_764).abs() < 1e-6);
    assert!((coordinates.longitude - 121.535_127_320_277_91).abs() < 1e-6);
}

#[test]
fn grid_zone_selects_central_meridian() {
    let raw = place(json!({"name": "Penghu", "x": 250000.0, "y": 2608000.0}));
    let mut opts = options();
    opts.grid = GridZone::Central119;
    let (record, _) = normalize_place(raw, &opts).expect("normalized");

    let coordinates = record.coordinates().expect("projected coordinates");
    assert!((coordinates.longitude - 119.0).abs() < 1e-9);
    assert!(coordinates.latitude > 23.0 && coordinates.latitude < 24.0);
}

#[test]
fn geographic_pair_wins_over_grid() {
    let raw = place(json!({
        "name": "Both",
        "lat": 24.0, "lng": 121.0,
        "x": 304000, "y": 2770000
    }));
    let (record, projected) = normalize_place(raw, &options()).expect("normalized");
    assert!(!projected);
    assert_eq!(record.latitude, Some(24.0));
}

#[test]
fn invalid_coordinates_become_absent() {
    for raw in [
        json!({"name": "Zero", "latitude": 0, "longitude": 0}),
        json!({"name": "Text", "latitude": "N/A", "longitude": "121.5"}),
        json!({"name": "Half", "latitude": 25.0}),
        json!({"name": "Grid zero", "x": 0, "y": 0}),
    ] {
        let (record, _) = normalize_place(place(raw), &options()).expect("normalized");
        assert_eq!(record.latitude, None, "{}", record.name);
        assert_eq!(record.longitude, None, "{}", record.name);
    }
}

#[test]
fn missing_name_is_rejected() {
    assert_eq!(
        normalize_place(place(json!({"address": "臺北市"})), &options()).map(|_| ()),
        Err(Rejection::MissingName)
    );
    assert_eq!(
        normalize_place(place(json!({"name": "  "})), &options()).map(|_| ()),
        Err(Rejection::MissingName)
    );
}

#[test]
fn fallbacks_fill_city_and_bare_district() {
    let raw = place(json!({"name": "Corner", "address": "中山路1號", "district": "北投"}));
    let mut opts = options();
    opts.fallback_city = Some("臺北市".to_string());
    let (record, _) = normalize_place(raw, &opts).expect("normalized");

    assert_eq!(record.city.as_deref(), Some("臺北市"));
    assert_eq!(record.district.as_deref(), Some("北投區"));
    assert_eq!(record.address, "中山路1號");
    assert!(record.metadata.get("originalAddress").is_none());
}

#[test]
fn keeps_source_fields_and_unknown_keys() {
    let raw = place(json!({
        "name": "Kept",
        "source": "playground",
        "sourceId": "tp-42",
        "link": "https://example.org/p/42",
        "image": "p42.png",
        "metadata": {"facilities": ["slide"]}
    }));
    let (record, _) = normalize_place(raw, &options()).expect("normalized");

    assert_eq!(record.source_type, "playground");
    assert_eq!(record.source_id, "tp-42");
    assert_eq!(record.link.as_deref(), Some("https://example.org/p/42"));
    assert_eq!(record.extra.get("image"), Some(&json!("p42.png")));
    assert_eq!(record.metadata.get("facilities"), Some(&json!(["slide"])));
}

#[test]
fn repeated_batches_upsert_by_source_id() {
    let batch = || {
        vec![
            place(json!({"name": "A", "sourceId": "a"})),
            place(json!({"name": "B", "sourceId": "b", "lat": "23.5", "lng": "120.5"})),
            place(json!({"address": "no name"})),
        ]
    };
    let mut store = RecordStore::new();

    let first = ingest_places(&mut store, batch(), &options());
    assert_eq!(
        (first.read, first.inserted, first.rejected, first.without_coordinates),
        (3, 2, 1, 1)
    );

    let second = ingest_places(&mut store, batch(), &options());
    assert_eq!((second.inserted, second.unchanged), (0, 2));

    let update = vec![place(json!({"name": "A", "sourceId": "a", "lat": 24.1, "lng": 120.7}))];
    let third = ingest_places(&mut store, update, &options());
    assert_eq!(third.merged, 1);
    assert_eq!(store.total_count(), 2);
    assert_eq!(store.records()[0].latitude, Some(24.1));
}
