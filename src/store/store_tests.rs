use super::*;
use serde_json::json;

fn record(id: &str, name: &str) -> Record {
    let mut record = Record::new(name, "test");
    record.source_id = id.to_string();
    record
}

fn located(id: &str, latitude: f64, longitude: f64) -> Record {
    let mut record = record(id, id);
    record.set_coordinates(Coordinates::new(latitude, longitude));
    record
}

#[test]
fn round_trips_through_snapshot_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("places.json");

    let mut first = located("a", 25.0, 121.5);
    first.address = "忠孝東路一段1號".to_string();
    first.city = Some("臺北市".to_string());
    first.district = Some("中正區".to_string());
    first.link = Some("https://example.org/a".to_string());
    first
        .metadata
        .insert("originalAddress".to_string(), json!("臺北市中正區忠孝東路一段1號"));
    first.extra.insert("opening_hours".to_string(), json!("09:00-17:00"));
    let second = record("b", "B");

    let (store, _) = RecordStore::from_records(vec![first, second], &GeoBounds::TAIWAN)
        .expect("build store");
    store.save(&path).expect("save snapshot");

    let (reloaded, stats) = RecordStore::load(&path, &GeoBounds::TAIWAN).expect("reload");
    assert_eq!(stats.records, 2);
    assert_eq!(stats.duplicates, 0);
    for original in store.records() {
        let copy = reloaded
            .records()
            .iter()
            .find(|candidate| candidate.source_id == original.source_id)
            .expect("record survives round trip");
        assert_eq!(copy, original);
    }

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read file"))
            .expect("parse file");
    assert_eq!(raw["totalCount"], json!(2));
    assert_eq!(raw["data"][0]["sourceId"], json!("a"));
    assert_eq!(raw["data"][0]["opening_hours"], json!("09:00-17:00"));
}

#[test]
fn reads_legacy_snapshot_keys() {
    let text = r#"{
        "total_count": 1,
        "data": [
            {"name": "哺集乳室", "address": null, "latitude": null, "longitude": null,
             "type": "依法設置哺集乳室", "source": "nursing"}
        ]
    }"#;
    let snapshot: Snapshot = serde_json::from_str(text).expect("parse legacy snapshot");
    assert_eq!(snapshot.total_count, 1);
    let record = &snapshot.data[0];
    assert_eq!(record.address, "");
    assert_eq!(record.source_type, "nursing");
    assert_eq!(record.extra.get("type"), Some(&json!("依法設置哺集乳室")));
}

#[test]
fn load_derives_missing_ids_and_folds_duplicates() {
    let mut a = Record::new("Park", "parks");
    a.address = "中山路 1 號".to_string();
    let mut b = Record::new("Park", "parks");
    b.address = "中山路  1 號".to_string();
    b.set_coordinates(Coordinates::new(24.1, 120.6));

    let (store, stats) =
        RecordStore::from_records(vec![a, b], &GeoBounds::TAIWAN).expect("build store");
    assert_eq!(store.total_count(), 1);
    assert_eq!(stats.derived_ids, 2);
    assert_eq!(stats.duplicates, 1);
    let kept = store.get(0).expect("first record kept");
    assert_eq!(kept.source_id, "parks_Park_中山路 1 號");
    assert_eq!(kept.address, "中山路 1 號");
    assert_eq!(kept.coordinates(), Some(Coordinates::new(24.1, 120.6)));
}

#[test]
fn load_drops_out_of_bounds_and_partial_pairs() {
    let outside = located("outside", 35.0, 139.0);
    let mut partial = record("partial", "P");
    partial.latitude = Some(25.0);
    let inside = located("inside", 23.5, 121.0);

    let (store, stats) = RecordStore::from_records(vec![outside, partial, inside], &GeoBounds::TAIWAN)
        .expect("build store");
    assert_eq!(stats.dropped_coordinates, 2);
    assert_eq!(store.get(0).and_then(Record::coordinates), None);
    assert_eq!(store.get(1).map(|r| (r.latitude, r.longitude)), Some((None, None)));
    assert!(store.get(2).and_then(Record::coordinates).is_some());
}

#[test]
fn malformed_coordinates_load_as_absent() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("places.json");
    let text = r#"{
        "totalCount": 4,
        "data": [
            {"name": "Text", "sourceId": "t", "latitude": "25.0", "longitude": " 121.5 "},
            {"name": "Junk", "sourceId": "j", "latitude": "N/A", "longitude": 121.5},
            {"name": "Shape", "sourceId": "s", "latitude": [25.0], "longitude": {"v": 1}},
            {"name": "Fine", "sourceId": "f", "latitude": 23.5, "longitude": 121.0}
        ]
    }"#;
    std::fs::write(&path, text).expect("write snapshot");

    let (store, stats) = RecordStore::load(&path, &GeoBounds::TAIWAN).expect("load");
    assert_eq!(stats.records, 4);
    assert_eq!(
        store.get(0).and_then(Record::coordinates),
        Some(Coordinates::new(25.0, 121.5))
    );
    assert_eq!(store.get(1).map(|r| (r.latitude, r.longitude)), Some((None, None)));
    assert_eq!(store.get(2).map(|r| (r.latitude, r.longitude)), Some((None, None)));
    assert!(store.get(3).and_then(Record::coordinates).is_some());
    assert_eq!(stats.dropped_coordinates, 1);
}

#[test]
fn load_canonicalizes_city_and_district() {
    let mut spelled = record("a", "A");
    spelled.city = Some(" 台北市 ".to_string());
    spelled.district = Some("大安區".to_string());
    let mut blank = record("b", "B");
    blank.city = Some("  ".to_string());
    blank.district = Some(String::new());
    let mut taitung = record("c", "C");
    taitung.city = Some("台東縣".to_string());
    taitung.district = Some("台東市".to_string());

    let (store, _) = RecordStore::from_records(vec![spelled, blank, taitung], &GeoBounds::TAIWAN)
        .expect("build store");
    let first = store.get(0).expect("first");
    assert_eq!(first.city.as_deref(), Some("臺北市"));
    assert_eq!(first.district.as_deref(), Some("大安區"));
    let second = store.get(1).expect("second");
    assert_eq!((second.city.as_deref(), second.district.as_deref()), (None, None));
    let third = store.get(2).expect("third");
    assert_eq!(third.city.as_deref(), Some("臺東縣"));
    assert_eq!(third.district.as_deref(), Some("臺東市"));
    assert_eq!(store.snapshot().data[0].city.as_deref(), Some("臺北市"));
}

#[test]
fn empty_name_is_a_load_error() {
    let err = RecordStore::from_records(vec![record("x", "  ")], &GeoBounds::TAIWAN)
        .expect_err("blank name rejected");
    assert!(err.to_string().contains("position 0"));
}

#[test]
fn records_missing_is_restartable_and_direction_aware() {
    let no_coordinates = record("a", "A");
    let mut no_address = located("b", 25.0, 121.5);
    no_address.address = "   ".to_string();
    let mut complete = located("c", 25.0, 121.5);
    complete.address = "somewhere".to_string();

    let (store, _) = RecordStore::from_records(
        vec![no_coordinates, no_address, complete],
        &GeoBounds::TAIWAN,
    )
    .expect("build store");

    let coordinates: Vec<usize> = store
        .records_missing(MissingField::Coordinates)
        .map(|(index, _)| index)
        .collect();
    let again: Vec<usize> = store
        .records_missing(MissingField::Coordinates)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(coordinates, vec![0]);
    assert_eq!(coordinates, again);

    let addresses: Vec<usize> = store
        .records_missing(MissingField::Address)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(addresses, vec![1]);
}

#[test]
fn update_rejects_identity_change_and_half_pairs() {
    let (mut store, _) =
        RecordStore::from_records(vec![record("a", "A")], &GeoBounds::TAIWAN).expect("build");

    let mut renamed = store.get(0).cloned().expect("record");
    renamed.source_id = "other".to_string();
    assert!(store.update(0, renamed).is_err());

    let mut half = store.get(0).cloned().expect("record");
    half.longitude = Some(121.0);
    assert!(store.update(0, half).is_err());

    assert!(store.update(7, record("a", "A")).is_err());

    let mut filled = store.get(0).cloned().expect("record");
    filled.set_coordinates(Coordinates::new(25.0, 121.0));
    store.update(0, filled).expect("valid update");
    assert_eq!(store.records_missing(MissingField::Coordinates).count(), 0);
}

#[test]
fn upsert_fills_gaps_without_overwriting() {
    let mut existing = record("a", "A");
    existing.address = "原地址".to_string();
    let mut store = RecordStore::new();
    assert_eq!(store.upsert(existing), Upsert::Inserted);

    let mut incoming = located("a", 22.6, 120.3);
    incoming.address = "新地址".to_string();
    assert_eq!(store.upsert(incoming.clone()), Upsert::Merged);
    assert_eq!(store.upsert(incoming), Upsert::Unchanged);

    let kept = store.get(0).expect("record");
    assert_eq!(kept.address, "原地址");
    assert_eq!(kept.coordinates(), Some(Coordinates::new(22.6, 120.3)));
}

#[test]
fn geocode_query_restores_parsed_prefix() {
    let mut record = record("a", "A");
    record.address = "忠孝東路一段1號".to_string();
    record.city = Some("臺北市".to_string());
    record.district = Some("中正區".to_string());
    assert_eq!(record.geocode_query(), "臺北市中正區忠孝東路一段1號");

    record.address = "臺北市中正區忠孝東路一段1號".to_string();
    assert_eq!(record.geocode_query(), "臺北市中正區忠孝東路一段1號");

    record.address.clear();
    record.city = None;
    record.district = None;
    assert_eq!(record.geocode_query(), "");
}
