//! Job selection: one unit of work per record still missing a field.
use crate::store::{Coordinates, MissingField, RecordStore};
use crate::util::truncate_chars;

/// Characters of a record's name kept in log lines.
const LABEL_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum JobInput {
    /// Single-line address sent to the geocoder.
    Address(String),
    /// Position sent to the reverse geocoder.
    Coordinates(Coordinates),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Position of the record in the store.
    pub index: usize,
    pub field: MissingField,
    /// Truncated record name for log context.
    pub label: String,
    pub input: JobInput,
}

/// Select the jobs for `fields`, in field order then store order.
///
/// Selection only reads the store, so rerunning it after a partial run picks
/// up exactly the records that are still missing data. A record missing
/// coordinates is never also missing its address (reverse needs coordinates),
/// so no record receives two jobs.
pub fn build_jobs(store: &RecordStore, fields: &[MissingField]) -> Vec<Job> {
    let mut jobs = Vec::new();
    for &field in fields {
        for (index, record) in store.records_missing(field) {
            let input = match field {
                MissingField::Coordinates => JobInput::Address(record.geocode_query()),
                MissingField::Address => match record.coordinates() {
                    Some(coordinates) => JobInput::Coordinates(coordinates),
                    None => continue,
                },
            };
            jobs.push(Job {
                index,
                field,
                label: truncate_chars(&record.name, LABEL_CHARS),
                input,
            });
        }
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GeoBounds, Record};

    fn store(records: Vec<Record>) -> RecordStore {
        RecordStore::from_records(records, &GeoBounds::TAIWAN)
            .expect("build store")
            .0
    }

    fn located(name: &str, address: &str) -> Record {
        let mut record = Record::new(name, "park");
        record.address = address.to_string();
        record.set_coordinates(Coordinates::new(25.0, 121.5));
        record
    }

    #[test]
    fn both_directions_never_double_book_a_record() {
        let mut bare = Record::new("Bare", "park");
        bare.address = String::new();
        let store = store(vec![
            bare,
            located("Has both", "中正路1號"),
            located("No address", ""),
        ]);

        let jobs = build_jobs(&store, &[MissingField::Coordinates, MissingField::Address]);
        let indexes: Vec<(usize, MissingField)> =
            jobs.iter().map(|job| (job.index, job.field)).collect();
        assert_eq!(
            indexes,
            vec![(0, MissingField::Coordinates), (2, MissingField::Address)]
        );
        assert_eq!(
            jobs[1].input,
            JobInput::Coordinates(Coordinates::new(25.0, 121.5))
        );
    }

    #[test]
    fn geocode_input_carries_city_and_district() {
        let mut record = Record::new("Park", "park");
        record.address = "中央北路四段".to_string();
        record.city = Some("臺北市".to_string());
        record.district = Some("北投區".to_string());
        let store = store(vec![record]);

        let jobs = build_jobs(&store, &[MissingField::Coordinates]);
        assert_eq!(
            jobs[0].input,
            JobInput::Address("臺北市北投區中央北路四段".to_string())
        );
    }

    #[test]
    fn labels_are_truncated() {
        let long_name = "公".repeat(40);
        let store = store(vec![Record::new(long_name, "park")]);
        let jobs = build_jobs(&store, &[MissingField::Coordinates]);
        assert_eq!(jobs[0].label.chars().count(), LABEL_CHARS + 1);
    }
}
