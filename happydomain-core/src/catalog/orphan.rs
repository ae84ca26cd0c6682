//! Fallback for records no analyzer recognized.

use happydomain_provider::{Record, RecordClass, RecordData};
use serde::{Deserialize, Serialize};

use super::{ORPHAN, ServiceBody, ServiceSpec, pick_ttl};

/// Exactly one record, kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orphan {
    #[serde(default)]
    pub class: RecordClass,
    #[serde(default)]
    pub ttl: u32,
    pub record: RecordData,
}

impl Orphan {
    pub fn from_record(record: &Record) -> Self {
        Self {
            class: record.class,
            ttl: record.ttl,
            record: record.data.clone(),
        }
    }
}

impl ServiceBody for Orphan {
    fn records(&self, subdomain: &str, ttl: u32, origin: &str) -> Vec<Record> {
        let mut record = Record::new(
            happydomain_provider::name::absolute_name(subdomain, origin),
            pick_ttl(self.ttl, ttl),
            self.record.clone(),
        );
        record.class = self.class;
        vec![record.normalized(origin)]
    }

    fn nb_resources(&self) -> usize {
        1
    }

    fn comment(&self) -> String {
        format!("{} {}", self.record.rtype(), self.record.to_presentation())
    }
}

pub(super) fn orphan_spec() -> ServiceSpec {
    ServiceSpec::new::<Orphan>(ORPHAN, "Orphan record", "Record without a dedicated service")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_class_and_data() {
        let record = Record {
            name: "version.bind.".into(),
            class: RecordClass::CH,
            ttl: 0,
            data: RecordData::txt("9.18"),
        };
        let orphan = Orphan::from_record(&record);
        let out = orphan.records("version", 60, "bind.");
        assert_eq!(out[0].class, RecordClass::CH);
        assert_eq!(out[0].ttl, 60);
        assert_eq!(orphan.comment(), "TXT \"9.18\"");
    }

    #[test]
    fn payload_shape() {
        let orphan = Orphan {
            class: RecordClass::IN,
            ttl: 300,
            record: RecordData::Other {
                rtype: "HINFO".into(),
                rdata: "\"PC\" \"Linux\"".into(),
            },
        };
        let json = serde_json::to_value(&orphan).unwrap();
        assert_eq!(json["record"]["type"], "Other");
        let back: Orphan = serde_json::from_value(json).unwrap();
        assert_eq!(back, orphan);
    }
}
