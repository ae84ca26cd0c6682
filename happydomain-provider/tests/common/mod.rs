//! Shared helpers for backend integration tests.

#![allow(dead_code)]

use std::net::Ipv4Addr;

use happydomain_provider::{Record, RecordData};

/// Skip a live test when an environment variable is missing.
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("skipping: {} is not set", $var);
                return;
            }
        )+
    };
}

/// Assert `Ok` and unwrap, failing the test with the error otherwise.
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Unique owner label so concurrent runs do not collide.
pub fn unique_label() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("_test-{}", &uuid.to_string()[..8])
}

pub fn a_record(name: &str, ttl: u32, last_octet: u8) -> Record {
    Record::new(
        name,
        ttl,
        RecordData::A {
            address: Ipv4Addr::new(192, 0, 2, last_octet),
        },
    )
}

pub fn txt_record(name: &str, ttl: u32, text: &str) -> Record {
    Record::new(name, ttl, RecordData::txt(text))
}
