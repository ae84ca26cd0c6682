//! Cloudflare live tests.
//!
//! Run with:
//! ```bash
//! CLOUDFLARE_API_TOKEN=xxx TEST_DOMAIN=example.com \
//!     cargo test -p happydomain-provider --test cloudflare_test -- --ignored --test-threads=1
//! ```

#![cfg(feature = "cloudflare")]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use std::sync::Arc;

use common::{txt_record, unique_label};
use happydomain_provider::{DnsProvider, ProviderTypeRegistry, get_zone_corrections, normalize};

fn provider() -> Arc<dyn DnsProvider> {
    let token = std::env::var("CLOUDFLARE_API_TOKEN").expect("token");
    ProviderTypeRegistry::with_builtin_providers()
        .build("cloudflare", &serde_json::json!({ "apiToken": token }))
        .expect("cloudflare provider")
}

#[tokio::test]
#[ignore]
async fn validate_and_list() {
    skip_if_no_credentials!("CLOUDFLARE_API_TOKEN", "TEST_DOMAIN");
    let provider = provider();
    assert!(require_ok!(provider.validate_credentials().await));

    let zone = normalize(&std::env::var("TEST_DOMAIN").unwrap());
    let zones = require_ok!(provider.list_zones().await);
    assert!(zones.contains(&zone), "{zone} not in {zones:?}");
}

#[tokio::test]
#[ignore]
async fn create_then_delete_txt() {
    skip_if_no_credentials!("CLOUDFLARE_API_TOKEN", "TEST_DOMAIN");
    let provider = provider();
    let zone = normalize(&std::env::var("TEST_DOMAIN").unwrap());
    let owner = format!("{}.{zone}", unique_label());

    let mut desired = require_ok!(provider.get_zone_records(&zone).await);
    desired.push(txt_record(&owner, 300, "happydomain live test"));
    let corrections = require_ok!(get_zone_corrections(&provider, &zone, &desired).await);
    assert_eq!(corrections.len(), 1, "{corrections:?}");
    for c in corrections {
        require_ok!(c.apply().await);
    }

    desired.pop();
    for c in require_ok!(get_zone_corrections(&provider, &zone, &desired).await) {
        require_ok!(c.apply().await);
    }
}
