//! Corrections: described, content-addressed, optionally executable changes.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};

use crate::diff::{ChangeKind, diff_records};
use crate::error::Result;
use crate::name::normalize;
use crate::record::Record;
use crate::traits::DnsProvider;

/// Kind of a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionKind {
    Addition,
    Update,
    Deletion,
    /// Informational: nothing will be sent to the provider.
    Other,
}

impl From<ChangeKind> for CorrectionKind {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Addition => Self::Addition,
            ChangeKind::Update => Self::Update,
            ChangeKind::Deletion => Self::Deletion,
        }
    }
}

/// A correction as shown to the user.
///
/// The id is the hex SHA-224 of the message, so the same change computed in
/// two different requests carries the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub id: String,
    pub msg: String,
    pub kind: CorrectionKind,
}

impl Correction {
    pub fn new(msg: impl Into<String>, kind: CorrectionKind) -> Self {
        let msg = msg.into();
        Self {
            id: correction_id(&msg),
            msg,
            kind,
        }
    }
}

/// Hex SHA-224 of a correction message.
pub fn correction_id(msg: &str) -> String {
    hex::encode(Sha224::digest(msg.as_bytes()))
}

/// Deferred provider call carried by an [`FCorrection`].
pub type CorrectionAction = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// A correction bound to a live provider session.
///
/// The action is consumed on [`apply`](Self::apply); re-applying means asking
/// the provider for fresh corrections.
pub struct FCorrection {
    pub correction: Correction,
    action: Option<CorrectionAction>,
}

impl FCorrection {
    pub fn new(correction: Correction, action: CorrectionAction) -> Self {
        Self {
            correction,
            action: Some(action),
        }
    }

    /// Correction without any remote effect.
    pub fn informational(correction: Correction) -> Self {
        Self {
            correction,
            action: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.correction.id
    }

    pub fn msg(&self) -> &str {
        &self.correction.msg
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Run the action. A correction without action succeeds immediately.
    pub async fn apply(self) -> Result<()> {
        match self.action {
            Some(action) => action().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FCorrection")
            .field("correction", &self.correction)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// Compute the corrections turning `zone`'s live content into `desired`.
///
/// Live records are read from the provider; each actionable change is bound
/// to [`DnsProvider::apply_change`] on a clone of `provider`. Changes on
/// record types the provider cannot handle become informational `Other`
/// corrections.
pub async fn get_zone_corrections(
    provider: &Arc<dyn DnsProvider>,
    zone: &str,
    desired: &[Record],
) -> Result<Vec<FCorrection>> {
    let zone = normalize(zone);
    let live: Vec<Record> = provider
        .get_zone_records(&zone)
        .await?
        .iter()
        .map(|r| r.normalized(&zone))
        .collect();
    let desired: Vec<Record> = desired.iter().map(|r| r.normalized(&zone)).collect();

    let changes = diff_records(&live, &desired);
    log::debug!(
        "[{}] {zone}: {} live records, {} desired, {} changes",
        provider.id(),
        live.len(),
        desired.len(),
        changes.len()
    );

    let corrections = changes
        .into_iter()
        .map(|change| {
            let msg = change.message();
            if !provider.supports_record_type(&change.rtype) {
                return FCorrection::informational(Correction::new(
                    format!("{msg} (unsupported by {})", provider.id()),
                    CorrectionKind::Other,
                ));
            }

            let correction = Correction::new(msg, change.kind.into());
            let provider = Arc::clone(provider);
            let zone = zone.clone();
            FCorrection::new(
                correction,
                Box::new(move || {
                    async move { provider.apply_change(&zone, &change).await }.boxed()
                }),
            )
        })
        .collect();

    Ok(corrections)
}
