//! Zone snapshots and service edits

use std::sync::Arc;

use chrono::Utc;
use happydomain_provider::{Correction, Record, diff_records, write_zone};

use crate::analyzer::synthesize_records;
use crate::catalog::ServiceInfo;
use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Domain, Identifier, Service, ServiceInput, User, Zone, ZoneMeta};
use crate::validation::normalize_subdomain;

/// Zone editing service
pub struct ZoneService {
    ctx: Arc<ServiceContext>,
}

impl ZoneService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Service types that can be added to a zone
    pub fn list_service_types(&self) -> Vec<ServiceInfo> {
        self.ctx.catalog.infos()
    }

    pub async fn get_zone(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
    ) -> CoreResult<Zone> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        self.ctx.get_zone(&domain, zone_id).await
    }

    /// Metadata of every zone of the domain, newest first
    pub async fn zone_history(&self, user: &User, domain_id: &Identifier) -> CoreResult<Vec<ZoneMeta>> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        let mut history = Vec::with_capacity(domain.zone_history.len());
        for zone_id in &domain.zone_history {
            history.push(self.ctx.get_zone(&domain, zone_id).await?.meta);
        }
        Ok(history)
    }

    pub async fn get_service(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
        service_id: &Identifier,
    ) -> CoreResult<Service> {
        let zone = self.get_zone(user, domain_id, zone_id).await?;
        zone.find_service(service_id)
            .map(|(_, svc)| svc.clone())
            .ok_or_else(|| CoreError::ServiceNotFound(service_id.to_string()))
    }

    /// Run `action` on an editable version of the zone.
    ///
    /// Archived zones are never changed: `action` runs on an editable copy,
    /// which is stored and put at the head of the history only once the
    /// action succeeded. Returns the edited zone.
    pub async fn act_on_editable_zone<F>(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
        action: F,
    ) -> CoreResult<Zone>
    where
        F: FnOnce(&Domain, &mut Zone) -> CoreResult<()> + Send,
    {
        let mut domain = self.ctx.get_domain(user, domain_id).await?;
        let zone = self.ctx.get_zone(&domain, zone_id).await?;

        let derived = !zone.is_editable();
        let mut zone = if derived {
            zone.derive(user.id.clone())
        } else {
            zone
        };

        action(&domain, &mut zone)?;
        zone.meta.last_modified = Utc::now();

        if derived {
            self.ctx.repos.zones.create(&mut zone).await?;
            domain.push_zone(zone.id().clone());
            self.ctx.repos.domains.save(&domain).await?;
            log::debug!(
                "Derived zone {} from archived zone {zone_id} of {}",
                zone.id(),
                domain.name
            );
        } else {
            self.ctx.repos.zones.update(&zone).await?;
        }
        Ok(zone)
    }

    /// Add a service under `subdomain`
    pub async fn add_service(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
        subdomain: &str,
        input: ServiceInput,
    ) -> CoreResult<Zone> {
        let catalog = Arc::clone(&self.ctx.catalog);
        let subdomain = subdomain.to_string();
        self.act_on_editable_zone(user, domain_id, zone_id, move |domain, zone| {
            let sub = normalize_subdomain(&subdomain, &domain.name)?;
            let service =
                catalog.build_service(&input.service_type, &sub, input.ttl, &input.payload, &domain.name)?;

            let services = zone.services.entry(sub).or_default();
            if services.iter().any(|s| s.id == service.id) {
                return Err(CoreError::ValidationError(
                    "an identical service already exists".to_string(),
                ));
            }
            services.push(service);
            Ok(())
        })
        .await
    }

    /// Replace the content of a service, keeping its place
    pub async fn update_service(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
        service_id: &Identifier,
        input: ServiceInput,
    ) -> CoreResult<Zone> {
        let catalog = Arc::clone(&self.ctx.catalog);
        let service_id = service_id.clone();
        self.act_on_editable_zone(user, domain_id, zone_id, move |domain, zone| {
            let slot = zone
                .services
                .values_mut()
                .flat_map(|svcs| svcs.iter_mut())
                .find(|s| s.id == service_id)
                .ok_or_else(|| CoreError::ServiceNotFound(service_id.to_string()))?;

            *slot = catalog.build_service(
                &input.service_type,
                &slot.subdomain,
                input.ttl,
                &input.payload,
                &domain.name,
            )?;
            Ok(())
        })
        .await
    }

    pub async fn delete_service(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
        service_id: &Identifier,
    ) -> CoreResult<Zone> {
        let service_id = service_id.clone();
        self.act_on_editable_zone(user, domain_id, zone_id, move |_, zone| {
            let sub = zone
                .find_service(&service_id)
                .map(|(sub, _)| sub.to_string())
                .ok_or_else(|| CoreError::ServiceNotFound(service_id.to_string()))?;

            if let Some(services) = zone.services.get_mut(&sub) {
                services.retain(|s| s.id != service_id);
                if services.is_empty() {
                    zone.services.remove(&sub);
                }
            }
            Ok(())
        })
        .await
    }

    /// Records the zone stands for, SOA first
    pub async fn list_records(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
    ) -> CoreResult<Vec<Record>> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        let zone = self.ctx.get_zone(&domain, zone_id).await?;
        synthesize_records(&self.ctx.catalog, &domain.name, &zone)
    }

    /// Changes turning zone `old_id` into zone `new_id`, without asking the
    /// provider. Corrections carry no action.
    pub async fn diff_zones(
        &self,
        user: &User,
        domain_id: &Identifier,
        old_id: &Identifier,
        new_id: &Identifier,
    ) -> CoreResult<Vec<Correction>> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        let old = self.ctx.get_zone(&domain, old_id).await?;
        let new = self.ctx.get_zone(&domain, new_id).await?;

        let old = synthesize_records(&self.ctx.catalog, &domain.name, &old)?;
        let new = synthesize_records(&self.ctx.catalog, &domain.name, &new)?;

        Ok(diff_records(&old, &new)
            .into_iter()
            .map(|change| Correction::new(change.message(), change.kind.into()))
            .collect())
    }

    /// Zone in master file format
    pub async fn export_zone_file(
        &self,
        user: &User,
        domain_id: &Identifier,
        zone_id: &Identifier,
    ) -> CoreResult<String> {
        let domain = self.ctx.get_domain(user, domain_id).await?;
        let zone = self.ctx.get_zone(&domain, zone_id).await?;
        let records = synthesize_records(&self.ctx.catalog, &domain.name, &zone)?;
        Ok(write_zone(&domain.name, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::test_utils::TestEnv;
    use happydomain_provider::CorrectionKind;

    fn txt(text: &str) -> ServiceInput {
        ServiceInput {
            service_type: catalog::TXT.to_string(),
            ttl: 0,
            payload: serde_json::json!({ "text": text }),
        }
    }

    #[tokio::test]
    async fn editing_archived_zone_derives_a_new_head() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let imported = domain.zone_history[0].clone();
        let svc = ZoneService::new(env.ctx.clone());

        let zone = svc
            .add_service(&env.user, &domain.id, &imported, "www", txt("hello"))
            .await
            .unwrap();
        assert!(zone.is_editable());
        assert_ne!(zone.id(), &imported);

        let history = svc.zone_history(&env.user, &domain.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(&history[0].id, zone.id());
        assert_eq!(history[1].id, imported);

        // the archived snapshot is untouched
        let archived = svc.get_zone(&env.user, &domain.id, &imported).await.unwrap();
        assert!(!archived.services.contains_key("www"));

        // further edits stay on the same editable zone
        let again = svc
            .add_service(&env.user, &domain.id, zone.id(), "www", txt("second"))
            .await
            .unwrap();
        assert_eq!(again.id(), zone.id());
        assert_eq!(again.services["www"].len(), 2);
        assert_eq!(svc.zone_history(&env.user, &domain.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_service() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let svc = ZoneService::new(env.ctx.clone());

        let zone = svc
            .add_service(&env.user, &domain.id, &domain.zone_history[0], "www", txt("v1"))
            .await
            .unwrap();
        let old_id = zone.services["www"][0].id.clone();

        let zone = svc
            .update_service(&env.user, &domain.id, zone.id(), &old_id, txt("v2"))
            .await
            .unwrap();
        let updated = &zone.services["www"][0];
        assert_ne!(updated.id, old_id);
        assert_eq!(updated.comment, "v2");

        let err = svc
            .delete_service(&env.user, &domain.id, zone.id(), &old_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ServiceNotFound(_)));

        let zone = svc
            .delete_service(&env.user, &domain.id, zone.id(), &updated.id.clone())
            .await
            .unwrap();
        assert!(!zone.services.contains_key("www"));
    }

    #[tokio::test]
    async fn empty_service_is_rejected() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let err = ZoneService::new(env.ctx.clone())
            .add_service(
                &env.user,
                &domain.id,
                &domain.zone_history[0],
                "@",
                ServiceInput {
                    service_type: catalog::MXS.to_string(),
                    ttl: 0,
                    payload: serde_json::json!({ "mx": [] }),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        // the archived head was not derived into a stray copy
        assert_eq!(env.reload_domain(&domain.id).await.zone_history, domain.zone_history);
        assert_eq!(env.ctx.repos.zones.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wildcard_subdomain_can_be_edited() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let svc = ZoneService::new(env.ctx.clone());

        let zone = svc
            .add_service(
                &env.user,
                &domain.id,
                &domain.zone_history[0],
                "*",
                ServiceInput {
                    service_type: catalog::CNAME.to_string(),
                    ttl: 0,
                    payload: serde_json::json!({ "target": "www.example.com." }),
                },
            )
            .await
            .unwrap();
        assert_eq!(zone.services["*"][0].service_type, catalog::CNAME);

        let text = svc
            .export_zone_file(&env.user, &domain.id, zone.id())
            .await
            .unwrap();
        assert!(text.lines().any(|l| l.starts_with('*') && l.contains("CNAME")));
    }

    #[tokio::test]
    async fn zone_outside_history_is_not_found() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let err = ZoneService::new(env.ctx.clone())
            .get_zone(&env.user, &domain.id, &Identifier::random())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ZoneNotFound(_)));
    }

    #[tokio::test]
    async fn diff_between_snapshots() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let imported = domain.zone_history[0].clone();
        let svc = ZoneService::new(env.ctx.clone());

        let zone = svc
            .add_service(&env.user, &domain.id, &imported, "www", txt("hello"))
            .await
            .unwrap();

        let diff = svc
            .diff_zones(&env.user, &domain.id, &imported, zone.id())
            .await
            .unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].kind, CorrectionKind::Addition);
        assert!(diff[0].msg.contains("www.example.com."));

        assert!(svc
            .diff_zones(&env.user, &domain.id, &imported, &imported)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn export_as_zone_file() {
        let env = TestEnv::new().await;
        let domain = env.import_domain("example.com.").await;
        let text = ZoneService::new(env.ctx.clone())
            .export_zone_file(&env.user, &domain.id, &domain.zone_history[0])
            .await
            .unwrap();
        assert!(text.starts_with("$ORIGIN example.com."));
        assert!(text.contains("SOA"));
    }
}
