// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use kube::ResourceExt;
use tracing::{debug, info, span, Instrument, Level};
use typed_builder::TypedBuilder;

use super::{
    backends::{IngressReadiness, RouteBackend},
    external_service::reconcile_external_service,
    metadata::render_metadata,
    pruner::prune_removed_components,
    readiness::{ComponentStates, ServiceNameResolver},
    status,
    topology::{self, TopologyOutcome},
};
use crate::{
    client::ResourceClient,
    common::ResourceKey,
    config::RuntimeConfig,
    crd::{InferenceService, InferenceServiceStatus},
    reconciler::{ApplyOutcome, Result},
};

/// Drives one inference service through the routing pipeline: prune removed components, keep the external name service,
/// build the topology, apply the routing object and compute the new status.
///
/// Nothing here writes the inference service itself. The returned status is published by the caller.
#[derive(Clone, TypedBuilder)]
pub struct IngressReconciler<B, C> {
    backend: B,
    client: C,
}

impl<B: RouteBackend, C: ResourceClient> IngressReconciler<B, C> {
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn reconcile(&self, isvc: &InferenceService, runtime: &RuntimeConfig) -> Result<InferenceServiceStatus> {
        let resource_key = ResourceKey::from(isvc);
        let span = span!(Level::INFO, "IngressReconciler", backend = %self.backend, id = %resource_key);
        self.reconcile_ingress(isvc, runtime).instrument(span).await
    }

    async fn reconcile_ingress(&self, isvc: &InferenceService, runtime: &RuntimeConfig) -> Result<InferenceServiceStatus> {
        let config = &runtime.ingress;
        let mut new_status = isvc.status.clone().unwrap_or_default();

        let states = ComponentStates::evaluate(isvc, &ServiceNameResolver::new(self.client.clone())).await?;
        let pruned = prune_removed_components::<B::ComponentObject, C>(&self.client, isvc, &states, &mut new_status).await?;
        if pruned > 0 {
            info!("Removed {pruned} objects of components no longer declared");
        }

        let metadata = render_metadata(isvc, runtime);
        let fronted = self.backend.needs_external_name_service(config);
        if fronted {
            reconcile_external_service(&self.client, isvc, &metadata, config).await?;
        }

        let topology = match topology::build(isvc, &states, config)? {
            TopologyOutcome::Ready(topology) => topology,
            TopologyOutcome::NotReady(condition) => {
                debug!("Waiting for components of {}: {:?}", isvc.name_any(), condition.reason);
                status::apply_not_ready(&mut new_status, condition);
                return Ok(new_status);
            },
        };

        let readiness = if self.backend.object_creation_disabled(config, &topology) {
            debug!("{} creation disabled for {}", self.backend, isvc.name_any());
            IngressReadiness::Ready
        } else {
            let desired = self.backend.build_desired(isvc, &topology, &metadata, config)?;
            let object = match self.backend.get_or_create_or_update(&self.client, &desired).await? {
                ApplyOutcome::Created(object) => {
                    info!("Created {} for {}", self.backend, isvc.name_any());
                    object
                },
                ApplyOutcome::Updated(object) => {
                    info!("Updated {} for {}", self.backend, isvc.name_any());
                    object
                },
                ApplyOutcome::Unchanged(object) => object,
            };
            self.backend.readiness(&object)
        };

        status::apply_ready(&mut new_status, &topology, fronted, &readiness);
        Ok(new_status)
    }
}

#[cfg(test)]
mod tests {
    use gateway_api::apis::standard::httproutes::HTTPRoute;
    use k8s_openapi::api::{core::v1::Service, networking::v1::Ingress};

    use super::*;
    use crate::{
        client::inmemory::{InMemoryClient, WriteKind},
        crd::{ComponentSpec, ComponentType, ConditionStatus, ConditionType, KnativeService, StatusConfigurationSpec, VirtualService},
        ingress::{
            backends::{HttpRouteBackend, IngressBackend, VirtualServiceBackend},
            fixtures,
        },
    };

    fn reconciler<B: RouteBackend>(backend: B, client: &InMemoryClient) -> IngressReconciler<B, InMemoryClient> {
        IngressReconciler::builder().backend(backend).client(client.clone()).build()
    }

    #[tokio::test]
    async fn test_single_predictor_is_routed() {
        let client = InMemoryClient::new();
        let isvc = fixtures::ready(fixtures::inference_service("foo"));
        let runtime = fixtures::runtime_config(fixtures::ingress_config());

        let status = reconciler(VirtualServiceBackend, &client).reconcile(&isvc, &runtime).await.unwrap();

        assert_eq!(status.traffic, Some(100));
        assert_eq!(status.canary_traffic, Some(0));
        assert_eq!(status.url.as_deref(), Some("http://foo.default.example.com"));
        assert_eq!(status.address.and_then(|address| address.url).as_deref(), Some("http://foo.default.svc.cluster.local"));
        assert!(status.conditions.iter().any(|condition| condition.is(ConditionType::IngressReady) && condition.is_true()));

        let vs: VirtualService = client.object("default", "foo").unwrap();
        let predict = &vs.spec.http[0];
        assert_eq!(predict.route.len(), 1);
        assert_eq!(predict.route[0].weight, Some(100));
        let shim: Service = client.object("default", "foo").unwrap();
        assert_eq!(shim.spec.and_then(|spec| spec.type_).as_deref(), Some("ExternalName"));
    }

    #[tokio::test]
    async fn test_second_reconcile_writes_nothing() {
        let client = InMemoryClient::new();
        let mut isvc = fixtures::ready(fixtures::with_canary(fixtures::inference_service("foo"), 25));
        isvc.spec.explainer = Some(Default::default());
        let isvc = fixtures::ready(isvc);
        let runtime = fixtures::runtime_config(fixtures::ingress_config());
        let reconciler = reconciler(VirtualServiceBackend, &client);

        let first = reconciler.reconcile(&isvc, &runtime).await.unwrap();
        assert_eq!(client.writes().len(), 2);
        client.clear_writes();

        let mut isvc = isvc;
        isvc.status = Some(first.clone());
        let second = reconciler.reconcile(&isvc, &runtime).await.unwrap();
        assert!(client.writes().is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_not_ready_predictor_blocks_routing() {
        let client = InMemoryClient::new();
        let isvc = fixtures::inference_service("foo");
        let runtime = fixtures::runtime_config(fixtures::ingress_config());

        let status = reconciler(VirtualServiceBackend, &client).reconcile(&isvc, &runtime).await.unwrap();

        assert!(status.url.is_none());
        let condition = status.get_condition(ConditionType::IngressReady).unwrap();
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.reason.as_deref(), Some("Predictor ingress not created"));
        assert!(client.object::<VirtualService>("default", "foo").is_none());
        assert_eq!(client.writes().iter().map(|write| write.kind).collect::<Vec<_>>(), vec![WriteKind::Create]);
    }

    #[tokio::test]
    async fn test_disabled_virtual_host_uses_component_address() {
        let client = InMemoryClient::new();
        let isvc = fixtures::ready(fixtures::inference_service("foo"));
        let mut config = fixtures::ingress_config();
        config.disable_istio_virtual_host = true;

        let status = reconciler(VirtualServiceBackend, &client).reconcile(&isvc, &fixtures::runtime_config(config)).await.unwrap();

        assert!(client.writes().is_empty());
        assert_eq!(status.url.as_deref(), Some("http://foo.default.example.com"));
        assert_eq!(status.address.as_ref().and_then(|address| address.url.as_deref()), Some("http://foo-predictor.default.svc.cluster.local"));
        assert!(status.is_condition_true(ConditionType::IngressReady));
    }

    #[tokio::test]
    async fn test_http_route_waits_for_parents() {
        let client = InMemoryClient::new();
        let isvc = fixtures::ready(fixtures::inference_service("foo"));
        let runtime = fixtures::runtime_config(fixtures::ingress_config());

        let status = reconciler(HttpRouteBackend, &client).reconcile(&isvc, &runtime).await.unwrap();

        assert!(client.object::<HTTPRoute>("default", "foo").is_some());
        assert!(client.object::<Service>("default", "foo").is_none());
        assert_eq!(status.url.as_deref(), Some("http://foo.default.example.com"));
        let condition = status.get_condition(ConditionType::IngressReady).unwrap();
        assert_eq!(condition.reason.as_deref(), Some("HTTPRouteParentStatusNotAvailable"));
        assert_eq!(condition.message.as_deref(), Some("HTTPRoute not ready"));

        client.clear_writes();
        reconciler(HttpRouteBackend, &client).reconcile(&isvc, &runtime).await.unwrap();
        assert!(client.writes().is_empty());
        assert_eq!(client.dry_runs(), 1);
    }

    #[tokio::test]
    async fn test_removed_canary_resets_traffic() {
        let client = InMemoryClient::new();
        let canary = fixtures::ready(fixtures::with_canary(fixtures::inference_service("foo"), 40));
        let runtime = fixtures::runtime_config(fixtures::ingress_config());
        let reconciler = reconciler(IngressBackend, &client);

        let status = reconciler.reconcile(&canary, &runtime).await.unwrap();
        assert_eq!((status.traffic, status.canary_traffic), (Some(60), Some(40)));
        let ingress: Ingress = client.object("default", "foo").unwrap();
        let first_rule = &ingress.spec.unwrap().rules.unwrap()[0];
        assert_eq!(first_rule.http.as_ref().unwrap().paths[0].backend.service.as_ref().unwrap().name, "foo-predictor");

        let mut isvc = canary;
        isvc.spec.canary = None;
        isvc.spec.canary_traffic_percent = None;
        isvc.status = Some(status);
        let status = reconciler.reconcile(&isvc, &runtime).await.unwrap();
        assert_eq!((status.traffic, status.canary_traffic), (Some(100), Some(0)));
        assert!(status.get_condition(ConditionType::CanaryPredictorReady).is_none());
    }

    #[tokio::test]
    async fn test_removed_canary_with_waiting_component_keeps_traffic_whole() {
        let client = InMemoryClient::new();
        let canary = fixtures::ready(fixtures::with_canary(fixtures::inference_service("foo"), 40));
        let runtime = fixtures::runtime_config(fixtures::ingress_config());
        let reconciler = reconciler(IngressBackend, &client);

        let status = reconciler.reconcile(&canary, &runtime).await.unwrap();
        assert_eq!((status.traffic, status.canary_traffic), (Some(60), Some(40)));

        let mut isvc = canary;
        isvc.spec.canary = None;
        isvc.spec.canary_traffic_percent = None;
        isvc.spec.transformer = Some(ComponentSpec::default());
        isvc.status = Some(status);
        let status = reconciler.reconcile(&isvc, &runtime).await.unwrap();

        assert_eq!((status.traffic, status.canary_traffic), (Some(100), Some(0)));
        assert_eq!(status.get_condition(ConditionType::IngressReady).and_then(|condition| condition.reason.as_deref()), Some("Transformer ingress not created"));
    }

    #[tokio::test]
    async fn test_removed_timeout_is_cleared_from_virtual_service() {
        let client = InMemoryClient::new();
        let mut isvc = fixtures::inference_service("foo");
        isvc.spec.predictor.timeout = Some(30);
        let isvc = fixtures::ready(isvc);
        let runtime = fixtures::runtime_config(fixtures::ingress_config());
        let reconciler = reconciler(VirtualServiceBackend, &client);

        reconciler.reconcile(&isvc, &runtime).await.unwrap();
        let vs: VirtualService = client.object("default", "foo").unwrap();
        assert_eq!(vs.spec.http[0].timeout.as_deref(), Some("30s"));

        let mut isvc = isvc;
        isvc.spec.predictor.timeout = None;
        client.clear_writes();
        reconciler.reconcile(&isvc, &runtime).await.unwrap();

        let vs: VirtualService = client.object("default", "foo").unwrap();
        assert!(vs.spec.http.iter().all(|route| route.timeout.is_none()));
        assert_eq!(client.writes().iter().map(|write| write.kind).collect::<Vec<_>>(), vec![WriteKind::Replace]);
    }

    #[tokio::test]
    async fn test_removed_canary_transformer_is_cleaned_up() {
        let client = InMemoryClient::new();
        let mut isvc = fixtures::with_canary(fixtures::inference_service("foo"), 20);
        if let Some(canary) = isvc.spec.canary.as_mut() {
            canary.transformer = Some(ComponentSpec::default());
        }
        let mut isvc = fixtures::ready(isvc);
        isvc.status_mut().canary.insert(ComponentType::Transformer, StatusConfigurationSpec { name: "foo-transformer-canary-00001".to_owned(), ..Default::default() });
        client.insert(&fixtures::owned_knative_service("foo-transformer-canary", fixtures::UID));
        client.insert(&fixtures::owned_knative_service("foo-predictor-canary", fixtures::UID));

        if let Some(canary) = isvc.spec.canary.as_mut() {
            canary.transformer = None;
        }
        let status = reconciler(VirtualServiceBackend, &client).reconcile(&isvc, &fixtures::runtime_config(fixtures::ingress_config())).await.unwrap();

        assert!(client.object::<KnativeService>("default", "foo-transformer-canary").is_none());
        assert!(client.object::<KnativeService>("default", "foo-predictor-canary").is_some());
        assert!(status.canary.get(&ComponentType::Transformer).is_none());
        assert!(status.get_condition(ConditionType::CanaryTransformerReady).is_none());
        assert!(status.is_condition_true(ConditionType::CanaryPredictorReady));
        assert_eq!((status.traffic, status.canary_traffic), (Some(80), Some(20)));
        assert!(status.is_condition_true(ConditionType::IngressReady));
    }
}
