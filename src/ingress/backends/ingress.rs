// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::fmt::Display;

use async_trait::async_trait;
use k8s_openapi::api::{
    core::v1::Service,
    networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend as KubeIngressBackend, IngressRule, IngressServiceBackend, IngressSpec,
        IngressTLS, ServiceBackendPort,
    },
};
use tracing::debug;

use super::{object_meta, RouteBackend};
use crate::{
    config::{IngressBackendKind, IngressConfig},
    crd::InferenceService,
    ingress::{
        metadata::RenderedMetadata,
        topology::{RouteTopology, UriMatch, WeightedDestination},
    },
    reconciler::Result,
};

const PATH_TYPE_PREFIX: &str = "Prefix";
const PATH_TYPE_EXACT: &str = "Exact";
const PATH_TYPE_IMPLEMENTATION_SPECIFIC: &str = "ImplementationSpecific";

/// Plain Kubernetes Ingress for raw deployments. An Ingress can neither split traffic nor set headers, so every path
/// goes to the destination with the largest share and in-cluster hosts are left to the services themselves.
#[derive(Clone, Debug, Default)]
pub struct IngressBackend;

impl Display for IngressBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ingress")
    }
}

fn ingress_path(uri: Option<&UriMatch>, destination: &WeightedDestination) -> HTTPIngressPath {
    let (path, path_type) = match uri {
        None => ("/".to_owned(), PATH_TYPE_PREFIX),
        Some(UriMatch::Prefix(path)) => (path.clone(), PATH_TYPE_PREFIX),
        Some(UriMatch::Exact(path)) => (path.clone(), PATH_TYPE_EXACT),
        Some(UriMatch::Regex(regex)) => (regex.trim_start_matches('^').trim_end_matches('$').to_owned(), PATH_TYPE_IMPLEMENTATION_SPECIFIC),
    };
    HTTPIngressPath {
        path: Some(path),
        path_type: path_type.to_owned(),
        backend: KubeIngressBackend {
            service: Some(IngressServiceBackend {
                name: destination.service.clone(),
                port: Some(ServiceBackendPort { number: Some(i32::from(destination.port)), name: None }),
            }),
            resource: None,
        },
    }
}

#[async_trait]
impl RouteBackend for IngressBackend {
    type Object = Ingress;
    type ComponentObject = Service;

    fn kind(&self) -> IngressBackendKind {
        IngressBackendKind::Ingress
    }

    fn build_desired(&self, isvc: &InferenceService, topology: &RouteTopology, metadata: &RenderedMetadata, config: &IngressConfig) -> Result<Ingress> {
        let mut rules: Vec<IngressRule> = vec![];
        for rule in &topology.rules {
            let Some(destination) = rule.primary_destination() else {
                continue;
            };
            if rule.rewrite_uri.is_some() {
                debug!("Ingress {} can't rewrite {} rule paths", topology.name, rule.kind.as_str());
            }
            for route_match in rule.matches.iter().filter(|route_match| route_match.authority != topology.internal_host) {
                let path = ingress_path(route_match.uri.as_ref(), destination);
                match rules.iter_mut().find(|ingress_rule| ingress_rule.host.as_deref() == Some(route_match.authority.as_str())) {
                    Some(IngressRule { http: Some(http), .. }) => http.paths.push(path),
                    _ => rules.push(IngressRule { host: Some(route_match.authority.clone()), http: Some(HTTPIngressRuleValue { paths: vec![path] }) }),
                }
            }
        }

        let tls = metadata
            .tls
            .iter()
            .map(|tls| IngressTLS { hosts: Some(tls.hosts.clone()), secret_name: Some(tls.secret_name.clone()) })
            .collect::<Vec<_>>();

        Ok(Ingress {
            metadata: object_meta(isvc, metadata)?,
            spec: Some(IngressSpec {
                ingress_class_name: config.ingress_class_name.clone(),
                rules: Some(rules),
                tls: (!tls.is_empty()).then_some(tls),
                default_backend: None,
            }),
            status: None,
        })
    }

    fn object_creation_disabled(&self, config: &IngressConfig, topology: &RouteTopology) -> bool {
        config.disable_ingress_creation || topology.cluster_local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::inmemory::InMemoryClient,
        config::TlsTemplate,
        ingress::{
            fixtures,
            metadata::render_metadata,
            readiness::{ComponentStates, ServiceNameResolver},
            topology::{self, TopologyOutcome},
        },
    };

    async fn topology(isvc: &InferenceService, config: &IngressConfig) -> RouteTopology {
        let states = ComponentStates::evaluate(isvc, &ServiceNameResolver::new(InMemoryClient::new())).await.unwrap();
        let TopologyOutcome::Ready(topology) = topology::build(isvc, &states, config).unwrap() else { panic!("topology is not ready") };
        *topology
    }

    fn paths<'a>(ingress: &'a Ingress, host: &str) -> Vec<&'a HTTPIngressPath> {
        ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.rules.as_ref())
            .into_iter()
            .flatten()
            .filter(|rule| rule.host.as_deref() == Some(host))
            .flat_map(|rule| rule.http.iter().flat_map(|http| http.paths.iter()))
            .collect()
    }

    #[tokio::test]
    async fn test_canary_routes_to_largest_share() {
        let mut config = fixtures::ingress_config();
        config.ingress_class_name = Some("nginx".to_owned());
        config.tls = vec![TlsTemplate { hosts: vec!["{{ .Name }}.{{ .Namespace }}.{{ .IngressDomain }}".to_owned()], secret_name: "wildcard-tls".to_owned() }];
        let mut isvc = fixtures::inference_service("foo");
        isvc.spec.explainer = Some(Default::default());
        let isvc = fixtures::ready(fixtures::with_canary(isvc, 30));

        let topology = topology(&isvc, &config).await;
        let metadata = render_metadata(&isvc, &fixtures::runtime_config(config.clone()));
        let ingress = IngressBackend.build_desired(&isvc, &topology, &metadata, &config).unwrap();

        let spec = ingress.spec.as_ref().unwrap();
        assert_eq!(spec.ingress_class_name.as_deref(), Some("nginx"));
        assert_eq!(spec.tls.as_ref().unwrap()[0].secret_name.as_deref(), Some("wildcard-tls"));
        assert!(paths(&ingress, "foo.default.svc.cluster.local").is_empty());

        let host_paths = paths(&ingress, "foo.default.example.com");
        assert_eq!(host_paths.len(), 2);
        assert_eq!(host_paths[0].path.as_deref(), Some(r"/v1/models/[\w-]+:explain"));
        assert_eq!(host_paths[0].path_type, "ImplementationSpecific");
        assert_eq!(host_paths[0].backend.service.as_ref().unwrap().name, "foo-explainer");
        assert_eq!(host_paths[1].path.as_deref(), Some("/"));
        assert_eq!(host_paths[1].backend.service.as_ref().unwrap().name, "foo-predictor");

        let predictor_paths = paths(&ingress, "foo-predictor.default.example.com");
        assert_eq!(predictor_paths.len(), 1);
    }

    #[tokio::test]
    async fn test_cluster_local_disables_creation() {
        let config = fixtures::ingress_config();
        let mut isvc = fixtures::ready(fixtures::inference_service("foo"));
        assert!(!IngressBackend.object_creation_disabled(&config, &topology(&isvc, &config).await));

        isvc.metadata.labels = Some([("networking.kserve.io/visibility".to_owned(), "cluster-local".to_owned())].into());
        assert!(IngressBackend.object_creation_disabled(&config, &topology(&isvc, &config).await));
    }
}
