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
use gateway_api::apis::standard::httproutes::{
    HTTPRoute, HTTPRouteParentRefs, HTTPRouteRules, HTTPRouteRulesBackendRefs, HTTPRouteRulesFilters, HTTPRouteRulesFiltersRequestHeaderModifier,
    HTTPRouteRulesFiltersRequestHeaderModifierSet, HTTPRouteRulesFiltersType, HTTPRouteRulesFiltersUrlRewrite, HTTPRouteRulesFiltersUrlRewritePath,
    HTTPRouteRulesFiltersUrlRewritePathType, HTTPRouteRulesMatches, HTTPRouteRulesMatchesHeaders, HTTPRouteRulesMatchesHeadersType,
    HTTPRouteRulesMatchesPath, HTTPRouteRulesMatchesPathType, HTTPRouteRulesTimeouts, HTTPRouteSpec,
};
use k8s_openapi::api::core::v1::Service;

use super::{duration, object_meta, IngressReadiness, RouteBackend};
use crate::{
    common::{host_regex, GATEWAY_API_GROUP, GATEWAY_KIND, HOST_HEADER, ISVC_NAMESPACE_HEADER, ISVC_NAME_HEADER, SERVICE_KIND},
    config::{parse_gateway_reference, IngressBackendKind, IngressConfig},
    crd::InferenceService,
    ingress::{
        metadata::RenderedMetadata,
        topology::{RouteRule, RouteTopology, RuleKind, UriMatch},
    },
    reconciler::Result,
};

const ACCEPTED_CONDITION: &str = "Accepted";
const RESOLVED_REFS_CONDITION: &str = "ResolvedRefs";
const PARENT_STATUS_NOT_AVAILABLE: &str = "HTTPRouteParentStatusNotAvailable";
const NOT_READY_MESSAGE: &str = "HTTPRoute not ready";

/// Gateway API HTTPRoute attached to the configured KServe gateway. Backends are the component services, the logical
/// inference service travels in the `Isvc-Name`/`Isvc-Namespace` headers.
#[derive(Clone, Debug, Default)]
pub struct HttpRouteBackend;

impl Display for HttpRouteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTPRoute")
    }
}

fn path_match(path_type: HTTPRouteRulesMatchesPathType, value: &str) -> HTTPRouteRulesMatchesPath {
    HTTPRouteRulesMatchesPath { r#type: Some(path_type), value: Some(value.to_owned()) }
}

fn rule_matches(rule: &RouteRule) -> Vec<HTTPRouteRulesMatches> {
    let mut matches: Vec<HTTPRouteRulesMatches> = vec![];
    for route_match in &rule.matches {
        let path = match &route_match.uri {
            None => path_match(HTTPRouteRulesMatchesPathType::PathPrefix, "/"),
            Some(UriMatch::Prefix(prefix)) => path_match(HTTPRouteRulesMatchesPathType::PathPrefix, prefix),
            Some(UriMatch::Exact(path)) => path_match(HTTPRouteRulesMatchesPathType::Exact, path),
            Some(UriMatch::Regex(regex)) => path_match(HTTPRouteRulesMatchesPathType::RegularExpression, regex),
        };
        // Hostnames are matched on the route itself, only the predictor route narrows the host further.
        let headers = (rule.kind == RuleKind::PredictorOnly).then(|| {
            vec![HTTPRouteRulesMatchesHeaders {
                name: HOST_HEADER.to_owned(),
                r#type: Some(HTTPRouteRulesMatchesHeadersType::RegularExpression),
                value: host_regex(&route_match.authority),
            }]
        });
        let candidate = HTTPRouteRulesMatches { path: Some(path), headers, ..Default::default() };
        if !matches.contains(&candidate) {
            matches.push(candidate);
        }
    }
    matches
}

fn rule_filters(rule: &RouteRule, topology: &RouteTopology) -> Vec<HTTPRouteRulesFilters> {
    let mut filters = vec![HTTPRouteRulesFilters {
        r#type: HTTPRouteRulesFiltersType::RequestHeaderModifier,
        request_header_modifier: Some(HTTPRouteRulesFiltersRequestHeaderModifier {
            set: Some(vec![
                HTTPRouteRulesFiltersRequestHeaderModifierSet { name: ISVC_NAME_HEADER.to_owned(), value: topology.name.clone() },
                HTTPRouteRulesFiltersRequestHeaderModifierSet { name: ISVC_NAMESPACE_HEADER.to_owned(), value: topology.namespace.clone() },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }];

    if let Some(rewrite) = &rule.rewrite_uri {
        let path = if rule.kind == RuleKind::PathExact {
            HTTPRouteRulesFiltersUrlRewritePath {
                r#type: HTTPRouteRulesFiltersUrlRewritePathType::ReplaceFullPath,
                replace_full_path: Some(rewrite.clone()),
                ..Default::default()
            }
        } else {
            HTTPRouteRulesFiltersUrlRewritePath {
                r#type: HTTPRouteRulesFiltersUrlRewritePathType::ReplacePrefixMatch,
                replace_prefix_match: Some(rewrite.clone()),
                ..Default::default()
            }
        };
        filters.push(HTTPRouteRulesFilters {
            r#type: HTTPRouteRulesFiltersType::UrlRewrite,
            url_rewrite: Some(HTTPRouteRulesFiltersUrlRewrite { path: Some(path), ..Default::default() }),
            ..Default::default()
        });
    }
    filters
}

fn http_route_rule(rule: &RouteRule, topology: &RouteTopology) -> HTTPRouteRules {
    let backend_refs = rule
        .destinations
        .iter()
        .map(|destination| HTTPRouteRulesBackendRefs {
            group: Some(String::new()),
            kind: Some(SERVICE_KIND.to_owned()),
            name: destination.service.clone(),
            namespace: Some(destination.namespace.clone()),
            port: Some(i32::from(destination.port)),
            weight: Some(i32::try_from(destination.weight).unwrap_or_default()),
            filters: None,
        })
        .collect();

    HTTPRouteRules {
        matches: Some(rule_matches(rule)),
        filters: Some(rule_filters(rule, topology)),
        backend_refs: Some(backend_refs),
        timeouts: rule.timeout.map(|timeout| HTTPRouteRulesTimeouts { request: Some(duration(timeout)), backend_request: None }),
        ..Default::default()
    }
}

#[async_trait]
impl RouteBackend for HttpRouteBackend {
    type Object = HTTPRoute;
    type ComponentObject = Service;

    fn kind(&self) -> IngressBackendKind {
        IngressBackendKind::HttpRoute
    }

    fn build_desired(&self, isvc: &InferenceService, topology: &RouteTopology, metadata: &RenderedMetadata, config: &IngressConfig) -> Result<HTTPRoute> {
        let (gateway_namespace, gateway_name) = parse_gateway_reference(&config.kserve_ingress_gateway)?;
        let parent = HTTPRouteParentRefs {
            group: Some(GATEWAY_API_GROUP.to_owned()),
            kind: Some(GATEWAY_KIND.to_owned()),
            name: gateway_name,
            namespace: Some(gateway_namespace),
            ..Default::default()
        };

        Ok(HTTPRoute {
            metadata: object_meta(isvc, metadata)?,
            spec: HTTPRouteSpec {
                hostnames: Some(topology.hosts.clone()),
                parent_refs: Some(vec![parent]),
                rules: Some(topology.rules.iter().map(|rule| http_route_rule(rule, topology)).collect()),
            },
            status: None,
        })
    }

    fn dry_run_before_compare(&self) -> bool {
        true
    }

    /// Ready once every parent gateway accepted the route and resolved its backends.
    fn readiness(&self, route: &HTTPRoute) -> IngressReadiness {
        let parents = route.status.as_ref().map(|status| status.parents.as_slice()).unwrap_or_default();
        if parents.is_empty() {
            return IngressReadiness::NotReady { reason: PARENT_STATUS_NOT_AVAILABLE.to_owned(), message: NOT_READY_MESSAGE.to_owned() };
        }

        let not_ready = parents
            .iter()
            .flat_map(|parent| parent.conditions.iter().flatten())
            .filter(|condition| condition.type_ == ACCEPTED_CONDITION || condition.type_ == RESOLVED_REFS_CONDITION)
            .find(|condition| condition.status != "True");

        match not_ready {
            Some(condition) => IngressReadiness::NotReady { reason: condition.reason.clone(), message: condition.message.clone() },
            None => IngressReadiness::Ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use gateway_api::apis::standard::httproutes::{HTTPRouteStatus, HTTPRouteStatusParents, HTTPRouteStatusParentsParentRef};
    use k8s_openapi::{apimachinery::pkg::apis::meta::v1::{Condition, Time}, chrono::Utc};

    use super::*;
    use crate::{
        client::inmemory::InMemoryClient,
        config::ConfigError,
        ingress::{
            fixtures,
            metadata::render_metadata,
            readiness::{ComponentStates, ServiceNameResolver},
            topology::{self, TopologyOutcome},
        },
        reconciler::ReconcileError,
    };

    async fn try_desired(isvc: &InferenceService, config: &IngressConfig) -> Result<HTTPRoute> {
        let states = ComponentStates::evaluate(isvc, &ServiceNameResolver::new(InMemoryClient::new())).await.unwrap();
        let TopologyOutcome::Ready(topology) = topology::build(isvc, &states, config).unwrap() else { panic!("topology is not ready") };
        let metadata = render_metadata(isvc, &fixtures::runtime_config(config.clone()));
        HttpRouteBackend.build_desired(isvc, &topology, &metadata, config)
    }

    async fn desired(isvc: &InferenceService, config: &IngressConfig) -> HTTPRoute {
        try_desired(isvc, config).await.unwrap()
    }

    fn condition(type_: &str, status: &str, reason: &str) -> Condition {
        Condition {
            type_: type_.to_owned(),
            status: status.to_owned(),
            reason: reason.to_owned(),
            message: format!("{type_} is {status}"),
            last_transition_time: Time(Utc::now()),
            observed_generation: None,
        }
    }

    fn with_parent_conditions(mut route: HTTPRoute, conditions: Vec<Condition>) -> HTTPRoute {
        route.status = Some(HTTPRouteStatus {
            parents: vec![HTTPRouteStatusParents {
                conditions: Some(conditions),
                controller_name: "gateway.envoyproxy.io/gatewayclass-controller".to_owned(),
                parent_ref: HTTPRouteStatusParentsParentRef { name: "kserve-ingress-gateway".to_owned(), ..Default::default() },
            }],
        });
        route
    }

    #[tokio::test]
    async fn test_canary_http_route() {
        let isvc = fixtures::ready(fixtures::with_canary(fixtures::inference_service("foo"), 20));
        let route = desired(&isvc, &fixtures::ingress_config()).await;

        let parent = &route.spec.parent_refs.as_ref().unwrap()[0];
        assert_eq!(parent.name, "kserve-ingress-gateway");
        assert_eq!(parent.namespace.as_deref(), Some("kserve"));
        assert!(route.spec.hostnames.as_ref().unwrap().contains(&"foo.default.example.com".to_owned()));

        let rules = route.spec.rules.as_ref().unwrap();
        let predict = &rules[0];
        let weights =
            predict.backend_refs.iter().flatten().map(|backend| (backend.name.as_str(), backend.weight.unwrap_or_default())).collect::<Vec<_>>();
        assert_eq!(weights, vec![("foo-predictor", 80), ("foo-predictor-canary", 20)]);
        assert_eq!(predict.matches.as_ref().unwrap().len(), 1);

        let header_filter = predict.filters.as_ref().unwrap()[0].request_header_modifier.as_ref().unwrap();
        let headers = header_filter.set.iter().flatten().map(|header| (header.name.as_str(), header.value.as_str())).collect::<Vec<_>>();
        assert_eq!(headers, vec![("Isvc-Name", "foo"), ("Isvc-Namespace", "default")]);

        let predictor_only = rules.last().unwrap();
        let host_match = &predictor_only.matches.as_ref().unwrap()[0].headers.as_ref().unwrap()[0];
        assert_eq!(host_match.name, "Host");
        assert_eq!(host_match.value, host_regex("foo-predictor.default.example.com"));
        assert!(regex::Regex::new(&host_match.value).unwrap().is_match("foo-predictor.default.example.com:8080"));
    }

    #[tokio::test]
    async fn test_path_rules_rewrite() {
        let mut config = fixtures::ingress_config();
        config.path_template = "/serving/{{ .Namespace }}/{{ .Name }}".to_owned();
        let isvc = fixtures::ready(fixtures::inference_service("foo"));
        let route = desired(&isvc, &config).await;

        let rules = route.spec.rules.as_ref().unwrap();
        let prefix_rule = &rules[2];
        let path = prefix_rule.matches.as_ref().unwrap()[0].path.as_ref().unwrap();
        assert_eq!(path.value.as_deref(), Some("/serving/default/foo/"));
        let rewrite = prefix_rule.filters.as_ref().unwrap()[1].url_rewrite.as_ref().unwrap().path.as_ref().unwrap();
        assert_eq!(rewrite.replace_prefix_match.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn test_readiness_from_parent_status() {
        let isvc = fixtures::ready(fixtures::inference_service("foo"));
        let route = desired(&isvc, &fixtures::ingress_config()).await;

        assert_eq!(
            HttpRouteBackend.readiness(&route),
            IngressReadiness::NotReady { reason: "HTTPRouteParentStatusNotAvailable".to_owned(), message: "HTTPRoute not ready".to_owned() }
        );

        let accepted = with_parent_conditions(route.clone(), vec![condition("Accepted", "True", "Accepted"), condition("ResolvedRefs", "True", "ResolvedRefs")]);
        assert_eq!(HttpRouteBackend.readiness(&accepted), IngressReadiness::Ready);

        let unresolved = with_parent_conditions(route, vec![condition("Accepted", "True", "Accepted"), condition("ResolvedRefs", "False", "BackendNotFound")]);
        assert_eq!(
            HttpRouteBackend.readiness(&unresolved),
            IngressReadiness::NotReady { reason: "BackendNotFound".to_owned(), message: "ResolvedRefs is False".to_owned() }
        );
    }

    #[test]
    fn test_compares_through_dry_run() {
        assert!(HttpRouteBackend.dry_run_before_compare());
    }

    #[tokio::test]
    async fn test_malformed_gateway_reference_is_rejected() {
        let mut config = fixtures::ingress_config();
        config.kserve_ingress_gateway = "kserve-ingress-gateway".to_owned();
        let isvc = fixtures::ready(fixtures::inference_service("foo"));

        let result = try_desired(&isvc, &config).await;
        assert!(matches!(result, Err(ReconcileError::Config(ConfigError::InvalidGatewayReference(reference))) if reference == "kserve-ingress-gateway"));
    }
}
