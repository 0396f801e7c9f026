// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use itertools::Itertools;
use kube::ResourceExt;

use super::{
    domain::{self, TemplateError},
    readiness::{ComponentState, ComponentStates},
};
use crate::{
    common::{DEFAULT_HTTP_PORT, EXPLAIN_PATH_REGEX, ISTIO_MESH_GATEWAY},
    config::IngressConfig,
    crd::{ComponentType, Condition, ConditionType, InferenceService, Variant, MAX_TRAFFIC_PERCENT},
};

const INTERNAL_URL_SCHEME: &str = "http";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleKind {
    Explain,
    Predict,
    PathExact,
    PathPrefix,
    PredictorOnly,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Explain => "explain",
            RuleKind::Predict => "predict",
            RuleKind::PathExact => "path-exact",
            RuleKind::PathPrefix => "path-prefix",
            RuleKind::PredictorOnly => "predictor",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UriMatch {
    Exact(String),
    Prefix(String),
    Regex(String),
}

/// Requests for `authority` (optionally narrowed to `uri`) entering through one of `gateways`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub uri: Option<UriMatch>,
    pub authority: String,
    pub gateways: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedDestination {
    pub component: ComponentType,
    pub variant: Variant,
    pub service: String,
    pub namespace: String,
    /// In-cluster host of the component service.
    pub host: String,
    pub port: u16,
    pub weight: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRule {
    pub kind: RuleKind,
    pub matches: Vec<RouteMatch>,
    pub destinations: Vec<WeightedDestination>,
    pub rewrite_uri: Option<String>,
    /// Seconds.
    pub timeout: Option<i64>,
}

impl RouteRule {
    /// Destination receiving the largest share, the default variant on a tie.
    pub fn primary_destination(&self) -> Option<&WeightedDestination> {
        self.destinations.iter().rev().max_by_key(|destination| destination.weight)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrafficSplit {
    pub default: i64,
    pub canary: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteTopology {
    pub name: String,
    pub namespace: String,
    /// Every host the routing object answers for, in match order.
    pub hosts: Vec<String>,
    pub internal_host: String,
    pub external_host: Option<String>,
    /// Internal host of the component receiving the catch-all traffic.
    pub front_service_host: String,
    pub cluster_local: bool,
    pub gateways: Vec<String>,
    pub rules: Vec<RouteRule>,
    pub url: String,
    pub traffic: TrafficSplit,
}

impl RouteTopology {
    pub fn rule(&self, kind: RuleKind) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.kind == kind)
    }

    /// Address for in-mesh callers. `fronted` is set when something answers for the inference service host itself.
    pub fn address_url(&self, fronted: bool) -> String {
        let host = if fronted { &self.internal_host } else { &self.front_service_host };
        format!("{INTERNAL_URL_SCHEME}://{host}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TopologyOutcome {
    /// A declared component is not ready yet; carries the `IngressReady` condition to publish.
    NotReady(Condition),
    Ready(Box<RouteTopology>),
}

fn not_ready(state: &ComponentState) -> TopologyOutcome {
    let message = format!("{} {} service {} is not ready", state.variant, state.component, state.service_name());
    TopologyOutcome::NotReady(Condition::not_ready(ConditionType::IngressReady, &state.not_ready_reason(), Some(message)))
}

struct TopologyBuilder<'a> {
    isvc: &'a InferenceService,
    states: &'a ComponentStates,
    config: &'a IngressConfig,
    namespace: String,
    canary_percent: i64,
}

impl TopologyBuilder<'_> {
    fn destination(&self, state: &ComponentState, weight: i64) -> WeightedDestination {
        WeightedDestination {
            component: state.component,
            variant: state.variant,
            service: state.service_name(),
            namespace: self.namespace.clone(),
            host: state.scheme.internal_host(&self.namespace, &self.config.cluster_domain),
            port: DEFAULT_HTTP_PORT,
            weight,
        }
    }

    fn split(&self, default: &ComponentState, canary: Option<&ComponentState>) -> Vec<WeightedDestination> {
        match canary {
            Some(canary) => vec![
                self.destination(default, MAX_TRAFFIC_PERCENT - self.canary_percent),
                self.destination(canary, self.canary_percent),
            ],
            None => vec![self.destination(default, MAX_TRAFFIC_PERCENT)],
        }
    }

    fn front(&self, variant: Variant) -> Option<&ComponentState> {
        self.states.declared(ComponentType::Transformer, variant).or_else(|| self.states.declared(ComponentType::Predictor, variant))
    }

    fn timeout(&self, component: ComponentType) -> Option<i64> {
        self.isvc.spec.component(component, Variant::Default).and_then(|spec| spec.timeout)
    }

    fn gateways(names: &[&str]) -> Vec<String> {
        names.iter().filter(|name| !name.is_empty()).map(|name| (*name).to_owned()).collect()
    }

    fn build(&self) -> Result<TopologyOutcome, TemplateError> {
        if let Some(blocking) = self.states.first_blocking() {
            return Ok(not_ready(blocking));
        }
        let Some(predictor) = self.states.declared(ComponentType::Predictor, Variant::Default) else {
            return Ok(TopologyOutcome::NotReady(Condition::not_ready(ConditionType::IngressReady, "Predictor ingress not created", None)));
        };
        let canary_predictor = self.states.declared(ComponentType::Predictor, Variant::Canary);
        let front = self.front(Variant::Default).unwrap_or(predictor);
        let canary_front = canary_predictor.and_then(|_| self.front(Variant::Canary));

        let name = self.isvc.name_any();
        let config = self.config;
        let cluster_local = config.is_cluster_local(self.isvc.labels());
        let internal_host = format!("{name}.{}.svc.{}", self.namespace, config.cluster_domain);
        let internal_gateways = Self::gateways(&[config.local_gateway.as_str(), ISTIO_MESH_GATEWAY]);
        let external_gateways = Self::gateways(&[config.ingress_gateway.as_str()]);

        let (external_host, additional_hosts, url_path) = if cluster_local {
            (None, vec![], String::new())
        } else {
            let external_host = domain::generate_domain_name(&name, &self.isvc.metadata, config)?;
            let additional_hosts =
                domain::additional_hosts(std::slice::from_ref(&config.ingress_domain), &external_host, &config.additional_ingress_domains);
            let url_path = domain::generate_url_path(&name, &self.namespace, config)?;
            (Some(external_host), additional_hosts, url_path)
        };

        let mut service_matches = vec![RouteMatch { uri: None, authority: internal_host.clone(), gateways: internal_gateways.clone() }];
        for host in external_host.iter().chain(additional_hosts.iter()) {
            service_matches.push(RouteMatch { uri: None, authority: host.clone(), gateways: external_gateways.clone() });
        }

        let mut rules = vec![];
        let explainer = self.states.declared(ComponentType::Explainer, Variant::Default);
        let canary_explainer = canary_predictor.and_then(|_| self.states.declared(ComponentType::Explainer, Variant::Canary));
        let explain_destinations = match (explainer, canary_explainer) {
            (Some(explainer), canary_explainer) => Some((self.split(explainer, canary_explainer), Variant::Default)),
            (None, Some(canary_explainer)) => Some((vec![self.destination(canary_explainer, MAX_TRAFFIC_PERCENT)], Variant::Canary)),
            (None, None) => None,
        };
        if let Some((destinations, variant)) = explain_destinations {
            rules.push(RouteRule {
                kind: RuleKind::Explain,
                matches: service_matches
                    .iter()
                    .map(|route_match| RouteMatch { uri: Some(UriMatch::Regex(EXPLAIN_PATH_REGEX.to_owned())), ..route_match.clone() })
                    .collect(),
                destinations,
                rewrite_uri: None,
                timeout: self.isvc.spec.component(ComponentType::Explainer, variant).and_then(|spec| spec.timeout),
            });
        }

        rules.push(RouteRule {
            kind: RuleKind::Predict,
            matches: service_matches,
            destinations: self.split(front, canary_front),
            rewrite_uri: None,
            timeout: self.timeout(front.component),
        });

        let mut path_host = None;
        if !url_path.is_empty() {
            for (kind, uri) in [(RuleKind::PathExact, UriMatch::Exact(url_path.clone())), (RuleKind::PathPrefix, UriMatch::Prefix(format!("{url_path}/")))] {
                rules.push(RouteRule {
                    kind,
                    matches: vec![RouteMatch { uri: Some(uri), authority: config.ingress_domain.clone(), gateways: external_gateways.clone() }],
                    destinations: self.split(front, canary_front),
                    rewrite_uri: Some("/".to_owned()),
                    timeout: self.timeout(front.component),
                });
            }
            path_host = Some(config.ingress_domain.clone());
        }

        let (predictor_host, predictor_gateways) = if cluster_local {
            (predictor.scheme.internal_host(&self.namespace, &config.cluster_domain), Self::gateways(&[config.local_gateway.as_str()]))
        } else {
            (domain::generate_domain_name(&predictor.service_name(), &self.isvc.metadata, config)?, external_gateways.clone())
        };
        rules.push(RouteRule {
            kind: RuleKind::PredictorOnly,
            matches: vec![RouteMatch { uri: None, authority: predictor_host.clone(), gateways: predictor_gateways }],
            destinations: self.split(predictor, canary_predictor),
            rewrite_uri: None,
            timeout: self.timeout(ComponentType::Predictor),
        });

        let hosts = std::iter::once(internal_host.clone())
            .chain(external_host.clone())
            .chain(additional_hosts)
            .chain(path_host)
            .chain(std::iter::once(predictor_host))
            .unique()
            .collect::<Vec<_>>();
        let gateways = rules.iter().flat_map(|rule| rule.matches.iter()).flat_map(|route_match| route_match.gateways.iter().cloned()).unique().collect();

        let url = match &external_host {
            None => format!("{INTERNAL_URL_SCHEME}://{internal_host}"),
            Some(_) if !url_path.is_empty() => format!("{}://{}{url_path}", config.url_scheme, config.ingress_domain),
            Some(host) => format!("{}://{host}", config.url_scheme),
        };
        let traffic = if canary_predictor.is_some() {
            TrafficSplit { default: MAX_TRAFFIC_PERCENT - self.canary_percent, canary: self.canary_percent }
        } else {
            TrafficSplit { default: MAX_TRAFFIC_PERCENT, canary: 0 }
        };

        Ok(TopologyOutcome::Ready(Box::new(RouteTopology {
            name,
            namespace: self.namespace.clone(),
            hosts,
            internal_host,
            external_host,
            front_service_host: front.scheme.internal_host(&self.namespace, &config.cluster_domain),
            cluster_local,
            gateways,
            rules,
            url,
            traffic,
        })))
    }
}

/// Derives the routing topology of an inference service from its component states. Pure: no cluster access.
///
/// Explain rules precede the catch-all predict rule and the predictor-only rule always comes last. Template errors in
/// the domain or path template fail the build; component readiness never does.
pub fn build(isvc: &InferenceService, states: &ComponentStates, config: &IngressConfig) -> Result<TopologyOutcome, TemplateError> {
    TopologyBuilder {
        isvc,
        states,
        config,
        namespace: isvc.namespace().unwrap_or_default(),
        canary_percent: isvc.spec.canary_traffic_percent(),
    }
    .build()
}
