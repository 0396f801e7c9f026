// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{collections::BTreeMap, fmt::Display};

use async_trait::async_trait;

use super::{duration, object_meta, RouteBackend};
use crate::{
    common::{host_regex, HOST_HEADER},
    config::{IngressBackendKind, IngressConfig},
    crd::{
        istio::{Destination, HTTPMatchRequest, HTTPRewrite, HTTPRoute, HTTPRouteDestination, Headers, PortSelector, StringMatch, VirtualServiceSpec},
        InferenceService, KnativeService, VirtualService,
    },
    ingress::{
        metadata::RenderedMetadata,
        topology::{RouteRule, RouteTopology, UriMatch},
    },
    reconciler::Result,
};

/// Routes through the Istio ingress and local gateways. Every destination is the local gateway service with the
/// component host carried in the `Host` header, so Knative picks the revision.
#[derive(Clone, Debug, Default)]
pub struct VirtualServiceBackend;

impl Display for VirtualServiceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VirtualService")
    }
}

fn string_match(uri: &UriMatch) -> StringMatch {
    match uri {
        UriMatch::Exact(path) => StringMatch::Exact(path.clone()),
        UriMatch::Prefix(path) => StringMatch::Prefix(path.clone()),
        UriMatch::Regex(regex) => StringMatch::Regex(regex.clone()),
    }
}

fn http_route(rule: &RouteRule, config: &IngressConfig) -> HTTPRoute {
    let matches = rule
        .matches
        .iter()
        .map(|route_match| HTTPMatchRequest {
            uri: route_match.uri.as_ref().map(string_match),
            authority: Some(StringMatch::Regex(host_regex(&route_match.authority))),
            gateways: route_match.gateways.clone(),
        })
        .collect();

    let route = rule
        .destinations
        .iter()
        .map(|destination| {
            let host = if config.local_gateway_service.is_empty() { destination.host.clone() } else { config.local_gateway_service.clone() };
            HTTPRouteDestination {
                destination: Destination { host, port: Some(PortSelector { number: u32::from(destination.port) }) },
                weight: Some(i32::try_from(destination.weight).unwrap_or_default()),
                headers: Some(Headers::set_request(BTreeMap::from([(HOST_HEADER.to_owned(), destination.host.clone())]))),
            }
        })
        .collect();

    HTTPRoute {
        name: Some(rule.kind.as_str().to_owned()),
        matches,
        route,
        rewrite: rule.rewrite_uri.as_ref().map(|uri| HTTPRewrite { uri: Some(uri.clone()), authority: None }),
        timeout: rule.timeout.map(duration),
        headers: None,
    }
}

#[async_trait]
impl RouteBackend for VirtualServiceBackend {
    type Object = VirtualService;
    type ComponentObject = KnativeService;

    fn kind(&self) -> IngressBackendKind {
        IngressBackendKind::VirtualService
    }

    fn build_desired(&self, isvc: &InferenceService, topology: &RouteTopology, metadata: &RenderedMetadata, config: &IngressConfig) -> Result<VirtualService> {
        Ok(VirtualService {
            metadata: object_meta(isvc, metadata)?,
            spec: VirtualServiceSpec {
                hosts: topology.hosts.clone(),
                gateways: topology.gateways.clone(),
                http: topology.rules.iter().map(|rule| http_route(rule, config)).collect(),
            },
        })
    }

    fn object_creation_disabled(&self, config: &IngressConfig, _topology: &RouteTopology) -> bool {
        config.disable_ingress_creation || config.disable_istio_virtual_host
    }

    fn needs_external_name_service(&self, config: &IngressConfig) -> bool {
        !config.disable_istio_virtual_host
    }
}
