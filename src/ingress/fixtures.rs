// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;

use crate::{
    config::{IngressConfig, RuntimeConfig},
    crd::{CanarySpec, ComponentSpec, Condition, ConditionType, ComponentType, InferenceService, InferenceServiceSpec, KnativeService, Variant},
};

pub const UID: &str = "9f6b2a3c-3f56-4d3e-8c1d-5b8f6b3e1a10";

pub fn predictor(storage_uri: &str) -> ComponentSpec {
    ComponentSpec {
        runtime: BTreeMap::from([("tensorflow".to_owned(), serde_json::json!({ "storageUri": storage_uri }))]),
        ..Default::default()
    }
}

pub fn inference_service(name: &str) -> InferenceService {
    let mut isvc = InferenceService::new(name, InferenceServiceSpec { predictor: predictor("s3://test/mnist/export"), ..Default::default() });
    isvc.metadata = ObjectMeta {
        name: Some(name.to_owned()),
        namespace: Some("default".to_owned()),
        uid: Some(UID.to_owned()),
        generation: Some(1),
        ..Default::default()
    };
    isvc
}

pub fn with_canary(mut isvc: InferenceService, percent: i64) -> InferenceService {
    isvc.spec.canary = Some(CanarySpec { predictor: predictor("s3://test/mnist-2/export"), ..Default::default() });
    isvc.spec.canary_traffic_percent = Some(percent);
    isvc
}

/// Marks every declared component variant ready.
pub fn ready(mut isvc: InferenceService) -> InferenceService {
    for variant in Variant::ALL {
        for component in ComponentType::ALL {
            if isvc.spec.is_declared(component, variant) {
                isvc.status_mut().set_condition(Condition::ready(ConditionType::for_component(component, variant)));
            }
        }
    }
    isvc
}

pub fn ingress_config() -> IngressConfig {
    IngressConfig::builder()
        .ingress_gateway("knative-serving/knative-ingress-gateway")
        .kserve_ingress_gateway("kserve/kserve-ingress-gateway")
        .ingress_service("istio-ingressgateway.istio-system.svc.cluster.local")
        .local_gateway("knative-serving/knative-local-gateway")
        .local_gateway_service("knative-local-gateway.istio-system.svc.cluster.local")
        .ingress_domain("example.com")
        .build()
}

pub fn runtime_config(ingress: IngressConfig) -> RuntimeConfig {
    RuntimeConfig::builder().ingress(ingress).build()
}

/// Knative service in `default` controlled by the inference service with `owner_uid`.
pub fn owned_knative_service(name: &str, owner_uid: &str) -> KnativeService {
    let mut service = KnativeService::new(name, Default::default());
    service.metadata = ObjectMeta {
        name: Some(name.to_owned()),
        namespace: Some("default".to_owned()),
        owner_references: Some(vec![OwnerReference {
            api_version: "serving.kserve.io/v1beta1".to_owned(),
            kind: "InferenceService".to_owned(),
            name: "foo".to_owned(),
            uid: owner_uid.to_owned(),
            controller: Some(true),
            block_owner_deletion: None,
        }]),
        ..Default::default()
    };
    service
}
