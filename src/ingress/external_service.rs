// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};

use super::{backends::object_meta, metadata::RenderedMetadata};
use crate::{
    client::ResourceClient,
    common::DEFAULT_HTTP_PORT,
    config::IngressConfig,
    crd::InferenceService,
    reconciler::{self, ApplyOutcome, Result},
};

const EXTERNAL_NAME_SERVICE_TYPE: &str = "ExternalName";
const HTTP_PORT_NAME: &str = "http";

/// `ExternalName` service answering for `<isvc>.<namespace>.svc` and resolving to the local gateway, so in-mesh callers
/// reach the VirtualService through the inference service host.
pub fn desired_external_service(isvc: &InferenceService, metadata: &RenderedMetadata, config: &IngressConfig) -> Result<Service> {
    Ok(Service {
        metadata: object_meta(isvc, metadata)?,
        spec: Some(ServiceSpec {
            type_: Some(EXTERNAL_NAME_SERVICE_TYPE.to_owned()),
            external_name: Some(config.local_gateway_service.clone()),
            session_affinity: Some("None".to_owned()),
            ports: Some(vec![ServicePort {
                name: Some(HTTP_PORT_NAME.to_owned()),
                protocol: Some("TCP".to_owned()),
                port: i32::from(DEFAULT_HTTP_PORT),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    })
}

pub async fn reconcile_external_service<C: ResourceClient>(
    client: &C,
    isvc: &InferenceService,
    metadata: &RenderedMetadata,
    config: &IngressConfig,
) -> Result<ApplyOutcome<Service>> {
    let desired = desired_external_service(isvc, metadata, config)?;
    reconciler::get_or_create_or_update(client, &desired, reconciler::derivative_equals, false).await
}
