// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

mod http_route;
mod ingress;
mod virtual_service;

use std::fmt::Display;

use async_trait::async_trait;
use kube::{Resource, ResourceExt};
use kube_core::ObjectMeta;

pub use http_route::HttpRouteBackend;
pub use ingress::IngressBackend;
pub use virtual_service::VirtualServiceBackend;

use super::{metadata::RenderedMetadata, topology::RouteTopology};
use crate::{
    client::{ClusterResource, ResourceClient},
    config::{IngressBackendKind, IngressConfig},
    crd::InferenceService,
    reconciler::{self, ApplyOutcome, DesiredState, ReconcileError, Result},
};

/// What the routing object itself reports once written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngressReadiness {
    Ready,
    NotReady { reason: String, message: String },
}

/// One way of exposing an inference service: an Istio VirtualService, a Kubernetes Ingress or a Gateway API HTTPRoute.
#[async_trait]
pub trait RouteBackend: Display + Send + Sync + 'static {
    type Object: DesiredState;
    /// The object backing a single component variant, removed once the variant leaves the spec.
    type ComponentObject: ClusterResource;

    fn kind(&self) -> IngressBackendKind;

    fn build_desired(&self, isvc: &InferenceService, topology: &RouteTopology, metadata: &RenderedMetadata, config: &IngressConfig) -> Result<Self::Object>;

    fn semantic_equals(&self, desired: &Self::Object, existing: &Self::Object) -> Result<bool> {
        reconciler::semantic_equals(desired, existing)
    }

    /// Compare against a dry-run update so fields defaulted by the API server never show up as a difference.
    fn dry_run_before_compare(&self) -> bool {
        false
    }

    fn readiness(&self, _object: &Self::Object) -> IngressReadiness {
        IngressReadiness::Ready
    }

    fn object_creation_disabled(&self, config: &IngressConfig, _topology: &RouteTopology) -> bool {
        config.disable_ingress_creation
    }

    /// Whether the inference service host needs an ExternalName service pointing at the local gateway.
    fn needs_external_name_service(&self, _config: &IngressConfig) -> bool {
        false
    }

    async fn get_or_create_or_update<C: ResourceClient>(&self, client: &C, desired: &Self::Object) -> Result<ApplyOutcome<Self::Object>> {
        reconciler::get_or_create_or_update(client, desired, |desired, existing| self.semantic_equals(desired, existing), self.dry_run_before_compare())
            .await
    }
}

/// Metadata shared by every routing object: same name and namespace as the inference service, rendered labels and
/// annotations and a controller owner reference.
pub(crate) fn object_meta(isvc: &InferenceService, metadata: &RenderedMetadata) -> Result<ObjectMeta> {
    let Some(owner_reference) = isvc.controller_owner_ref(&()) else {
        return Err(ReconcileError::InvalidResource(format!("inference service {} has no uid", isvc.name_any())));
    };
    Ok(ObjectMeta {
        name: Some(isvc.name_any()),
        namespace: isvc.namespace(),
        labels: Some(metadata.labels.clone()),
        annotations: Some(metadata.annotations.clone()),
        owner_references: Some(vec![owner_reference]),
        ..Default::default()
    })
}

/// Gateway API style duration for a timeout in seconds.
pub(crate) fn duration(seconds: i64) -> String {
    format!("{seconds}s")
}
