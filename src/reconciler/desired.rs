// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use gateway_api::apis::standard::httproutes::{HTTPRoute, HTTPRouteSpec};
use k8s_openapi::api::{
    core::v1::{Service, ServiceSpec},
    networking::v1::{Ingress, IngressSpec},
};
use serde::Serialize;

use crate::{
    client::ClusterResource,
    crd::{istio::VirtualServiceSpec, VirtualService},
};

/// The part of an object the reconciler owns and overwrites on update.
pub trait DesiredState: ClusterResource {
    type Spec: Serialize;

    fn desired_spec(&self) -> Option<&Self::Spec>;
    fn copy_spec_into(&self, existing: &mut Self);
}

impl DesiredState for VirtualService {
    type Spec = VirtualServiceSpec;

    fn desired_spec(&self) -> Option<&Self::Spec> {
        Some(&self.spec)
    }

    fn copy_spec_into(&self, existing: &mut Self) {
        existing.spec = self.spec.clone();
    }
}

impl DesiredState for HTTPRoute {
    type Spec = HTTPRouteSpec;

    fn desired_spec(&self) -> Option<&Self::Spec> {
        Some(&self.spec)
    }

    fn copy_spec_into(&self, existing: &mut Self) {
        existing.spec = self.spec.clone();
    }
}

impl DesiredState for Ingress {
    type Spec = IngressSpec;

    fn desired_spec(&self) -> Option<&Self::Spec> {
        self.spec.as_ref()
    }

    fn copy_spec_into(&self, existing: &mut Self) {
        existing.spec.clone_from(&self.spec);
    }
}

impl DesiredState for Service {
    type Spec = ServiceSpec;

    fn desired_spec(&self) -> Option<&Self::Spec> {
        self.spec.as_ref()
    }

    fn copy_spec_into(&self, existing: &mut Self) {
        existing.spec.clone_from(&self.spec);
    }
}
