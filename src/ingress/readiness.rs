// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::{debug, warn};

use super::naming::ServiceNameScheme;
use crate::{
    client::ResourceClient,
    crd::{ComponentType, InferenceService, Variant},
};

/// Finds the service actually backing a component, preferring the `-default` suffixed name created by older releases.
#[derive(Clone)]
pub struct ServiceNameResolver<C> {
    client: C,
}

impl<C: ResourceClient> ServiceNameResolver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, namespace: &str, base_name: &str, component: ComponentType, variant: Variant) -> Result<ServiceNameScheme, kube::Error> {
        let canonical = ServiceNameScheme::canonical(base_name, component, variant);
        if variant == Variant::Canary {
            return Ok(canonical);
        }

        let legacy = ServiceNameScheme::legacy(base_name, component, variant);
        if self.exists(namespace, &legacy.service_name()).await? {
            return Ok(legacy);
        }
        if !self.exists(namespace, &canonical.service_name()).await? {
            debug!("No service found for {namespace}.{canonical}, assuming the canonical name");
        }
        Ok(canonical)
    }

    async fn exists(&self, namespace: &str, name: &str) -> Result<bool, kube::Error> {
        Ok(self.client.get::<Service>(namespace, name).await?.is_some())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComponentState {
    pub component: ComponentType,
    pub variant: Variant,
    pub declared: bool,
    pub ready: bool,
    pub scheme: ServiceNameScheme,
}

impl ComponentState {
    pub fn service_name(&self) -> String {
        self.scheme.service_name()
    }

    /// Reason used on `IngressReady` while this component blocks the route.
    pub fn not_ready_reason(&self) -> String {
        let component = match self.component {
            ComponentType::Predictor => "Predictor",
            ComponentType::Transformer => "Transformer",
            ComponentType::Explainer => "Explainer",
        };
        match self.variant {
            Variant::Default => format!("{component} ingress not created"),
            Variant::Canary => format!("Canary {} ingress not created", self.component),
        }
    }
}

/// Readiness and resolved naming of every component variant of one inference service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentStates {
    states: BTreeMap<(ComponentType, Variant), ComponentState>,
}

impl ComponentStates {
    pub async fn evaluate<C: ResourceClient>(isvc: &InferenceService, resolver: &ServiceNameResolver<C>) -> Result<Self, kube::Error> {
        let name = isvc.name_any();
        let namespace = isvc.namespace().unwrap_or_default();
        let mut states = BTreeMap::new();
        for variant in Variant::ALL {
            for component in ComponentType::ALL {
                let declared = isvc.spec.is_declared(component, variant);
                let scheme = if declared {
                    let scheme = resolver.resolve(&namespace, &name, component, variant).await?;
                    if let Some(reported) = reported_scheme(isvc, component, variant).filter(|reported| reported != &scheme) {
                        warn!("{namespace}.{name} status reports {variant} {component} at {reported}, routing to {scheme}");
                    }
                    scheme
                } else {
                    ServiceNameScheme::canonical(&name, component, variant)
                };
                let ready = declared && isvc.is_component_ready(component, variant);
                states.insert((component, variant), ComponentState { component, variant, declared, ready, scheme });
            }
        }
        Ok(Self { states })
    }

    pub fn get(&self, component: ComponentType, variant: Variant) -> Option<&ComponentState> {
        self.states.get(&(component, variant))
    }

    /// The state of a component variant present in the spec.
    pub fn declared(&self, component: ComponentType, variant: Variant) -> Option<&ComponentState> {
        self.get(component, variant).filter(|state| state.declared)
    }

    pub fn undeclared(&self) -> impl Iterator<Item = &ComponentState> {
        self.states.values().filter(|state| !state.declared)
    }

    /// First declared component variant that is not ready, predictor first.
    pub fn first_blocking(&self) -> Option<&ComponentState> {
        [ComponentType::Predictor, ComponentType::Explainer, ComponentType::Transformer]
            .into_iter()
            .flat_map(|component| Variant::ALL.into_iter().map(move |variant| (component, variant)))
            .filter_map(|(component, variant)| self.declared(component, variant))
            .find(|state| !state.ready)
    }
}

/// Naming of the service the component's status entry reports as its host, if it belongs to this component.
fn reported_scheme(isvc: &InferenceService, component: ComponentType, variant: Variant) -> Option<ServiceNameScheme> {
    let entry = isvc.status.as_ref()?.components(variant).get(&component)?;
    ServiceNameScheme::from_host(&entry.hostname).filter(|scheme| {
        scheme.base_name() == isvc.name_any() && scheme.component() == component && scheme.variant() == variant
    })
}
