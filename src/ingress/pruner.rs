// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use itertools::Itertools;
use kube::{Resource, ResourceExt};
use tracing::{debug, info};

use super::{
    naming::ServiceNameScheme,
    readiness::{ComponentState, ComponentStates},
};
use crate::{
    client::{ClusterResource, ResourceClient},
    crd::{ComponentType, ConditionType, InferenceService, InferenceServiceStatus, Variant, MAX_TRAFFIC_PERCENT},
    reconciler::{self, Result},
};

/// Removes what is left of component variants no longer present in the spec: the backing objects this inference
/// service controls and their status entries. Returns the number of deleted objects.
pub async fn prune_removed_components<K: ClusterResource, C: ResourceClient>(
    client: &C,
    isvc: &InferenceService,
    states: &ComponentStates,
    status: &mut InferenceServiceStatus,
) -> Result<usize> {
    let namespace = isvc.namespace().unwrap_or_default();
    let mut deleted = 0;
    for state in states.undeclared() {
        for name in candidate_names(state) {
            let Some(object) = client.get::<K>(&namespace, &name).await? else {
                continue;
            };
            if !is_controlled_by(&object, isvc) {
                debug!("Leaving {namespace}.{name} in place, not controlled by {}", isvc.name_any());
                continue;
            }
            if reconciler::delete_if_exists::<K, C>(client, &namespace, &name).await? {
                deleted += 1;
            }
        }
        clear_status(status, state);
    }

    let split_recorded = status.traffic.is_some() || status.canary_traffic.is_some();
    let all_to_default = (status.traffic, status.canary_traffic) == (Some(MAX_TRAFFIC_PERCENT), Some(0));
    if !isvc.spec.is_declared(ComponentType::Predictor, Variant::Canary) && split_recorded && !all_to_default {
        info!("Canary removed from {namespace}.{}, routing all traffic to the default variant", isvc.name_any());
        status.traffic = Some(MAX_TRAFFIC_PERCENT);
        status.canary_traffic = Some(0);
    }
    Ok(deleted)
}

fn candidate_names(state: &ComponentState) -> Vec<String> {
    let base_name = state.scheme.base_name();
    [
        ServiceNameScheme::canonical(base_name, state.component, state.variant),
        ServiceNameScheme::legacy(base_name, state.component, state.variant),
    ]
    .iter()
    .map(ServiceNameScheme::service_name)
    .unique()
    .collect()
}

fn is_controlled_by<K: Resource>(object: &K, isvc: &InferenceService) -> bool {
    let Some(uid) = isvc.uid() else {
        return false;
    };
    object.meta().owner_references.iter().flatten().any(|owner| owner.uid == uid)
}

fn clear_status(status: &mut InferenceServiceStatus, state: &ComponentState) {
    status.components_mut(state.variant).remove(&state.component);
    status.clear_condition(ConditionType::for_component(state.component, state.variant));
}
