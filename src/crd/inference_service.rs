// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{collections::BTreeMap, fmt::Display};

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::conditions::{Condition, ConditionType, Conditions};

pub const MAX_TRAFFIC_PERCENT: i64 = 100;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Predictor,
    Transformer,
    Explainer,
}

impl ComponentType {
    pub const ALL: [ComponentType; 3] = [ComponentType::Predictor, ComponentType::Transformer, ComponentType::Explainer];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Predictor => "predictor",
            ComponentType::Transformer => "transformer",
            ComponentType::Explainer => "explainer",
        }
    }
}

impl Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    Default,
    Canary,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Default, Variant::Canary];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Default => "default",
            Variant::Canary => "canary",
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single serving component. Everything apart from the routing relevant fields is kept opaque.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<i32>,
    #[serde(flatten)]
    pub runtime: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanarySpec {
    pub predictor: ComponentSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explainer: Option<ComponentSpec>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(group = "serving.kserve.io", version = "v1beta1", kind = "InferenceService", namespaced, shortname = "isvc")]
#[kube(status = "InferenceServiceStatus")]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceSpec {
    pub predictor: ComponentSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explainer: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canary: Option<CanarySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canary_traffic_percent: Option<i64>,
}

impl InferenceServiceSpec {
    pub fn component(&self, component: ComponentType, variant: Variant) -> Option<&ComponentSpec> {
        match variant {
            Variant::Default => match component {
                ComponentType::Predictor => Some(&self.predictor),
                ComponentType::Transformer => self.transformer.as_ref(),
                ComponentType::Explainer => self.explainer.as_ref(),
            },
            Variant::Canary => self.canary.as_ref().and_then(|canary| match component {
                ComponentType::Predictor => Some(&canary.predictor),
                ComponentType::Transformer => canary.transformer.as_ref(),
                ComponentType::Explainer => canary.explainer.as_ref(),
            }),
        }
    }

    pub fn is_declared(&self, component: ComponentType, variant: Variant) -> bool {
        self.component(component, variant).is_some()
    }

    /// Share of the traffic sent to the canary, clamped to `[0, 100]`. Zero without a canary.
    pub fn canary_traffic_percent(&self) -> i64 {
        if self.canary.is_some() {
            self.canary_traffic_percent.unwrap_or_default().clamp(0, MAX_TRAFFIC_PERCENT)
        } else {
            0
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfigurationSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hostname: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct Addressable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Addressable>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default: BTreeMap<ComponentType, StatusConfigurationSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub canary: BTreeMap<ComponentType, StatusConfigurationSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canary_traffic: Option<i64>,
}

impl InferenceServiceStatus {
    pub fn components(&self, variant: Variant) -> &BTreeMap<ComponentType, StatusConfigurationSpec> {
        match variant {
            Variant::Default => &self.default,
            Variant::Canary => &self.canary,
        }
    }

    pub fn components_mut(&mut self, variant: Variant) -> &mut BTreeMap<ComponentType, StatusConfigurationSpec> {
        match variant {
            Variant::Default => &mut self.default,
            Variant::Canary => &mut self.canary,
        }
    }

    pub fn is_condition_true(&self, type_: ConditionType) -> bool {
        self.conditions.is_condition_true(type_)
    }

    pub fn get_condition(&self, type_: ConditionType) -> Option<&Condition> {
        self.conditions.get_condition(type_)
    }

    /// Sets a condition and recomputes the aggregate `Ready` condition.
    pub fn set_condition(&mut self, condition: Condition) {
        self.conditions.set_condition(condition);
        self.conditions.recompute_ready();
    }

    pub fn clear_condition(&mut self, type_: ConditionType) -> bool {
        let cleared = self.conditions.clear_condition(type_);
        if cleared {
            self.conditions.recompute_ready();
        }
        cleared
    }
}

impl InferenceService {
    pub fn status_mut(&mut self) -> &mut InferenceServiceStatus {
        self.status.get_or_insert_with(InferenceServiceStatus::default)
    }

    pub fn is_component_ready(&self, component: ComponentType, variant: Variant) -> bool {
        self.status.as_ref().is_some_and(|status| status.is_condition_true(ConditionType::for_component(component, variant)))
    }
}
