// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::fmt::Display;

use k8s_openapi::{apimachinery::pkg::apis::meta::v1::Time, chrono::Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ComponentType, Variant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionType {
    PredictorReady,
    TransformerReady,
    ExplainerReady,
    CanaryPredictorReady,
    CanaryTransformerReady,
    CanaryExplainerReady,
    IngressReady,
    Ready,
}

impl ConditionType {
    pub const ALL: [ConditionType; 8] = [
        ConditionType::PredictorReady,
        ConditionType::TransformerReady,
        ConditionType::ExplainerReady,
        ConditionType::CanaryPredictorReady,
        ConditionType::CanaryTransformerReady,
        ConditionType::CanaryExplainerReady,
        ConditionType::IngressReady,
        ConditionType::Ready,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::PredictorReady => "PredictorReady",
            ConditionType::TransformerReady => "TransformerReady",
            ConditionType::ExplainerReady => "ExplainerReady",
            ConditionType::CanaryPredictorReady => "CanaryPredictorReady",
            ConditionType::CanaryTransformerReady => "CanaryTransformerReady",
            ConditionType::CanaryExplainerReady => "CanaryExplainerReady",
            ConditionType::IngressReady => "IngressReady",
            ConditionType::Ready => "Ready",
        }
    }

    pub fn for_component(component: ComponentType, variant: Variant) -> Self {
        match (variant, component) {
            (Variant::Default, ComponentType::Predictor) => ConditionType::PredictorReady,
            (Variant::Default, ComponentType::Transformer) => ConditionType::TransformerReady,
            (Variant::Default, ComponentType::Explainer) => ConditionType::ExplainerReady,
            (Variant::Canary, ComponentType::Predictor) => ConditionType::CanaryPredictorReady,
            (Variant::Canary, ComponentType::Transformer) => ConditionType::CanaryTransformerReady,
            (Variant::Canary, ComponentType::Explainer) => ConditionType::CanaryExplainerReady,
        }
    }
}

impl Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// Conditions without a severity are treated as errors and gate the aggregate `Ready` condition.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ConditionSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ConditionSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
}

impl Condition {
    pub fn ready(type_: ConditionType) -> Self {
        Self { type_: type_.as_str().to_owned(), status: ConditionStatus::True, ..Default::default() }
    }

    pub fn not_ready(type_: ConditionType, reason: &str, message: Option<String>) -> Self {
        Self { type_: type_.as_str().to_owned(), status: ConditionStatus::False, reason: Some(reason.to_owned()), message, ..Default::default() }
    }

    pub fn unknown(type_: ConditionType, reason: &str, message: Option<String>) -> Self {
        Self { type_: type_.as_str().to_owned(), status: ConditionStatus::Unknown, reason: Some(reason.to_owned()), message, ..Default::default() }
    }

    pub fn is(&self, type_: ConditionType) -> bool {
        self.type_ == type_.as_str()
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    fn gates_readiness(&self) -> bool {
        matches!(self.severity, None | Some(ConditionSeverity::Error))
    }

    fn same_state(&self, other: &Condition) -> bool {
        self.status == other.status && self.reason == other.reason && self.message == other.message && self.severity == other.severity
    }
}

pub trait Conditions {
    fn get_condition(&self, type_: ConditionType) -> Option<&Condition>;
    fn is_condition_true(&self, type_: ConditionType) -> bool;
    /// Replaces the condition of the same type. The transition time only moves when the condition actually changed.
    fn set_condition(&mut self, condition: Condition);
    fn clear_condition(&mut self, type_: ConditionType) -> bool;
    fn recompute_ready(&mut self);
}

impl Conditions for Vec<Condition> {
    fn get_condition(&self, type_: ConditionType) -> Option<&Condition> {
        self.iter().find(|c| c.is(type_))
    }

    fn is_condition_true(&self, type_: ConditionType) -> bool {
        self.get_condition(type_).is_some_and(Condition::is_true)
    }

    fn set_condition(&mut self, mut condition: Condition) {
        if let Some(existing) = self.iter_mut().find(|c| c.type_ == condition.type_) {
            if existing.same_state(&condition) {
                return;
            }
            condition.last_transition_time = if existing.status == condition.status {
                existing.last_transition_time.clone()
            } else {
                Some(Time(Utc::now()))
            };
            *existing = condition;
        } else {
            condition.last_transition_time = Some(Time(Utc::now()));
            self.push(condition);
        }
        self.sort_by_key(|c| ConditionType::ALL.iter().position(|t| c.is(*t)).unwrap_or(ConditionType::ALL.len()));
    }

    fn clear_condition(&mut self, type_: ConditionType) -> bool {
        let before = self.len();
        self.retain(|c| !c.is(type_));
        before != self.len()
    }

    fn recompute_ready(&mut self) {
        let dependents = self.iter().filter(|c| !c.is(ConditionType::Ready) && c.gates_readiness()).collect::<Vec<_>>();
        if dependents.is_empty() {
            self.clear_condition(ConditionType::Ready);
            return;
        }

        let first_false = dependents.iter().find(|c| c.status == ConditionStatus::False);
        let first_unknown = dependents.iter().find(|c| c.status == ConditionStatus::Unknown);
        let ready = match (first_false, first_unknown) {
            (Some(c), _) => {
                Condition::not_ready(ConditionType::Ready, c.reason.as_deref().unwrap_or(c.type_.as_str()), c.message.clone())
            },
            (None, Some(c)) => Condition::unknown(ConditionType::Ready, c.reason.as_deref().unwrap_or(c.type_.as_str()), c.message.clone()),
            (None, None) => Condition::ready(ConditionType::Ready),
        };
        self.set_condition(ready);
    }
}
