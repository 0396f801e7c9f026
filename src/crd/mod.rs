// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

pub mod conditions;
mod inference_service;
pub mod istio;
pub mod knative;

pub use conditions::{Condition, ConditionSeverity, ConditionStatus, ConditionType, Conditions};
pub use inference_service::{
    Addressable, CanarySpec, ComponentSpec, ComponentType, InferenceService, InferenceServiceSpec, InferenceServiceStatus, StatusConfigurationSpec, Variant,
    MAX_TRAFFIC_PERCENT,
};
pub use istio::VirtualService;
pub use knative::KnativeService;
