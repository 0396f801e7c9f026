// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Knative Service backing a serverless component. Only its identity is used here, the spec is owned by the component
/// reconcilers.
/// API: serving.knative.dev/v1
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(group = "serving.knative.dev", version = "v1", kind = "Service", root = "KnativeService", namespaced)]
#[kube(status = "KnativeServiceStatus")]
pub struct KnativeServiceSpec {
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct KnativeServiceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "latestReadyRevisionName")]
    pub latest_ready_revision_name: Option<String>,

    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}
