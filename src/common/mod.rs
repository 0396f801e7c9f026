// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

mod resource_key;
pub use resource_key::{ResourceKey, DEFAULT_GROUP_NAME, DEFAULT_KIND_NAME, DEFAULT_NAMESPACE_NAME};

pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
pub const DEFAULT_HTTP_PORT: u16 = 80;

pub const ISTIO_MESH_GATEWAY: &str = "mesh";
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";
pub const GATEWAY_KIND: &str = "Gateway";
pub const SERVICE_KIND: &str = "Service";

pub const VISIBILITY_LABEL: &str = "networking.kserve.io/visibility";
pub const KNATIVE_VISIBILITY_LABEL: &str = "networking.knative.dev/visibility";
pub const CLUSTER_LOCAL_VISIBILITY: &str = "cluster-local";

pub const ISVC_NAME_HEADER: &str = "Isvc-Name";
pub const ISVC_NAMESPACE_HEADER: &str = "Isvc-Namespace";
pub const HOST_HEADER: &str = "Host";

pub const EXPLAIN_PATH_REGEX: &str = r"^/v1/models/[\w-]+:explain$";

pub fn format_resource<R>() -> &'static str {
    std::any::type_name::<R>().split("::").last().unwrap_or_default()
}

/// Regular expression matching a host with an optional port, as sent in the `Host`/`:authority` header.
pub fn host_regex(host: &str) -> String {
    format!("^{}(:[0-9]+)?$", regex::escape(host))
}
