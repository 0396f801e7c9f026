// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use super::{backends::IngressReadiness, topology::RouteTopology};
use crate::crd::{Addressable, Condition, ConditionType, InferenceServiceStatus};

/// Publishes a ready topology: URL, address, traffic split and `IngressReady` from the routing object's readiness.
pub fn apply_ready(status: &mut InferenceServiceStatus, topology: &RouteTopology, fronted: bool, readiness: &IngressReadiness) {
    status.url = Some(topology.url.clone());
    status.address = Some(Addressable { url: Some(topology.address_url(fronted)) });
    status.traffic = Some(topology.traffic.default);
    status.canary_traffic = Some(topology.traffic.canary);

    let condition = match readiness {
        IngressReadiness::Ready => Condition::ready(ConditionType::IngressReady),
        IngressReadiness::NotReady { reason, message } => Condition::not_ready(ConditionType::IngressReady, reason, Some(message.clone())),
    };
    status.set_condition(condition);
}

/// A component is still coming up. The previously published URL stays in place.
pub fn apply_not_ready(status: &mut InferenceServiceStatus, condition: Condition) {
    status.set_condition(condition);
}
