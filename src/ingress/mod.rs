// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

pub mod backends;
pub mod domain;
pub mod external_service;
pub mod metadata;
pub mod naming;
pub mod pruner;
pub mod readiness;
pub mod reconciler;
pub mod status;
pub mod topology;

#[cfg(test)]
pub mod fixtures;

pub use backends::{HttpRouteBackend, IngressBackend, IngressReadiness, RouteBackend, VirtualServiceBackend};
pub use reconciler::IngressReconciler;
