// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::fmt::Display;

use crate::crd::{ComponentType, Variant};

const DEFAULT_SUFFIX: &str = "-default";
const CANARY_SUFFIX: &str = "-canary";

/// Naming of a component's backing service: `<base>-<component>`, `<base>-<component>-default` for services created by
/// older releases and `<base>-<component>-canary` for the canary variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceNameScheme {
    base_name: String,
    component: ComponentType,
    variant: Variant,
    uses_default_suffix: bool,
}

impl ServiceNameScheme {
    pub fn canonical(base_name: &str, component: ComponentType, variant: Variant) -> Self {
        Self { base_name: base_name.to_owned(), component, variant, uses_default_suffix: false }
    }

    pub fn legacy(base_name: &str, component: ComponentType, variant: Variant) -> Self {
        Self { base_name: base_name.to_owned(), component, variant, uses_default_suffix: true }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn component(&self) -> ComponentType {
        self.component
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn uses_default_suffix(&self) -> bool {
        self.uses_default_suffix
    }

    pub fn service_name(&self) -> String {
        match (self.variant, self.uses_default_suffix) {
            (Variant::Canary, _) => format!("{}-{}{CANARY_SUFFIX}", self.base_name, self.component),
            (Variant::Default, true) => format!("{}-{}{DEFAULT_SUFFIX}", self.base_name, self.component),
            (Variant::Default, false) => format!("{}-{}", self.base_name, self.component),
        }
    }

    pub fn internal_host(&self, namespace: &str, cluster_domain: &str) -> String {
        format!("{}.{namespace}.svc.{cluster_domain}", self.service_name())
    }

    pub fn parse(name: &str) -> Option<Self> {
        let (rest, variant, uses_default_suffix) = if let Some(rest) = name.strip_suffix(DEFAULT_SUFFIX) {
            (rest, Variant::Default, true)
        } else if let Some(rest) = name.strip_suffix(CANARY_SUFFIX) {
            (rest, Variant::Canary, false)
        } else {
            (name, Variant::Default, false)
        };

        ComponentType::ALL.iter().find_map(|component| {
            rest.strip_suffix(&format!("-{component}")).filter(|base| !base.is_empty()).map(|base_name| Self {
                base_name: base_name.to_owned(),
                component: *component,
                variant,
                uses_default_suffix,
            })
        })
    }

    /// Parses the first label of a host name.
    pub fn from_host(host: &str) -> Option<Self> {
        host.split('.').next().and_then(Self::parse)
    }
}

impl Display for ServiceNameScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.service_name())
    }
}
