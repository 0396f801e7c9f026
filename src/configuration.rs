// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{
    config::{IngressBackendKind, INFERENCE_SERVICE_CONFIG_MAP_NAME, KSERVE_NAMESPACE},
    Result,
};

fn default_config_map_name() -> String {
    INFERENCE_SERVICE_CONFIG_MAP_NAME.to_owned()
}

fn default_config_map_namespace() -> String {
    KSERVE_NAMESPACE.to_owned()
}

#[derive(Debug, TypedBuilder, Deserialize)]
pub struct Configuration {
    #[builder(setter(into))]
    pub controller_name: String,
    #[builder(default)]
    pub enable_open_telemetry: Option<bool>,
    #[serde(default = "default_config_map_name")]
    #[builder(default = default_config_map_name(), setter(into))]
    pub config_map_name: String,
    #[serde(default = "default_config_map_namespace")]
    #[builder(default = default_config_map_namespace(), setter(into))]
    pub config_map_namespace: String,
    /// Forces a backend instead of deriving it from the ingress configuration.
    #[serde(default)]
    #[builder(default)]
    pub ingress_backend: Option<IngressBackendKind>,
}

#[derive(Error, Debug)]
enum ConfigurationError {
    #[error("controller name must be not empty")]
    ControllerName,
    #[error("config map name and namespace must be not empty")]
    ConfigMap,
}

impl Configuration {
    pub fn validate(&self) -> Result<()> {
        if self.controller_name.is_empty() {
            return Err(ConfigurationError::ControllerName.into());
        }
        if self.config_map_name.is_empty() || self.config_map_namespace.is_empty() {
            return Err(ConfigurationError::ConfigMap.into());
        }
        Ok(())
    }
}
