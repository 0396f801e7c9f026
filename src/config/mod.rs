// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::{
    client::ResourceClient,
    common::{CLUSTER_LOCAL_VISIBILITY, DEFAULT_CLUSTER_DOMAIN},
    reconciler::ReconcileError,
};

pub const INFERENCE_SERVICE_CONFIG_MAP_NAME: &str = "inferenceservice-config";
pub const KSERVE_NAMESPACE: &str = "kserve";

const INGRESS_CONFIG_KEY: &str = "ingress";
const DEPLOY_CONFIG_KEY: &str = "deploy";
const INFERENCE_SERVICE_CONFIG_KEY: &str = "inferenceService";

pub const DEFAULT_DOMAIN_TEMPLATE: &str = "{{ .Name }}.{{ .Namespace }}.{{ .IngressDomain }}";
pub const DEFAULT_URL_SCHEME: &str = "http";
const LAST_APPLIED_CONFIGURATION_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config map {0} not found")]
    ConfigMapNotFound(String),
    #[error("config map key {0} is missing")]
    MissingKey(&'static str),
    #[error("unable to parse {key}: {source}")]
    Parse {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid ingress config: {0}")]
    InvalidIngress(String),
    #[error("invalid gateway reference {0}, expected <namespace>/<name>")]
    InvalidGatewayReference(String),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TlsTemplate {
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub secret_name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfig {
    #[builder(setter(into))]
    pub ingress_gateway: String,
    #[serde(default)]
    #[builder(default, setter(into))]
    pub kserve_ingress_gateway: String,
    #[builder(setter(into))]
    pub ingress_service: String,
    #[serde(default)]
    #[builder(default, setter(into))]
    pub local_gateway: String,
    #[serde(default)]
    #[builder(default, setter(into))]
    pub local_gateway_service: String,
    #[serde(default)]
    #[builder(default, setter(into))]
    pub ingress_domain: String,
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub ingress_class_name: Option<String>,
    #[serde(default)]
    #[builder(default = DEFAULT_DOMAIN_TEMPLATE.to_owned(), setter(into))]
    pub domain_template: String,
    #[serde(default)]
    #[builder(default, setter(into))]
    pub path_template: String,
    #[serde(default)]
    #[builder(default = DEFAULT_URL_SCHEME.to_owned(), setter(into))]
    pub url_scheme: String,
    #[serde(default)]
    #[builder(default)]
    pub disable_istio_virtual_host: bool,
    #[serde(default)]
    #[builder(default)]
    pub disable_ingress_creation: bool,
    #[serde(default)]
    #[builder(default)]
    pub additional_ingress_domains: Vec<String>,
    #[serde(default)]
    #[builder(default)]
    pub enable_gateway_api: bool,
    /// Annotation templates rendered onto every produced routing object.
    #[serde(default)]
    #[builder(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    #[builder(default)]
    pub tls: Vec<TlsTemplate>,
    #[serde(default)]
    #[builder(default = DEFAULT_CLUSTER_DOMAIN.to_owned(), setter(into))]
    pub cluster_domain: String,
}

impl IngressConfig {
    fn with_defaults(mut self) -> Self {
        if self.domain_template.is_empty() {
            DEFAULT_DOMAIN_TEMPLATE.clone_into(&mut self.domain_template);
        }
        if self.url_scheme.is_empty() {
            DEFAULT_URL_SCHEME.clone_into(&mut self.url_scheme);
        }
        if self.cluster_domain.is_empty() {
            DEFAULT_CLUSTER_DOMAIN.clone_into(&mut self.cluster_domain);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingress_gateway.is_empty() || self.ingress_service.is_empty() {
            return Err(ConfigError::InvalidIngress("ingressGateway, ingressService are required".to_owned()));
        }
        if self.enable_gateway_api {
            parse_gateway_reference(&self.kserve_ingress_gateway)?;
        }
        Ok(())
    }

    /// An ingress domain pointing at the cluster's own service domain never exposes anything outside of the cluster.
    pub fn is_cluster_local_domain(&self) -> bool {
        self.ingress_domain == format!("svc.{}", self.cluster_domain)
    }

    pub fn is_cluster_local(&self, labels: &BTreeMap<String, String>) -> bool {
        self.is_cluster_local_domain()
            || [crate::common::VISIBILITY_LABEL, crate::common::KNATIVE_VISIBILITY_LABEL]
                .iter()
                .any(|label| labels.get(*label).is_some_and(|value| value == CLUSTER_LOCAL_VISIBILITY))
    }
}

/// Splits a `<namespace>/<name>` gateway reference.
pub fn parse_gateway_reference(reference: &str) -> Result<(String, String), ConfigError> {
    match reference.split_once('/') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() && !name.contains('/') => Ok((namespace.to_owned(), name.to_owned())),
        _ => Err(ConfigError::InvalidGatewayReference(reference.to_owned())),
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum DeploymentMode {
    #[default]
    Serverless,
    RawDeployment,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    #[serde(default)]
    pub default_deployment_mode: DeploymentMode,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServicesConfig {
    #[serde(default = "default_annotation_disallowed_list")]
    pub service_annotation_disallowed_list: Vec<String>,
    #[serde(default)]
    pub service_label_disallowed_list: Vec<String>,
}

fn default_annotation_disallowed_list() -> Vec<String> {
    vec![LAST_APPLIED_CONFIGURATION_ANNOTATION.to_owned()]
}

impl Default for InferenceServicesConfig {
    fn default() -> Self {
        Self { service_annotation_disallowed_list: default_annotation_disallowed_list(), service_label_disallowed_list: vec![] }
    }
}

impl InferenceServicesConfig {
    pub fn propagated_annotations(&self, annotations: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        filter_keys(annotations, &self.service_annotation_disallowed_list)
    }

    pub fn propagated_labels(&self, labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        filter_keys(labels, &self.service_label_disallowed_list)
    }
}

fn filter_keys(values: &BTreeMap<String, String>, disallowed: &[String]) -> BTreeMap<String, String> {
    values.iter().filter(|(key, _)| !disallowed.contains(key)).map(|(key, value)| (key.clone(), value.clone())).collect()
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IngressBackendKind {
    VirtualService,
    Ingress,
    HttpRoute,
}

/// Everything read from the `inferenceservice-config` ConfigMap.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct RuntimeConfig {
    pub ingress: IngressConfig,
    #[builder(default)]
    pub deploy: DeployConfig,
    #[builder(default)]
    pub inference_services: InferenceServicesConfig,
}

fn parse_key<T: DeserializeOwned>(data: &BTreeMap<String, String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    data.get(key).map(|raw| serde_json::from_str(raw).map_err(|source| ConfigError::Parse { key, source })).transpose()
}

impl RuntimeConfig {
    pub fn from_config_map(config_map: &ConfigMap) -> Result<Self, ConfigError> {
        let empty = BTreeMap::new();
        let data = config_map.data.as_ref().unwrap_or(&empty);
        let ingress: IngressConfig = parse_key(data, INGRESS_CONFIG_KEY)?.ok_or(ConfigError::MissingKey(INGRESS_CONFIG_KEY))?;
        let ingress = ingress.with_defaults();
        ingress.validate()?;
        let deploy = parse_key(data, DEPLOY_CONFIG_KEY)?.unwrap_or_default();
        let inference_services = parse_key(data, INFERENCE_SERVICE_CONFIG_KEY)?.unwrap_or_default();
        Ok(Self { ingress, deploy, inference_services })
    }

    pub async fn load<C: ResourceClient>(client: &C, namespace: &str, name: &str) -> Result<Self, ReconcileError> {
        let Some(config_map) = client.get::<ConfigMap>(namespace, name).await? else {
            return Err(ConfigError::ConfigMapNotFound(format!("{namespace}/{name}")).into());
        };
        let config = Self::from_config_map(&config_map)?;
        debug!("Loaded ingress configuration {:?}", config.ingress);
        Ok(config)
    }

    /// Backend used when the controller configuration does not force one.
    pub fn backend_kind(&self) -> IngressBackendKind {
        if self.ingress.enable_gateway_api {
            IngressBackendKind::HttpRoute
        } else if self.deploy.default_deployment_mode == DeploymentMode::RawDeployment {
            IngressBackendKind::Ingress
        } else {
            IngressBackendKind::VirtualService
        }
    }
}
