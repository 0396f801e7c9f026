// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use kube::api::ObjectMeta;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::warn;

use crate::{common::DEFAULT_NAMESPACE_NAME, config::IngressConfig};

const TEMPLATE_NAME: &str = "ingress-template";
const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

lazy_static! {
    static ref ACTION: Regex = Regex::new(r"\{\{-?(.*?)-?\}\}").expect("valid action expression");
    static ref INDEX_CALL: Regex = Regex::new(r#"index\s+\.([A-Za-z_][A-Za-z0-9_]*)\s+"([^"]*)""#).expect("valid index expression");
    static ref FIELD_ACCESS: Regex = Regex::new(r"(^|[^A-Za-z0-9_\]\)])\.([A-Za-z_])").expect("valid field expression");
    static ref URL_SCHEME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid scheme expression");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unable to parse template {template}: {message}")]
    Parse { template: String, message: String },
    #[error("unable to execute template {template}: {message}")]
    Execute { template: String, message: String },
    #[error("invalid domain name {host}: {reason}")]
    InvalidDomain { host: String, reason: String },
    #[error("invalid url path template {template}: {reason}")]
    InvalidPath { template: String, reason: String },
}

/// Values available to domain, path, annotation and TLS templates.
#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateContext<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub ingress_domain: &'a str,
    pub annotations: &'a BTreeMap<String, String>,
    pub labels: &'a BTreeMap<String, String>,
}

/// Outcome of rendering a template whose failure must not fail the reconcile.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateRenderResult {
    pub value: Option<String>,
    pub error: Option<TemplateError>,
    pub skipped: bool,
}

impl TemplateRenderResult {
    fn rendered(value: String) -> Self {
        Self { value: Some(value), error: None, skipped: false }
    }

    fn skipped(error: TemplateError) -> Self {
        Self { value: None, error: Some(error), skipped: true }
    }
}

fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Rewrites Go text/template actions (`{{ .Name }}`, `{{ index .Annotations "key" }}`) into tera expressions.
fn normalize(template: &str) -> String {
    ACTION
        .replace_all(template, |caps: &Captures| {
            let body = INDEX_CALL.replace_all(&caps[1], r#"${1}["${2}"] | default(value="")"#);
            let body = FIELD_ACCESS.replace_all(&body, "${1}${2}");
            format!("{{{{{body}}}}}")
        })
        .into_owned()
}

pub fn render(template: &str, context: &TemplateContext) -> Result<String, TemplateError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, &normalize(template))
        .map_err(|e| TemplateError::Parse { template: template.to_owned(), message: error_chain(&e) })?;
    let context =
        Context::from_serialize(context).map_err(|e| TemplateError::Execute { template: template.to_owned(), message: error_chain(&e) })?;
    tera.render(TEMPLATE_NAME, &context).map_err(|e| TemplateError::Execute { template: template.to_owned(), message: error_chain(&e) })
}

pub fn render_optional(template: &str, context: &TemplateContext) -> TemplateRenderResult {
    match render(template, context) {
        Ok(value) => TemplateRenderResult::rendered(value),
        Err(e) => {
            warn!("Skipping template {template}: {e}");
            TemplateRenderResult::skipped(e)
        },
    }
}

fn invalid_domain(host: &str, reason: &str) -> TemplateError {
    TemplateError::InvalidDomain { host: host.to_owned(), reason: reason.to_owned() }
}

/// Validates a fully qualified DNS-1123 domain name.
pub fn validate_domain(host: &str) -> Result<(), TemplateError> {
    let trimmed = host.strip_suffix('.').unwrap_or(host);
    if trimmed.is_empty() {
        return Err(invalid_domain(host, "must not be empty"));
    }
    if trimmed.len() > MAX_DOMAIN_LENGTH {
        return Err(invalid_domain(host, &format!("must be no more than {MAX_DOMAIN_LENGTH} characters")));
    }
    let labels = trimmed.split('.').collect::<Vec<_>>();
    if labels.len() < 2 {
        return Err(invalid_domain(host, "should be a domain with at least two segments separated by dots"));
    }
    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
            return Err(invalid_domain(host, &format!("each label must be between 1 and {MAX_LABEL_LENGTH} characters")));
        }
        let valid_characters = label.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        let alphanumeric_edges = !label.starts_with('-') && !label.ends_with('-');
        if !valid_characters || !alphanumeric_edges {
            return Err(invalid_domain(
                host,
                "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character",
            ));
        }
    }
    Ok(())
}

/// Renders the domain template for `name`. The result is validated as a DNS name unless ingress creation is disabled.
pub fn generate_domain_name(name: &str, meta: &ObjectMeta, config: &IngressConfig) -> Result<String, TemplateError> {
    let empty = BTreeMap::new();
    let context = TemplateContext {
        name,
        namespace: meta.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE_NAME),
        ingress_domain: &config.ingress_domain,
        annotations: meta.annotations.as_ref().unwrap_or(&empty),
        labels: meta.labels.as_ref().unwrap_or(&empty),
    };
    let domain = render(&config.domain_template, &context)?;
    if !config.disable_ingress_creation {
        validate_domain(&domain)?;
    }
    Ok(domain)
}

/// Renders the path template. Empty when no template is configured.
pub fn generate_url_path(name: &str, namespace: &str, config: &IngressConfig) -> Result<String, TemplateError> {
    if config.path_template.is_empty() {
        return Ok(String::new());
    }
    let empty = BTreeMap::new();
    let context = TemplateContext { name, namespace, ingress_domain: &config.ingress_domain, annotations: &empty, labels: &empty };
    let path = render(&config.path_template, &context)?;
    let invalid = |reason: &str| TemplateError::InvalidPath { template: config.path_template.clone(), reason: reason.to_owned() };

    if URL_SCHEME.is_match(&path) {
        return Err(invalid("the rendered path must not contain a scheme"));
    }
    if path.starts_with("//") {
        return Err(invalid("the rendered path must not contain a host"));
    }
    if !path.starts_with('/') {
        return Err(invalid("the rendered path must be absolute"));
    }
    Ok(path.trim_end_matches('/').to_owned())
}

/// Derives hosts for the additional domains by swapping the observed domain suffix of `service_host`.
pub fn additional_hosts(observed_domains: &[String], service_host: &str, additional_domains: &[String]) -> Vec<String> {
    let Some(domain) = observed_domains.iter().filter(|domain| !domain.is_empty()).find(|domain| service_host.ends_with(&format!(".{domain}")))
    else {
        return vec![];
    };
    let prefix = &service_host[..service_host.len() - domain.len()];

    let mut hosts: Vec<String> = vec![];
    for additional_domain in additional_domains {
        let host = format!("{prefix}{additional_domain}");
        if host == service_host || hosts.contains(&host) {
            continue;
        }
        match validate_domain(&host) {
            Ok(()) => hosts.push(host),
            Err(e) => warn!("Skipping additional host {host}: {e}"),
        }
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(domain_template: &str) -> IngressConfig {
        IngressConfig::builder()
            .ingress_gateway("knative-serving/knative-ingress-gateway")
            .ingress_service("istio-ingressgateway.istio-system.svc.cluster.local")
            .ingress_domain("example.com")
            .domain_template(domain_template)
            .build()
    }

    fn meta(namespace: &str, annotations: &[(&str, &str)]) -> ObjectMeta {
        ObjectMeta {
            namespace: Some(namespace.to_owned()),
            annotations: Some(annotations.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_domain_template() {
        let config = config(crate::config::DEFAULT_DOMAIN_TEMPLATE);
        assert_eq!(generate_domain_name("foo", &meta("default", &[]), &config).unwrap(), "foo.default.example.com");
    }

    #[test]
    fn test_go_template_syntax() {
        let config = config(r#"{{.Name}}-{{ .Namespace }}.{{ index .Annotations "serving.kserve.io/zone" }}.{{ .IngressDomain }}"#);
        let meta = meta("models", &[("serving.kserve.io/zone", "eu")]);
        assert_eq!(generate_domain_name("foo", &meta, &config).unwrap(), "foo-models.eu.example.com");
    }

    #[test]
    fn test_unknown_field_is_an_execution_error() {
        let config = config("{{ .Name }}.{{ .Cluster }}.{{ .IngressDomain }}");
        let result = generate_domain_name("foo", &meta("default", &[]), &config);
        assert!(matches!(result, Err(TemplateError::Execute { .. })));
    }

    #[test]
    fn test_malformed_template_is_a_parse_error() {
        let config = config("{{ .Name }}.{% if %}.{{ .IngressDomain }}");
        let result = generate_domain_name("foo", &meta("default", &[]), &config);
        assert!(matches!(result, Err(TemplateError::Parse { .. })));
    }

    #[test]
    fn test_dns_validation_and_bypass() {
        let long_name = "a".repeat(70);
        let mut config = config(crate::config::DEFAULT_DOMAIN_TEMPLATE);
        let result = generate_domain_name(&long_name, &meta("default", &[]), &config);
        assert!(matches!(result, Err(TemplateError::InvalidDomain { .. })));

        config.disable_ingress_creation = true;
        let domain = generate_domain_name(&long_name, &meta("default", &[]), &config).unwrap();
        assert_eq!(domain, format!("{long_name}.default.example.com"));
    }

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("foo.default.example.com").is_ok());
        assert!(validate_domain("foo.default.example.com.").is_ok());
        assert!(validate_domain("localhost").is_err());
        assert!(validate_domain("Foo.example.com").is_err());
        assert!(validate_domain("-foo.example.com").is_err());
        assert!(validate_domain("foo..example.com").is_err());
        assert!(validate_domain(&format!("{}.com", "a.".repeat(130))).is_err());
    }

    #[test]
    fn test_url_path() {
        let mut config = config(crate::config::DEFAULT_DOMAIN_TEMPLATE);
        assert_eq!(generate_url_path("foo", "default", &config).unwrap(), "");

        config.path_template = "/serving/{{ .Namespace }}/{{ .Name }}/".to_owned();
        assert_eq!(generate_url_path("foo", "default", &config).unwrap(), "/serving/default/foo");

        config.path_template = "http://{{ .Name }}.example.com/models".to_owned();
        assert!(matches!(generate_url_path("foo", "default", &config), Err(TemplateError::InvalidPath { .. })));

        config.path_template = "//{{ .Name }}.example.com/models".to_owned();
        assert!(matches!(generate_url_path("foo", "default", &config), Err(TemplateError::InvalidPath { .. })));
    }

    #[test]
    fn test_additional_hosts() {
        let observed = vec!["example.com".to_owned()];
        let additional = vec!["additional.example.com".to_owned(), "example.com".to_owned(), "additional.example.com".to_owned(), "Bad_Domain".to_owned()];
        let hosts = additional_hosts(&observed, "foo.default.example.com", &additional);
        assert_eq!(hosts, vec!["foo.default.additional.example.com".to_owned()]);

        assert!(additional_hosts(&observed, "foo.default.other.io", &additional).is_empty());
    }

    #[test]
    fn test_render_optional_skips_failures() {
        let empty = BTreeMap::new();
        let context = TemplateContext { name: "foo", namespace: "default", ingress_domain: "example.com", annotations: &empty, labels: &empty };
        let result = render_optional("{{ .Missing }}", &context);
        assert!(result.skipped);
        assert!(result.value.is_none());
        assert!(matches!(result.error, Some(TemplateError::Execute { .. })));

        let result = render_optional("{{ .Name }}-tls", &context);
        assert_eq!(result, TemplateRenderResult { value: Some("foo-tls".to_owned()), error: None, skipped: false });
    }
}
