// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use kube::ResourceExt;
use tracing::warn;

use super::domain::{render_optional, TemplateContext};
use crate::{config::RuntimeConfig, crd::InferenceService};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedTls {
    pub hosts: Vec<String>,
    pub secret_name: String,
}

/// Labels, annotations and TLS blocks stamped on every routing object of an inference service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedMetadata {
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub tls: Vec<RenderedTls>,
    /// Template entries left out because they failed to render.
    pub skipped: usize,
}

pub fn render_metadata(isvc: &InferenceService, runtime: &RuntimeConfig) -> RenderedMetadata {
    let name = isvc.name_any();
    let namespace = isvc.namespace().unwrap_or_default();
    let context = TemplateContext {
        name: &name,
        namespace: &namespace,
        ingress_domain: &runtime.ingress.ingress_domain,
        annotations: isvc.annotations(),
        labels: isvc.labels(),
    };

    let labels = runtime.inference_services.propagated_labels(isvc.labels());
    let mut annotations = runtime.inference_services.propagated_annotations(isvc.annotations());
    let mut skipped = 0;

    for (key, template) in &runtime.ingress.annotations {
        match render_optional(template, &context).value {
            Some(value) => {
                annotations.insert(key.clone(), value);
            },
            None => skipped += 1,
        }
    }

    let mut tls = vec![];
    for entry in &runtime.ingress.tls {
        let Some(secret_name) = render_optional(&entry.secret_name, &context).value else {
            skipped += 1;
            continue;
        };
        let mut hosts = vec![];
        for host in &entry.hosts {
            match render_optional(host, &context).value {
                Some(host) if !host.is_empty() => hosts.push(host),
                _ => skipped += 1,
            }
        }
        if !hosts.is_empty() {
            tls.push(RenderedTls { hosts, secret_name });
        }
    }

    if skipped > 0 {
        warn!("Skipped {skipped} ingress metadata templates for {namespace}.{name}");
    }
    RenderedMetadata { labels, annotations, tls, skipped }
}
