// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use kube::{
    runtime::events::{Recorder, Reporter},
    Client,
};
use tracing::info;

pub mod client;
pub mod common;
pub mod config;
pub mod configuration;
mod controllers;
pub mod crd;
pub mod ingress;
pub mod reconciler;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

use client::KubeResourceClient;
use config::{IngressBackendKind, RuntimeConfig};
pub use configuration::Configuration;
use controllers::{InferenceServiceController, InferenceServiceControllerContext};
use ingress::{HttpRouteBackend, IngressBackend, IngressReconciler, RouteBackend, VirtualServiceBackend};

pub async fn start(configuration: Configuration) -> Result<()> {
    info!("KServe ingress controller started");
    let client = Client::try_default().await?;
    let resource_client = KubeResourceClient::new(client.clone(), &configuration.controller_name);

    let backend_kind = match configuration.ingress_backend {
        Some(backend_kind) => backend_kind,
        None => RuntimeConfig::load(&resource_client, &configuration.config_map_namespace, &configuration.config_map_name).await?.backend_kind(),
    };
    info!("Selected {backend_kind:?} ingress backend");

    match backend_kind {
        IngressBackendKind::VirtualService => run(VirtualServiceBackend, client, resource_client, &configuration).await,
        IngressBackendKind::Ingress => run(IngressBackend, client, resource_client, &configuration).await,
        IngressBackendKind::HttpRoute => run(HttpRouteBackend, client, resource_client, &configuration).await,
    }
}

async fn run<B: RouteBackend>(backend: B, client: Client, resource_client: KubeResourceClient, configuration: &Configuration) -> Result<()> {
    let reporter = Reporter { controller: configuration.controller_name.clone(), instance: None };
    let controller = InferenceServiceController::builder()
        .ctx(Arc::new(
            InferenceServiceControllerContext::builder()
                .client(client.clone())
                .resource_client(resource_client.clone())
                .ingress_reconciler(IngressReconciler::builder().backend(backend).client(resource_client).build())
                .config_map_name(configuration.config_map_name.clone())
                .config_map_namespace(configuration.config_map_namespace.clone())
                .recorder(Recorder::new(client, reporter))
                .build(),
        ))
        .build();

    info!("Inference Service controller...started");
    controller.get_controller().await;
    info!("Inference Service controller...stopped");
    Ok(())
}
