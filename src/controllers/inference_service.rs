// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt, StreamExt};
use k8s_openapi::api::core::v1::Service;
use kube::{
    runtime::{
        controller::Action,
        events::{Event, EventType, Recorder},
        watcher::Config,
        Controller,
    },
    Api, Client, Resource, ResourceExt,
};
use serde_json::json;
use tracing::{debug, info, span, warn, Instrument, Level};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::{backoff::Backoff, ControllerError, RECONCILE_LONG_WAIT};
use crate::{
    client::{KubeResourceClient, ResourceClient},
    common::ResourceKey,
    config::RuntimeConfig,
    crd::{ConditionType, InferenceService, InferenceServiceStatus},
    ingress::{IngressReconciler, RouteBackend},
    reconciler::{self, semantic::merge_patch, ReconcileError},
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

const INGRESS_READY_REASON: &str = "IngressReady";
const RECONCILE_FAILED_REASON: &str = "InternalError";
const RECONCILE_ACTION: &str = "Reconcile";

/// What one pass over an inference service changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOutcome {
    pub status_written: bool,
    pub ingress_ready: bool,
    pub became_ready: bool,
}

/// Writes the difference between the observed and the computed status as a merge patch on the status subresource.
/// The patch carries the observed `resourceVersion`, so a concurrent writer makes it fail with a conflict.
pub async fn write_status<C: ResourceClient>(client: &C, isvc: &InferenceService, new_status: &InferenceServiceStatus) -> Result<bool, ReconcileError> {
    let current = serde_json::to_value(&isvc.status)?;
    let target = serde_json::to_value(new_status)?;
    let patch = merge_patch(&current, &target);
    if patch.as_object().is_some_and(serde_json::Map::is_empty) {
        return Ok(false);
    }

    let (namespace, name) = reconciler::namespace_and_name(isvc)?;
    let patch = json!({
        "metadata": { "resourceVersion": isvc.metadata.resource_version },
        "status": patch,
    });
    client.patch_status::<InferenceService>(&namespace, &name, &patch).await?;
    Ok(true)
}

/// Loads the runtime configuration, reconciles routing and publishes the resulting status.
pub async fn sync_inference_service<B: RouteBackend, C: ResourceClient>(
    isvc: &InferenceService,
    ingress_reconciler: &IngressReconciler<B, C>,
    client: &C,
    config_map_namespace: &str,
    config_map_name: &str,
) -> Result<SyncOutcome, ReconcileError> {
    let runtime = RuntimeConfig::load(client, config_map_namespace, config_map_name).await?;
    if runtime.backend_kind() != ingress_reconciler.backend().kind() {
        debug!("Configuration asks for {:?}, keeping {} until restart", runtime.backend_kind(), ingress_reconciler.backend());
    }

    let mut new_status = ingress_reconciler.reconcile(isvc, &runtime).await?;
    new_status.observed_generation = isvc.metadata.generation;

    let was_ready = isvc.status.as_ref().is_some_and(|status| status.is_condition_true(ConditionType::IngressReady));
    let ingress_ready = new_status.is_condition_true(ConditionType::IngressReady);
    let status_written = write_status(client, isvc, &new_status).await?;
    Ok(SyncOutcome { status_written, ingress_ready, became_ready: ingress_ready && !was_ready })
}

#[derive(TypedBuilder)]
pub struct InferenceServiceControllerContext<B> {
    client: Client,
    resource_client: KubeResourceClient,
    ingress_reconciler: IngressReconciler<B, KubeResourceClient>,
    #[builder(setter(into))]
    config_map_name: String,
    #[builder(setter(into))]
    config_map_namespace: String,
    recorder: Recorder,
    #[builder(default)]
    backoff: Backoff,
}

impl<B> InferenceServiceControllerContext<B> {
    async fn publish_event(&self, isvc: &InferenceService, type_: EventType, reason: &str, note: Option<String>) {
        let event = Event { type_, reason: reason.to_owned(), note, action: RECONCILE_ACTION.to_owned(), secondary: None };
        if let Err(e) = self.recorder.publish(&event, &isvc.object_ref(&())).await {
            warn!("Failed to publish event {reason} for {}: {e}", isvc.name_any());
        }
    }
}

#[derive(TypedBuilder)]
pub struct InferenceServiceController<B> {
    ctx: Arc<InferenceServiceControllerContext<B>>,
}

impl<B: RouteBackend> InferenceServiceController<B> {
    pub fn get_controller(&'_ self) -> BoxFuture<'_, ()> {
        let client = self.ctx.client.clone();
        let context = &self.ctx;

        Controller::new(Api::<InferenceService>::all(client.clone()), Config::default())
            .owns(Api::<B::Object>::all(client.clone()), Config::default())
            .owns(Api::<Service>::all(client), Config::default())
            .run(Self::reconcile_inference_service, Self::error_policy, Arc::clone(context))
            .for_each(|_| futures::future::ready(()))
            .boxed()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn error_policy(isvc: Arc<InferenceService>, err: &ControllerError, ctx: Arc<InferenceServiceControllerContext<B>>) -> Action {
        let resource_key = ResourceKey::from(isvc.as_ref());
        let delay = ctx.backoff.next_delay(&resource_key);
        warn!("Reconcile of {resource_key} failed, retrying in {}s: {err}", delay.as_secs());
        Action::requeue(delay)
    }

    async fn reconcile_inference_service(isvc: Arc<InferenceService>, ctx: Arc<InferenceServiceControllerContext<B>>) -> Result<Action> {
        let resource_key = ResourceKey::from(isvc.as_ref());
        let span = span!(Level::INFO, "InferenceServiceController", id = %resource_key);
        Self::reconcile(isvc, ctx, resource_key).instrument(span).await
    }

    async fn reconcile(isvc: Arc<InferenceService>, ctx: Arc<InferenceServiceControllerContext<B>>, resource_key: ResourceKey) -> Result<Action> {
        let uid = isvc.metadata.uid.clone().ok_or(ControllerError::InvalidPayload("Uid must be present".to_owned()))?;
        let _id = Uuid::parse_str(&uid).map_err(|e| ControllerError::InvalidPayload(format!("Uid in wrong format {e}")))?;

        if isvc.metadata.deletion_timestamp.is_some() {
            debug!("{resource_key} is being deleted, owned objects are garbage collected");
            return Ok(Action::await_change());
        }

        let result =
            sync_inference_service(&isvc, &ctx.ingress_reconciler, &ctx.resource_client, &ctx.config_map_namespace, &ctx.config_map_name).await;
        match result {
            Ok(outcome) => {
                ctx.backoff.reset(&resource_key);
                if outcome.status_written {
                    info!("Status of {resource_key} updated, ingress ready {}", outcome.ingress_ready);
                }
                if outcome.became_ready {
                    ctx.publish_event(&isvc, EventType::Normal, INGRESS_READY_REASON, Some(format!("Routing through {}", ctx.ingress_reconciler.backend())))
                        .await;
                }
                if outcome.ingress_ready {
                    Ok(Action::requeue(RECONCILE_LONG_WAIT))
                } else {
                    Ok(Action::await_change())
                }
            },
            Err(e) => {
                ctx.publish_event(&isvc, EventType::Warning, RECONCILE_FAILED_REASON, Some(e.to_string())).await;
                Err(ControllerError::ReconcileFailed(e.to_string()))
            },
        }
    }
}
