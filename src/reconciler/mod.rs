// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

mod desired;
pub mod semantic;

use kube::{Resource, ResourceExt};
use thiserror::Error;
use tracing::{debug, info, span, Instrument, Level};

pub use desired::DesiredState;

use crate::{
    client::{ClusterResource, ResourceClient},
    common::{format_resource, ResourceKey},
    config::ConfigError,
    ingress::domain::TemplateError,
};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid resource: {0}")]
    InvalidResource(String),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq)]
pub enum ApplyOutcome<K> {
    Created(K),
    Updated(K),
    Unchanged(K),
}

impl<K> ApplyOutcome<K> {
    pub fn into_inner(self) -> K {
        match self {
            ApplyOutcome::Created(resource) | ApplyOutcome::Updated(resource) | ApplyOutcome::Unchanged(resource) => resource,
        }
    }

    pub fn resource(&self) -> &K {
        match self {
            ApplyOutcome::Created(resource) | ApplyOutcome::Updated(resource) | ApplyOutcome::Unchanged(resource) => resource,
        }
    }
}

pub(crate) fn namespace_and_name<K: Resource>(resource: &K) -> Result<(String, String)> {
    let meta = resource.meta();
    match (&meta.namespace, &meta.name) {
        (Some(namespace), Some(name)) => Ok((namespace.clone(), name.clone())),
        _ => Err(ReconcileError::InvalidResource(format!("{} must have a namespace and a name", format_resource::<K>()))),
    }
}

fn metadata_equals<K: DesiredState>(desired: &K, existing: &K) -> Result<bool> {
    Ok(semantic::normalized_eq(&serde_json::to_value(desired.labels())?, &serde_json::to_value(existing.labels())?)
        && semantic::normalized_eq(&serde_json::to_value(desired.annotations())?, &serde_json::to_value(existing.annotations())?)
        && semantic::normalized_eq(&serde_json::to_value(desired.owner_references())?, &serde_json::to_value(existing.owner_references())?))
}

/// Spec, labels, annotations and owner references must match exactly. A field dropped from `desired` but still set on
/// `existing` is a difference, so removed settings are cleared from the live object.
pub fn semantic_equals<K: DesiredState>(desired: &K, existing: &K) -> Result<bool> {
    let spec_equal = semantic::normalized_eq(&serde_json::to_value(desired.desired_spec())?, &serde_json::to_value(existing.desired_spec())?);
    Ok(spec_equal && metadata_equals(desired, existing)?)
}

/// Like [`semantic_equals`] but spec fields left unset in `desired` are ignored. For objects whose spec the API server
/// defaults (core `Service`) and which are not compared through a dry run.
pub fn derivative_equals<K: DesiredState>(desired: &K, existing: &K) -> Result<bool> {
    let spec_equal = semantic::derivative_eq(&serde_json::to_value(desired.desired_spec())?, &serde_json::to_value(existing.desired_spec())?);
    Ok(spec_equal && metadata_equals(desired, existing)?)
}

/// Copies the reconciler owned parts of `desired` into the fetched object, keeping its `resourceVersion`.
pub fn merge_desired<K: DesiredState>(desired: &K, existing: &K) -> K {
    let mut merged = existing.clone();
    desired.copy_spec_into(&mut merged);
    let meta = merged.meta_mut();
    meta.labels.clone_from(&desired.meta().labels);
    meta.annotations.clone_from(&desired.meta().annotations);
    meta.owner_references.clone_from(&desired.meta().owner_references);
    meta.managed_fields = None;
    merged
}

/// Creates `desired` when it does not exist, otherwise updates the live object when it differs.
///
/// With `dry_run_first` the merged object is sent as a dry-run update and the server defaulted result is compared with
/// [`semantic_equals`], so defaults show up on both sides while removed fields still count as a difference.
pub async fn get_or_create_or_update<K, C, F>(client: &C, desired: &K, equals: F, dry_run_first: bool) -> Result<ApplyOutcome<K>>
where
    K: DesiredState,
    C: ResourceClient,
    F: Fn(&K, &K) -> Result<bool> + Send + Sync,
{
    let (namespace, name) = namespace_and_name(desired)?;
    let resource_key = ResourceKey::from(desired);
    let span = span!(Level::INFO, "DiffAndApply", resource = %format_resource::<K>(), id = %resource_key);
    apply(client, desired, &namespace, &name, equals, dry_run_first).instrument(span).await
}

async fn apply<K, C, F>(client: &C, desired: &K, namespace: &str, name: &str, equals: F, dry_run_first: bool) -> Result<ApplyOutcome<K>>
where
    K: DesiredState,
    C: ResourceClient,
    F: Fn(&K, &K) -> Result<bool> + Send + Sync,
{
    let Some(existing) = client.get::<K>(namespace, name).await? else {
        info!("Creating {}", format_resource::<K>());
        let created = client.create(namespace, desired).await?;
        return Ok(ApplyOutcome::Created(created));
    };

    let merged = merge_desired(desired, &existing);
    let equal = if dry_run_first {
        let defaulted = client.replace(namespace, &merged, true).await?;
        semantic_equals(&defaulted, &existing)?
    } else {
        equals(desired, &existing)?
    };

    if equal {
        debug!("{} unchanged", format_resource::<K>());
        Ok(ApplyOutcome::Unchanged(existing))
    } else {
        info!("Updating {}", format_resource::<K>());
        let updated = client.replace(namespace, &merged, false).await?;
        Ok(ApplyOutcome::Updated(updated))
    }
}

/// Deletes an object, treating a missing object as already deleted. Returns whether anything was removed.
pub async fn delete_if_exists<K: ClusterResource, C: ResourceClient>(client: &C, namespace: &str, name: &str) -> Result<bool> {
    match client.delete::<K>(namespace, name).await {
        Ok(()) => {
            info!("Deleted {} {namespace}.{name}", format_resource::<K>());
            Ok(true)
        },
        Err(e) if crate::client::is_not_found(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
