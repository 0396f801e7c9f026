// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use kube::core::ErrorResponse;
use serde_json::Value;

use super::{ClusterResource, ResourceClient};
use crate::reconciler::semantic::apply_merge_patch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Replace,
    Delete,
    PatchStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Write {
    pub kind: WriteKind,
    pub resource: String,
    pub namespace: String,
    pub name: String,
}

type ObjectId = (String, String, String);

/// API server stand-in. Every mutating call is recorded, dry runs are counted separately.
#[derive(Clone, Default)]
pub struct InMemoryClient {
    objects: Arc<Mutex<BTreeMap<ObjectId, Value>>>,
    writes: Arc<Mutex<Vec<Write>>>,
    dry_runs: Arc<AtomicU64>,
    version: Arc<AtomicU64>,
}

fn object_id<K: ClusterResource>(namespace: &str, name: &str) -> ObjectId {
    (format!("{}/{}", K::api_version(&()), K::kind(&())), namespace.to_owned(), name.to_owned())
}

fn api_error(code: u16, reason: &str, message: String) -> kube::Error {
    kube::Error::Api(ErrorResponse { status: "Failure".to_owned(), message, reason: reason.to_owned(), code })
}

fn resource_version(value: &Value) -> Option<&str> {
    value.pointer("/metadata/resourceVersion").and_then(Value::as_str)
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn record(&self, kind: WriteKind, id: &ObjectId) {
        self.writes.lock().unwrap().push(Write { kind, resource: id.0.clone(), namespace: id.1.clone(), name: id.2.clone() });
    }

    /// Seeds an object without recording a write.
    pub fn insert<K: ClusterResource>(&self, resource: &K) {
        let namespace = resource.meta().namespace.clone().unwrap_or_default();
        let name = resource.meta().name.clone().unwrap_or_default();
        let mut value = serde_json::to_value(resource).unwrap();
        value["metadata"]["resourceVersion"] = Value::String(self.next_version());
        if value.pointer("/metadata/uid").is_none() {
            value["metadata"]["uid"] = Value::String(uuid::Uuid::new_v4().to_string());
        }
        self.objects.lock().unwrap().insert(object_id::<K>(&namespace, &name), value);
    }

    pub fn object<K: ClusterResource>(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects.lock().unwrap().get(&object_id::<K>(namespace, name)).map(|value| serde_json::from_value(value.clone()).unwrap())
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }

    pub fn dry_runs(&self) -> u64 {
        self.dry_runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceClient for InMemoryClient {
    async fn get<K: ClusterResource>(&self, namespace: &str, name: &str) -> Result<Option<K>, kube::Error> {
        let objects = self.objects.lock().unwrap();
        objects.get(&object_id::<K>(namespace, name)).map(|value| serde_json::from_value(value.clone()).map_err(kube::Error::SerdeError)).transpose()
    }

    async fn create<K: ClusterResource>(&self, namespace: &str, resource: &K) -> Result<K, kube::Error> {
        let name = resource.meta().name.clone().unwrap_or_default();
        let id = object_id::<K>(namespace, &name);
        let mut value = serde_json::to_value(resource).map_err(kube::Error::SerdeError)?;
        {
            let mut objects = self.objects.lock().unwrap();
            if objects.contains_key(&id) {
                return Err(api_error(409, "AlreadyExists", format!("{name} already exists")));
            }
            value["metadata"]["namespace"] = Value::String(namespace.to_owned());
            value["metadata"]["resourceVersion"] = Value::String(self.next_version());
            value["metadata"]["uid"] = Value::String(uuid::Uuid::new_v4().to_string());
            objects.insert(id.clone(), value.clone());
        }
        self.record(WriteKind::Create, &id);
        serde_json::from_value(value).map_err(kube::Error::SerdeError)
    }

    async fn replace<K: ClusterResource>(&self, namespace: &str, resource: &K, dry_run: bool) -> Result<K, kube::Error> {
        let name = resource.meta().name.clone().unwrap_or_default();
        let id = object_id::<K>(namespace, &name);
        let mut value = serde_json::to_value(resource).map_err(kube::Error::SerdeError)?;
        {
            let mut objects = self.objects.lock().unwrap();
            let Some(stored) = objects.get(&id) else {
                return Err(api_error(404, "NotFound", format!("{name} not found")));
            };
            if let Some(version) = resource_version(&value) {
                if Some(version) != resource_version(stored) {
                    return Err(api_error(409, "Conflict", format!("{name} has been modified")));
                }
            }
            match stored.get("status") {
                Some(status) => value["status"] = status.clone(),
                None => {
                    if let Some(object) = value.as_object_mut() {
                        object.remove("status");
                    }
                },
            }
            value["metadata"]["uid"] = stored["metadata"]["uid"].clone();
            if dry_run {
                self.dry_runs.fetch_add(1, Ordering::SeqCst);
                value["metadata"]["resourceVersion"] = stored["metadata"]["resourceVersion"].clone();
                return serde_json::from_value(value).map_err(kube::Error::SerdeError);
            }
            value["metadata"]["resourceVersion"] = Value::String(self.next_version());
            objects.insert(id.clone(), value.clone());
        }
        self.record(WriteKind::Replace, &id);
        serde_json::from_value(value).map_err(kube::Error::SerdeError)
    }

    async fn delete<K: ClusterResource>(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        let id = object_id::<K>(namespace, name);
        if self.objects.lock().unwrap().remove(&id).is_none() {
            return Err(api_error(404, "NotFound", format!("{name} not found")));
        }
        self.record(WriteKind::Delete, &id);
        Ok(())
    }

    async fn patch_status<K: ClusterResource>(&self, namespace: &str, name: &str, patch: &Value) -> Result<K, kube::Error> {
        let id = object_id::<K>(namespace, name);
        let value = {
            let mut objects = self.objects.lock().unwrap();
            let Some(stored) = objects.get_mut(&id) else {
                return Err(api_error(404, "NotFound", format!("{name} not found")));
            };
            if let Some(version) = resource_version(patch) {
                if Some(version) != resource_version(stored) {
                    return Err(api_error(409, "Conflict", format!("{name} has been modified")));
                }
            }
            if let Some(status_patch) = patch.get("status") {
                let mut status = stored.get("status").cloned().unwrap_or(Value::Null);
                apply_merge_patch(&mut status, status_patch);
                stored["status"] = status;
            }
            stored["metadata"]["resourceVersion"] = Value::String(self.next_version());
            stored.clone()
        };
        self.record(WriteKind::PatchStatus, &id);
        serde_json::from_value(value).map_err(kube::Error::SerdeError)
    }
}
