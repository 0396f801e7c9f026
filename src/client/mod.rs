// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

#[cfg(test)]
pub mod inmemory;

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{DeleteParams, Patch, PatchParams, PostParams},
    Api, Client, Resource,
};
use serde::{de::DeserializeOwned, Serialize};

pub trait ClusterResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<K> ClusterResource for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Namespaced object access used by the reconcilers. Kept narrow so the reconcilers can run against an in-memory store
/// in tests.
#[async_trait]
pub trait ResourceClient: Clone + Send + Sync + 'static {
    /// `Ok(None)` when the object does not exist.
    async fn get<K: ClusterResource>(&self, namespace: &str, name: &str) -> Result<Option<K>, kube::Error>;
    async fn create<K: ClusterResource>(&self, namespace: &str, resource: &K) -> Result<K, kube::Error>;
    /// Full update. The object's `resourceVersion` is used for optimistic concurrency.
    async fn replace<K: ClusterResource>(&self, namespace: &str, resource: &K, dry_run: bool) -> Result<K, kube::Error>;
    async fn delete<K: ClusterResource>(&self, namespace: &str, name: &str) -> Result<(), kube::Error>;
    /// JSON merge patch against the status subresource.
    async fn patch_status<K: ClusterResource>(&self, namespace: &str, name: &str, patch: &serde_json::Value) -> Result<K, kube::Error>;
}

pub fn is_not_found(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}

pub fn is_conflict(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409)
}

#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
    field_manager: String,
}

impl KubeResourceClient {
    pub fn new(client: Client, field_manager: &str) -> Self {
        Self { client, field_manager: field_manager.to_owned() }
    }

    fn api<K: ClusterResource>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params(&self, dry_run: bool) -> PostParams {
        PostParams { dry_run, field_manager: Some(self.field_manager.clone()) }
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn get<K: ClusterResource>(&self, namespace: &str, name: &str) -> Result<Option<K>, kube::Error> {
        self.api::<K>(namespace).get_opt(name).await
    }

    async fn create<K: ClusterResource>(&self, namespace: &str, resource: &K) -> Result<K, kube::Error> {
        self.api::<K>(namespace).create(&self.post_params(false), resource).await
    }

    async fn replace<K: ClusterResource>(&self, namespace: &str, resource: &K, dry_run: bool) -> Result<K, kube::Error> {
        let name = resource.meta().name.clone().unwrap_or_default();
        self.api::<K>(namespace).replace(&name, &self.post_params(dry_run), resource).await
    }

    async fn delete<K: ClusterResource>(&self, namespace: &str, name: &str) -> Result<(), kube::Error> {
        self.api::<K>(namespace).delete(name, &DeleteParams::background()).await.map(|_| ())
    }

    async fn patch_status<K: ClusterResource>(&self, namespace: &str, name: &str, patch: &serde_json::Value) -> Result<K, kube::Error> {
        let params = PatchParams { field_manager: Some(self.field_manager.clone()), ..Default::default() };
        self.api::<K>(namespace).patch_status(name, &params, &Patch::Merge(patch)).await
    }
}
