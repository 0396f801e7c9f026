// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::common::ResourceKey;

pub const BACKOFF_BASE: Duration = Duration::from_secs(5);
pub const BACKOFF_CAP: Duration = Duration::from_secs(300);

/// Consecutive failures per object. The requeue delay doubles with each failure and resets once a reconcile succeeds.
#[derive(Clone, Debug, Default)]
pub struct Backoff {
    failures: Arc<Mutex<HashMap<ResourceKey, u32>>>,
}

impl Backoff {
    pub fn next_delay(&self, resource_key: &ResourceKey) -> Duration {
        let Ok(mut failures) = self.failures.lock() else {
            return BACKOFF_BASE;
        };
        let attempts = failures.entry(resource_key.clone()).or_default();
        *attempts = attempts.saturating_add(1);
        delay_for(*attempts)
    }

    pub fn reset(&self, resource_key: &ResourceKey) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(resource_key);
        }
    }
}

fn delay_for(attempts: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempts.saturating_sub(1));
    BACKOFF_BASE.saturating_mul(factor).min(BACKOFF_CAP)
}
