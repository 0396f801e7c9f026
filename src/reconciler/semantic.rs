// SPDX-FileCopyrightText: © 2026 kserve-ingress authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 kserve-ingress authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use serde_json::{Map, Value};

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// Derivative equality: every field set in `desired` must be present and equal in `existing`. Fields left unset in
/// `desired` are ignored, so values populated by the API server do not count as a difference.
pub fn derivative_eq(desired: &Value, existing: &Value) -> bool {
    if is_unset(desired) {
        return true;
    }
    match (desired, existing) {
        (Value::Object(desired), Value::Object(existing)) => {
            desired.iter().all(|(key, value)| existing.get(key).map_or_else(|| is_unset(value), |existing| derivative_eq(value, existing)))
        },
        (Value::Array(desired), Value::Array(existing)) => {
            desired.len() == existing.len() && desired.iter().zip(existing).all(|(desired, existing)| derivative_eq(desired, existing))
        },
        (desired, existing) => desired == existing,
    }
}

/// Equality where null, absent and empty values are interchangeable. A field set on only one side is a difference.
pub fn normalized_eq(left: &Value, right: &Value) -> bool {
    derivative_eq(left, right) && derivative_eq(right, left)
}

/// Builds the RFC 7386 merge patch turning `current` into `target`. Removed keys become explicit nulls.
pub fn merge_patch(current: &Value, target: &Value) -> Value {
    match (current, target) {
        (Value::Object(current), Value::Object(target)) => {
            let mut patch = Map::new();
            for key in current.keys().filter(|key| !target.contains_key(*key)) {
                patch.insert(key.clone(), Value::Null);
            }
            for (key, value) in target {
                match current.get(key) {
                    Some(existing) if existing == value => {},
                    Some(existing @ Value::Object(_)) if value.is_object() => {
                        patch.insert(key.clone(), merge_patch(existing, value));
                    },
                    _ => {
                        patch.insert(key.clone(), value.clone());
                    },
                }
            }
            Value::Object(patch)
        },
        (_, target) => target.clone(),
    }
}

pub fn apply_merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(fields) = target {
        for (key, value) in patch {
            if value.is_null() {
                fields.remove(key);
            } else {
                apply_merge_patch(fields.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}
