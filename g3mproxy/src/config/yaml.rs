/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use humanize_rs::bytes::Bytes;
use indexmap::IndexMap;
use yaml_rust::{Yaml, YamlLoader, yaml};

use crate::types::DimensionId;

pub(super) fn foreach_doc<F>(path: &Path, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(usize, &Yaml) -> anyhow::Result<()>,
{
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read in file {}: {e}", path.display()))?;
    let docs = YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    for (i, doc) in docs.iter().enumerate() {
        f(i, doc).context(format!("failed to load doc #{i} of file {}", path.display()))?;
    }
    Ok(())
}

pub(super) fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        if let Yaml::String(key) = k {
            f(key, v).context(format!("failed to parse value of key {key}"))?;
        } else {
            return Err(anyhow!("key in hash should be string"));
        }
    }
    Ok(())
}

/// Keys are case insensitive, and `-` is the same as `_`
pub(super) fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

pub(super) fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        _ => Err(anyhow!(
            "yaml value type for string should be 'string', 'integer', 'real' or 'boolean'"
        )),
    }
}

pub(super) fn as_bool(v: &Yaml) -> anyhow::Result<bool> {
    match v {
        Yaml::String(s) => match s.to_lowercase().as_str() {
            "on" | "true" | "yes" | "1" => Ok(true),
            "off" | "false" | "no" | "0" => Ok(false),
            _ => Err(anyhow!("invalid yaml string value for 'bool': {s}")),
        },
        Yaml::Boolean(value) => Ok(*value),
        Yaml::Integer(i) => Ok(*i != 0),
        _ => Err(anyhow!(
            "yaml value type for 'bool' should be 'boolean', 'string' or 'integer'"
        )),
    }
}

pub(super) fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(s) => Ok(usize::from_str(s)?),
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for 'usize' should be 'string' or 'integer'"
        )),
    }
}

/// Sizes like `16MiB` or `1000`
pub(super) fn as_humanize_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(value) => {
            let v = value.parse::<Bytes>()?;
            Ok(v.size())
        }
        Yaml::Integer(value) => Ok(usize::try_from(*value)?),
        _ => Err(anyhow!(
            "yaml value type for humanize usize should be 'string' or 'integer'"
        )),
    }
}

/// Durations like `10s`, plain numbers are seconds
pub(super) fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => match humanize_rs::duration::parse(value) {
            Ok(v) => Ok(v),
            Err(ParseError::MissingUnit) => {
                if let Ok(u) = u64::from_str(value) {
                    Ok(Duration::from_secs(u))
                } else if let Ok(f) = f64::from_str(value) {
                    Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
                } else {
                    Err(anyhow!("invalid duration string"))
                }
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(value) => {
            let u = u64::try_from(*value).map_err(|_| anyhow!("negative duration value"))?;
            Ok(Duration::from_secs(u))
        }
        Yaml::Real(s) => {
            let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 value: {e}"))?;
            Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
        }
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer' or 'real'"
        )),
    }
}

/// Dimensions in map form `{k: v}` or as a list of `{key: k, value: v}`
pub(super) fn as_dimensions(v: &Yaml) -> anyhow::Result<IndexMap<DimensionId, String>> {
    let mut dimensions = IndexMap::new();
    match v {
        Yaml::Hash(map) => {
            foreach_kv(map, |k, v| {
                dimensions.insert(DimensionId::new(k), as_string(v)?);
                Ok(())
            })?;
        }
        Yaml::Array(seq) => {
            for (i, item) in seq.iter().enumerate() {
                let Yaml::Hash(map) = item else {
                    return Err(anyhow!("dimension #{i} should be a map"));
                };
                let mut key = None;
                let mut value = None;
                foreach_kv(map, |k, v| match normalize_key(k).as_str() {
                    "key" => {
                        key = Some(as_string(v)?);
                        Ok(())
                    }
                    "value" => {
                        value = Some(as_string(v)?);
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })
                .context(format!("invalid dimension #{i}"))?;
                let (Some(key), Some(value)) = (key, value) else {
                    return Err(anyhow!("dimension #{i} should have both key and value"));
                };
                dimensions.insert(DimensionId::from(key), value);
            }
        }
        Yaml::Null => {}
        _ => return Err(anyhow!("yaml value type for dimensions should be 'map' or 'array'")),
    }
    Ok(dimensions)
}

#[cfg(test)]
pub(super) fn load_str(s: &str) -> Yaml {
    let mut docs = YamlLoader::load_from_str(s).unwrap();
    docs.remove(0)
}
