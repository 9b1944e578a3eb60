//! Tags derived from the `/tenant/application/object` naming convention.

use crate::schema::AddTags;
use crate::tree::{StatsMap, StatsValue};

const TENANT: &str = "tenant";
const APPLICATION: &str = "application";

/// The tenant and application encoded in a resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTags<'a> {
    pub tenant: &'a str,
    pub application: Option<&'a str>,
}

/// Split a resource name into its tags.
///
/// `/Common/app.app/vs` has a tenant and an application; `/Common/vs` has only a
/// tenant. Names that do not start with `/` carry no tags.
#[must_use]
pub fn parse_resource_name(name: &str) -> Option<ResourceTags<'_>> {
    let rest = name.strip_prefix('/')?;
    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        [tenant, _object] if !tenant.is_empty() => Some(ResourceTags {
            tenant: *tenant,
            application: None,
        }),
        [tenant, application, _, ..] if !tenant.is_empty() => Some(ResourceTags {
            tenant: *tenant,
            application: (!application.is_empty()).then_some(*application),
        }),
        _ => None,
    }
}

/// Add tags to a record, or to every record of a collection.
pub fn add_tags(value: StatsValue, tags: &AddTags) -> StatsValue {
    match value {
        StatsValue::Map(map) if map.contains_key(&tags.source_key) => StatsValue::Map(tag_record(map, tags)),
        StatsValue::Map(map) => StatsValue::Map(map.into_iter().map(|(k, v)| (k, tag_member(v, tags))).collect()),
        StatsValue::List(items) => StatsValue::List(items.into_iter().map(|v| tag_member(v, tags)).collect()),
        other => other,
    }
}

fn tag_member(value: StatsValue, tags: &AddTags) -> StatsValue {
    match value {
        StatsValue::Map(map) => StatsValue::Map(tag_record(map, tags)),
        other => other,
    }
}

fn tag_record(mut record: StatsMap, tags: &AddTags) -> StatsMap {
    let Some(source) = record.get(&tags.source_key).and_then(StatsValue::as_str).map(ToString::to_string) else {
        return record;
    };

    if let Some(parsed) = parse_resource_name(&source) {
        let mut insert = |key: &str, value: &str| {
            if !tags.skip.iter().any(|s| s == key) {
                let _ = record.insert(key.to_string(), StatsValue::from(value));
            }
        };

        insert(TENANT, parsed.tenant);
        if let Some(application) = parsed.application {
            insert(APPLICATION, application);
        }
    }

    if let Some(name_key) = &tags.name_key {
        let _ = record.insert(name_key.clone(), StatsValue::from(source.as_str()));
    }

    record
}
