//! Collection naming.
//!
//! A [`NameProvider`] maps a type to the name of the collection its
//! documents live in. [`NameResolver`] picks the provider for each type
//! (per-type override, named strategy from the entity marker, or the
//! default) and caches the result.
pub mod case;

use crate::{
    error::{ErrorOrigin, MapperError},
    metadata::{EntityShape, MetadataResolver, SnapshotCache, translate},
    model::{CaseTranslation, NameStrategy, TypeRef},
    traits::MappedObject,
};
use std::sync::Arc;
use tracing::debug;

///
/// NameRequest
/// Everything a provider may consult when naming one type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameRequest {
    pub path: &'static str,
    pub name: &'static str,
    /// Collection override from the entity marker.
    pub override_name: Option<&'static str>,
    pub fully_qualified: bool,
    pub case: CaseTranslation,
}

///
/// NameProvider
///

pub trait NameProvider: Send + Sync {
    fn collection_name(&self, request: &NameRequest) -> String;
}

///
/// DefaultNameProvider
///
/// Explicit override verbatim; otherwise the simple or fully-qualified type
/// name, case-translated per path segment. Fully-qualified names join
/// segments with `_`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNameProvider;

impl NameProvider for DefaultNameProvider {
    fn collection_name(&self, request: &NameRequest) -> String {
        if let Some(name) = request.override_name {
            return name.to_string();
        }

        if request.fully_qualified {
            request
                .path
                .split("::")
                .map(|segment| translate(segment, request.case))
                .collect::<Vec<_>>()
                .join("_")
        } else {
            translate(request.name, request.case)
        }
    }
}

///
/// NameResolver
///

pub struct NameResolver {
    metadata: Arc<MetadataResolver>,
    default: Arc<dyn NameProvider>,
    per_type: SnapshotCache<&'static str, Arc<dyn NameProvider>>,
    strategies: SnapshotCache<&'static str, Arc<dyn NameProvider>>,
    names: SnapshotCache<&'static str, Arc<str>>,
}

impl NameResolver {
    #[must_use]
    pub fn new(metadata: Arc<MetadataResolver>) -> Self {
        Self::with_default(metadata, Arc::new(DefaultNameProvider))
    }

    #[must_use]
    pub fn with_default(metadata: Arc<MetadataResolver>, default: Arc<dyn NameProvider>) -> Self {
        Self {
            metadata,
            default,
            per_type: SnapshotCache::new(),
            strategies: SnapshotCache::new(),
            names: SnapshotCache::new(),
        }
    }

    /// Collection name for `type_ref`, computed once and cached.
    pub fn collection_name(&self, type_ref: TypeRef) -> Result<String, MapperError> {
        let name = self.names.get_or_try_insert_with(type_ref.path, || {
            let name = self.compute(type_ref)?;
            debug!(path = type_ref.path, collection = %name, "resolved collection name");

            Ok::<_, MapperError>(Arc::from(name))
        })?;

        Ok(name.to_string())
    }

    /// Collection name for the runtime type of `object`.
    pub fn collection_name_of(&self, object: &dyn MappedObject) -> Result<String, MapperError> {
        self.collection_name(object.type_ref())
    }

    /// Use `provider` for the type at `path`; drops its cached name.
    pub fn set_provider_for(&self, path: &'static str, provider: Arc<dyn NameProvider>) {
        self.per_type.insert(path, provider);
        self.names.retain(|cached, _| *cached != path);
    }

    /// Register a provider under the strategy name used in entity markers.
    pub fn register_strategy(&self, name: &'static str, provider: Arc<dyn NameProvider>) {
        self.strategies.insert(name, provider);
        self.names.retain(|_, _| false);
    }

    fn compute(&self, type_ref: TypeRef) -> Result<String, MapperError> {
        let meta = self.metadata.resolve_entity_metadata(type_ref)?;
        let marker = match meta.shape {
            EntityShape::Entity(marker) => Some(marker),
            EntityShape::Embedded(_) | EntityShape::Opaque => None,
        };
        let strategy = marker.map(|m| m.name_strategy).unwrap_or_default();

        let provider = match (self.per_type.get(type_ref.path), strategy) {
            (Some(provider), _) => provider,
            (None, NameStrategy::Provider(name)) => self.strategies.get(name).ok_or_else(|| {
                MapperError::configuration(
                    ErrorOrigin::Naming,
                    format!(
                        "entity '{}' names provider '{name}' but none is registered",
                        type_ref.path
                    ),
                )
            })?,
            (None, _) => Arc::clone(&self.default),
        };

        let request = NameRequest {
            path: meta.path,
            name: meta.name,
            override_name: marker.and_then(|m| m.collection),
            fully_qualified: strategy == NameStrategy::FullyQualified,
            case: meta.case,
        };

        Ok(provider.collection_name(&request))
    }
}

///
/// TESTS
///
