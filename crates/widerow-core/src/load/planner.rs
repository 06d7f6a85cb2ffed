use crate::{
    codec::ColumnCodec,
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::entity::EntityMetadata,
    value::Value,
};
use thiserror::Error as ThisError;

///
/// PropertyRef
///
/// One includable unit: a whole property (scalar or full collection), a
/// single collection element, or a single unmapped column.
///

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyRef {
    Named(String),
    CollectionElement { property: String, key: Value },
    Unmapped(Value),
}

///
/// PropertySelect
///
/// Which properties a load should materialize. Include and exclude are
/// mutually exclusive shapes; `All` reads the full row.
///

#[derive(Clone, Debug, PartialEq)]
pub enum PropertySelect {
    All,
    Include(Vec<PropertyRef>),
    Exclude(Vec<String>),
}

impl PropertySelect {
    /// Build a partial selection from optional include/exclude lists, as
    /// callers with two optional parameters hand them in. Exactly one must
    /// be supplied; full loads use [`PropertySelect::All`] directly.
    pub fn from_parts(
        includes: Option<Vec<PropertyRef>>,
        excludes: Option<Vec<String>>,
    ) -> Result<Self, PlanError> {
        match (includes, excludes) {
            (Some(_), Some(_)) => Err(PlanError::IncludesAndExcludes),
            (Some(includes), None) => Ok(Self::Include(includes)),
            (None, Some(excludes)) => Ok(Self::Exclude(excludes)),
            (None, None) => Err(PlanError::MissingSelection),
        }
    }
}

///
/// PlanError
///

#[derive(Debug, ThisError)]
pub enum PlanError {
    #[error("a load cannot both include and exclude properties")]
    IncludesAndExcludes,

    #[error("a partial load needs an include or exclude list")]
    MissingSelection,

    #[error("include selection is empty")]
    EmptyIncludes,

    #[error("selection excludes every property")]
    NothingSelected,

    #[error("unknown property '{name}'")]
    UnknownProperty { name: String },

    #[error("property '{name}' is not a collection")]
    NotCollection { name: String },

    #[error("entity has no unmapped-field container")]
    UnmappedWithoutHandler,

    #[error("column name encoding failed: {0}")]
    Codec(InternalError),
}

impl From<PlanError> for InternalError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Codec(inner) => inner,
            other => Self::new(
                ErrorClass::InvalidArgument,
                ErrorOrigin::Plan,
                other.to_string(),
            ),
        }
    }
}

///
/// LoadPlan
///
/// Physical read plan for one selection. `Full` is a paged whole-row range
/// read. `Partial` fetches explicit column names in one read plus a paged
/// range per selected whole collection; partial loads never populate the
/// unmapped container beyond explicitly included unmapped columns.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoadPlan {
    Full,
    Partial {
        names: Vec<Vec<u8>>,
        ranges: Vec<(Vec<u8>, Vec<u8>)>,
    },
}

///
/// LoadPlanner
///

pub struct LoadPlanner<'a, E> {
    meta: &'a EntityMetadata<E>,
    codec: ColumnCodec<'a, E>,
}

impl<'a, E> LoadPlanner<'a, E> {
    #[must_use]
    pub const fn new(meta: &'a EntityMetadata<E>) -> Self {
        Self {
            meta,
            codec: ColumnCodec::new(meta),
        }
    }

    pub fn resolve(&self, select: &PropertySelect) -> Result<LoadPlan, PlanError> {
        match select {
            PropertySelect::All => Ok(LoadPlan::Full),
            PropertySelect::Include(refs) => self.resolve_includes(refs),
            PropertySelect::Exclude(names) => self.resolve_excludes(names),
        }
    }

    fn resolve_includes(&self, refs: &[PropertyRef]) -> Result<LoadPlan, PlanError> {
        if refs.is_empty() {
            return Err(PlanError::EmptyIncludes);
        }

        let mut names = Vec::new();
        let mut ranges = Vec::new();
        for property_ref in refs {
            match property_ref {
                PropertyRef::Named(name) => {
                    let pm = self
                        .meta
                        .property(name)
                        .ok_or_else(|| PlanError::UnknownProperty { name: name.clone() })?;
                    if pm.is_collection() {
                        ranges.push(self.codec.collection_range(pm).map_err(PlanError::Codec)?);
                    } else {
                        names.push(
                            self.codec
                                .property_name(pm)
                                .map_err(|err| PlanError::Codec(err.into()))?,
                        );
                    }
                }
                PropertyRef::CollectionElement { property, key } => {
                    let pm = self.meta.property(property).ok_or_else(|| {
                        PlanError::UnknownProperty {
                            name: property.clone(),
                        }
                    })?;
                    if !pm.is_collection() {
                        return Err(PlanError::NotCollection {
                            name: property.clone(),
                        });
                    }
                    names.push(self.codec.element_name(pm, key).map_err(PlanError::Codec)?);
                }
                PropertyRef::Unmapped(key) => {
                    if self.meta.unmapped().is_none() {
                        return Err(PlanError::UnmappedWithoutHandler);
                    }
                    names.push(self.codec.unmapped_name(key).map_err(PlanError::Codec)?);
                }
            }
        }

        Ok(LoadPlan::Partial { names, ranges })
    }

    fn resolve_excludes(&self, excluded: &[String]) -> Result<LoadPlan, PlanError> {
        // With an unmapped container, excluded names that match no mapped
        // property are inert (they may name unmapped columns); without one
        // they can only be caller mistakes.
        if self.meta.unmapped().is_none() {
            for name in excluded {
                if self.meta.property(name).is_none() {
                    return Err(PlanError::UnknownProperty { name: name.clone() });
                }
            }
        }

        let mut names = Vec::new();
        let mut ranges = Vec::new();
        for pm in self.meta.properties() {
            if excluded.iter().any(|name| name == pm.name) {
                continue;
            }
            if pm.is_collection() {
                ranges.push(self.codec.collection_range(pm).map_err(PlanError::Codec)?);
            } else {
                names.push(
                    self.codec
                        .property_name(pm)
                        .map_err(|err| PlanError::Codec(err.into()))?,
                );
            }
        }

        if names.is_empty() && ranges.is_empty() {
            return Err(PlanError::NothingSelected);
        }

        Ok(LoadPlan::Partial { names, ranges })
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::EntityKind,
        test_support::{Article, PlainNote},
    };

    fn plan_for_article(select: &PropertySelect) -> Result<LoadPlan, PlanError> {
        LoadPlanner::new(Article::metadata()).resolve(select)
    }

    #[test]
    fn including_one_scalar_selects_exactly_one_name() {
        let plan = plan_for_article(&PropertySelect::Include(vec![PropertyRef::Named(
            "title".to_string(),
        )]))
        .unwrap();

        let LoadPlan::Partial { names, ranges } = plan else {
            panic!("expected a partial plan");
        };
        assert_eq!(names.len(), 1);
        assert!(ranges.is_empty());
    }

    #[test]
    fn included_collections_become_ranges() {
        let plan = plan_for_article(&PropertySelect::Include(vec![PropertyRef::Named(
            "tags".to_string(),
        )]))
        .unwrap();

        let LoadPlan::Partial { names, ranges } = plan else {
            panic!("expected a partial plan");
        };
        assert!(names.is_empty());
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn excluding_selects_everything_else() {
        let plan = plan_for_article(&PropertySelect::Exclude(vec!["title".to_string()]))
            .unwrap();

        let LoadPlan::Partial { names, ranges } = plan else {
            panic!("expected a partial plan");
        };
        // rating and views stay as names; tags and attrs stay as ranges.
        assert_eq!(names.len(), 2);
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn exclude_tolerates_unknown_names_only_with_an_unmapped_container() {
        // Article has one, so an unknown name is inert.
        assert!(plan_for_article(&PropertySelect::Exclude(vec!["ghost".to_string()])).is_ok());

        // PlainNote has none, so the same call is a caller error.
        let err = LoadPlanner::new(PlainNote::metadata())
            .resolve(&PropertySelect::Exclude(vec!["ghost".to_string()]))
            .unwrap_err();
        assert!(matches!(err, PlanError::UnknownProperty { .. }));
    }

    #[test]
    fn caller_contract_violations_fail_fast() {
        assert!(matches!(
            PropertySelect::from_parts(Some(Vec::new()), Some(Vec::new())),
            Err(PlanError::IncludesAndExcludes)
        ));
        assert!(matches!(
            PropertySelect::from_parts(None, None),
            Err(PlanError::MissingSelection)
        ));
        assert!(matches!(
            plan_for_article(&PropertySelect::Include(Vec::new())),
            Err(PlanError::EmptyIncludes)
        ));
        assert!(matches!(
            plan_for_article(&PropertySelect::Include(vec![PropertyRef::Named(
                "ghost".to_string()
            )])),
            Err(PlanError::UnknownProperty { .. })
        ));
        assert!(matches!(
            plan_for_article(&PropertySelect::Include(vec![
                PropertyRef::CollectionElement {
                    property: "title".to_string(),
                    key: Value::BigInt(0.into()),
                }
            ])),
            Err(PlanError::NotCollection { .. })
        ));
    }
}
