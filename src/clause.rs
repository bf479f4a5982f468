//! The WHERE clause applied to the observation view.
//!
//! The clause always opens with the mandatory predicate (valid, present, inside the
//! study area). Every optional fragment brings its own leading separator, so an
//! empty fragment simply contributes nothing.

use std::fmt;

use crate::error::Result;
use crate::geometry::{polygon_array, PolygonFeature};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    sql: String,
}

impl WhereClause {
    /// Starts a clause from the study-area polygons.
    pub fn new(features: &[PolygonFeature], srid: u32) -> Result<Self> {
        let array = polygon_array(features, srid)?;
        Ok(Self {
            sql: format!("is_valid and is_present and ST_within(obs.geom, ST_union({array}))"),
        })
    }
    /// Appends a compiled fragment that already carries its separator.
    pub fn and(mut self, fragment: &str) -> Self {
        self.sql.push_str(fragment);
        self
    }
    /// Appends caller-written SQL verbatim, expected to start with `and`.
    ///
    /// The text is neither validated nor escaped: whoever fills it in is trusted
    /// with the observation store.
    pub fn and_raw(mut self, extra: &str) -> Self {
        if !extra.trim().is_empty() {
            self.sql.push(' ');
            self.sql.push_str(extra);
        }
        self
    }
    pub fn as_str(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Mandatory predicate, taxon fragment, temporal fragment and free text, in that order.
pub fn assemble(
    features: &[PolygonFeature],
    srid: u32,
    taxon_fragment: &str,
    temporal_fragment: &str,
    extra_where: &str,
) -> Result<WhereClause> {
    Ok(WhereClause::new(features, srid)?
        .and(taxon_fragment)
        .and(temporal_fragment)
        .and_raw(extra_where))
}
