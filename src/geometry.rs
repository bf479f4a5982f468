//! Study-area geometries and their rendering as a backend array literal.
//!
//! The host application owns the layer holding the study area. Here it is reduced
//! to the [`FeatureSource`] capability: something that can hand out its polygons
//! as `(WKT, is single part)` snapshots.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SummaryError};

lazy_static! {
    // leading geometry tag of a WKT string
    static ref WKT_TAG: Regex = Regex::new(r"^\s*([A-Za-z]+)").unwrap();
}

/// Coordinate reference system used for the study-area polygons (Lambert-93).
pub const DEFAULT_SRID: u32 = 2154;

const SEPARATOR: &str = ", ";

// ------------- PolygonFeature -------------
/// Deserialized features are always classified from their WKT, so a request can
/// neither smuggle in another geometry kind nor mislabel its parts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawFeature")]
pub struct PolygonFeature {
    wkt: String,
    single_part: bool,
}

impl PolygonFeature {
    pub fn new(wkt: impl Into<String>, single_part: bool) -> Self {
        Self {
            wkt: wkt.into(),
            single_part,
        }
    }
    /// Classifies the feature from its WKT tag. Anything that is neither a
    /// polygon nor a multipolygon cannot delimit a study area.
    pub fn from_wkt(wkt: impl Into<String>) -> Result<Self> {
        let wkt = wkt.into();
        let tag = WKT_TAG
            .captures(&wkt)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
            .unwrap_or_default();
        let single_part = match tag.as_str() {
            "POLYGON" => true,
            "MULTIPOLYGON" => false,
            other => {
                return Err(SummaryError::Configuration(format!(
                    "the study area must be made of polygons, found '{other}'"
                )));
            }
        };
        Ok(Self { wkt, single_part })
    }
    pub fn wkt(&self) -> &str {
        &self.wkt
    }
    pub fn single_part(&self) -> bool {
        self.single_part
    }
    fn constructor(&self, srid: u32) -> String {
        let function = if self.single_part {
            "ST_PolygonFromText"
        } else {
            "ST_MPolyFromText"
        };
        format!("{function}('{}', {srid})", self.wkt)
    }
}

#[derive(Deserialize)]
struct RawFeature {
    wkt: String,
}

impl TryFrom<RawFeature> for PolygonFeature {
    type Error = SummaryError;
    fn try_from(raw: RawFeature) -> Result<Self> {
        PolygonFeature::from_wkt(raw.wkt)
    }
}

// ------------- FeatureSource -------------
/// A layer able to provide polygon features.
pub trait FeatureSource {
    fn features(&self) -> Vec<PolygonFeature>;
    /// Features currently selected by the user, possibly none.
    fn selected_features(&self) -> Vec<PolygonFeature>;
}

/// The selection when there is one, otherwise every feature of the layer.
pub fn study_area<S: FeatureSource + ?Sized>(source: &S) -> Vec<PolygonFeature> {
    let selected = source.selected_features();
    if selected.is_empty() {
        source.features()
    } else {
        selected
    }
}

/// Renders `array[<constructor>, ...]` for the given features.
///
/// One feature gives no separator at all, N features give exactly N - 1.
pub fn polygon_array(features: &[PolygonFeature], srid: u32) -> Result<String> {
    if features.is_empty() {
        return Err(SummaryError::Configuration(
            "no study-area geometry supplied".to_string(),
        ));
    }
    let mut array = String::from("array[");
    for feature in features {
        array.push_str(&feature.constructor(srid));
        array.push_str(SEPARATOR);
    }
    // drop the one trailing separator
    array.truncate(array.len() - SEPARATOR.len());
    array.push(']');
    Ok(array)
}
