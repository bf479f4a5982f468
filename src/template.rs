//! The per-species summary query.
//!
//! The query is a fixed chain of common table expressions:
//! * `obs` – observations of the view satisfying the WHERE clause.
//! * `communes` – the distinct municipalities each observation falls in.
//! * `total_count` – number of retained observations.
//! * `data` – one row per species with counts, statuses and aggregated lists.
//! * `synthese` – the caller-visible labels.
//!
//! The `data` stage and the final projection are kept as structured column lists
//! rather than raw text, so that [`QueryTemplate::check`] can verify that every
//! grouping key reaches the output and that nothing ungrouped sneaks in. A query
//! breaking that rule would otherwise only fail once the backend tries to group it.

use std::collections::BTreeSet;

use crate::clause::WhereClause;
use crate::error::{Result, SummaryError};

/// Name of the row number column, unique within a result.
pub const ROW_ID_COLUMN: &str = "id";

// columns the row numbers follow first, by aggregation-stage name
const ROW_ORDER_LEAD: [&str; 2] = ["groupe_taxo", "nom_vern"];

/// A column of the aggregation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Taken as is from a row, hence part of the grouping clause.
    Key { expr: &'static str, name: &'static str },
    /// Computed over the rows of a group.
    Measure { expr: &'static str, name: &'static str },
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Key { name, .. } | Column::Measure { name, .. } => name,
        }
    }
    fn render(&self) -> String {
        match self {
            Column::Key { expr, name } | Column::Measure { expr, name } => {
                format!("{expr} AS {name}")
            }
        }
    }
}

/// A column of the final projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// A column of the aggregation stage, optionally relabelled.
    Column { name: &'static str, label: Option<&'static str> },
    /// An expression computed after aggregation (ratios, lookups).
    Derived { expr: &'static str, label: &'static str },
}

impl Projection {
    /// How the final SELECT refers to this column.
    fn reference(&self) -> String {
        match self {
            Projection::Column { name, label: None } => name.to_string(),
            Projection::Column { label: Some(label), .. } | Projection::Derived { label, .. } => {
                format!("\"{label}\"")
            }
        }
    }
    fn render(&self) -> String {
        match self {
            Projection::Column { name, label: None } => name.to_string(),
            Projection::Column { name, label: Some(label) } => format!("{name} AS \"{label}\""),
            Projection::Derived { expr, label } => format!("{expr} AS \"{label}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub columns: Vec<Column>,
    pub group_by: Vec<&'static str>,
    pub projection: Vec<Projection>,
}

fn key(expr: &'static str, name: &'static str) -> Column {
    Column::Key { expr, name }
}
fn measure(expr: &'static str, name: &'static str) -> Column {
    Column::Measure { expr, name }
}
fn labelled(name: &'static str, label: &'static str) -> Projection {
    Projection::Column { name, label: Some(label) }
}

impl QueryTemplate {
    pub fn species_summary() -> Self {
        let columns = vec![
            key("obs.taxref_cdnom", "cd_nom"),
            key("t.cd_ref", "cd_ref"),
            key("r.nom_rang", "nom_rang"),
            key("obs.groupe_taxo", "groupe_taxo"),
            key("obs.nom_vern", "nom_vern"),
            key("obs.nom_sci", "nom_sci"),
            measure("COUNT(*)", "nb_donnees"),
            measure("COUNT(DISTINCT obs.observateur)", "nb_observateurs"),
            measure("COUNT(DISTINCT obs.date)", "nb_dates"),
            measure("SUM(CASE WHEN mortalite THEN 1 ELSE 0 END)", "nb_mortalite"),
            key("lr.lr_france", "lr_france"),
            key("lr.lrra", "lrra"),
            key("lr.lrauv", "lrauv"),
            key("p.dir_hab", "dir_hab"),
            key("p.dir_ois", "dir_ois"),
            key("p.protection_nat", "protection_nat"),
            key("p.conv_berne", "conv_berne"),
            key("p.conv_bonn", "conv_bonn"),
            measure("max(sn.code_nidif)", "max_atlas_code"),
            measure("max(obs.nombre_total)", "nb_individus_max"),
            measure("min(obs.date_an)", "premiere_observation"),
            measure("max(obs.date_an)", "derniere_observation"),
            measure("string_agg(DISTINCT com.area_name, ', ')", "communes"),
            measure("string_agg(DISTINCT obs.source, ', ')", "sources"),
        ];
        let group_by = vec![
            "obs.taxref_cdnom",
            "obs.groupe_taxo",
            "obs.nom_vern",
            "obs.nom_sci",
            "t.cd_ref",
            "r.nom_rang",
            "lr.lr_france",
            "lr.lrra",
            "lr.lrauv",
            "p.dir_hab",
            "p.dir_ois",
            "p.protection_nat",
            "p.conv_berne",
            "p.conv_bonn",
        ];
        let projection = vec![
            Projection::Column { name: "cd_nom", label: None },
            Projection::Column { name: "cd_ref", label: None },
            labelled("nom_rang", "Rang"),
            labelled("groupe_taxo", "Groupe taxo"),
            labelled("nom_vern", "Nom vernaculaire"),
            labelled("nom_sci", "Nom scientifique"),
            labelled("nb_donnees", "Nb de données"),
            Projection::Derived {
                expr: "ROUND(nb_donnees::DECIMAL / total_count, 4) * 100",
                label: "Nb données / nb données total (%)",
            },
            labelled("nb_observateurs", "Nb d'observateurs"),
            labelled("nb_dates", "Nb de dates"),
            labelled("nb_mortalite", "Nb de données de mortalité"),
            labelled("lr_france", "LR France"),
            labelled("lrra", "LR Rhône-Alpes"),
            labelled("lrauv", "LR Auvergne"),
            labelled("dir_hab", "Directive Habitats"),
            labelled("dir_ois", "Directive Oiseaux"),
            labelled("protection_nat", "Protection nationale"),
            labelled("conv_berne", "Convention de Berne"),
            labelled("conv_bonn", "Convention de Bonn"),
            Projection::Derived { expr: "sn2.statut_nidif", label: "Statut nidif" },
            labelled("nb_individus_max", "Nb d'individus max"),
            labelled("premiere_observation", "Année première obs"),
            labelled("derniere_observation", "Année dernière obs"),
            labelled("communes", "Liste de communes"),
            labelled("sources", "Sources"),
        ];
        Self { columns, group_by, projection }
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Grouped columns and projected key columns must be the same set.
    pub fn check(&self) -> Result<()> {
        let mut grouped = BTreeSet::new();
        for expr in &self.group_by {
            match self.columns.iter().find(|c| matches!(c, Column::Key { expr: e, .. } if e == expr)) {
                Some(column) => {
                    grouped.insert(column.name());
                }
                None => {
                    return Err(mismatch(format!("'{expr}' is grouped but never selected")));
                }
            }
        }
        for column in &self.columns {
            if let Column::Key { expr, name } = column {
                if !self.group_by.contains(expr) {
                    return Err(mismatch(format!("'{name}' is selected but not grouped")));
                }
            }
        }
        let mut projected = BTreeSet::new();
        for projection in &self.projection {
            if let Projection::Column { name, .. } = projection {
                match self.column(name) {
                    Some(Column::Key { name, .. }) => {
                        projected.insert(*name);
                    }
                    Some(Column::Measure { .. }) => (),
                    None => {
                        return Err(mismatch(format!("'{name}' is projected but never computed")));
                    }
                }
            }
        }
        if grouped != projected {
            let missing: Vec<&str> = grouped.difference(&projected).copied().collect();
            let extra: Vec<&str> = projected.difference(&grouped).copied().collect();
            return Err(mismatch(format!(
                "grouped but not projected {missing:?}, projected but not grouped {extra:?}"
            )));
        }
        Ok(())
    }

    /// Window order of the row numbers: the leading columns, then every other
    /// projected key, then the derived columns. The result is a total order over
    /// the rows of `synthese`.
    pub fn row_order(&self) -> Vec<String> {
        let projected_key = |projection: &Projection| match projection {
            Projection::Column { name, .. } => match self.column(name) {
                Some(Column::Key { name, .. }) => Some(*name),
                _ => None,
            },
            Projection::Derived { .. } => None,
        };
        let mut order = Vec::new();
        for lead in ROW_ORDER_LEAD {
            order.extend(
                self.projection
                    .iter()
                    .filter(|p| projected_key(*p) == Some(lead))
                    .map(Projection::reference),
            );
        }
        order.extend(
            self.projection
                .iter()
                .filter(|p| projected_key(*p).is_some_and(|name| !ROW_ORDER_LEAD.contains(&name)))
                .map(Projection::reference),
        );
        order.extend(
            self.projection
                .iter()
                .filter(|p| matches!(p, Projection::Derived { .. }))
                .map(Projection::reference),
        );
        order
    }

    /// Substitutes the WHERE clause and the observation view into the query.
    pub fn render(&self, observation_view: &str, clause: &WhereClause) -> Result<String> {
        self.check()?;
        let columns: Vec<String> = self.columns.iter().map(Column::render).collect();
        let projection: Vec<String> = self.projection.iter().map(Projection::render).collect();
        Ok(format!(
            "WITH obs AS (
    SELECT obs.*
    FROM {observation_view} obs
    LEFT JOIN taxonomie.taxref t ON obs.taxref_cdnom = t.cd_nom
    WHERE {clause}),
communes AS (
    SELECT DISTINCT obs.id_synthese, la.area_name
    FROM obs
    LEFT JOIN gn_synthese.cor_area_synthese cor ON obs.id_synthese = cor.id_synthese
    JOIN ref_geo.l_areas la ON cor.id_area = la.id_area
    WHERE la.id_type = (SELECT id_type FROM ref_geo.bib_areas_types WHERE type_code = 'COM')),
total_count AS (
    SELECT COUNT(*) AS total_count
    FROM obs),
data AS (
    SELECT
    {columns}
    FROM obs
    LEFT JOIN referentiel.statut_nidif sn ON obs.oiso_code_nidif = sn.code_repro
    LEFT JOIN taxonomie.taxref t ON obs.taxref_cdnom = t.cd_nom
    LEFT JOIN taxonomie.bib_taxref_rangs r ON t.id_rang = r.id_rang
    LEFT JOIN communes com ON obs.id_synthese = com.id_synthese
    LEFT JOIN taxonomie.vm_statut_lr lr ON (obs.taxref_cdnom, obs.nom_sci) = (lr.cd_nom, lr.vn_nom_sci)
    LEFT JOIN taxonomie.vm_statut_protection p ON (obs.taxref_cdnom, obs.nom_sci) = (p.cd_nom, p.vn_nom_sci)
    GROUP BY
    {group_by}),
synthese AS (
    SELECT DISTINCT
    {projection}
    FROM total_count, data d
    LEFT JOIN referentiel.statut_nidif sn2 ON d.max_atlas_code = sn2.code_nidif)
SELECT row_number() OVER (ORDER BY {row_order}) AS {ROW_ID_COLUMN}, *
FROM synthese
ORDER BY {ROW_ID_COLUMN}",
            columns = columns.join("\n    , "),
            group_by = self.group_by.join("\n    , "),
            projection = projection.join("\n    , "),
            row_order = self.row_order().join(", "),
        ))
    }
}

fn mismatch(detail: String) -> SummaryError {
    SummaryError::Configuration(format!("grouping/projection mismatch: {detail}"))
}
