use super::localize::CategoryMap;
use super::query::{col, Column, Localization, OutputColumn, QuerySpec, SpeciesGroup};

/// Southern BC Chinook units reported as their own group.
const SOUTHERN_BC_CHINOOK: &[&str] = &[
    "CK-01", "CK-02", "CK-03", "CK-04", "CK-05", "CK-06", "CK-07", "CK-08", "CK-09", "CK-10",
    "CK-11", "CK-12", "CK-13", "CK-14", "CK-15", "CK-16", "CK-17", "CK-18", "CK-19", "CK-20",
    "CK-21", "CK-22", "CK-25", "CK-27", "CK-28", "CK-29", "CK-31", "CK-32", "CK-33", "CK-34",
    "CK-35", "CK-9002", "CK-9004", "CK-9005", "CK-9006", "CK-9007", "CK-9008",
];

const GROUPS: &[SpeciesGroup] = &[
    SpeciesGroup {
        code: "CK",
        name: "Chinook",
        species: "Chinook",
        life_history: None,
        include: None,
        prefix_len: 2,
    },
    SpeciesGroup {
        code: "CK_SBC",
        name: "Southern BC Chinook",
        species: "Chinook",
        life_history: None,
        include: Some(SOUTHERN_BC_CHINOOK),
        prefix_len: 2,
    },
    SpeciesGroup {
        code: "CM",
        name: "Chum",
        species: "Chum",
        life_history: None,
        include: None,
        prefix_len: 2,
    },
    SpeciesGroup {
        code: "CO",
        name: "Coho",
        species: "Coho",
        life_history: None,
        include: None,
        prefix_len: 2,
    },
    SpeciesGroup {
        code: "PKE",
        name: "Pink Even Year",
        species: "Pink",
        life_history: Some("Even Year"),
        include: None,
        prefix_len: 3,
    },
    SpeciesGroup {
        code: "PKO",
        name: "Pink Odd Year",
        species: "Pink",
        life_history: Some("Odd Year"),
        include: None,
        prefix_len: 3,
    },
    SpeciesGroup {
        code: "SEL",
        name: "Sockeye Lake Type",
        species: "Sockeye",
        life_history: Some("Lake Type"),
        include: None,
        prefix_len: 3,
    },
    SpeciesGroup {
        code: "SER",
        name: "Sockeye River Type",
        species: "Sockeye",
        life_history: Some("River Type"),
        include: None,
        prefix_len: 3,
    },
];

const STATUS_EN: &[OutputColumn] = &[
    col(Column::Source("CU_INDEX"), "cu_index"),
    col(Column::Source("CU_NAME"), "cu_name"),
    col(Column::Qualifier, "species_qualified"),
    col(Column::Source("REGION"), "region"),
    col(Column::Source("STATUS"), "status"),
    col(Column::Source("STATUS_YEAR"), "status_year"),
];

const STATUS_FR: &[OutputColumn] = &[
    col(Column::Source("CU_INDEX"), "indice_uc"),
    col(Column::LocalizedName, "nom_uc"),
    col(Column::Qualifier, "qualificatif_espece"),
    col(Column::Translated("REGION"), "region"),
    col(Column::Source("STATUS"), "statut"),
    col(Column::Source("STATUS_YEAR"), "annee_statut"),
];

const SITES_EN: &[OutputColumn] = &[
    col(Column::Source("CU_INDEX"), "cu_index"),
    col(Column::Qualifier, "species_qualified"),
    col(Column::Source("SITE_ID"), "site_id"),
    col(Column::Source("SITE_NAME"), "site_name"),
    col(Column::Source("LATITUDE"), "latitude"),
    col(Column::Source("LONGITUDE"), "longitude"),
];

const BOUNDARY_EN: &[OutputColumn] = &[
    col(Column::Source("CU_INDEX"), "cu_index"),
    col(Column::Source("CU_NAME"), "cu_name"),
    col(Column::Qualifier, "species_qualified"),
    col(Column::Source("AREA_KM2"), "area_km2"),
    col(Column::Source("BOUNDARY_SOURCE"), "boundary_source"),
    col(Column::Source("LAST_UPDATED"), "last_updated"),
];

/// (dataset key, source table, English columns)
const DATASETS: &[(&str, &str, &[OutputColumn])] = &[
    ("STATUS", "cu_status", STATUS_EN),
    ("SITES", "cu_sites", SITES_EN),
    ("BOUNDARY", "cu_boundary", BOUNDARY_EN),
];

pub fn species_groups() -> &'static [SpeciesGroup] {
    GROUPS
}

/// Every query the extraction stage runs: the English datasets for each
/// species group, then a French status variant per group.
pub fn standard_catalog() -> Vec<QuerySpec> {
    let mut catalog = Vec::new();

    for group in GROUPS {
        for &(dataset, table, columns) in DATASETS {
            catalog.push(QuerySpec {
                name: format!("{}_CU_{}_En", group.code, dataset),
                title: format!("{} CU {} (English)", group.name, dataset.to_lowercase()),
                table,
                group: group.clone(),
                columns: columns.to_vec(),
                localization: None,
                needs_validation: false,
            });
        }
    }

    for group in GROUPS {
        catalog.push(QuerySpec {
            name: format!("{}_CU_STATUS_Fr", group.code),
            title: format!("{} CU status (French)", group.name),
            table: "cu_status",
            group: group.clone(),
            columns: STATUS_FR.to_vec(),
            localization: Some(Localization {
                category_column: Some("statut"),
                categories: CategoryMap::status_fr(),
                text_columns: vec!["nom_uc", "region", "statut"],
            }),
            needs_validation: true,
        });
    }

    catalog
}
