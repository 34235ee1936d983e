//! Enforcement-office registry
//!
//! Cantonal office routing is reference data: filings go to the office of
//! the debtor's domicile, keyed by canton. The table is versioned and
//! replaceable at runtime; a canton without an entry routes to the
//! configured default office rather than failing the filing.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One cantonal enforcement office
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    /// Routing code used in filing payloads (e.g. `GE01`)
    pub code: String,
    /// Two-letter canton abbreviation
    pub canton: String,
    pub name: String,
}

/// Versioned canton-to-office routing table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficeRegistry {
    pub version: u32,
    offices: HashMap<String, Office>,
    /// Office used when the debtor's canton has no entry
    default_code: String,
}

impl OfficeRegistry {
    /// Builds a registry; the default code must reference a listed office
    pub fn new(
        version: u32,
        offices: Vec<Office>,
        default_code: impl Into<String>,
    ) -> Result<Self, String> {
        let default_code = default_code.into();
        let by_canton: HashMap<String, Office> = offices
            .into_iter()
            .map(|o| (o.canton.clone(), o))
            .collect();
        if !by_canton.values().any(|o| o.code == default_code) {
            return Err(format!("default office {default_code} is not in the table"));
        }
        Ok(Self {
            version,
            offices: by_canton,
            default_code,
        })
    }

    /// Resolves the office for a debtor's canton, falling back to the default
    pub fn office_for_canton(&self, canton: Option<&str>) -> &Office {
        canton
            .and_then(|c| self.offices.get(&c.to_uppercase()))
            .unwrap_or_else(|| self.default_office())
    }

    fn default_office(&self) -> &Office {
        self.offices
            .values()
            .find(|o| o.code == self.default_code)
            .expect("default office validated at construction")
    }

    /// The built-in cantonal routing table
    pub fn builtin() -> &'static OfficeRegistry {
        &BUILTIN_REGISTRY
    }
}

static BUILTIN_REGISTRY: Lazy<OfficeRegistry> = Lazy::new(|| {
    let office = |code: &str, canton: &str, name: &str| Office {
        code: code.to_string(),
        canton: canton.to_string(),
        name: name.to_string(),
    };
    OfficeRegistry::new(
        1,
        vec![
            office("GE01", "GE", "Office des poursuites de Genève"),
            office("VD01", "VD", "Office des poursuites du district de Lausanne"),
            office("VS01", "VS", "Office des poursuites de Sion"),
            office("NE01", "NE", "Office des poursuites de Neuchâtel"),
            office("FR01", "FR", "Office des poursuites de la Sarine"),
            office("BE01", "BE", "Betreibungsamt Bern-Mittelland"),
            office("ZH01", "ZH", "Betreibungsamt Zürich"),
            office("BS01", "BS", "Betreibungsamt Basel-Stadt"),
            office("TI01", "TI", "Ufficio di esecuzione di Lugano"),
        ],
        "GE01",
    )
    .expect("builtin office table is well-formed")
});
