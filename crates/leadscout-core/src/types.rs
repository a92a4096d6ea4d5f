//! Closed enumerations shared across LeadScout.
//!
//! Niches and cities are fixed at build time. Their declaration order is the
//! order the pipeline walks them in, so `Ord` is derived and must not be
//! reordered without invalidating resume behaviour of existing checkpoints.

use crate::error::LeadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Industry category a lead was collected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Niche {
    /// Physiotherapy practices
    #[serde(rename = "Physical therapists")]
    PhysicalTherapists,
    /// Dental practices
    #[serde(rename = "Dentists")]
    Dentists,
    /// Car repair workshops
    #[serde(rename = "Auto repair shops")]
    AutoRepairShops,
    /// Removal and storage companies
    #[serde(rename = "Moving companies")]
    MovingCompanies,
    /// Commercial and household cleaning
    #[serde(rename = "Cleaning companies")]
    CleaningCompanies,
    /// Beauty salons, cosmetics and spas
    #[serde(rename = "Beauty & wellness (premium)")]
    BeautyWellness,
    /// Estate agents
    #[serde(rename = "Real estate agents")]
    RealEstateAgents,
    /// Law firms, accountants and tax advisors
    #[serde(rename = "Lawyers / tax advisors")]
    LawyersTaxAdvisors,
    /// Pet shops, boarding and veterinarians
    #[serde(rename = "Pet services")]
    PetServices,
    /// Plumbers and heating engineers
    #[serde(rename = "Plumbing & heating")]
    PlumbingHeating,
    /// Garden centres and landscapers
    #[serde(rename = "Gardening & landscaping")]
    GardeningLandscaping,
}

impl Niche {
    /// Every niche, in pipeline order.
    pub const ALL: [Niche; 11] = [
        Self::PhysicalTherapists,
        Self::Dentists,
        Self::AutoRepairShops,
        Self::MovingCompanies,
        Self::CleaningCompanies,
        Self::BeautyWellness,
        Self::RealEstateAgents,
        Self::LawyersTaxAdvisors,
        Self::PetServices,
        Self::PlumbingHeating,
        Self::GardeningLandscaping,
    ];

    /// Human-readable label, also used as the search keyword and CSV value.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::PhysicalTherapists => "Physical therapists",
            Self::Dentists => "Dentists",
            Self::AutoRepairShops => "Auto repair shops",
            Self::MovingCompanies => "Moving companies",
            Self::CleaningCompanies => "Cleaning companies",
            Self::BeautyWellness => "Beauty & wellness (premium)",
            Self::RealEstateAgents => "Real estate agents",
            Self::LawyersTaxAdvisors => "Lawyers / tax advisors",
            Self::PetServices => "Pet services",
            Self::PlumbingHeating => "Plumbing & heating",
            Self::GardeningLandscaping => "Gardening & landscaping",
        }
    }

    /// Short command-line friendly identifier.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::PhysicalTherapists => "physical-therapists",
            Self::Dentists => "dentists",
            Self::AutoRepairShops => "auto-repair-shops",
            Self::MovingCompanies => "moving-companies",
            Self::CleaningCompanies => "cleaning-companies",
            Self::BeautyWellness => "beauty-wellness",
            Self::RealEstateAgents => "real-estate-agents",
            Self::LawyersTaxAdvisors => "lawyers-tax-advisors",
            Self::PetServices => "pet-services",
            Self::PlumbingHeating => "plumbing-heating",
            Self::GardeningLandscaping => "gardening-landscaping",
        }
    }

    /// OpenStreetMap `(key, value)` tag filters that identify this niche.
    ///
    /// Cleaning companies have no dedicated OSM tag, so the broad
    /// `office=company` filter is used.
    #[must_use]
    pub fn osm_tags(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::PhysicalTherapists => &[
                ("amenity", "physiotherapist"),
                ("healthcare", "physiotherapist"),
            ],
            Self::Dentists => &[("amenity", "dentist")],
            Self::AutoRepairShops => &[("shop", "car_repair"), ("amenity", "car_repair")],
            Self::MovingCompanies => &[("office", "moving_company"), ("shop", "storage")],
            Self::CleaningCompanies => &[("office", "company")],
            Self::BeautyWellness => &[
                ("shop", "beauty"),
                ("shop", "cosmetics"),
                ("amenity", "spa"),
            ],
            Self::RealEstateAgents => &[("office", "estate_agent")],
            Self::LawyersTaxAdvisors => &[
                ("office", "lawyer"),
                ("office", "accountant"),
                ("office", "tax_advisor"),
            ],
            Self::PetServices => &[
                ("shop", "pet"),
                ("amenity", "animal_boarding"),
                ("amenity", "veterinary"),
            ],
            Self::PlumbingHeating => &[("craft", "plumber"), ("shop", "plumber")],
            Self::GardeningLandscaping => &[("shop", "garden_centre"), ("craft", "gardener")],
        }
    }
}

impl fmt::Display for Niche {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Niche {
    type Err = LeadError;

    /// Accepts either the label (case-insensitive) or the slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|n| n.slug() == needle || n.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| LeadError::Validation(format!("unknown niche '{needle}'")))
    }
}

/// City a lead was collected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum City {
    /// Mannheim
    Mannheim,
    /// Heidelberg
    Heidelberg,
    /// Heilbronn
    Heilbronn,
    /// Pforzheim
    Pforzheim,
    /// Ulm
    Ulm,
    /// Reutlingen
    Reutlingen,
    /// Tübingen
    #[serde(rename = "Tübingen")]
    Tuebingen,
    /// Esslingen am Neckar
    #[serde(rename = "Esslingen am Neckar")]
    Esslingen,
}

impl City {
    /// Every city, in pipeline order.
    pub const ALL: [City; 8] = [
        Self::Mannheim,
        Self::Heidelberg,
        Self::Heilbronn,
        Self::Pforzheim,
        Self::Ulm,
        Self::Reutlingen,
        Self::Tuebingen,
        Self::Esslingen,
    ];

    /// Human-readable name, used in search queries and the CSV.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mannheim => "Mannheim",
            Self::Heidelberg => "Heidelberg",
            Self::Heilbronn => "Heilbronn",
            Self::Pforzheim => "Pforzheim",
            Self::Ulm => "Ulm",
            Self::Reutlingen => "Reutlingen",
            Self::Tuebingen => "Tübingen",
            Self::Esslingen => "Esslingen am Neckar",
        }
    }

    /// Short command-line friendly identifier.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Mannheim => "mannheim",
            Self::Heidelberg => "heidelberg",
            Self::Heilbronn => "heilbronn",
            Self::Pforzheim => "pforzheim",
            Self::Ulm => "ulm",
            Self::Reutlingen => "reutlingen",
            Self::Tuebingen => "tuebingen",
            Self::Esslingen => "esslingen",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for City {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == needle || c.label().to_lowercase() == needle.to_lowercase())
            .ok_or_else(|| LeadError::Validation(format!("unknown city '{needle}'")))
    }
}

/// One unit of pipeline work: a niche searched within a city.
///
/// Ordering is niche first, then city, which is exactly the walk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    /// Niche searched
    pub niche: Niche,
    /// City searched
    pub city: City,
}

impl PairKey {
    /// Create a pair key.
    #[must_use]
    pub fn new(niche: Niche, city: City) -> Self {
        Self { niche, city }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.niche, self.city)
    }
}
