use std::fmt;
use std::sync::RwLock;

use tracing::{debug, info};

use crate::geo::Location;

/// How long a publication stays available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationType {
    Normal,
    Scheduled,
    Continuous,
}

impl PublicationType {
    /// The commands a user picks a type with, in menu order.
    pub fn options() -> Vec<(String, PublicationType)> {
        vec![
            ("/normal".to_string(), PublicationType::Normal),
            ("/scheduled".to_string(), PublicationType::Scheduled),
            ("/continuous".to_string(), PublicationType::Continuous),
        ]
    }
}

impl fmt::Display for PublicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicationType::Normal => write!(f, "normal"),
            PublicationType::Scheduled => write!(f, "scheduled"),
            PublicationType::Continuous => write!(f, "continuous"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    pub quantity: f64,
    pub unit: String,
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.unit)
    }
}

/// A document certifying someone may handle a material.
#[derive(Debug, Clone, PartialEq)]
pub struct Habilitation {
    pub link: String,
    pub description: String,
}

/// A material offered by a company.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub company: String,
    pub material: String,
    pub category: String,
    pub amount: Amount,
    pub location: Location,
    pub kind: PublicationType,
    pub keywords: Vec<String>,
    pub habilitations: Vec<Habilitation>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl fmt::Display for Publication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}, {}, offered by {} at {}",
            self.material, self.category, self.amount, self.kind, self.company, self.location
        )
    }
}

/// Every published material. Material names are unique per company,
/// compared case-insensitively.
#[derive(Default)]
pub struct Catalogue {
    publications: RwLock<Vec<Publication>>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a publication. Returns `false` if its company already publishes
    /// a material with the same name.
    pub fn publish(&self, publication: Publication) -> bool {
        let mut publications = self.publications.write().expect("catalogue poisoned");
        if publications
            .iter()
            .any(|p| same_material(p, &publication.company, &publication.material))
        {
            debug!(company = %publication.company, material = %publication.material, "duplicate material");
            return false;
        }
        info!(company = %publication.company, material = %publication.material, "material published");
        publications.push(publication);
        true
    }

    pub fn has_material(&self, company: &str, material: &str) -> bool {
        let publications = self.publications.read().expect("catalogue poisoned");
        publications.iter().any(|p| same_material(p, company, material))
    }

    pub fn of_company(&self, company: &str) -> Vec<Publication> {
        self.filter(|p| p.company == company)
    }

    pub fn by_category(&self, category: &str) -> Vec<Publication> {
        self.filter(|p| p.category.eq_ignore_ascii_case(category.trim()))
    }

    pub fn by_keyword(&self, keyword: &str) -> Vec<Publication> {
        let keyword = keyword.trim();
        self.filter(|p| p.keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)))
    }

    /// Publications picked up within `max_km` of `from`, nearest first.
    pub fn near(&self, from: &Location, max_km: f64) -> Vec<Publication> {
        let mut found: Vec<(f64, Publication)> = self
            .filter(|p| p.location.distance_km(from) <= max_km)
            .into_iter()
            .map(|p| (p.location.distance_km(from), p))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().map(|(_, p)| p).collect()
    }

    pub fn len(&self) -> usize {
        self.publications.read().expect("catalogue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter(&self, keep: impl Fn(&Publication) -> bool) -> Vec<Publication> {
        let publications = self.publications.read().expect("catalogue poisoned");
        publications.iter().filter(|p| keep(p)).cloned().collect()
    }
}

fn same_material(p: &Publication, company: &str, material: &str) -> bool {
    p.company == company && p.material.eq_ignore_ascii_case(material.trim())
}

/// `title` followed by one bullet per publication, or `empty` if none.
pub(crate) fn listing(title: &str, publications: &[Publication], empty: &str) -> String {
    if publications.is_empty() {
        return empty.to_string();
    }
    let mut out = title.to_string();
    for p in publications {
        out.push_str(&format!("\n- {p}"));
    }
    out
}
