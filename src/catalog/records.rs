//! Record types for the three catalog tiers
//!
//! Every scraped field is kept as raw text: prices keep their currency
//! symbols and formatting, names keep whatever casing the site uses.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One level of the catalog hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Schools listed by the supplier
    Schools,

    /// Products sold on a school's store page
    Products,

    /// Size/price options of a product
    Variants,
}

/// The tier at which a crawl invocation stops
pub type Depth = Tier;

impl Tier {
    /// All tiers, outermost first
    pub const ALL: [Tier; 3] = [Tier::Schools, Tier::Products, Tier::Variants];

    /// Returns true if a crawl stopping at `self` produces `tier`
    pub fn includes(&self, tier: Tier) -> bool {
        tier <= *self
    }

    /// Name used in export file names and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schools => "schools",
            Self::Products => "products",
            Self::Variants => "variants",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schools" => Ok(Self::Schools),
            "products" => Ok(Self::Products),
            "variants" => Ok(Self::Variants),
            other => Err(format!(
                "invalid depth '{}' (expected schools, products or variants)",
                other
            )),
        }
    }
}

/// A school listed by a supplier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct School {
    pub id: u64,
    pub name: Option<String>,
    pub store_page: Option<String>,
    /// Unique reference number, when the site embeds one in the listing
    pub urn: Option<String>,
}

/// A product on a school's store page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: u64,
    pub school_id: u64,
    pub name: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub label: Option<String>,
}

/// One selectable option of a product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub id: u64,
    pub product_id: u64,
    pub size: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    #[serde(serialize_with = "join_cells")]
    pub icons: Vec<String>,
    #[serde(serialize_with = "join_cells")]
    pub colors: Vec<String>,
}

impl Variant {
    /// Row standing in for an option whose extraction failed
    pub fn placeholder(id: u64, product_id: u64) -> Self {
        Self {
            id,
            product_id,
            ..Self::default()
        }
    }

    /// Returns true if no scraped field carries data
    pub fn is_placeholder(&self) -> bool {
        self.size.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.icons.is_empty()
            && self.colors.is_empty()
    }
}

/// Writes a list attribute as a single `|`-separated cell
fn join_cells<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&values.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_includes() {
        assert!(Depth::Schools.includes(Tier::Schools));
        assert!(!Depth::Schools.includes(Tier::Products));
        assert!(Depth::Products.includes(Tier::Schools));
        assert!(!Depth::Products.includes(Tier::Variants));
        assert!(Depth::Variants.includes(Tier::Variants));
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("schools".parse::<Tier>().unwrap(), Tier::Schools);
        assert_eq!(" Products ".parse::<Tier>().unwrap(), Tier::Products);
        assert_eq!("VARIANTS".parse::<Tier>().unwrap(), Tier::Variants);

        let err = "sizes".parse::<Tier>().unwrap_err();
        assert!(err.contains("sizes"));
    }

    #[test]
    fn test_tier_display_round_trip() {
        for tier in Tier::ALL {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
    }

    #[test]
    fn test_placeholder_variant() {
        let variant = Variant::placeholder(7, 3);
        assert_eq!(variant.id, 7);
        assert_eq!(variant.product_id, 3);
        assert!(variant.is_placeholder());

        let filled = Variant {
            size: Some("M".to_string()),
            ..Variant::placeholder(8, 3)
        };
        assert!(!filled.is_placeholder());
    }
}
