use serde::Deserialize;

/// Complete navigation and extraction table for one supplier
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteAdapter {
    /// Supplier name used on the command line and in export file names
    pub name: String,

    /// Human-readable supplier name
    #[serde(default)]
    pub title: Option<String>,

    /// How schools are listed
    pub schools: SchoolTier,

    /// How a school's products are listed
    #[serde(default)]
    pub products: Option<ProductTier>,

    /// How a product's size options are read
    #[serde(default)]
    pub variants: Option<VariantTier>,
}

impl SiteAdapter {
    /// Display name, falling back to the supplier name
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Where a tier's listing pages come from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingSource {
    /// A single listing page
    Fixed(String),

    /// An enumerated set of category pages
    Urls(Vec<String>),

    /// One page per letter `a`..`z`; the template contains `{letter}`
    Letters(String),

    /// Listing pages linked from a seed page (e.g. regions linking to schools)
    Discovered { seed: String, link: String },

    /// Entries declared in the adapter itself, no listing page to read
    Entries(Vec<ListingEntry>),
}

/// A statically declared listing entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingEntry {
    pub name: String,
    pub url: String,
}

/// Container, item and expansion selectors shared by the listing tiers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Listing {
    /// Best-effort actions run after each listing page loads
    #[serde(default)]
    pub prepare: Vec<Action>,

    /// Element that must exist for the listing to be readable
    #[serde(default)]
    pub container: Option<String>,

    /// Selector matching one element per record, relative to the container
    pub item: String,

    /// How the listing grows beyond its first screen
    #[serde(default)]
    pub expansion: Expansion,

    /// Number of leading items to drop (menu headings and the like)
    #[serde(default)]
    pub skip: usize,
}

/// A best-effort page interaction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Click(String),
    ScrollToBottom,
    SendKeys { selector: String, keys: String },
}

/// Listing expansion rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expansion {
    /// Everything is on the first page
    #[default]
    None,

    /// Click the matching control while it exists and the item count grows
    LoadMore(String),

    /// Scroll to the bottom while the document height grows
    Scroll,

    /// Follow the matching link, reading each page in turn
    NextPage(String),
}

/// How a field value is read from an element
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extract {
    /// Rendered text, whitespace collapsed
    #[default]
    Text,

    /// Inner HTML, trimmed
    Html,

    /// Attribute value; `href` and `src` resolve to absolute URLs
    Attribute(String),
}

/// Extraction rule for a single field
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldRule {
    /// Selector relative to the record's element; absent means the element itself
    #[serde(default)]
    pub selector: Option<String>,

    #[serde(default)]
    pub extract: Extract,

    /// Optional fields are left empty on failure instead of failing the record
    #[serde(default)]
    pub optional: bool,

    /// Regex applied to the value; the first capture group (or the whole
    /// match) becomes the field
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Extraction rule for a list-valued field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListRule {
    pub selector: String,
    #[serde(default)]
    pub extract: Extract,
}

/// School tier rules
///
/// `listing` and the field rules are required for every source except
/// `entries`, which declares its schools directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchoolTier {
    pub source: ListingSource,
    #[serde(default)]
    pub listing: Option<Listing>,
    #[serde(default)]
    pub name: FieldRule,
    #[serde(default)]
    pub store_page: FieldRule,
    #[serde(default)]
    pub urn: Option<FieldRule>,
}

/// Product tier rules, applied to every school's store page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProductTier {
    /// Query appended to the store page URL, e.g. `limit=100`
    #[serde(default)]
    pub query: Option<String>,
    pub listing: Listing,
    pub name: FieldRule,
    pub price: FieldRule,
    pub link: FieldRule,
    pub image: FieldRule,
    #[serde(default)]
    pub label: Option<FieldRule>,
}

/// How an option of the size control is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interaction {
    /// `<select>` control; options are `<option>` elements
    #[default]
    Select,

    /// Clickable swatches
    Click,
}

/// Variant tier rules, applied to every product page
///
/// `size` is read from the option element. The other fields are read from
/// the page when they carry a selector, otherwise from the option element.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariantTier {
    pub control: String,
    pub option: String,
    #[serde(default)]
    pub interaction: Interaction,
    pub size: FieldRule,
    pub price: FieldRule,
    #[serde(default)]
    pub description: Option<FieldRule>,
    #[serde(default)]
    pub icons: Option<ListRule>,
    #[serde(default)]
    pub colors: Option<ListRule>,
}

impl Listing {
    /// Iterates over every selector this listing names
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        let prepare = self.prepare.iter().filter_map(|action| match action {
            Action::Click(selector) => Some(selector.as_str()),
            Action::SendKeys { selector, .. } => Some(selector.as_str()),
            Action::ScrollToBottom => None,
        });
        let expansion = match &self.expansion {
            Expansion::LoadMore(selector) | Expansion::NextPage(selector) => {
                Some(selector.as_str())
            }
            Expansion::None | Expansion::Scroll => None,
        };

        prepare
            .chain(self.container.as_deref())
            .chain(std::iter::once(self.item.as_str()))
            .chain(expansion)
    }
}
