//! Categories and the ordered category book.
//!
//! Tasks reference a category either by key (`"📋 Outros"`) or, in older
//! data, by display name (`"Outros"`). [`CategoryBook::canonical_key`] is the
//! one place that maps either form to a [`CategoryKey`].

use std::fmt;

use rand::Rng;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::policy;

/// Accent colours for categories created at runtime
pub const PALETTE: [&str; 9] = [
    "#ef4444", "#f97316", "#f59e0b", "#10b981", "#06b6d4", "#3b82f6", "#8b5cf6", "#d946ef",
    "#ec4899",
];

pub const DEFAULT_ICON: &str = "📌";
pub const OTHER_KEY: &str = "📋 Outros";
/// Display name of the category reserved for attendance tasks
pub const ATTENDANCE_NAME: &str = "Pessoas/Atendimentos";

const DEFAULTS: [(&str, &str, &str, &str); 9] = [
    ("📚", "Bolsas de Estudos", "#fdab3d", "#5a4a2a"),
    ("🎓", "Incentivo à Educação (ETEC)", "#e44258", "#4a2a2f"),
    ("💼", "Programa de Estágio", "#00c875", "#1f4a3c"),
    ("📊", "Indicadores da Área", "#00d9ff", "#1f3d4a"),
    ("⚙️", "Projeto de Desenvolvimento", "#579bfc", "#2a3d5a"),
    ("🤝", "Relacionamento com Instituições", "#a25ddc", "#3d2a5a"),
    ("🏢", "Deskbee", "#00cd8e", "#1f4a3c"),
    ("👥", ATTENDANCE_NAME, "#ff5ac4", "#4a2a4a"),
    ("📋", "Outros", "#9699a6", "#3d3d4a"),
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn for_parts(icon: &str, name: &str) -> Self {
        Self(format!("{icon} {name}"))
    }

    pub fn other() -> Self {
        Self(OTHER_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub color: String,
    pub icon: String,
    pub name: String,
    pub bg: String,
    /// Identity the category is private to; `None` for legacy categories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Category {
    fn from_default(entry: &(&str, &str, &str, &str)) -> Self {
        let (icon, name, color, bg) = *entry;
        Self {
            color: color.to_string(),
            icon: icon.to_string(),
            name: name.to_string(),
            bg: bg.to_string(),
            owner: None,
        }
    }

    pub fn is_attendance(&self) -> bool {
        self.name == ATTENDANCE_NAME
    }
}

/// The "Other" category as shipped, used when nothing else matches.
pub fn fallback_category() -> Category {
    Category::from_default(&DEFAULTS[DEFAULTS.len() - 1])
}

pub fn is_default_key(key: &CategoryKey) -> bool {
    DEFAULTS
        .iter()
        .any(|(icon, name, _, _)| CategoryKey::for_parts(icon, name) == *key)
}

/// Categories in insertion order, keyed by [`CategoryKey`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBook {
    entries: Vec<(CategoryKey, Category)>,
}

impl CategoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        let entries = DEFAULTS
            .iter()
            .map(|entry| {
                let category = Category::from_default(entry);
                (CategoryKey::for_parts(&category.icon, &category.name), category)
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CategoryKey, &Category)> {
        self.entries.iter().map(|(key, category)| (key, category))
    }

    pub fn get(&self, key: &CategoryKey) -> Option<&Category> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, category)| category)
    }

    pub fn contains(&self, key: &CategoryKey) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, key: CategoryKey, category: Category) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = category,
            None => self.entries.push((key, category)),
        }
    }

    pub fn remove(&mut self, key: &CategoryKey) -> Option<Category> {
        let idx = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Add entries whose keys are not present yet.
    pub fn merge_missing(&mut self, other: CategoryBook) {
        for (key, category) in other.entries {
            if !self.contains(&key) {
                self.entries.push((key, category));
            }
        }
    }

    /// Map a key-or-name reference to a category key. Unknown references
    /// resolve to the "Other" key.
    pub fn canonical_key(&self, reference: &str) -> CategoryKey {
        let reference = reference.trim();
        self.entries
            .iter()
            .find(|(key, category)| key.as_str() == reference || category.name == reference)
            .map(|(key, _)| key.clone())
            .or_else(|| {
                Self::defaults()
                    .entries
                    .into_iter()
                    .find(|(key, category)| key.as_str() == reference || category.name == reference)
                    .map(|(key, _)| key)
            })
            .unwrap_or_else(CategoryKey::other)
    }

    /// Category record for a key-or-name reference, falling back to "Other".
    pub fn resolve(&self, reference: &str) -> Category {
        let key = self.canonical_key(reference);
        self.get(&key)
            .cloned()
            .or_else(|| Self::defaults().get(&key).cloned())
            .unwrap_or_else(fallback_category)
    }

    /// Create a private category with a random accent colour.
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        icon: &str,
        name: &str,
        owner: &str,
        rng: &mut R,
    ) -> Result<CategoryKey> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("category name cannot be empty".to_string()));
        }
        let icon = match icon.trim() {
            "" => DEFAULT_ICON,
            icon => icon,
        };
        let key = CategoryKey::for_parts(icon, name);
        if self.contains(&key) {
            return Err(Error::InvalidArgument(format!("category {key} already exists")));
        }

        let color = PALETTE[rng.random_range(0..PALETTE.len())];
        self.entries.push((
            key.clone(),
            Category {
                color: color.to_string(),
                icon: icon.to_string(),
                name: name.to_string(),
                bg: format!("{color}22"),
                owner: Some(owner.to_string()),
            },
        ));
        Ok(key)
    }

    /// Categories the identity may see, in book order.
    pub fn visible_to(&self, identity: &Identity) -> Vec<(&CategoryKey, &Category)> {
        self.iter()
            .filter(|(_, category)| policy::can_view_category(identity, category))
            .collect()
    }

    /// Categories offered for a new regular task (attendance excluded).
    pub fn selectable_for(&self, identity: &Identity) -> Vec<(&CategoryKey, &Category)> {
        self.visible_to(identity)
            .into_iter()
            .filter(|(_, category)| !category.is_attendance())
            .collect()
    }

    /// Key of the selectable category named by `reference`. Default
    /// categories count as stored when the book predates them; "Other" is
    /// always allowed.
    pub fn pick_for(&self, identity: &Identity, reference: &str) -> Option<CategoryKey> {
        let reference = reference.trim();
        let other = fallback_category();
        if reference == OTHER_KEY || reference == other.name {
            return Some(CategoryKey::other());
        }
        let mut book = self.clone();
        book.merge_missing(Self::defaults());
        let picked = book
            .selectable_for(identity)
            .into_iter()
            .find(|(key, category)| key.as_str() == reference || category.name == reference)
            .map(|(key, _)| key.clone());
        picked
    }

    pub fn attendance_key(&self) -> CategoryKey {
        self.canonical_key(ATTENDANCE_NAME)
    }
}

impl Serialize for CategoryBook {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, category) in &self.entries {
            map.serialize_entry(key, category)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryBook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BookVisitor;

        impl<'de> Visitor<'de> for BookVisitor {
            type Value = CategoryBook;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category key to category")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<CategoryBook, A::Error> {
                let mut book = CategoryBook::new();
                while let Some((key, category)) = access.next_entry::<CategoryKey, Category>()? {
                    book.insert(key, category);
                }
                Ok(book)
            }
        }

        deserializer.deserialize_map(BookVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn defaults_include_nine_fixed_categories() {
        let book = CategoryBook::defaults();
        assert_eq!(book.len(), 9);
        assert!(book.contains(&CategoryKey::other()));
        assert!(is_default_key(&CategoryKey::new("🏢 Deskbee")));
        assert!(!is_default_key(&CategoryKey::new("📌 Financeiro")));
    }

    #[test]
    fn canonical_key_accepts_key_or_name() {
        let book = CategoryBook::defaults();
        let expected = CategoryKey::new("💼 Programa de Estágio");
        assert_eq!(book.canonical_key("💼 Programa de Estágio"), expected);
        assert_eq!(book.canonical_key("Programa de Estágio"), expected);
        assert_eq!(book.canonical_key("unknown"), CategoryKey::other());
    }

    #[test]
    fn empty_book_still_resolves_default_names() {
        let book = CategoryBook::new();
        assert_eq!(book.canonical_key("Outros"), CategoryKey::other());
        assert_eq!(book.resolve("Deskbee").icon, "🏢");
        assert_eq!(book.resolve("missing").name, "Outros");
    }

    #[test]
    fn add_assigns_palette_colour_and_owner() {
        let mut book = CategoryBook::defaults();
        let mut rng = StdRng::seed_from_u64(7);
        let key = book
            .add("💰", "Financeiro", "2858700", &mut rng)
            .expect("add");
        assert_eq!(key.as_str(), "💰 Financeiro");

        let category = book.get(&key).expect("present");
        assert!(PALETTE.contains(&category.color.as_str()));
        assert_eq!(category.bg, format!("{}22", category.color));
        assert_eq!(category.owner.as_deref(), Some("2858700"));

        let err = book
            .add("💰", "Financeiro", "2858700", &mut rng)
            .expect_err("duplicate");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn blank_icon_uses_pin() {
        let mut book = CategoryBook::new();
        let mut rng = StdRng::seed_from_u64(1);
        let key = book.add(" ", "Compras", "2949400", &mut rng).expect("add");
        assert_eq!(key.as_str(), "📌 Compras");
    }

    #[test]
    fn json_shape_keeps_insertion_order() {
        let mut book = CategoryBook::new();
        let mut rng = StdRng::seed_from_u64(3);
        book.add("🅱", "Beta", "2949400", &mut rng).expect("add");
        book.add("🅰", "Alpha", "2949400", &mut rng).expect("add");

        let json = serde_json::to_string(&book).expect("serialize");
        assert!(json.find("Beta").expect("beta") < json.find("Alpha").expect("alpha"));

        let back: CategoryBook = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, book);
    }

    #[test]
    fn legacy_entries_without_owner_load() {
        let json = r##"{"📋 Outros": {"color": "#9699a6", "icon": "📋", "name": "Outros", "bg": "#3d3d4a"}}"##;
        let book: CategoryBook = serde_json::from_str(json).expect("deserialize");
        assert_eq!(book.get(&CategoryKey::other()).expect("other").owner, None);
    }

    #[test]
    fn selectable_excludes_attendance() {
        let config = Config::default();
        let primary = Identity::from_key("2949400", &config);
        let book = CategoryBook::defaults();
        let selectable = book.selectable_for(&primary);
        assert_eq!(selectable.len(), 8);
        assert!(selectable.iter().all(|(_, c)| c.name != ATTENDANCE_NAME));
    }

    #[test]
    fn pick_respects_category_privacy() {
        let config = Config::default();
        let owner = Identity::from_key("2858700", &config);
        let other_member = Identity::from_key("2791900", &config);
        let primary = Identity::from_key("2949400", &config);

        let mut book = CategoryBook::defaults();
        let mut rng = StdRng::seed_from_u64(5);
        let key = book.add("🛒", "Compras", "2858700", &mut rng).expect("add");

        assert_eq!(book.pick_for(&owner, "Compras"), Some(key.clone()));
        assert_eq!(book.pick_for(&other_member, "🛒 Compras"), None);
        assert_eq!(book.pick_for(&other_member, "Outros"), Some(CategoryKey::other()));
        assert_eq!(book.pick_for(&other_member, "Deskbee"), None);
        assert_eq!(
            CategoryBook::new().pick_for(&primary, "Deskbee"),
            Some(CategoryKey::new("🏢 Deskbee"))
        );
        assert_eq!(book.pick_for(&primary, ATTENDANCE_NAME), None);
        assert_eq!(book.pick_for(&primary, "Inexistente"), None);
    }
}
