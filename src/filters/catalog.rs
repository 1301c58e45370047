//! The filter catalog: lookup by key, menu layout and JSON export.

use serde::Serialize;

use super::edge::{Dog, GaussianLaplace, Gradient, Laplace};
use super::rank::RankFilter;
use super::sharpen::{LaplaceSharp, UnsharpMask};
use super::smooth::{Gaussian, Gaussian3D, Uniform};
use super::{Capabilities, Filter, FilterGroup};
use crate::error::{FilterError, FilterResult};
use crate::params::{ParamSchema, ParameterSet};

/// Ordered, read-only set of filters.
pub struct Catalog {
    filters: Vec<Box<dyn Filter>>,
}

/// One line of the host menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuEntry {
    Filter { key: &'static str, title: &'static str },
    Separator,
}

#[derive(Serialize)]
struct FilterInfo<'a> {
    key: &'static str,
    title: &'static str,
    group: FilterGroup,
    capabilities: Capabilities,
    params: &'a ParamSchema,
    defaults: ParameterSet,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Catalog { filters: Vec::new() }
    }

    /// The fourteen classic filters in menu order.
    pub fn builtin() -> Self {
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(Uniform::new()),
            Box::new(Gaussian::new()),
            Box::new(RankFilter::maximum()),
            Box::new(RankFilter::minimum()),
            Box::new(RankFilter::median()),
            Box::new(RankFilter::percentile()),
            Box::new(Gradient::prewitt()),
            Box::new(Gradient::sobel()),
            Box::new(Laplace::new()),
            Box::new(GaussianLaplace::new()),
            Box::new(Dog::new()),
            Box::new(LaplaceSharp::new()),
            Box::new(UnsharpMask::new()),
            Box::new(Gaussian3D::new()),
        ];
        Catalog { filters }
    }

    /// Add a filter; keys must be unique.
    pub fn register(&mut self, filter: Box<dyn Filter>) -> FilterResult<()> {
        if self.filters.iter().any(|f| f.key() == filter.key()) {
            return Err(FilterError::invalid(
                "key",
                format!("filter `{}` is already registered", filter.key()),
            ));
        }
        self.filters.push(filter);
        Ok(())
    }

    pub fn get(&self, key: &str) -> FilterResult<&dyn Filter> {
        self.filters
            .iter()
            .find(|f| f.key() == key)
            .map(|f| f.as_ref())
            .ok_or_else(|| FilterError::UnknownFilter(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Filter> {
        self.filters.iter().map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filters in order, with a separator wherever the group changes.
    pub fn menu(&self) -> Vec<MenuEntry> {
        let mut entries = Vec::with_capacity(self.filters.len() + 4);
        let mut last: Option<FilterGroup> = None;
        for filter in self.iter() {
            if last.is_some_and(|group| group != filter.group()) {
                entries.push(MenuEntry::Separator);
            }
            last = Some(filter.group());
            entries.push(MenuEntry::Filter {
                key: filter.key(),
                title: filter.title(),
            });
        }
        entries
    }

    /// Titles, flags and schemas of every filter as a JSON array.
    pub fn to_json(&self) -> FilterResult<String> {
        let infos: Vec<FilterInfo<'_>> = self
            .iter()
            .map(|f| FilterInfo {
                key: f.key(),
                title: f.title(),
                group: f.group(),
                capabilities: f.capabilities(),
                params: f.schema(),
                defaults: f.schema().defaults(),
            })
            .collect();
        serde_json::to_string(&infos).map_err(|e| FilterError::Unsupported(e.to_string()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys_unique_and_complete() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 14);
        let mut keys: Vec<_> = catalog.iter().map(|f| f.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 14);
        for key in ["uniform", "percentile", "dog", "unsharp_mask", "gaussian3d"] {
            assert!(catalog.get(key).is_ok(), "{}", key);
        }
    }

    #[test]
    fn test_unknown_key() {
        let catalog = Catalog::builtin();
        assert!(matches!(catalog.get("emboss"), Err(FilterError::UnknownFilter(k)) if k == "emboss"));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut catalog = Catalog::new();
        assert!(catalog.is_empty());
        catalog.register(Box::new(Uniform::new())).unwrap();
        assert!(catalog.register(Box::new(Uniform::new())).is_err());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_menu_separators_between_groups() {
        let menu = Catalog::builtin().menu();
        let separators = menu.iter().filter(|e| **e == MenuEntry::Separator).count();
        assert_eq!(separators, 4);
        assert_eq!(menu.len(), 18);
        assert_eq!(menu[2], MenuEntry::Separator);
        assert_eq!(
            menu[17],
            MenuEntry::Filter {
                key: "gaussian3d",
                title: "Gaussian3D"
            }
        );
    }

    #[test]
    fn test_capabilities_per_filter() {
        let catalog = Catalog::builtin();
        let wide: Vec<_> = catalog
            .iter()
            .filter(|f| f.has(Capabilities::WIDE_INTERMEDIATE))
            .map(|f| f.key())
            .collect();
        assert_eq!(
            wide,
            vec!["prewitt", "sobel", "laplace", "gaussian_laplace", "dog", "laplace_sharp", "unsharp_mask"]
        );
        let g3 = catalog.get("gaussian3d").unwrap();
        assert!(g3.has(Capabilities::STACK_3D));
        assert!(!g3.has(Capabilities::AUTO_SNAPSHOT));
    }

    #[test]
    fn test_json_export() {
        let json = Catalog::builtin().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let dog = &value[10];
        assert_eq!(dog["key"], "dog");
        assert_eq!(dog["group"], "edge");
        assert_eq!(dog["defaults"]["sigma2"], 2.0);
        assert_eq!(dog["params"][0]["key"], "sigma1");
        assert!(dog["capabilities"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c == "wide_intermediate"));
    }
}
