//! crates/protolab_core/src/estimate.rs
//!
//! Price aggregation over the catalog and the current selection. Everything here
//! is a pure function of its inputs; callers recompute after each mutation.

use crate::domain::{Catalog, CatalogItem, ItemClass};
use crate::selection::SelectionStore;

/// One priced line of an estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub class: ItemClass,
    pub item_id: String,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

/// Per-class subtotal and the lines that make it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSubtotal {
    pub class: ItemClass,
    pub lines: Vec<LineItem>,
    pub subtotal: u64,
}

/// A full snapshot of prices for one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    /// One entry per class, in [`ItemClass::ALL`] order, including empty ones.
    pub classes: Vec<ClassSubtotal>,
    pub total: u64,
}

impl Estimate {
    pub fn compute(catalog: &Catalog, store: &SelectionStore) -> Self {
        let classes: Vec<ClassSubtotal> = ItemClass::ALL
            .into_iter()
            .map(|class| {
                let lines = line_items(store, catalog, class);
                let subtotal = sum_lines(&lines);
                ClassSubtotal {
                    class,
                    lines,
                    subtotal,
                }
            })
            .collect();
        let total = grand_total(classes.iter().map(|c| c.subtotal));
        Self { classes, total }
    }

    pub fn subtotal(&self, class: ItemClass) -> u64 {
        self.classes
            .iter()
            .find(|c| c.class == class)
            .map_or(0, |c| c.subtotal)
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineItem> {
        self.classes.iter().flat_map(|c| c.lines.iter())
    }
}

/// Priced lines for one class. Ids the catalog no longer knows are skipped.
pub fn line_items(store: &SelectionStore, catalog: &Catalog, class: ItemClass) -> Vec<LineItem> {
    store
        .selected(class)
        .into_iter()
        .filter_map(|(item_id, quantity)| {
            let item = catalog.find(class, item_id)?;
            Some(LineItem {
                class,
                item_id: item.id.clone(),
                name: item.name.clone(),
                unit_price: item.price,
                quantity,
                line_total: item.price.saturating_mul(u64::from(quantity)),
            })
        })
        .collect()
}

/// Sum of `price × quantity` over one class; stale ids contribute 0.
pub fn class_subtotal(store: &SelectionStore, catalog: &Catalog, class: ItemClass) -> u64 {
    sum_lines(&line_items(store, catalog, class))
}

fn sum_lines(lines: &[LineItem]) -> u64 {
    lines.iter().map(|l| l.line_total).fold(0, u64::saturating_add)
}

pub fn grand_total(subtotals: impl IntoIterator<Item = u64>) -> u64 {
    subtotals.into_iter().fold(0, u64::saturating_add)
}

/// Groups items by category; categories appear in order of first occurrence.
pub fn group_by_category(items: &[CatalogItem]) -> Vec<(&str, Vec<&CatalogItem>)> {
    let mut groups: Vec<(&str, Vec<&CatalogItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(cat, _)| *cat == item.category) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.category.as_str(), vec![item])),
        }
    }
    groups
}
