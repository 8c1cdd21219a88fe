//! crates/protolab_core/src/selection.rs
//!
//! The user's current choices, one slot per item class, mutated only through
//! [`SelectionCommand`]s.

use tracing::debug;

use crate::domain::{ItemClass, NONE_ITEM_ID};

/// A selected multi-select item and how many of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub item_id: String,
    /// Always at least 1.
    pub quantity: u32,
}

/// Validation failures raised before an estimate is submitted anywhere.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Please select a microcontroller")]
    MissingMicrocontroller,
}

/// Every mutation the selection store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    Select { class: ItemClass, item_id: String },
    Deselect { class: ItemClass, item_id: String },
    /// In a single-select class holding a different item, replaces that item.
    Toggle { class: ItemClass, item_id: String },
    SetQuantity { class: ItemClass, item_id: String, delta: i32 },
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    mcu: Option<String>,
    display: Option<String>,
    sensors: Vec<SelectionEntry>,
    components: Vec<SelectionEntry>,
    actuators: Vec<SelectionEntry>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single state-transition function; every other mutator routes through here.
    pub fn apply(&mut self, command: SelectionCommand) {
        match command {
            SelectionCommand::Select { class, item_id } => {
                if !self.is_selected(class, &item_id) {
                    self.insert(class, item_id);
                }
            }
            SelectionCommand::Deselect { class, item_id } => self.remove(class, &item_id),
            SelectionCommand::Toggle { class, item_id } => {
                if self.is_selected(class, &item_id) {
                    self.remove(class, &item_id);
                } else {
                    self.insert(class, item_id);
                }
            }
            SelectionCommand::SetQuantity {
                class,
                item_id,
                delta,
            } => self.adjust_quantity(class, &item_id, delta),
            SelectionCommand::Reset => *self = Self::default(),
        }
    }

    pub fn toggle(&mut self, class: ItemClass, item_id: impl Into<String>) {
        self.apply(SelectionCommand::Toggle {
            class,
            item_id: item_id.into(),
        });
    }

    pub fn set_quantity(&mut self, class: ItemClass, item_id: impl Into<String>, delta: i32) {
        self.apply(SelectionCommand::SetQuantity {
            class,
            item_id: item_id.into(),
            delta,
        });
    }

    pub fn reset(&mut self) {
        self.apply(SelectionCommand::Reset);
    }

    /// The chosen item of a single-select class.
    pub fn single(&self, class: ItemClass) -> Option<&str> {
        match class {
            ItemClass::Microcontroller => self.mcu.as_deref(),
            ItemClass::Display => self.display.as_deref(),
            _ => None,
        }
    }

    /// The entries of a multi-select class, in the order they were selected.
    pub fn entries(&self, class: ItemClass) -> &[SelectionEntry] {
        match class {
            ItemClass::Sensor => &self.sensors,
            ItemClass::Component => &self.components,
            ItemClass::Actuator => &self.actuators,
            _ => &[],
        }
    }

    /// `(item_id, quantity)` pairs for any class; single-select items carry quantity 1.
    pub fn selected(&self, class: ItemClass) -> Vec<(&str, u32)> {
        if class.is_single_select() {
            self.single(class).map(|id| vec![(id, 1)]).unwrap_or_default()
        } else {
            self.entries(class)
                .iter()
                .map(|e| (e.item_id.as_str(), e.quantity))
                .collect()
        }
    }

    pub fn quantity(&self, class: ItemClass, item_id: &str) -> Option<u32> {
        if class.is_single_select() {
            (self.single(class) == Some(item_id)).then_some(1)
        } else {
            self.entries(class)
                .iter()
                .find(|e| e.item_id == item_id)
                .map(|e| e.quantity)
        }
    }

    pub fn is_selected(&self, class: ItemClass, item_id: &str) -> bool {
        self.quantity(class, item_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        ItemClass::ALL
            .into_iter()
            .all(|class| self.selected(class).is_empty())
    }

    /// Checks what a quote submission needs.
    pub fn validate_for_quote(&self) -> Result<(), SelectionError> {
        if self.mcu.is_none() {
            return Err(SelectionError::MissingMicrocontroller);
        }
        Ok(())
    }

    fn single_slot(&mut self, class: ItemClass) -> Option<&mut Option<String>> {
        match class {
            ItemClass::Microcontroller => Some(&mut self.mcu),
            ItemClass::Display => Some(&mut self.display),
            _ => None,
        }
    }

    fn entries_mut(&mut self, class: ItemClass) -> Option<&mut Vec<SelectionEntry>> {
        match class {
            ItemClass::Sensor => Some(&mut self.sensors),
            ItemClass::Component => Some(&mut self.components),
            ItemClass::Actuator => Some(&mut self.actuators),
            _ => None,
        }
    }

    fn insert(&mut self, class: ItemClass, item_id: String) {
        if let Some(slot) = self.single_slot(class) {
            // Picking the placeholder means "no choice" for this class.
            *slot = (item_id != NONE_ITEM_ID).then_some(item_id);
        } else if let Some(entries) = self.entries_mut(class) {
            entries.push(SelectionEntry {
                item_id,
                quantity: 1,
            });
        }
    }

    fn remove(&mut self, class: ItemClass, item_id: &str) {
        if let Some(slot) = self.single_slot(class) {
            if slot.as_deref() == Some(item_id) {
                *slot = None;
            }
        } else if let Some(entries) = self.entries_mut(class) {
            entries.retain(|e| e.item_id != item_id);
        }
    }

    fn adjust_quantity(&mut self, class: ItemClass, item_id: &str, delta: i32) {
        let Some(entries) = self.entries_mut(class) else {
            debug!("Ignoring quantity change on single-select class {}", class);
            return;
        };
        let Some(pos) = entries.iter().position(|e| e.item_id == item_id) else {
            debug!("Ignoring quantity change for unselected item {}/{}", class, item_id);
            return;
        };

        let next = i64::from(entries[pos].quantity) + i64::from(delta);
        if next < 1 {
            entries.remove(pos);
        } else {
            entries[pos].quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
    }
}
