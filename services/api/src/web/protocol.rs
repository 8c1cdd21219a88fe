//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server,
//! and their conversions from the core domain types.

use chrono::{DateTime, Utc};
use protolab_core::domain::{
    AdminReply, Catalog, ItemClass, Request, RequestDetails, RequestStatus,
};
use protolab_core::estimate::{group_by_category, Estimate, LineItem};
use protolab_core::selection::{SelectionCommand, SelectionStore};
use protolab_core::triage::StatusCounts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Shared Enums
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WireItemClass {
    Mcu,
    Sensors,
    Components,
    Actuators,
    Display,
}

impl From<WireItemClass> for ItemClass {
    fn from(class: WireItemClass) -> Self {
        match class {
            WireItemClass::Mcu => ItemClass::Microcontroller,
            WireItemClass::Sensors => ItemClass::Sensor,
            WireItemClass::Components => ItemClass::Component,
            WireItemClass::Actuators => ItemClass::Actuator,
            WireItemClass::Display => ItemClass::Display,
        }
    }
}

impl From<ItemClass> for WireItemClass {
    fn from(class: ItemClass) -> Self {
        match class {
            ItemClass::Microcontroller => WireItemClass::Mcu,
            ItemClass::Sensor => WireItemClass::Sensors,
            ItemClass::Component => WireItemClass::Components,
            ItemClass::Actuator => WireItemClass::Actuators,
            ItemClass::Display => WireItemClass::Display,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// One mutation of an estimate's selection.
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandRequest {
    Select { class: WireItemClass, item_id: String },
    Deselect { class: WireItemClass, item_id: String },
    /// Selects an unselected item, deselects a selected one.
    Toggle { class: WireItemClass, item_id: String },
    /// Adds `delta` to the quantity; dropping below 1 removes the item.
    SetQuantity { class: WireItemClass, item_id: String, delta: i32 },
    Reset,
}

impl CommandRequest {
    /// The item a command would add to the selection, if any.
    pub fn added_item(&self) -> Option<(ItemClass, &str)> {
        match self {
            CommandRequest::Select { class, item_id } | CommandRequest::Toggle { class, item_id } => {
                Some(((*class).into(), item_id.as_str()))
            }
            _ => None,
        }
    }
}

impl From<CommandRequest> for SelectionCommand {
    fn from(cmd: CommandRequest) -> Self {
        match cmd {
            CommandRequest::Select { class, item_id } => SelectionCommand::Select {
                class: class.into(),
                item_id,
            },
            CommandRequest::Deselect { class, item_id } => SelectionCommand::Deselect {
                class: class.into(),
                item_id,
            },
            CommandRequest::Toggle { class, item_id } => SelectionCommand::Toggle {
                class: class.into(),
                item_id,
            },
            CommandRequest::SetQuantity {
                class,
                item_id,
                delta,
            } => SelectionCommand::SetQuantity {
                class: class.into(),
                item_id,
                delta,
            },
            CommandRequest::Reset => SelectionCommand::Reset,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug)]
pub struct ListRequestsQuery {
    /// `pending`, `under_review` or `solved`; omitted means all.
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ReplyBody {
    pub message: String,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct SolveBody {
    #[serde(default)]
    pub message: Option<String>,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, ToSchema, Debug)]
pub struct CatalogItemDto {
    pub id: String,
    pub name: String,
    pub price: u64,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CategoryGroupDto {
    pub category: String,
    pub items: Vec<CatalogItemDto>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CatalogClassDto {
    pub class: WireItemClass,
    pub single_select: bool,
    pub categories: Vec<CategoryGroupDto>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CatalogResponse {
    /// Set when the catalog failed to load and the estimator runs on an empty one.
    pub banner: Option<String>,
    pub classes: Vec<CatalogClassDto>,
}

impl CatalogResponse {
    pub fn new(catalog: &Catalog, banner: Option<String>) -> Self {
        let classes = ItemClass::ALL
            .into_iter()
            .map(|class| CatalogClassDto {
                class: class.into(),
                single_select: class.is_single_select(),
                categories: group_by_category(catalog.items(class))
                    .into_iter()
                    .map(|(category, items)| CategoryGroupDto {
                        category: category.to_string(),
                        items: items
                            .into_iter()
                            .map(|item| CatalogItemDto {
                                id: item.id.clone(),
                                name: item.name.clone(),
                                price: item.price,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self { banner, classes }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct LineItemDto {
    pub item_id: String,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

impl From<&LineItem> for LineItemDto {
    fn from(line: &LineItem) -> Self {
        Self {
            item_id: line.item_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_total: line.line_total,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ClassSubtotalDto {
    pub class: WireItemClass,
    pub subtotal: u64,
    pub lines: Vec<LineItemDto>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SelectedEntryDto {
    pub class: WireItemClass,
    pub item_id: String,
    pub quantity: u32,
}

/// The selection and the totals recomputed from it.
#[derive(Serialize, ToSchema, Debug)]
pub struct EstimateResponse {
    pub estimate_id: Uuid,
    /// Everything selected, including ids the catalog no longer knows.
    pub selection: Vec<SelectedEntryDto>,
    pub classes: Vec<ClassSubtotalDto>,
    pub total: u64,
}

impl EstimateResponse {
    pub fn new(estimate_id: Uuid, catalog: &Catalog, store: &SelectionStore) -> Self {
        let estimate = Estimate::compute(catalog, store);
        let selection = ItemClass::ALL
            .into_iter()
            .flat_map(|class| {
                store
                    .selected(class)
                    .into_iter()
                    .map(move |(item_id, quantity)| SelectedEntryDto {
                        class: class.into(),
                        item_id: item_id.to_string(),
                        quantity,
                    })
            })
            .collect();
        let classes = estimate
            .classes
            .iter()
            .map(|c| ClassSubtotalDto {
                class: c.class.into(),
                subtotal: c.subtotal,
                lines: c.lines.iter().map(LineItemDto::from).collect(),
            })
            .collect();
        Self {
            estimate_id,
            selection,
            classes,
            total: estimate.total,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct RequestDto {
    pub id: Uuid,
    pub request_type: String,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: String,
    pub summary: String,
    pub admin_notes: Option<String>,
}

impl From<Request> for RequestDto {
    fn from(r: Request) -> Self {
        Self {
            id: r.id,
            request_type: r.request_type.to_string(),
            user_id: r.user_id,
            user_email: r.user_email,
            user_name: r.user_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
            status: r.status.to_string(),
            summary: r.summary,
            admin_notes: r.admin_notes,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
pub struct StatusCountsDto {
    pub all: usize,
    pub pending: usize,
    pub under_review: usize,
    pub solved: usize,
}

impl From<StatusCounts> for StatusCountsDto {
    fn from(c: StatusCounts) -> Self {
        Self {
            all: c.all,
            pending: c.pending,
            under_review: c.under_review,
            solved: c.solved,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct RequestListResponse {
    pub requests: Vec<RequestDto>,
    pub counts: StatusCountsDto,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AdminReplyDto {
    pub message: String,
    pub previous_status: String,
    pub new_status: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminReply> for AdminReplyDto {
    fn from(r: AdminReply) -> Self {
        Self {
            message: r.message,
            previous_status: r.previous_status.to_string(),
            new_status: r.new_status.to_string(),
            created_at: r.created_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct RequestDetailsResponse {
    pub request: RequestDto,
    pub fields: BTreeMap<String, String>,
    pub replies: Vec<AdminReplyDto>,
}

impl From<RequestDetails> for RequestDetailsResponse {
    fn from(d: RequestDetails) -> Self {
        Self {
            request: d.request.into(),
            fields: d.fields,
            replies: d.replies.into_iter().map(AdminReplyDto::from).collect(),
        }
    }
}

/// Parses the optional `status` query value.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<RequestStatus>, String> {
    match raw {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_json_uses_tagged_snake_case() {
        let cmd: CommandRequest = serde_json::from_str(
            r#"{"type":"set_quantity","class":"sensors","item_id":"dht22","delta":-1}"#,
        )
        .unwrap();
        assert_eq!(
            SelectionCommand::from(cmd),
            SelectionCommand::SetQuantity {
                class: ItemClass::Sensor,
                item_id: "dht22".into(),
                delta: -1
            }
        );

        let reset: CommandRequest = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(SelectionCommand::from(reset), SelectionCommand::Reset);
    }

    #[test]
    fn only_select_and_toggle_add_items() {
        let toggle: CommandRequest =
            serde_json::from_str(r#"{"type":"toggle","class":"mcu","item_id":"esp32"}"#).unwrap();
        assert_eq!(toggle.added_item(), Some((ItemClass::Microcontroller, "esp32")));

        let deselect: CommandRequest =
            serde_json::from_str(r#"{"type":"deselect","class":"sensors","item_id":"x"}"#).unwrap();
        assert_eq!(deselect.added_item(), None);
    }

    #[test]
    fn status_filter_accepts_all_and_rejects_unknown() {
        assert_eq!(parse_status_filter(None), Ok(None));
        assert_eq!(parse_status_filter(Some("all")), Ok(None));
        assert_eq!(
            parse_status_filter(Some("solved")),
            Ok(Some(RequestStatus::Solved))
        );
        assert!(parse_status_filter(Some("archived")).is_err());
    }

    #[test]
    fn wire_class_maps_both_ways() {
        for class in ItemClass::ALL {
            assert_eq!(ItemClass::from(WireItemClass::from(class)), class);
        }
    }
}
