//! crates/protolab_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Catalog
//=========================================================================================

/// The five procurement classes an estimate is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemClass {
    Microcontroller,
    Sensor,
    Component,
    Actuator,
    Display,
}

impl ItemClass {
    /// All classes in report order.
    pub const ALL: [ItemClass; 5] = [
        ItemClass::Microcontroller,
        ItemClass::Sensor,
        ItemClass::Component,
        ItemClass::Actuator,
        ItemClass::Display,
    ];

    /// Single-select classes hold at most one item and carry no quantity.
    pub fn is_single_select(self) -> bool {
        matches!(self, ItemClass::Microcontroller | ItemClass::Display)
    }

    /// Stable key used on the wire and in the catalog file.
    pub fn key(self) -> &'static str {
        match self {
            ItemClass::Microcontroller => "mcu",
            ItemClass::Sensor => "sensors",
            ItemClass::Component => "components",
            ItemClass::Actuator => "actuators",
            ItemClass::Display => "display",
        }
    }

    /// Section banner used by the exported report.
    pub fn banner(self) -> &'static str {
        match self {
            ItemClass::Microcontroller => "MICROCONTROLLER",
            ItemClass::Sensor => "SENSORS",
            ItemClass::Component => "COMPONENTS & POWER",
            ItemClass::Actuator => "ACTUATORS",
            ItemClass::Display => "DISPLAY",
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ItemClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemClass::ALL
            .into_iter()
            .find(|class| class.key() == s)
            .ok_or_else(|| format!("unknown item class '{}'", s))
    }
}

/// Id of the placeholder entry a single-select class may offer for "nothing selected".
pub const NONE_ITEM_ID: &str = "none";

/// A purchasable part offered by the estimator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Whole rupees.
    pub price: u64,
    /// Grouping label for presentation only.
    pub category: String,
}

/// The full set of items, one ordered list per class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    classes: BTreeMap<ItemClass, Vec<CatalogItem>>,
}

impl Catalog {
    /// Builds a catalog from per-class item lists. Classes not present are empty.
    pub fn new(classes: impl IntoIterator<Item = (ItemClass, Vec<CatalogItem>)>) -> Self {
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn items(&self, class: ItemClass) -> &[CatalogItem] {
        self.classes.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, class: ItemClass, item_id: &str) -> Option<&CatalogItem> {
        self.items(class).iter().find(|item| item.id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.values().all(Vec::is_empty)
    }
}

//=========================================================================================
// Customer Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Consulting,
    Prototyping,
    Firmware,
    OnDemand,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Consulting => "consulting",
            RequestType::Prototyping => "prototyping",
            RequestType::Firmware => "firmware",
            RequestType::OnDemand => "ondemand",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consulting" => Ok(RequestType::Consulting),
            "prototyping" => Ok(RequestType::Prototyping),
            "firmware" => Ok(RequestType::Firmware),
            "ondemand" => Ok(RequestType::OnDemand),
            other => Err(format!("unknown request type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Pending,
    UnderReview,
    Solved,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [
        RequestStatus::Pending,
        RequestStatus::UnderReview,
        RequestStatus::Solved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::UnderReview => "under_review",
            RequestStatus::Solved => "solved",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "under_review" => Ok(RequestStatus::UnderReview),
            "solved" => Ok(RequestStatus::Solved),
            other => Err(format!("unknown request status '{}'", other)),
        }
    }
}

/// A customer-submitted request as seen by the admin triage.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Uuid,
    pub request_type: RequestType,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub summary: String,
    pub admin_notes: Option<String>,
}

/// One admin reply recorded against a request.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminReply {
    pub message: String,
    pub previous_status: RequestStatus,
    pub new_status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A request with its type-specific fields and reply history merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDetails {
    pub request: Request,
    pub fields: BTreeMap<String, String>,
    pub replies: Vec<AdminReply>,
}

/// Payload persisted by a triage transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplySubmission {
    pub request_type: RequestType,
    pub request_id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub reply_message: String,
    pub new_status: RequestStatus,
    pub previous_status: RequestStatus,
}

/// A request filed by an end user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub request_type: RequestType,
    pub user_id: Uuid,
    pub summary: String,
    pub fields: BTreeMap<String, String>,
}

//=========================================================================================
// Accounts
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub full_name: String,
    pub is_admin: bool,
}

/// Who is behind the current browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user: User,
    pub profile: Option<Profile>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin)
    }

    /// Name to show for the user, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.full_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.user.email)
    }
}
