pub mod catalog;
pub mod domain;
pub mod estimate;
pub mod export;
pub mod ports;
pub mod selection;
pub mod triage;

pub use domain::{
    AdminReply, AuthContext, Catalog, CatalogItem, ItemClass, NewRequest, Profile, ReplySubmission,
    Request, RequestDetails, RequestStatus, RequestType, User, UserCredentials,
};
pub use catalog::{load_catalog_or_empty, LoadedCatalog};
pub use estimate::{Estimate, LineItem};
pub use ports::{AccountService, CatalogSource, PortError, PortResult, RequestStore};
pub use selection::{SelectionCommand, SelectionError, SelectionStore};
pub use triage::{StatusCounts, TriageError, TriageStore};
