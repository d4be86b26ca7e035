//! Household planner core: the shared checklist state, the two ways of
//! keeping it in sync, and the session that binds them to a household.

mod adapter;
mod cloud;
mod live;
mod local;
mod model;
mod planner;

pub use adapter::{SyncAdapter, SyncMode};
pub use cloud::{CloudAdapter, HouseholdScope};
pub use live::{LiveState, ViewEvent};
pub use local::{HOUSEHOLD_KEY, LocalAdapter, LocalStorage, STATE_KEY};
pub use model::{Item, ListKind, PlannerState, clean_text};
pub use planner::{Credentials, Planner, PlannerView};

pub use homeplan_shared::Weekday;
pub use homeplan_store::Session;
