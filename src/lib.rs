pub mod auth;
pub mod fmcsa;
pub mod search;
pub mod store;
pub mod types;

pub use auth::{AuthError, Authenticator};
pub use fmcsa::{FmcsaClient, FmcsaConfig, VerifyError};
pub use search::{SearchCriteria, search};
pub use store::load_loads_from_file;
pub use types::{CarrierRecord, CarrierStatus, EquipmentType, Load};
