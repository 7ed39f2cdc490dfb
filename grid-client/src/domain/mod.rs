pub mod application_status;
pub mod capacity;
pub mod facility;

pub use application_status::ApplicationStatus;
pub use capacity::{CapacityStatus, CapacitySummary, ChainId, NormalizedFacilityRow};
pub use facility::{RawFacilityRecord, StageFields, StageKind};
