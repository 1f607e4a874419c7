mod error;
mod ground_station;
mod pass_finder;
mod propagation;
mod tle_loader;
mod types;

pub use error::PredictError;
pub use ground_station::Observer;
pub use pass_finder::{next_pass, sample_pass};
pub use propagation::{look_angles, LookAngles};
pub use tle_loader::{Satellite, TleCatalog};
pub use types::Pass;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
