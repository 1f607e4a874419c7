use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Invalid TLE format in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("No satellites in {0}")]
    NoSatellites(String),
    #[error("Satellite not found: {0}")]
    SatelliteNotFound(String),
    #[error("Propagation error: {0}")]
    Propagation(String),
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
    #[error("No pass above {min_elevation_deg} deg within {window}")]
    NoPass {
        min_elevation_deg: f64,
        window: String,
    },
}

impl From<sgp4::Error> for PredictError {
    fn from(err: sgp4::Error) -> Self {
        PredictError::Propagation(err.to_string())
    }
}
