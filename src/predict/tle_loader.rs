use std::fs;
use std::path::Path;

use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;

pub struct Satellite {
    pub name: String,
    pub norad_id: u64,
    pub elements: Elements,
    pub constants: Constants,
}

/// All satellites of one TLE file.
pub struct TleCatalog {
    source: String,
    satellites: Vec<Satellite>,
}

impl TleCatalog {
    pub fn from_file(path: &Path) -> Result<Self, PredictError> {
        let content = fs::read_to_string(path)?;
        let source = path.display().to_string();
        let catalog = Self::parse(&content, &source)?;
        log::info!(
            "Loaded {} satellites from {}",
            catalog.satellites.len(),
            source
        );
        Ok(catalog)
    }

    /// Parses 2-line and 3-line TLE sets; unrecognised lines are skipped.
    pub fn parse(content: &str, source: &str) -> Result<Self, PredictError> {
        let invalid = |message: String| PredictError::InvalidTle {
            file: source.to_string(),
            message,
        };

        let mut satellites = Vec::new();
        for (name, line1, line2) in split_tle_sets(content) {
            let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
                .map_err(|e| invalid(e.to_string()))?;
            let constants =
                Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;
            satellites.push(Satellite {
                name: name.unwrap_or_else(|| format!("NORAD {}", elements.norad_id)),
                norad_id: elements.norad_id,
                elements,
                constants,
            });
        }

        if satellites.is_empty() {
            return Err(PredictError::NoSatellites(source.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            satellites,
        })
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    /// Looks a satellite up by NORAD id or by name, ignoring case.
    pub fn find(&self, query: &str) -> Result<&Satellite, PredictError> {
        let query = query.trim();
        let by_id = query.parse::<u64>().ok();
        self.satellites
            .iter()
            .find(|s| match by_id {
                Some(id) => s.norad_id == id,
                None => s.name.eq_ignore_ascii_case(query),
            })
            .ok_or_else(|| {
                PredictError::SatelliteNotFound(format!("{} in {}", query, self.source))
            })
    }
}

fn split_tle_sets(content: &str) -> Vec<(Option<String>, &str, &str)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut sets = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            sets.push((None, lines[i], lines[i + 1]));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            let name = lines[i].trim_start_matches("0 ").trim().to_string();
            sets.push((Some(name), lines[i + 1], lines[i + 2]));
            i += 3;
        } else {
            i += 1;
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_named_and_anonymous_sets() {
        let content = "ISS (ZARYA)\n1 a\n2 b\n\n1 c\n2 d\ngarbage\n";
        let sets = split_tle_sets(content);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0], (Some("ISS (ZARYA)".to_string()), "1 a", "2 b"));
        assert_eq!(sets[1], (None, "1 c", "2 d"));
    }

    #[test]
    fn empty_file_has_no_satellites() {
        assert!(matches!(
            TleCatalog::parse("\n\n", "empty.tle"),
            Err(PredictError::NoSatellites(_))
        ));
    }
}
