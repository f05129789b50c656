use fxhash::FxHashSet;
use std::io::{self, BufRead};
use std::{fs::File, path::Path};
use thiserror::Error;

use crate::structs::{Entity, EntityError, EntityId};

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Unable to read entities")]
    Io(#[from] io::Error),
    #[error("No valid entity found")]
    Empty,
}

/// Loads a CSV with a header row. The name is the first column, latitude
/// and longitude are the last two.
pub fn load_entities<P>(filename: P) -> Result<Vec<Entity>, DataError>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    let lines = io::BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<_>>>()?;

    parse_entities(lines.iter().map(String::as_str))
}

/// Rows that fail to parse are logged and skipped. Ids follow the order of
/// the accepted rows.
pub fn parse_entities<'a, I>(lines: I) -> Result<Vec<Entity>, DataError>
where
    I: Iterator<Item = &'a str>,
{
    let mut entities = Vec::new();
    let mut seen = FxHashSet::default();

    for (i, line) in lines.enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_entity(i + 1, line, entities.len()) {
            Ok(entity) if seen.insert(entity.name.to_lowercase()) => entities.push(entity),
            Ok(entity) => log::warn!(
                "Skipping line {}: duplicate name \"{}\"",
                i + 1,
                entity.name
            ),
            Err(err) => log::warn!("Skipping row: {err}"),
        }
    }

    if entities.is_empty() {
        return Err(DataError::Empty);
    }
    log::info!("Loaded {} entities", entities.len());

    Ok(entities)
}

pub fn parse_entity(line: usize, row: &str, id: EntityId) -> Result<Entity, EntityError> {
    let invalid = |reason: String| EntityError::InvalidEntity { line, reason };

    let (name, rest) = match row.trim().strip_prefix('"') {
        Some(quoted) => quoted
            .split_once('"')
            .ok_or_else(|| invalid("unterminated quoted name".to_string()))?,
        None => row.split_once(',').unwrap_or((row, "")),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("empty name".to_string()));
    }

    let fields = rest.split(',').map(str::trim).collect::<Vec<_>>();
    let [.., lat, lon] = fields.as_slice() else {
        return Err(invalid(format!("expected at least three columns, found \"{row}\"")));
    };

    let latitude = parse_coordinate(lat, 90.).map_err(invalid)?;
    let longitude = parse_coordinate(lon, 180.).map_err(invalid)?;

    Ok(Entity::new(id, name, latitude, longitude))
}

fn parse_coordinate(field: &str, bound: f64) -> Result<f64, String> {
    let value = field
        .parse::<f64>()
        .map_err(|_| format!("\"{field}\" is not a number"))?;
    if !value.is_finite() || value.abs() > bound {
        return Err(format!("{value} is outside [-{bound}, {bound}]"));
    }
    Ok(value)
}
