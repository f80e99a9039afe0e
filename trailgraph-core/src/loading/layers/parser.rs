use geojson::Position;
use serde_json::{Map, Value};

use crate::model::{Coord3, LineString3, LineTags};

/// Promote GeoJSON positions to 3D vertices.
///
/// Returns `None` for positions that are not a usable line: fewer than two
/// ordinates, non-finite values, or fewer than two distinct vertices.
pub(crate) fn parse_line(positions: &[Position]) -> Option<LineString3> {
    let coords = positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y] => Some(Coord3::new(*x, *y, 0.0)),
            [x, y, z, ..] => Some(Coord3::new(*x, *y, *z)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    if coords
        .iter()
        .any(|c| !(c.x.is_finite() && c.y.is_finite() && c.z.is_finite()))
    {
        return None;
    }

    let first = coords.first()?;
    if !coords.iter().any(|c| !c.same_xy(first)) {
        return None;
    }

    Some(LineString3::new(coords))
}

/// Pick the tags the graph builder consumes out of the feature properties
pub(crate) fn parse_tags(properties: Option<&Map<String, Value>>) -> LineTags {
    let Some(properties) = properties else {
        return LineTags::default();
    };

    LineTags {
        highway: properties.get("highway").and_then(tag_string),
        name: properties.get("name").and_then(tag_string),
        main_trail: properties.get("main_trail").is_some_and(is_truthy),
    }
}

fn tag_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "true" | "1"
        ),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn positions(raw: &[&[f64]]) -> Vec<Position> {
        raw.iter().map(|p| Position::from(p.to_vec())).collect()
    }

    #[test]
    fn promotes_2d_positions() {
        let line = parse_line(&positions(&[&[0.0, 0.0], &[1.0, 2.0, 30.0]])).unwrap();
        assert_eq!(line.coords()[0], Coord3::new(0.0, 0.0, 0.0));
        assert_eq!(line.coords()[1], Coord3::new(1.0, 2.0, 30.0));
    }

    #[test]
    fn rejects_unusable_lines() {
        assert!(parse_line(&positions(&[&[0.0, 0.0]])).is_none());
        assert!(parse_line(&positions(&[&[1.0, 1.0], &[1.0, 1.0, 5.0]])).is_none());
        assert!(parse_line(&positions(&[&[0.0], &[1.0, 1.0]])).is_none());
        assert!(parse_line(&[]).is_none());
    }

    #[test]
    fn reads_consumed_tags() {
        let properties = json!({
            "highway": "path",
            "name": "Long Trail",
            "main_trail": "yes",
            "surface": "dirt"
        });
        let tags = parse_tags(properties.as_object());
        assert_eq!(tags.highway(), "path");
        assert_eq!(tags.name(), "Long Trail");
        assert!(tags.main_trail);
    }

    #[test]
    fn main_trail_truthiness() {
        for (value, expected) in [
            (json!("yes"), true),
            (json!("True"), true),
            (json!(true), true),
            (json!(1), true),
            (json!("no"), false),
            (json!(0), false),
            (json!(null), false),
        ] {
            let properties = json!({ "main_trail": value });
            assert_eq!(parse_tags(properties.as_object()).main_trail, expected);
        }
    }
}
