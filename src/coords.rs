use crate::patterns::PatternLibrary;

/// Coordinates from the first `{{Coord|...}}` template in `body`, as
/// `(lon, lat)`. Later templates are ignored.
///
/// Two argument layouts are recognized after dropping empty and named
/// (`key=value`) tokens:
///
/// - decimal: `{{Coord|44.112|-87.913|...}}`, when the first two tokens parse
///   as numbers and no later token does
/// - degree/minute/second: `{{Coord|57|18|22|N|4|27|32|W|...}}` or
///   `{{Coord|44.112|N|87.913|W}}`, one latitude group closed by `N`/`S`
///   followed by one longitude group closed by `E`/`W`
///
/// A `(0, 0)` result is reported as `None`; under this heuristic a true null
/// island coordinate is indistinguishable from "not found".
pub fn extract_coordinates(patterns: &PatternLibrary, body: &str) -> Option<(f64, f64)> {
    let caps = patterns.coord.captures(body)?;
    let args = caps.get(1)?.as_str();

    let tokens: Vec<&str> = args
        .split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.contains('='))
        .collect();
    if tokens.is_empty() {
        return None;
    }

    // DMS runs also open with two numeric tokens; the pair is only decimal
    // degrees when no numeric token follows it
    let trailing_number = tokens.iter().skip(2).any(|t| is_number(t));
    let (lat, lon) = if tokens.len() >= 2
        && is_number(tokens[0])
        && is_number(tokens[1])
        && !trailing_number
    {
        decimal_layout(&tokens)?
    } else {
        dms_layout(&tokens)
    };

    if lat == 0.0 && lon == 0.0 {
        return None;
    }
    Some((lon, lat))
}

fn decimal_layout(tokens: &[&str]) -> Option<(f64, f64)> {
    let mut lat: f64 = tokens[0].parse().ok()?;
    let mut lon: f64 = tokens[1].parse().ok()?;
    if tokens.len() > 2 {
        if tokens[2].eq_ignore_ascii_case("S") {
            lat = -lat;
        }
        // The third and fourth tokens are checked independently, so a W in
        // both positions negates twice
        if tokens[2].eq_ignore_ascii_case("W") {
            lon = -lon;
        }
        if tokens.len() > 3 && tokens[3].eq_ignore_ascii_case("W") {
            lon = -lon;
        }
    }
    Some((lat, lon))
}

/// Accumulates numeric tokens until a direction letter closes the group:
/// `N`/`S` resolves latitude, `E`/`W` resolves longitude and ends the scan.
fn dms_layout(tokens: &[&str]) -> (f64, f64) {
    let mut lat = 0.0;
    let mut lon = 0.0;
    let mut parts: Vec<f64> = Vec::new();

    for token in tokens {
        if let Ok(value) = token.parse::<f64>() {
            parts.push(value);
            continue;
        }
        match token.to_ascii_uppercase().as_str() {
            "N" | "S" => {
                lat = dms_to_decimal(&parts);
                if token.eq_ignore_ascii_case("S") {
                    lat = -lat;
                }
                parts.clear();
            }
            "E" | "W" => {
                lon = dms_to_decimal(&parts);
                if token.eq_ignore_ascii_case("W") {
                    lon = -lon;
                }
                break;
            }
            _ => {}
        }
    }

    (lat, lon)
}

/// `[deg, min, sec]` to decimal degrees, using only as many parts as present.
fn dms_to_decimal(parts: &[f64]) -> f64 {
    let mut degrees = match parts.first() {
        Some(d) => *d,
        None => return 0.0,
    };
    if parts.len() > 1 {
        degrees += parts[1] / 60.0;
    }
    if parts.len() > 2 {
        degrees += parts[2] / 3600.0;
    }
    degrees
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}
