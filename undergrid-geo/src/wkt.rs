//! Well-Known Text encoding of pipeline lines and facility points.
//!
//! Output is always `LINESTRING(x y, x y, ...)` / `POINT(x y)` with six
//! decimals, longitude first. Input additionally tolerates what spatial
//! databases emit: surrounding whitespace, lower-case tags, a space before the
//! parenthesis and an EWKT `SRID=4326;` prefix.

use undergrid_types::GeoPoint;

/// The only spatial reference the store uses (WGS84 lon/lat).
pub const SRID_WGS84: u32 = 4326;

const LINESTRING: &str = "LINESTRING";
const POINT: &str = "POINT";

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while decoding WKT.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The text is not a well-formed geometry of the expected kind.
    #[error("malformed WKT: {0}")]
    Malformed(String),

    /// EWKT carried a spatial reference other than WGS84.
    #[error("unsupported SRID {0}, expected 4326")]
    UnsupportedSrid(u32),
}

/// Encodes a line. An empty slice yields an empty string, meaning "no geometry".
pub fn encode_line(points: &[GeoPoint]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let coords: Vec<String> = points.iter().map(|p| format_pair(*p)).collect();
    format!("{LINESTRING}({})", coords.join(", "))
}

/// Encodes a single point.
pub fn encode_point(p: GeoPoint) -> String {
    format!("{POINT}({})", format_pair(p))
}

/// Decodes `LINESTRING(x y, ...)` into points in text order.
pub fn decode_line(wkt: &str) -> CodecResult<Vec<GeoPoint>> {
    let body = unwrap_tagged(wkt, LINESTRING)?;
    body.split(',').map(parse_pair).collect()
}

/// Decodes `POINT(x y)`.
pub fn decode_point(wkt: &str) -> CodecResult<GeoPoint> {
    let body = unwrap_tagged(wkt, POINT)?;
    if body.contains(',') {
        return Err(CodecError::Malformed(format!("point with several coordinates: {wkt}")));
    }
    parse_pair(body)
}

fn format_pair(p: GeoPoint) -> String {
    format!("{:.6} {:.6}", p.longitude, p.latitude)
}

/// Strips the optional SRID prefix and the `TAG(` ... `)` wrapper, returning
/// the coordinate list.
fn unwrap_tagged<'a>(wkt: &'a str, tag: &str) -> CodecResult<&'a str> {
    let text = strip_srid(wkt.trim())?;

    let head = text
        .get(..tag.len())
        .filter(|head| head.eq_ignore_ascii_case(tag))
        .ok_or_else(|| CodecError::Malformed(format!("expected {tag}: {wkt}")))?;
    let rest = text[head.len()..].trim_start();

    let body = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| CodecError::Malformed(format!("missing parentheses: {wkt}")))?;

    if body.trim().is_empty() {
        return Err(CodecError::Malformed(format!("empty coordinate list: {wkt}")));
    }
    Ok(body)
}

fn strip_srid(text: &str) -> CodecResult<&str> {
    let Some(prefix) = text.get(..5).filter(|p| p.eq_ignore_ascii_case("SRID=")) else {
        return Ok(text);
    };
    let (srid, rest) = text[prefix.len()..]
        .split_once(';')
        .ok_or_else(|| CodecError::Malformed(format!("unterminated SRID prefix: {text}")))?;
    let srid: u32 = srid
        .trim()
        .parse()
        .map_err(|_| CodecError::Malformed(format!("non-numeric SRID: {srid}")))?;
    if srid != SRID_WGS84 {
        return Err(CodecError::UnsupportedSrid(srid));
    }
    Ok(rest.trim_start())
}

fn parse_pair(pair: &str) -> CodecResult<GeoPoint> {
    let mut tokens = pair.split_whitespace();
    let (Some(x), Some(y), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(CodecError::Malformed(format!(
            "expected two ordinates, got '{}'",
            pair.trim()
        )));
    };
    Ok(GeoPoint::new(parse_ordinate(x)?, parse_ordinate(y)?))
}

fn parse_ordinate(token: &str) -> CodecResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CodecError::Malformed(format!("non-numeric ordinate '{token}'")))
}
