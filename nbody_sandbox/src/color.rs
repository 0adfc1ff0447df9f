//! Display colors
//!
//! Colors are opaque strings to the physics; renderers turn them into RGBA.

use rand::Rng;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Random `#rrggbb` color
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut color = String::with_capacity(7);
    color.push('#');
    for _ in 0..6 {
        color.push(HEX_DIGITS[rng.gen_range(0..16)] as char);
    }
    color
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r,g,b)` or a handful of named colors.
///
/// Unknown input renders white rather than failing; color never affects physics.
pub fn to_rgba(color: &str) -> [f32; 4] {
    parse(color.trim()).unwrap_or([1.0, 1.0, 1.0, 1.0])
}

fn parse(color: &str) -> Option<[f32; 4]> {
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = color.to_ascii_lowercase();
    if let Some(body) = lower
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<f32> = body
            .split(',')
            .map(|c| c.trim().parse::<u8>().map(|v| v as f32 / 255.0))
            .collect::<Result<_, _>>()
            .ok()?;
        return match channels.as_slice() {
            [r, g, b] => Some([*r, *g, *b, 1.0]),
            _ => None,
        };
    }
    let named = match lower.as_str() {
        "red" => [1.0, 0.0, 0.0],
        "green" => [0.0, 0.5, 0.0],
        "blue" => [0.0, 0.0, 1.0],
        "white" => [1.0, 1.0, 1.0],
        "yellow" => [1.0, 1.0, 0.0],
        "orange" => [1.0, 0.65, 0.0],
        "purple" => [0.5, 0.0, 0.5],
        "cyan" => [0.0, 1.0, 1.0],
        "gray" | "grey" => [0.5, 0.5, 0.5],
        _ => return None,
    };
    Some([named[0], named[1], named[2], 1.0])
}

fn parse_hex(hex: &str) -> Option<[f32; 4]> {
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as f32);
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => Some([
            nibble(bytes[0])? * 17.0 / 255.0,
            nibble(bytes[1])? * 17.0 / 255.0,
            nibble(bytes[2])? * 17.0 / 255.0,
            1.0,
        ]),
        6 => {
            let channel = |i: usize| Some((nibble(bytes[i])? * 16.0 + nibble(bytes[i + 1])?) / 255.0);
            Some([channel(0)?, channel(2)?, channel(4)?, 1.0])
        }
        _ => None,
    }
}
