use crate::pipeline::stage4_rank::CellRank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

const WHITE: Rgb = Rgb(255, 255, 255);

/// Best to worst: green through yellow and orange to red.
pub const REGULAR_RAMP: [Rgb; 5] = [
    Rgb(144, 238, 144),
    Rgb(255, 230, 102),
    Rgb(255, 165, 0),
    Rgb(255, 99, 71),
    Rgb(255, 64, 64),
];

/// Start-gate columns: light to dark blue.
pub const ACCELERATION_RAMP: [Rgb; 5] = [
    Rgb(135, 206, 250),
    Rgb(100, 149, 237),
    Rgb(65, 105, 225),
    Rgb(0, 0, 205),
    Rgb(0, 0, 139),
];

/// Piecewise-linear colour at `position` in [0, 1]; channels truncate.
pub fn interpolate(ramp: &[Rgb], position: f64) -> Rgb {
    let Some(first) = ramp.first() else {
        return WHITE;
    };
    if ramp.len() == 1 {
        return *first;
    }
    let segments = ramp.len() - 1;
    let scaled = position.clamp(0.0, 1.0) * segments as f64;
    let idx = (scaled.floor() as usize).min(segments - 1);
    let t = scaled - idx as f64;
    let (a, b) = (ramp[idx], ramp[idx + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t) as u8;
    Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Alpha-blends `color` over white.
pub fn blend(color: Rgb, opacity: f64) -> Rgb {
    let o = opacity.clamp(0.0, 1.0);
    let mix = |c: u8, bg: u8| (c as f64 * o + bg as f64 * (1.0 - o)) as u8;
    Rgb(
        mix(color.0, WHITE.0),
        mix(color.1, WHITE.1),
        mix(color.2, WHITE.2),
    )
}

pub fn fill_for(cell: &CellRank) -> Rgb {
    // lone times are always shown as the best regular colour
    if cell.total_ranked <= 1 {
        return blend(REGULAR_RAMP[0], cell.opacity);
    }
    let ramp: &[Rgb] = if cell.is_acceleration_ramp {
        &ACCELERATION_RAMP
    } else {
        &REGULAR_RAMP
    };
    blend(interpolate(ramp, cell.gradient_position()), cell.opacity)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/palette.rs"]
mod tests;
