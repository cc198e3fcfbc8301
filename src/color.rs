/// Color utilities for labels and the timeline.

const PALETTE: &[&str] = &[
    "#FF5733", "#33FF57", "#3357FF", "#F333FF", "#33FFF5", "#F5FF33", "#FF33A8",
    "#A833FF", "#33FFA8", "#FFA833", "#FF3380", "#8033FF", "#33FF80", "#FF8033",
];

/// Pick a stable palette color for a title, so an event keeps its color across runs.
pub fn title_color(title: &str) -> &'static str {
    let hash = title
        .bytes()
        .fold(0x811c_9dc5_u32, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193));
    PALETTE[hash as usize % PALETTE.len()]
}
