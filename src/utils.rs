use chrono::Local;

/// Build a timestamped export filename like
/// `OpponentPokemon-3 2026-08-30 14-05-12.png`.
///
/// The timestamp uses the local clock on purpose: the files sit next to the
/// broadcaster's recordings, which are named in local time too.
pub fn timestamped_filename(prefix: &str, ext: &str) -> String {
    format!("{} {}.{}", prefix, Local::now().format("%Y-%m-%d %H-%M-%S"), ext)
}

/// Per-slot variant: `<prefix>-<n>` with a 1-based slot number
pub fn slot_filename(prefix: &str, slot: usize, ext: &str) -> String {
    timestamped_filename(&format!("{}-{}", prefix, slot + 1), ext)
}
