//! Descriptive metadata derived from parameters and the primary event.

use blocktape_spec::hash::short_hash;
use blocktape_spec::{
    Attribute, MusicParameters, PitchClass, ScaleMode, SourceEvent, TrackMetadata,
};

/// Hex digits of the content hash shown in the attributes.
const HASH_DIGITS: usize = 10;

/// Base color per pitch class, C through B.
const KEY_PALETTE: [(u8, u8, u8); 12] = [
    (0x8e, 0x6c, 0x8a),
    (0x6d, 0x59, 0x7a),
    (0x4f, 0x6d, 0x7a),
    (0x3f, 0x7c, 0x85),
    (0x5b, 0x8c, 0x85),
    (0x7a, 0x9e, 0x7e),
    (0xa3, 0xa8, 0x6d),
    (0xc9, 0xa2, 0x66),
    (0xd4, 0x8a, 0x6a),
    (0xc0, 0x6e, 0x6e),
    (0xa8, 0x5e, 0x7d),
    (0x9b, 0x72, 0xaa),
];

/// Brighter modes get lighter backgrounds.
fn mode_brightness(scale: ScaleMode) -> f64 {
    match scale {
        ScaleMode::Lydian => 1.0,
        ScaleMode::Ionian => 0.92,
        ScaleMode::Mixolydian => 0.84,
        ScaleMode::Dorian => 0.76,
        ScaleMode::Aeolian => 0.66,
        ScaleMode::Phrygian => 0.56,
    }
}

/// Background color for a key and mode, as hex without `#`.
pub fn background_color(key: PitchClass, scale: ScaleMode) -> String {
    let (r, g, b) = KEY_PALETTE[key.semitone() as usize % 12];
    let k = mode_brightness(scale);
    let shade = |c: u8| (c as f64 * k).round().clamp(0.0, 255.0) as u8;
    format!("{:02x}{:02x}{:02x}", shade(r), shade(g), shade(b))
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Builds the metadata block. Uses no randomness.
pub fn build_metadata(
    primary: &SourceEvent,
    event_count: usize,
    params: &MusicParameters,
    duration_seconds: f64,
    animation_url: Option<String>,
) -> TrackMetadata {
    let genre = title_case(&params.genre);
    let key = params.key.name();
    let scale = params.scale.name();
    let tempo = round_to(params.tempo, 1);

    let name = format!("{} #{} - {} {}", genre, primary.sequence, key, scale);
    let description = format!(
        "A {:.0}-second {} track at {} BPM in {} {}, generated from {} source events ending at block {}.",
        duration_seconds, params.genre, tempo, key, scale, event_count, primary.sequence
    );

    let attributes = vec![
        Attribute::new("Genre", genre),
        Attribute::new("Block Number", primary.sequence),
        Attribute::new("Event Count", event_count as u64),
        Attribute::new("Tempo", tempo),
        Attribute::new("Key", key),
        Attribute::new("Scale", scale),
        Attribute::new("Time Signature", params.time_signature.to_string()),
        Attribute::new("Duration", round_to(duration_seconds, 1)),
        Attribute::new("Swing", (params.swing * 100.0).round()),
        Attribute::new("Extended Chords", params.features.extended_chords),
        Attribute::new("Vinyl Texture", params.features.vinyl_texture),
        Attribute::new("Tape Saturation", params.features.tape_saturation),
        Attribute::new(
            "Source Hash",
            short_hash(&primary.content_hash, HASH_DIGITS).to_string(),
        ),
    ];

    TrackMetadata {
        name,
        description,
        attributes,
        background_color: background_color(params.key, params.scale),
        animation_url,
    }
}
