use serde::Serializer;

use gbx::GameString;

/// Turn the number of milliseconds into a readable run time,
/// f.e. '00:48:051' for '48051'.
pub(super) fn fmt_time(millis: i32) -> String {
    let millis = millis.max(0);
    let secs = millis / 1000;
    let millis = millis % 1000;
    let mins = secs / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:03}", mins, secs, millis)
}

/// Remove all formatting from a nick name.
pub(super) fn format_plain<S>(p: &GameString, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&p.plain())
}

/// Points that were added in the current round, f.e. '+10',
/// or nothing if no points were added.
pub(super) fn format_points_added<S>(x: &Option<i32>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match x {
        Some(points) if *points > 0 => s.serialize_str(&format!("+{}", points)),
        _ => s.serialize_str(""),
    }
}
