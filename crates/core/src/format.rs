use std::time::Duration;

use crate::types::{Script, ScriptOrigin};

/// Typical narration pace used to estimate spoken length.
pub const WORDS_PER_MINUTE: f64 = 150.0;

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let total = secs.round() as u64;
        format!("{}m {}s", total / 60, total % 60)
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Seconds it would take to read `text` aloud at [`WORDS_PER_MINUTE`].
pub fn estimated_speaking_seconds(text: &str) -> f64 {
    word_count(text) as f64 / WORDS_PER_MINUTE * 60.0
}

fn origin_label(origin: ScriptOrigin) -> &'static str {
    match origin {
        ScriptOrigin::New => "new",
        ScriptOrigin::Regenerated => "regenerated",
        ScriptOrigin::Edited => "edited",
    }
}

pub fn format_script_readable(title: &str, script: &Script) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", title));
    output.push_str(&format!(
        "**Words:** {} | **Spoken length:** ~{} | **Origin:** {}\n\n",
        word_count(&script.content),
        format_timestamp(estimated_speaking_seconds(&script.content)),
        origin_label(script.origin)
    ));

    output.push_str("## Research\n\n");
    output.push_str(&format!(
        "{} ({} sources)\n\n",
        script.source_summary.text(),
        script.source_summary.source_count()
    ));

    output.push_str("## Script\n\n");
    output.push_str(script.content.trim());
    output.push('\n');

    output
}
