//! Style directives appended to every instruction.

use crate::types::Tone;

pub fn instructions_for(tone: Tone) -> &'static str {
    match tone {
        Tone::Neutral => "Use a balanced, professional tone without emotional undertones.",
        Tone::Friendly => "Use a warm, approachable tone while maintaining professionalism.",
        Tone::FirmButPolite => "Use a strong, authoritative tone while remaining respectful.",
        Tone::Formal => "Use a highly formal, official tone suitable for official communications.",
    }
}

/// Resolves a free-form tone label. Unrecognised labels get the neutral
/// directive instead of an error.
pub fn instructions_for_label(label: &str) -> &'static str {
    let tone = label.parse::<Tone>().unwrap_or(Tone::Neutral);
    instructions_for(tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tone_has_a_directive() {
        for tone in Tone::ALL {
            assert!(!instructions_for(tone).trim().is_empty(), "{tone} has no directive");
        }
    }

    #[test]
    fn directives_are_distinct() {
        let mut seen: Vec<&str> = Tone::ALL.into_iter().map(instructions_for).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), Tone::ALL.len());
    }

    #[test]
    fn unknown_label_falls_back_to_neutral() {
        assert_eq!(
            instructions_for_label("passive aggressive"),
            instructions_for(Tone::Neutral)
        );
        assert_eq!(instructions_for_label(""), instructions_for(Tone::Neutral));
        assert_eq!(
            instructions_for_label("Formal"),
            instructions_for(Tone::Formal)
        );
    }
}
