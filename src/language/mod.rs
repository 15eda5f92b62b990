use std::ops::RangeInclusive;

/// A supported language with its defining Unicode script range.
///
/// English has no script range of its own and is counted by ASCII alphabetic
/// characters instead.
struct ScriptEntry {
    tag: &'static str,
    name: &'static str,
    range: Option<RangeInclusive<char>>,
}

/// Languages the classifier can distinguish, keyed by Unicode script block.
/// Devanagari maps to Hindi (Marathi shares the script and loses the tie).
static SCRIPTS: &[ScriptEntry] = &[
    ScriptEntry {
        tag: "en-IN",
        name: "English (India)",
        range: None,
    },
    ScriptEntry {
        tag: "hi-IN",
        name: "Hindi (हिंदी)",
        range: Some('\u{0900}'..='\u{097F}'),
    },
    ScriptEntry {
        tag: "bn-IN",
        name: "Bengali (বাংলা)",
        range: Some('\u{0980}'..='\u{09FF}'),
    },
    ScriptEntry {
        tag: "ta-IN",
        name: "Tamil (தமிழ்)",
        range: Some('\u{0B80}'..='\u{0BFF}'),
    },
    ScriptEntry {
        tag: "te-IN",
        name: "Telugu (తెలుగు)",
        range: Some('\u{0C00}'..='\u{0C7F}'),
    },
    ScriptEntry {
        tag: "kn-IN",
        name: "Kannada (ಕನ್ನಡ)",
        range: Some('\u{0C80}'..='\u{0CFF}'),
    },
    ScriptEntry {
        tag: "ml-IN",
        name: "Malayalam (മലയാളം)",
        range: Some('\u{0D00}'..='\u{0D7F}'),
    },
    ScriptEntry {
        tag: "gu-IN",
        name: "Gujarati (ગુજરાતી)",
        range: Some('\u{0A80}'..='\u{0AFF}'),
    },
    ScriptEntry {
        tag: "pa-IN",
        name: "Punjabi (ਪੰਜਾਬੀ)",
        range: Some('\u{0A00}'..='\u{0A7F}'),
    },
    ScriptEntry {
        tag: "od-IN",
        name: "Odia (ଓଡ଼ିଆ)",
        range: Some('\u{0B00}'..='\u{0B7F}'),
    },
];

/// How confident the classifier is in a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// Dominant script share exceeded the high-confidence threshold.
    Strong,
    /// Share exceeded only the low-confidence threshold.
    Weak,
    /// No clear winner; the session's current hint was kept.
    Fallback,
}

/// Result of classifying a single transcript.
#[derive(Debug, Clone)]
pub struct LanguageGuess {
    /// BCP-47-style language tag, e.g. "hi-IN".
    pub tag: String,
    /// Share of non-whitespace characters in the dominant script.
    pub ratio: f64,
    pub strength: Strength,
}

impl LanguageGuess {
    /// Whether this guess carries new evidence worth recording.
    pub fn is_evidence(&self) -> bool {
        self.strength != Strength::Fallback
    }
}

/// Classify a transcript by counting characters per script and picking the
/// language with the highest share of non-whitespace characters.
///
/// `fallback` is the session's current hint language, returned unchanged when
/// no script clears the low-confidence threshold.
pub fn detect_language(
    transcript: &str,
    fallback: &str,
    high_confidence: f64,
    low_confidence: f64,
) -> LanguageGuess {
    let mut counts = vec![0usize; SCRIPTS.len()];
    let mut total = 0usize;

    for ch in transcript.chars() {
        if ch.is_whitespace() {
            continue;
        }
        total += 1;

        for (i, entry) in SCRIPTS.iter().enumerate() {
            let matched = match &entry.range {
                Some(range) => range.contains(&ch),
                None => ch.is_ascii_alphabetic(),
            };
            if matched {
                counts[i] += 1;
            }
        }
    }

    // Ties go to the earlier entry, so English wins an exact split
    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    let best_count = counts[best];

    let ratio = if total > 0 {
        best_count as f64 / total as f64
    } else {
        0.0
    };

    if ratio > high_confidence {
        LanguageGuess {
            tag: SCRIPTS[best].tag.to_string(),
            ratio,
            strength: Strength::Strong,
        }
    } else if ratio > low_confidence {
        LanguageGuess {
            tag: SCRIPTS[best].tag.to_string(),
            ratio,
            strength: Strength::Weak,
        }
    } else {
        LanguageGuess {
            tag: fallback.to_string(),
            ratio,
            strength: Strength::Fallback,
        }
    }
}

/// Human-readable name for a language tag; unknown tags echo back as-is.
pub fn display_name(tag: &str) -> String {
    if tag == "mr-IN" {
        // Shares Devanagari with Hindi; only reachable as a fixed mode tag
        return "Marathi (मराठी)".to_string();
    }

    SCRIPTS
        .iter()
        .find(|entry| entry.tag == tag)
        .map(|entry| entry.name.to_string())
        .unwrap_or_else(|| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devanagari_is_a_strong_hindi_guess() {
        let guess = detect_language("नमस्ते दोस्तों कैसे हैं आप", "en-IN", 0.70, 0.40);
        assert_eq!(guess.tag, "hi-IN");
        assert_eq!(guess.strength, Strength::Strong);
        assert!(guess.ratio > 0.95);
    }

    #[test]
    fn english_is_counted_by_ascii_letters() {
        let guess = detect_language("hello there how are you", "hi-IN", 0.70, 0.40);
        assert_eq!(guess.tag, "en-IN");
        assert_eq!(guess.strength, Strength::Strong);
    }

    #[test]
    fn mixed_script_falls_back_to_hint() {
        // Half Devanagari, half Latin, with digits diluting both shares
        let guess = detect_language("नमस्ते hello 123456789012", "ta-IN", 0.70, 0.40);
        assert_eq!(guess.tag, "ta-IN");
        assert_eq!(guess.strength, Strength::Fallback);
    }

    #[test]
    fn majority_script_with_noise_is_a_weak_guess() {
        // Tamil chars are ~60% of non-whitespace characters
        let guess = detect_language("வணக்கம் நண்பர்களே 1234567890", "en-IN", 0.70, 0.40);
        assert_eq!(guess.tag, "ta-IN");
        assert_eq!(guess.strength, Strength::Weak);
    }

    #[test]
    fn exact_tie_prefers_english() {
        // Five Latin letters vs. five Devanagari characters: 50% each,
        // above the weak threshold, and the earlier-listed language wins
        let guess = detect_language("abcde कखगघङ", "ta-IN", 0.70, 0.40);
        assert_eq!(guess.tag, "en-IN");
        assert_eq!(guess.strength, Strength::Weak);
    }

    #[test]
    fn empty_transcript_falls_back() {
        let guess = detect_language("", "en-IN", 0.70, 0.40);
        assert_eq!(guess.tag, "en-IN");
        assert_eq!(guess.strength, Strength::Fallback);
    }

    #[test]
    fn display_names_cover_detected_tags() {
        assert_eq!(display_name("hi-IN"), "Hindi (हिंदी)");
        assert_eq!(display_name("en-IN"), "English (India)");
        assert_eq!(display_name("xx-YY"), "xx-YY");
    }
}
